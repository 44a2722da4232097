//! HTTP metrics middleware.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use std::time::{Duration, Instant};

use crate::metrics::{
    normalize_path, HTTP_REQUESTS_IN_FLIGHT, HTTP_REQUESTS_TOTAL, HTTP_REQUEST_DURATION,
};

/// Holds one slot of the in-flight gauge until dropped.
///
/// Dropping on cancellation keeps the gauge accurate when a client disconnects
/// mid-request.
pub(crate) struct InFlight;

impl InFlight {
    pub(crate) fn start() -> Self {
        HTTP_REQUESTS_IN_FLIGHT.inc();
        InFlight
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        HTTP_REQUESTS_IN_FLIGHT.dec();
    }
}

/// Method and route a request is accounted under.
struct RequestLabels {
    method: String,
    path: String,
}

impl RequestLabels {
    fn of(request: &Request<Body>) -> Self {
        Self {
            method: request.method().as_str().to_owned(),
            path: normalize_path(request.uri().path()),
        }
    }

    fn record(&self, status: StatusCode, elapsed: Duration) {
        let status = status.as_str();
        let labels = [self.method.as_str(), self.path.as_str(), status];
        HTTP_REQUEST_DURATION
            .with_label_values(&labels)
            .observe(elapsed.as_secs_f64());
        HTTP_REQUESTS_TOTAL.with_label_values(&labels).inc();
    }
}

/// Records duration, count and in-flight requests for every HTTP request.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response {
    let labels = RequestLabels::of(&request);
    let _in_flight = InFlight::start();
    let start = Instant::now();

    let response = next.run(request).await;

    labels.record(response.status(), start.elapsed());
    response
}
