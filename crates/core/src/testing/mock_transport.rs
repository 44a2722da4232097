//! Mock HTTP transport for testing.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::searcher::{HttpTransport, TransportError, TransportResponse};

/// A request seen by the mock transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub url: String,
    pub params: Vec<(String, String)>,
}

impl RecordedRequest {
    /// Value of a query parameter.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// The decoded search term from a `/usearch/<term>/` URL.
    pub fn term(&self) -> Option<String> {
        let (_, rest) = self.url.split_once("/usearch/")?;
        let encoded = rest.trim_end_matches('/');
        urlencoding::decode(encoded).ok().map(|t| t.into_owned())
    }
}

type Scripted = Result<TransportResponse, TransportError>;

/// Which requests a scripted response applies to.
#[derive(Debug, Clone, Default)]
struct Matcher {
    term: Option<String>,
    sort: Option<String>,
}

impl Matcher {
    fn matches(&self, request: &RecordedRequest) -> bool {
        let term_ok = match &self.term {
            Some(term) => request.term().as_deref() == Some(term.as_str()),
            None => true,
        };
        let sort_ok = match &self.sort {
            Some(sort) => request.param("field") == Some(sort.as_str()),
            None => true,
        };
        term_ok && sort_ok
    }
}

/// Mock implementation of [`HttpTransport`].
///
/// Responses are scripted per search term and/or sort field; the most
/// recently added matching rule wins. Unmatched requests get an empty 200
/// response. Every request is recorded for assertions.
///
/// # Example
///
/// ```rust,ignore
/// use kat_search_core::testing::{fixtures, MockTransport};
///
/// let transport = MockTransport::new();
/// transport.respond_to_term("foo", TransportResponse::ok(fixtures::html_results_page(&[
///     fixtures::html_row("torrent_1", "Foo", "//site/foo.torrent", "5", "1"),
/// ])));
/// transport.fail_sort("time_add", TransportError::Timeout);
/// ```
#[derive(Debug, Default)]
pub struct MockTransport {
    rules: Mutex<Vec<(Matcher, Scripted)>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn add_rule(&self, matcher: Matcher, scripted: Scripted) {
        self.rules.lock().unwrap().push((matcher, scripted));
    }

    /// Respond to every request.
    pub fn respond_to_all(&self, response: TransportResponse) {
        self.add_rule(Matcher::default(), Ok(response));
    }

    /// Respond to requests for a (decoded) search term.
    pub fn respond_to_term(&self, term: &str, response: TransportResponse) {
        self.add_rule(
            Matcher {
                term: Some(term.to_string()),
                sort: None,
            },
            Ok(response),
        );
    }

    /// Respond to requests sorted by the given field (`time_add`, `seeders`).
    pub fn respond_to_sort(&self, field: &str, response: TransportResponse) {
        self.add_rule(
            Matcher {
                term: None,
                sort: Some(field.to_string()),
            },
            Ok(response),
        );
    }

    /// Fail requests for a search term with a transport error.
    pub fn fail_term(&self, term: &str, error: TransportError) {
        self.add_rule(
            Matcher {
                term: Some(term.to_string()),
                sort: None,
            },
            Err(error),
        );
    }

    /// Fail requests sorted by the given field with a transport error.
    pub fn fail_sort(&self, field: &str, error: TransportError) {
        self.add_rule(
            Matcher {
                term: None,
                sort: Some(field.to_string()),
            },
            Err(error),
        );
    }

    /// Requests made so far, in completion order.
    pub fn recorded_requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Decoded terms that were requested, one entry per request.
    pub fn requested_terms(&self) -> Vec<String> {
        self.recorded_requests()
            .iter()
            .filter_map(RecordedRequest::term)
            .collect()
    }

    pub fn clear_recorded(&self) {
        self.requests.lock().unwrap().clear();
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn get(
        &self,
        url: &str,
        params: &[(String, String)],
    ) -> Result<TransportResponse, TransportError> {
        let request = RecordedRequest {
            url: url.to_string(),
            params: params.to_vec(),
        };

        let scripted = self
            .rules
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(matcher, _)| matcher.matches(&request))
            .map(|(_, scripted)| scripted.clone());

        self.requests.lock().unwrap().push(request);

        scripted.unwrap_or_else(|| Ok(TransportResponse::ok(Vec::new())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(field: &str) -> Vec<(String, String)> {
        vec![
            ("field".to_string(), field.to_string()),
            ("sorder".to_string(), "desc".to_string()),
        ]
    }

    #[tokio::test]
    async fn test_unmatched_request_gets_empty_body() {
        let transport = MockTransport::new();
        let response = transport
            .get("https://kat.test/usearch/foo/", &params("seeders"))
            .await
            .unwrap();
        assert_eq!(response.status, 200);
        assert!(response.body.is_empty());
    }

    #[tokio::test]
    async fn test_latest_matching_rule_wins() {
        let transport = MockTransport::new();
        transport.respond_to_all(TransportResponse::ok("all"));
        transport.respond_to_sort("seeders", TransportResponse::ok("seeders"));

        let by_time = transport
            .get("https://kat.test/usearch/foo/", &params("time_add"))
            .await
            .unwrap();
        let by_seeders = transport
            .get("https://kat.test/usearch/foo/", &params("seeders"))
            .await
            .unwrap();

        assert_eq!(by_time.body, b"all".to_vec());
        assert_eq!(by_seeders.body, b"seeders".to_vec());
    }

    #[tokio::test]
    async fn test_term_matching_decodes_url() {
        let transport = MockTransport::new();
        transport.fail_term("foo verified:1", TransportError::Timeout);

        let result = transport
            .get("https://kat.test/usearch/foo%20verified%3A1/", &params("seeders"))
            .await;
        assert!(matches!(result, Err(TransportError::Timeout)));
        assert_eq!(transport.requested_terms(), vec!["foo verified:1".to_string()]);
    }

    #[test]
    fn test_recorded_request_accessors() {
        let request = RecordedRequest {
            url: "https://kat.test/usearch/the%20matrix/".to_string(),
            params: params("time_add"),
        };
        assert_eq!(request.term().as_deref(), Some("the matrix"));
        assert_eq!(request.param("field"), Some("time_add"));
        assert_eq!(request.param("category"), None);
    }

    #[test]
    fn test_scripted_response_resolves_without_suspending() {
        let transport = MockTransport::new();
        transport.respond_to_term("bar", TransportResponse::with_status(500, "oops"));

        let mut get = tokio_test::task::spawn(transport.get("https://kat.test/usearch/bar/", &[]));
        let response = tokio_test::assert_ready_ok!(get.poll());
        assert_eq!(response.status, 500);
        assert_eq!(transport.recorded_requests().len(), 1);
    }
}
