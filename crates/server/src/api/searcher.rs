//! Searcher API handlers.

use std::sync::Arc;
use std::time::Instant;

use axum::{extract::State, http::StatusCode, Json};
use kat_search_core::searcher as kat;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub search_strings: Option<Vec<String>>,
    /// Overrides for the configured connector defaults
    #[serde(default)]
    pub category: Option<kat::SearchCategory>,
    #[serde(default)]
    pub verified: Option<bool>,
    #[serde(default)]
    pub rss: Option<bool>,
}

impl SearchRequest {
    /// Merge per-request overrides onto the configured defaults.
    pub fn options(&self, defaults: &kat::SearchOptions) -> kat::SearchOptions {
        kat::SearchOptions {
            category: self.category.unwrap_or(defaults.category),
            verified: self.verified.unwrap_or(defaults.verified),
            rss: self.rss.unwrap_or(defaults.rss),
        }
    }

    /// The core request, or `None` when there is nothing to search for.
    pub fn to_search_request(&self) -> Option<kat::SearchRequest> {
        let strings: Vec<String> = self
            .search_strings
            .iter()
            .flatten()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        let title = self.title.trim();

        if strings.is_empty() {
            if title.is_empty() {
                return None;
            }
            return Some(kat::SearchRequest::from_title(title));
        }
        Some(kat::SearchRequest::with_search_strings(title, strings))
    }
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub results: Vec<kat::ResultRecord>,
    pub duration_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Order records by rank, best first, then by title and locator.
pub fn sorted_results(
    results: impl IntoIterator<Item = kat::ResultRecord>,
) -> Vec<kat::ResultRecord> {
    let mut results: Vec<_> = results.into_iter().collect();
    results.sort_by(|a, b| {
        b.rank()
            .cmp(&a.rank())
            .then_with(|| a.title.cmp(&b.title))
            .then_with(|| a.locator.cmp(&b.locator))
    });
    results
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/search
///
/// Search KAT for every term of the request.
pub async fn search(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, (StatusCode, Json<ErrorResponse>)> {
    let request = body.to_search_request().ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "title or search_strings must not be empty".to_string(),
            }),
        )
    })?;
    let options = body.options(&state.config().kat.options);

    let searcher = state.searcher();
    let start = Instant::now();
    let results = searcher.search(&request, &options).await;
    let duration_ms = start.elapsed().as_millis() as u64;

    info!(
        searcher = searcher.name(),
        title = %request.title,
        results = results.len(),
        duration_ms,
        "Search executed"
    );

    Ok(Json(SearchResponse {
        results: sorted_results(results),
        duration_ms,
    }))
}
