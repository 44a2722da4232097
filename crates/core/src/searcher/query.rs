//! Execution of one search term against KAT.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::metrics::{KAT_REQUESTS, PARSE_FAILURES, RECORDS_PARSED};

use super::feed::FeedParser;
use super::html::HtmlTableParser;
use super::transport::HttpTransport;
use super::{
    ParseError, ParseMode, ResultParser, ResultRecord, SearchCategory, SearchOptions, SortOrder,
};

/// Marker appended to the term to only match verified torrents.
const VERIFIED_MARKER: &str = " verified:1";

impl ParseMode {
    /// The parser backing this mode.
    pub fn parser(&self, skip_malformed_items: bool) -> Box<dyn ResultParser> {
        match self {
            ParseMode::Feed => {
                Box::new(FeedParser::new().skipping_malformed_items(skip_malformed_items))
            }
            ParseMode::Html => {
                Box::new(HtmlTableParser::new().skipping_malformed_items(skip_malformed_items))
            }
        }
    }
}

/// Build the term sent to KAT, with the verified marker when requested.
pub fn query_term(term: &str, verified: bool) -> String {
    if verified {
        format!("{}{}", term, VERIFIED_MARKER)
    } else {
        term.to_string()
    }
}

/// Parameters shared by both sort orders.
pub fn base_params(options: &SearchOptions) -> Vec<(String, String)> {
    let mut params = Vec::new();
    if options.rss {
        params.push(("rss".to_string(), "1".to_string()));
    }
    if options.category != SearchCategory::All {
        params.push(("category".to_string(), options.category.as_str().to_string()));
    }
    params
}

/// Set a parameter, replacing any previous value for the key.
fn set_param(params: &mut Vec<(String, String)>, key: &str, value: &str) {
    match params.iter_mut().find(|(k, _)| k == key) {
        Some((_, v)) => *v = value.to_string(),
        None => params.push((key.to_string(), value.to_string())),
    }
}

/// The base parameters with a sort order applied on top.
pub fn sorted_params(base: &[(String, String)], sort: SortOrder) -> Vec<(String, String)> {
    let mut params = base.to_vec();
    set_param(&mut params, "field", sort.field());
    set_param(&mut params, "sorder", sort.direction());
    params
}

/// Runs one normalized term against KAT in both sort orders.
#[derive(Clone)]
pub struct QueryExecutor {
    transport: Arc<dyn HttpTransport>,
    base_url: String,
    skip_malformed_items: bool,
}

impl QueryExecutor {
    pub fn new(transport: Arc<dyn HttpTransport>, base_url: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
            skip_malformed_items: false,
        }
    }

    /// Skip malformed items or rows instead of dropping the whole payload.
    pub fn skipping_malformed_items(mut self, skip: bool) -> Self {
        self.skip_malformed_items = skip;
        self
    }

    /// Build the search endpoint URL for a term.
    ///
    /// The term is percent-encoded except for `/`, which the site expects verbatim.
    pub fn search_url(&self, term: &str, options: &SearchOptions) -> String {
        let encoded = urlencoding::encode(&query_term(term, options.verified)).replace("%2F", "/");
        format!("{}/usearch/{}/", self.base_url.trim_end_matches('/'), encoded)
    }

    /// Search one term in every sort order and union the results.
    ///
    /// Failures are logged and contribute nothing; this never errors.
    pub async fn execute(&self, term: &str, options: &SearchOptions) -> HashSet<ResultRecord> {
        let url = self.search_url(term, options);
        let base = base_params(options);
        let mode = options.parse_mode();

        let requests = SortOrder::ALL.iter().map(|&sort| {
            let params = sorted_params(&base, sort);
            let url = url.as_str();
            async move { self.fetch(url, &params, sort, mode).await }
        });

        let mut records = HashSet::new();
        for found in futures::future::join_all(requests).await {
            records.extend(found);
        }

        debug!(term = %term, records = records.len(), "KAT term search complete");
        records
    }

    /// Issue one request and parse its payload.
    async fn fetch(
        &self,
        url: &str,
        params: &[(String, String)],
        sort: SortOrder,
        mode: ParseMode,
    ) -> HashSet<ResultRecord> {
        debug!(url = %url, sort = sort.field(), "Requesting KAT search");

        let response = match self.transport.get(url, params).await {
            Ok(response) => response,
            Err(e) => {
                warn!(sort = sort.field(), error = %e, "KAT search request failed");
                record_outcome(sort, "transport_error");
                return HashSet::new();
            }
        };

        if response.body.is_empty() {
            debug!(sort = sort.field(), "No content returned from KAT search");
            record_outcome(sort, "empty");
            return HashSet::new();
        }

        if response.status != 200 {
            warn!(
                sort = sort.field(),
                status = response.status,
                "KAT search returned unexpected status"
            );
            record_outcome(sort, "bad_status");
            return HashSet::new();
        }

        let parser = mode.parser(self.skip_malformed_items);
        match parse_off_runtime(parser, response.body).await {
            Ok(records) => {
                record_outcome(sort, "ok");
                RECORDS_PARSED
                    .with_label_values(&[mode.as_str()])
                    .inc_by(records.len() as u64);
                records
            }
            Err(e) => {
                warn!(
                    sort = sort.field(),
                    mode = mode.as_str(),
                    error = %e,
                    "Failed to parse KAT search results"
                );
                record_outcome(sort, "parse_error");
                PARSE_FAILURES.with_label_values(&[mode.as_str()]).inc();
                HashSet::new()
            }
        }
    }
}

/// Run a parser on the blocking pool so large pages do not stall the runtime.
pub(crate) async fn parse_off_runtime(
    parser: Box<dyn ResultParser>,
    body: Vec<u8>,
) -> Result<HashSet<ResultRecord>, ParseError> {
    tokio::task::spawn_blocking(move || parser.parse(&body))
        .await
        .unwrap_or_else(|e| Err(ParseError::Task(e.to_string())))
}

fn record_outcome(sort: SortOrder, outcome: &str) {
    KAT_REQUESTS
        .with_label_values(&[sort.field(), outcome])
        .inc();
}
