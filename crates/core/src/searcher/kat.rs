//! KAT search backend implementation.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, info_span, Instrument};

use crate::config::KatConfig;
use crate::metrics::{SEARCH_DURATION, SEARCH_RESULTS};

use super::query::QueryExecutor;
use super::transport::{HttpTransport, ReqwestTransport, TransportError};
use super::util::normalize_search_term;
use super::{ResultRecord, SearchOptions, SearchRequest, Searcher};

/// KAT search backend.
///
/// Runs every search term of a request through a [`QueryExecutor`] and
/// unions the results. Terms run concurrently, bounded by
/// `max_concurrent_queries`.
pub struct KatSearcher {
    executor: QueryExecutor,
    max_concurrent_queries: usize,
}

impl KatSearcher {
    /// Create a searcher on top of the given transport.
    pub fn new(transport: Arc<dyn HttpTransport>, config: &KatConfig) -> Self {
        let executor = QueryExecutor::new(transport, config.base_url.clone())
            .skipping_malformed_items(config.skip_malformed_items);

        Self {
            executor,
            max_concurrent_queries: config.max_concurrent_queries.max(1),
        }
    }

    /// Create a searcher with a reqwest transport built from the config.
    pub fn from_config(config: &KatConfig) -> Result<Self, TransportError> {
        let transport = ReqwestTransport::new(
            Duration::from_secs(config.timeout_secs as u64),
            config.user_agent.as_deref(),
        )?;
        Ok(Self::new(Arc::new(transport), config))
    }

    /// Normalized terms for a request, without duplicates, in request order.
    pub fn normalized_terms(request: &SearchRequest) -> Vec<String> {
        let mut seen = HashSet::new();
        request
            .terms()
            .into_iter()
            .map(normalize_search_term)
            .filter(|term| seen.insert(term.clone()))
            .collect()
    }
}

#[async_trait]
impl Searcher for KatSearcher {
    fn name(&self) -> &str {
        "kat"
    }

    async fn search(
        &self,
        request: &SearchRequest,
        options: &SearchOptions,
    ) -> HashSet<ResultRecord> {
        let terms = Self::normalized_terms(request);
        let span = info_span!("kat_search", title = %request.title, terms = terms.len());

        async move {
            let start = Instant::now();
            debug!(terms = ?terms, options = ?options, "Starting KAT search");

            let per_term: Vec<HashSet<ResultRecord>> = stream::iter(terms.clone())
                .map(|term| async move { self.executor.execute(&term, options).await })
                .buffer_unordered(self.max_concurrent_queries)
                .collect()
                .await;

            let mut results = HashSet::new();
            for found in per_term {
                results.extend(found);
            }

            let elapsed = start.elapsed();
            SEARCH_DURATION.observe(elapsed.as_secs_f64());
            SEARCH_RESULTS.observe(results.len() as f64);

            info!(
                results = results.len(),
                duration_ms = elapsed.as_millis() as u64,
                "KAT search complete"
            );
            results
        }
        .instrument(span)
        .await
    }
}
