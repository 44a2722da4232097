use std::sync::Arc;
use kat_search_core::{Config, Searcher};

/// Shared application state
pub struct AppState {
    config: Config,
    searcher: Arc<dyn Searcher>,
}

impl AppState {
    pub fn new(config: Config, searcher: Arc<dyn Searcher>) -> Self {
        Self { config, searcher }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn searcher(&self) -> &dyn Searcher {
        self.searcher.as_ref()
    }
}
