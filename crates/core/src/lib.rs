pub mod config;
pub mod metrics;
pub mod searcher;
pub mod testing;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, KatConfig,
    ServerConfig,
};
pub use searcher::{
    KatSearcher, ParseError, ResultRecord, SearchCategory, SearchOptions, SearchRequest,
    Searcher, TransportError,
};
