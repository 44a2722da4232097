use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - KAT base URL is http(s)
/// - Timeout and concurrency are positive
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    // KAT validation
    let base_url = &config.kat.base_url;
    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        return Err(ConfigError::ValidationError(format!(
            "kat.base_url must start with http:// or https://, got '{}'",
            base_url
        )));
    }

    if config.kat.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "kat.timeout_secs must be greater than 0".to_string(),
        ));
    }

    if config.kat.max_concurrent_queries == 0 {
        return Err(ConfigError::ValidationError(
            "kat.max_concurrent_queries must be greater than 0".to_string(),
        ));
    }

    Ok(())
}
