use super::schema::Config;
use crate::standings::FIRST_SEASON;

/// Validate configuration at startup.
/// Returns all validation errors at once (not just the first).
pub fn validate_config(config: &Config) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if config.default_year < FIRST_SEASON {
        errors.push(format!(
            "default_year: {} is before the first season ({})",
            config.default_year, FIRST_SEASON
        ));
    }

    if let Err(e) = config.cache_ttl() {
        errors.push(format!("cache_ttl: {:#}", e));
    }

    if config.concurrency == 0 {
        errors.push("concurrency: must be at least 1".to_string());
    }

    if config.request_timeout_secs == 0 {
        errors.push("request_timeout_secs: must be at least 1".to_string());
    }

    let base = config.api_base_url.trim();
    if !(base.starts_with("http://") || base.starts_with("https://")) {
        errors.push(format!(
            "api_base_url: '{}' must start with http:// or https://",
            config.api_base_url
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
