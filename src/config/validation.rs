use crate::config::types::{Config, FinderConfig, HttpConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_finder_config(&config.finder)?;
    validate_http_config(&config.http)?;
    Ok(())
}

/// Validates the finder configuration
///
/// The registry-specific settings only matter when the registry is used, so a
/// JSON-backed country may leave them at their defaults.
fn validate_finder_config(config: &FinderConfig) -> Result<(), ConfigError> {
    if config.country.trim().is_empty() {
        return Err(ConfigError::Validation(
            "country cannot be empty".to_string(),
        ));
    }

    if !config.uses_registry() {
        return Ok(());
    }

    let registry_url = config.registry_url.as_deref().ok_or_else(|| {
        ConfigError::Validation(format!(
            "country '{}' must have a registry-url",
            config.country
        ))
    })?;
    validate_registry_url(registry_url)?;

    if config.program_filter.trim().is_empty() {
        return Err(ConfigError::Validation(
            "program-filter cannot be empty".to_string(),
        ));
    }

    validate_regions(&config.regions)?;

    Ok(())
}

/// Validates the registry base URL
fn validate_registry_url(registry_url: &str) -> Result<(), ConfigError> {
    let url = Url::parse(registry_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid registry-url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "registry-url '{}' must use HTTP or HTTPS",
            registry_url
        )));
    }

    Ok(())
}

/// Validates the region list
fn validate_regions(regions: &[String]) -> Result<(), ConfigError> {
    if regions.is_empty() {
        return Err(ConfigError::Validation(
            "regions must contain at least one region code".to_string(),
        ));
    }

    if let Some(blank) = regions.iter().position(|r| r.trim().is_empty()) {
        return Err(ConfigError::Validation(format!(
            "region code at index {} cannot be blank",
            blank
        )));
    }

    Ok(())
}

/// Validates HTTP client configuration
fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if config.connect_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "connect-timeout-secs must be >= 1".to_string(),
        ));
    }

    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeout-secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}
