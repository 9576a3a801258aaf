use crate::config::types::{Config, CrawlerConfig, HttpConfig, OutputConfig};
use crate::crawler::UrlTemplate;
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler, &config.http)?;
    validate_http_config(&config.http)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the sweep range and scheduling knobs
fn validate_crawler_config(config: &CrawlerConfig, http: &HttpConfig) -> Result<(), ConfigError> {
    if config.start_id > config.end_id {
        return Err(ConfigError::Validation(format!(
            "start_id ({}) must not be greater than end_id ({})",
            config.start_id, config.end_id
        )));
    }

    if config.max_concurrent < 1 || config.max_concurrent > http.max_connections {
        return Err(ConfigError::Validation(format!(
            "max_concurrent must be between 1 and max_connections ({}), got {}",
            http.max_connections, config.max_concurrent
        )));
    }

    if config.batch_size < 1 {
        return Err(ConfigError::Validation(
            "batch_size must be >= 1".to_string(),
        ));
    }

    if config.save_every < 1 {
        return Err(ConfigError::Validation(
            "save_every must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates HTTP client configuration
fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if !config.url_template.contains(UrlTemplate::PLACEHOLDER) {
        return Err(ConfigError::InvalidUrl(format!(
            "url_template must contain '{}', got '{}'",
            UrlTemplate::PLACEHOLDER,
            config.url_template
        )));
    }

    let sample = UrlTemplate::new(config.url_template.clone()).render(1);
    let url = Url::parse(&sample)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid url_template: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "url_template must use http or https, got '{}'",
            url.scheme()
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.connect_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "connect_timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.timeout_secs < config.connect_timeout_secs {
        return Err(ConfigError::Validation(format!(
            "timeout_secs ({}) must be >= connect_timeout_secs ({})",
            config.timeout_secs, config.connect_timeout_secs
        )));
    }

    if config.max_connections_per_host < 1
        || config.max_connections_per_host > config.max_connections
    {
        return Err(ConfigError::Validation(format!(
            "max_connections_per_host must be between 1 and max_connections ({}), got {}",
            config.max_connections, config.max_connections_per_host
        )));
    }

    if config.max_idle_per_host < 1 || config.max_idle_per_host > config.max_connections {
        return Err(ConfigError::Validation(format!(
            "max_idle_per_host must be between 1 and max_connections ({}), got {}",
            config.max_connections, config.max_idle_per_host
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.checkpoint_path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "checkpoint_path cannot be empty".to_string(),
        ));
    }

    if config.export_base.trim().is_empty() {
        return Err(ConfigError::Validation(
            "export_base cannot be empty".to_string(),
        ));
    }

    Ok(())
}
