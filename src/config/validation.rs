use crate::config::types::{
    Config, DeliveryConfig, DigestConfig, FeedEntry, FetchConfig, SummarizerConfig,
};
use crate::{ConfigError, ConfigResult};
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
///
/// Only checks what a run needs to proceed safely. A missing recipient is not
/// a configuration error; the run itself fails with a specific cause.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_digest_config(&config.digest)?;
    validate_fetch_config(&config.fetch)?;
    validate_summarizer_config(&config.summarizer)?;
    validate_delivery_config(&config.delivery)?;
    validate_feeds(&config.feeds)?;
    Ok(())
}

fn validate_digest_config(config: &DigestConfig) -> ConfigResult<()> {
    if config.max_items < 1 {
        return Err(ConfigError::Validation(
            "max-items must be >= 1".to_string(),
        ));
    }

    if config.run_deadline_secs < 1 {
        return Err(ConfigError::Validation(
            "run-deadline-secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_fetch_config(config: &FetchConfig) -> ConfigResult<()> {
    validate_concurrency("max-concurrent-fetches", config.max_concurrent_fetches)?;

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "fetch timeout-secs must be >= 1, got {}",
            config.timeout_secs
        )));
    }

    if config.max_items_per_source < 1 {
        return Err(ConfigError::Validation(
            "max-items-per-source must be >= 1".to_string(),
        ));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if config.base_delay_ms > config.max_delay_ms {
        return Err(ConfigError::Validation(format!(
            "fetch base-delay-ms ({}) exceeds max-delay-ms ({})",
            config.base_delay_ms, config.max_delay_ms
        )));
    }

    Ok(())
}

fn validate_summarizer_config(config: &SummarizerConfig) -> ConfigResult<()> {
    validate_endpoint("summarizer endpoint", &config.endpoint)?;
    validate_concurrency("summarizer max-concurrent", config.max_concurrent)?;

    if config.model.trim().is_empty() {
        return Err(ConfigError::Validation("model cannot be empty".to_string()));
    }

    if !(0.0..=2.0).contains(&config.temperature) {
        return Err(ConfigError::Validation(format!(
            "temperature must be between 0.0 and 2.0, got {}",
            config.temperature
        )));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "summarizer timeout-secs must be >= 1, got {}",
            config.timeout_secs
        )));
    }

    if config.max_summary_words < 1 || config.fallback_chars < 1 || config.max_input_chars < 1 {
        return Err(ConfigError::Validation(
            "max-summary-words, fallback-chars and max-input-chars must be >= 1".to_string(),
        ));
    }

    if config.base_delay_ms > config.max_delay_ms {
        return Err(ConfigError::Validation(format!(
            "summarizer base-delay-ms ({}) exceeds max-delay-ms ({})",
            config.base_delay_ms, config.max_delay_ms
        )));
    }

    Ok(())
}

fn validate_delivery_config(config: &DeliveryConfig) -> ConfigResult<()> {
    validate_endpoint("delivery endpoint", &config.endpoint)?;

    if let Some(from) = &config.from {
        validate_email(from)?;
    }

    for to in &config.to {
        validate_email(to)?;
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "delivery timeout-secs must be >= 1, got {}",
            config.timeout_secs
        )));
    }

    if config.base_delay_ms > config.max_delay_ms {
        return Err(ConfigError::Validation(format!(
            "delivery base-delay-ms ({}) exceeds max-delay-ms ({})",
            config.base_delay_ms, config.max_delay_ms
        )));
    }

    Ok(())
}

/// Validates feed entries: names, http(s) URLs and no duplicate URLs
fn validate_feeds(feeds: &[FeedEntry]) -> ConfigResult<()> {
    let mut seen = HashSet::new();

    for feed in feeds {
        if feed.name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "Feed '{}' must have a name",
                feed.url
            )));
        }

        let url = Url::parse(&feed.url).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid feed URL '{}': {}", feed.url, e))
        })?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::InvalidUrl(format!(
                "Feed URL '{}' must use http or https",
                feed.url
            )));
        }

        if !seen.insert(url.as_str().to_string()) {
            return Err(ConfigError::Validation(format!(
                "Feed URL '{}' is listed more than once",
                feed.url
            )));
        }

        if feed.keywords.iter().any(|k| k.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "Feed '{}' has an empty keyword",
                feed.name
            )));
        }
    }

    Ok(())
}

fn validate_concurrency(name: &str, value: usize) -> ConfigResult<()> {
    if !(1..=100).contains(&value) {
        return Err(ConfigError::Validation(format!(
            "{} must be between 1 and 100, got {}",
            name, value
        )));
    }
    Ok(())
}

fn validate_endpoint(name: &str, endpoint: &str) -> ConfigResult<()> {
    let url = Url::parse(endpoint)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {}: {}", name, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} must use http or https, got '{}'",
            name, endpoint
        )));
    }
    Ok(())
}

/// Basic email validation
///
/// Requires exactly one `@` with text on both sides and a dot in the domain.
pub fn validate_email(email: &str) -> ConfigResult<()> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "Email address cannot be empty".to_string(),
        ));
    }

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    let local = parts[0];
    let domain = parts[1];

    if local.is_empty() || domain.is_empty() || email.chars().any(char::is_whitespace) {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
