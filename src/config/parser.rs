use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigResult;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads, overrides and validates a configuration file
///
/// `EMAIL_TO` and `EMAIL_FROM` from the process environment take precedence
/// over the `[delivery]` addresses in the file.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use feed_digest::config::load_config;
///
/// let config = load_config(Path::new("digest.toml")).unwrap();
/// println!("Feeds: {}", config.feeds.len());
/// ```
pub fn load_config(path: &Path) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path)?;
    let mut config = parse_config(&content)?;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate(&config)?;
    Ok(config)
}

/// Parses TOML text into a configuration without validating it
pub fn parse_config(content: &str) -> ConfigResult<Config> {
    Ok(toml::from_str(content)?)
}

/// Applies environment overrides to the delivery addresses
///
/// `lookup` resolves a variable name to its value; the loader passes the
/// process environment.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(to) = lookup("EMAIL_TO").filter(|v| !v.trim().is_empty()) {
        config.delivery.to = to
            .split(',')
            .map(|addr| addr.trim().to_string())
            .filter(|addr| !addr.is_empty())
            .collect();
    }

    if let Some(from) = lookup("EMAIL_FROM").filter(|v| !v.trim().is_empty()) {
        config.delivery.from = Some(from.trim().to_string());
    }
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Each run records this hash so archived runs can be tied back to the
/// configuration that produced them.
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> ConfigResult<String> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> ConfigResult<(Config, String)> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ConfigError;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    const VALID_CONFIG: &str = r#"
[digest]
title = "Cloud Digest"
max-items = 10

[fetch]
max-concurrent-fetches = 4
timeout-secs = 5

[summarizer]
model = "gpt-4o-mini"
max-retries = 2

[delivery]
from = "digest@example.com"
to = ["team@example.com"]

[[feeds]]
url = "https://aws.amazon.com/blogs/aws/feed/"
name = "AWS News Blog"
category = "Cloud"

[[feeds]]
url = "https://example.com/rss"
name = "Example"
enabled = false
"#;

    #[test]
    fn test_load_valid_config() {
        let file = create_temp_config(VALID_CONFIG);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.digest.title, "Cloud Digest");
        assert_eq!(config.digest.max_items, 10);
        assert!(config.digest.send_empty_digest);
        assert_eq!(config.fetch.max_concurrent_fetches, 4);
        assert_eq!(config.fetch.max_items_per_source, 3);
        assert_eq!(config.summarizer.model, "gpt-4o-mini");
        assert_eq!(config.summarizer.max_retries, 2);
        assert_eq!(config.summarizer.max_summary_words, 150);
        assert_eq!(config.feeds.len(), 2);
        assert_eq!(config.feeds[0].category, "Cloud");
        assert_eq!(config.feeds[1].category, "General");
        assert!(!config.feeds[1].enabled);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.digest.max_items, 15);
        assert_eq!(config.digest.run_deadline_secs, 300);
        assert_eq!(config.fetch.max_concurrent_fetches, 10);
        assert_eq!(config.fetch.timeout_secs, 10);
        assert_eq!(config.summarizer.max_concurrent, 5);
        assert_eq!(config.summarizer.max_input_chars, 8_000);
        assert_eq!(config.delivery.max_retries, 3);
        assert!(config.delivery.to.is_empty());
        assert!(config.archive.path.is_none());
        assert!(config.feeds.is_empty());
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/digest.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let file = create_temp_config("[fetch]\nmax-concurrent-fetches = 0\n");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_env_overrides_replace_addresses() {
        let mut config = parse_config(VALID_CONFIG).unwrap();
        let env: HashMap<&str, &str> = [
            ("EMAIL_TO", "a@example.com, b@example.com"),
            ("EMAIL_FROM", "bot@example.org"),
        ]
        .into_iter()
        .collect();

        apply_env_overrides(&mut config, |key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.delivery.to, vec!["a@example.com", "b@example.com"]);
        assert_eq!(config.delivery.from.as_deref(), Some("bot@example.org"));
    }

    #[test]
    fn test_blank_env_override_is_ignored() {
        let mut config = parse_config(VALID_CONFIG).unwrap();
        apply_env_overrides(&mut config, |key| {
            (key == "EMAIL_TO").then(|| "   ".to_string())
        });
        assert_eq!(config.delivery.to, vec!["team@example.com"]);
    }

    #[test]
    fn test_compute_config_hash() {
        let file = create_temp_config("test content");

        let hash1 = compute_config_hash(file.path()).unwrap();
        let hash2 = compute_config_hash(file.path()).unwrap();

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_different_content_different_hash() {
        let file1 = create_temp_config("content 1");
        let file2 = create_temp_config("content 2");

        let hash1 = compute_config_hash(file1.path()).unwrap();
        let hash2 = compute_config_hash(file2.path()).unwrap();

        assert_ne!(hash1, hash2);
    }
}
