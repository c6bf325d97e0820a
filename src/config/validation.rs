use crate::config::pattern::{compile_user_regexes, parse_replace_rules};
use crate::config::types::{Config, CrawlerConfig, DomainsConfig, ExportConfig, LimitsConfig};
use crate::config::user_agent::resolve_user_agent;
use crate::url::normalize_url;
use crate::ConfigError;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_limits(&config.limits)?;
    validate_domains(&config.domains)?;
    if let Some(export) = &config.export {
        validate_export_config(export)?;
    }
    if config.report.slowest_min_time < 0.0 {
        return Err(ConfigError::Validation(format!(
            "slowest-min-time must be >= 0, got {}",
            config.report.slowest_min_time
        )));
    }
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    normalize_url(&config.url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", config.url, e)))?;

    if config.max_workers < 1 {
        return Err(ConfigError::Validation(format!(
            "max-workers must be >= 1, got {}",
            config.max_workers
        )));
    }

    if config.timeout < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout must be >= 1 second, got {}",
            config.timeout
        )));
    }

    compile_user_regexes(&config.include_regex)?;
    compile_user_regexes(&config.ignore_regex)?;

    // Fails with UnsupportedDevice unless an explicit agent is configured
    resolve_user_agent(config)?;

    Ok(())
}

fn validate_limits(limits: &LimitsConfig) -> Result<(), ConfigError> {
    for (key, value) in [
        ("max-queue-length", limits.max_queue_length),
        ("max-visited-urls", limits.max_visited_urls),
        ("max-url-length", limits.max_url_length),
    ] {
        if value < 1 {
            return Err(ConfigError::Validation(format!(
                "{} must be >= 1, got {}",
                key, value
            )));
        }
    }
    Ok(())
}

fn validate_domains(domains: &DomainsConfig) -> Result<(), ConfigError> {
    for pattern in domains
        .allowed_for_crawling
        .iter()
        .chain(domains.allowed_for_static_files.iter())
    {
        validate_domain_pattern(pattern)?;
    }
    Ok(())
}

fn validate_export_config(config: &ExportConfig) -> Result<(), ConfigError> {
    if config.directory.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "export directory cannot be empty".to_string(),
        ));
    }

    if config.file_path_length_limit < 1 {
        return Err(ConfigError::Validation(format!(
            "file-path-length-limit must be >= 1, got {}",
            config.file_path_length_limit
        )));
    }

    compile_user_regexes(&config.store_only_url_regex)?;
    parse_replace_rules(&config.replace_query_string)?;

    Ok(())
}

/// Validates a domain pattern (supports wildcards)
fn validate_domain_pattern(pattern: &str) -> Result<(), ConfigError> {
    if pattern.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain pattern cannot be empty".to_string(),
        ));
    }

    if pattern == "*" {
        return Ok(());
    }

    validate_domain_string(pattern.strip_prefix("*.").unwrap_or(pattern))
}

/// Validates a domain string (without wildcard prefix)
fn validate_domain_string(domain: &str) -> Result<(), ConfigError> {
    if domain.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain cannot be empty".to_string(),
        ));
    }

    if !domain
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' contains invalid characters",
            domain
        )));
    }

    if domain.starts_with('.')
        || domain.ends_with('.')
        || domain.starts_with('-')
        || domain.ends_with('-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot start or end with '.' or '-'",
            domain
        )));
    }

    if domain.contains("..") {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot contain consecutive dots",
            domain
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::create_test_config;
    use crate::config::ExportConfig;

    #[test]
    fn test_validate_domain_pattern() {
        assert!(validate_domain_pattern("example.com").is_ok());
        assert!(validate_domain_pattern("*.example.com").is_ok());
        assert!(validate_domain_pattern("localhost").is_ok());
        assert!(validate_domain_pattern("*").is_ok());

        assert!(validate_domain_pattern("").is_err());
        assert!(validate_domain_pattern("*.").is_err());
        assert!(validate_domain_pattern(".example.com").is_err());
        assert!(validate_domain_pattern("example.com.").is_err());
        assert!(validate_domain_pattern("exa mple.com").is_err());
    }

    #[test]
    fn test_valid_test_config() {
        assert!(validate(&create_test_config()).is_ok());
    }

    #[test]
    fn test_seed_must_be_http() {
        let mut config = create_test_config();
        config.crawler.url = "ftp://example.com/".to_string();
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn test_zero_limits_rejected() {
        let mut config = create_test_config();
        config.limits.max_visited_urls = 0;
        assert!(matches!(validate(&config), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_invalid_filter_regex_rejected() {
        let mut config = create_test_config();
        config.crawler.ignore_regex = vec!["/([a-z/".to_string()];
        assert!(matches!(
            validate(&config),
            Err(ConfigError::InvalidRegex { .. })
        ));
    }

    #[test]
    fn test_export_path_limit_rejected() {
        let mut config = create_test_config();
        config.export = Some(ExportConfig {
            directory: "./mirror".into(),
            file_path_length_limit: 0,
            filename_sanitization: Default::default(),
            replace_query_string: Vec::new(),
            store_only_url_regex: Vec::new(),
            ignore_store_file_error: false,
        });
        assert!(matches!(validate(&config), Err(ConfigError::Validation(_))));
    }
}
