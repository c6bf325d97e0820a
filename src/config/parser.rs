use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
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
/// use site_mirror::config::load_config;
///
/// let config = load_config(Path::new("mirror.toml")).unwrap();
/// println!("Workers: {}", config.crawler.max_workers);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration from a TOML string
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so runs can be matched to the configuration they used.
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AssetKind, ExtraColumn, FilenameSanitization};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_minimal_config_uses_defaults() {
        let file = create_temp_config(
            r#"
[crawler]
url = "https://example.com/"
"#,
        );
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.crawler.url, "https://example.com/");
        assert_eq!(config.crawler.max_workers, 3);
        assert_eq!(config.crawler.timeout, 10);
        assert_eq!(config.crawler.device, "desktop");
        assert!(!config.crawler.remove_query_params);
        assert_eq!(config.limits.max_queue_length, 9000);
        assert_eq!(config.limits.max_visited_urls, 10000);
        assert_eq!(config.limits.max_url_length, 2083);
        assert!(config.export.is_none());
        assert_eq!(config.report.slowest_top_limit, 10);
    }

    #[test]
    fn test_load_full_config() {
        let file = create_temp_config(
            r#"
[crawler]
url = "https://example.com/"
max-workers = 8
timeout = 5
crawl-assets = ["images", "styles"]
include-regex = ["/docs/"]
remove-query-params = true
extra-columns = ["Title", "DOM"]

[limits]
max-queue-length = 100
max-visited-urls = 200
max-url-length = 500

[domains]
allowed-for-crawling = ["docs.example.org"]
allowed-for-static-files = ["*.cdn.example.net"]

[export]
directory = "./mirror"
filename-sanitization = "md5"
replace-query-string = ["page= -> p"]

[report]
slowest-top-limit = 5
slowest-min-time = 0.5
"#,
        );
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.crawler.max_workers, 8);
        assert!(config.crawler.crawls(AssetKind::Images));
        assert!(!config.crawler.crawls(AssetKind::Fonts));
        assert!(config.crawler.wants(ExtraColumn::Dom));
        assert_eq!(config.limits.max_queue_length, 100);
        assert_eq!(config.domains.allowed_for_static_files.len(), 1);

        let export = config.export.unwrap();
        assert_eq!(export.file_path_length_limit, 200);
        assert_eq!(export.filename_sanitization, FilenameSanitization::Md5);
        assert!(!export.ignore_store_file_error);
        assert_eq!(config.report.slowest_min_time, 0.5);
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_unknown_asset_kind_is_parse_error() {
        let result = parse_config(
            r#"
[crawler]
url = "https://example.com/"
crawl-assets = ["videos"]
"#,
        );
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let result = parse_config(
            r#"
[crawler]
url = "https://example.com/"
max-workers = 0
"#,
        );
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_unsupported_device_rejected_at_load() {
        let result = parse_config(
            r#"
[crawler]
url = "https://example.com/"
device = "fridge"
"#,
        );
        assert!(matches!(result, Err(ConfigError::UnsupportedDevice(_))));
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

        assert_ne!(
            compute_config_hash(file1.path()).unwrap(),
            compute_config_hash(file2.path()).unwrap()
        );
    }
}
