//! Configuration module for site-mirror
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use site_mirror::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("mirror.toml")).unwrap();
//! println!("Crawling {} with {} workers", config.crawler.url, config.crawler.max_workers);
//! ```

mod parser;
mod pattern;
mod types;
mod user_agent;
mod validation;

// Re-export types
pub use types::{
    AssetKind, Config, CrawlerConfig, DomainsConfig, ExportConfig, ExtraColumn,
    FilenameSanitization, LimitsConfig, ReportConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use pattern::{compile_user_regex, compile_user_regexes, parse_replace_rules, ReplaceRule};
pub use user_agent::{device_user_agent, resolve_user_agent};

impl Config {
    /// Domain allow-lists as a relativization policy
    pub fn domain_policy(&self) -> crate::url::DomainAllowList {
        crate::url::DomainAllowList::new(
            self.domains.allowed_for_crawling.clone(),
            self.domains.allowed_for_static_files.clone(),
        )
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Small valid configuration shared by unit tests
    pub(crate) fn create_test_config() -> Config {
        parse_config(
            r#"
[crawler]
url = "https://example.com/"
max-workers = 2
timeout = 5
"#,
        )
        .unwrap()
    }
}
