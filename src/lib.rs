//! site-mirror: a bounded website crawler with offline mirror export
//!
//! This crate crawls a website from one seed URL with a fixed-size pool of
//! async workers, records every visited URL under hard capacity limits, and
//! can re-materialize the crawled content as a browsable offline copy with
//! every URL rewritten to a path-correct relative reference.

pub mod config;
pub mod crawler;
pub mod export;
pub mod output;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for site-mirror operations
#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Admission error: {0}")]
    Admission(#[from] AdmissionError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Pattern error: {0}")]
    Regex(#[from] regex::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid domain pattern: {0}")]
    InvalidPattern(String),

    #[error("Invalid regular expression '{pattern}': {message}")]
    InvalidRegex { pattern: String, message: String },

    #[error("Unsupported device '{0}' (expected desktop, mobile or tablet)")]
    UnsupportedDevice(String),
}

/// Table or limit that refused a new entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityResource {
    Queue,
    Visited,
    UrlLength,
}

impl CapacityResource {
    /// Name of the configuration key that has to be raised
    pub fn config_key(&self) -> &'static str {
        match self {
            Self::Queue => "max-queue-length",
            Self::Visited => "max-visited-urls",
            Self::UrlLength => "max-url-length",
        }
    }
}

/// Fatal frontier admission errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AdmissionError {
    #[error("Unable to store URL '{url}': {resource:?} limit of {limit} reached. Set higher [limits] {}.", .resource.config_key())]
    CapacityExceeded {
        resource: CapacityResource,
        limit: usize,
        url: String,
    },
}

/// Offline export errors
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Cannot create directory '{path}': {source}")]
    CreateDirectory {
        path: String,
        source: std::io::Error,
    },

    #[error("Cannot store file '{path}': {source}")]
    WriteFile {
        path: String,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// URL-specific errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Result type alias for site-mirror operations
pub type Result<T> = std::result::Result<T, MirrorError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use state::{ContentType, UrlState, VisitedRecord};
pub use url::{DomainPolicy, Fingerprint, ParsedUrl, TargetDomainRelation};
