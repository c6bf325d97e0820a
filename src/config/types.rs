use serde::Deserialize;
use std::path::PathBuf;

/// Main configuration structure for site-mirror
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub domains: DomainsConfig,
    /// Offline mirror export, disabled when the section is missing
    #[serde(default)]
    pub export: Option<ExportConfig>,
    #[serde(default)]
    pub report: ReportConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Seed URL the crawl starts from
    pub url: String,

    /// Maximum number of concurrent fetches
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default = "default_accept_encoding")]
    pub accept_encoding: String,

    /// Explicit user agent, overrides `device`
    #[serde(default)]
    pub user_agent: Option<String>,

    #[serde(default = "default_device")]
    pub device: String,

    /// Asset categories whose links are followed besides anchors
    #[serde(default)]
    pub crawl_assets: Vec<AssetKind>,

    #[serde(default)]
    pub include_regex: Vec<String>,

    #[serde(default)]
    pub ignore_regex: Vec<String>,

    #[serde(default)]
    pub remove_query_params: bool,

    #[serde(default)]
    pub add_random_query_params: bool,

    #[serde(default)]
    pub extra_columns: Vec<ExtraColumn>,
}

impl CrawlerConfig {
    pub fn crawls(&self, kind: AssetKind) -> bool {
        self.crawl_assets.contains(&kind)
    }

    pub fn wants(&self, column: ExtraColumn) -> bool {
        self.extra_columns.contains(&column)
    }
}

/// Asset categories that can be crawled in addition to pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Fonts,
    Images,
    Styles,
    Scripts,
}

/// Optional per-page columns extracted from HTML
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum ExtraColumn {
    #[serde(alias = "title")]
    Title,
    #[serde(alias = "description")]
    Description,
    #[serde(alias = "keywords")]
    Keywords,
    #[serde(rename = "DOM", alias = "dom")]
    Dom,
}

/// Hard capacity limits of the frontier tables
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LimitsConfig {
    #[serde(default = "default_max_queue_length")]
    pub max_queue_length: usize,

    #[serde(default = "default_max_visited_urls")]
    pub max_visited_urls: usize,

    #[serde(default = "default_max_url_length")]
    pub max_url_length: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_queue_length: default_max_queue_length(),
            max_visited_urls: default_max_visited_urls(),
            max_url_length: default_max_url_length(),
        }
    }
}

/// Foreign domains that may be crawled or mirrored
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DomainsConfig {
    /// Domain patterns (e.g. "docs.example.org" or "*.example.org")
    #[serde(default)]
    pub allowed_for_crawling: Vec<String>,

    #[serde(default)]
    pub allowed_for_static_files: Vec<String>,
}

/// Offline export configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ExportConfig {
    /// Target directory of the mirror
    pub directory: PathBuf,

    #[serde(default = "default_file_path_length_limit")]
    pub file_path_length_limit: usize,

    #[serde(default)]
    pub filename_sanitization: FilenameSanitization,

    /// Rules (`from -> to`) replacing the query-string hash in file names
    #[serde(default)]
    pub replace_query_string: Vec<String>,

    /// Only URLs matching one of these patterns are stored
    #[serde(default)]
    pub store_only_url_regex: Vec<String>,

    #[serde(default)]
    pub ignore_store_file_error: bool,
}

/// How special characters in mirror file names are handled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilenameSanitization {
    #[default]
    SpecialCharsToUnderscore,
    SpecialCharsToDash,
    SpecialCharsToEmpty,
    Urlencode,
    Rawurlencode,
    Md5,
}

/// Final report configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ReportConfig {
    #[serde(default = "default_slowest_top_limit")]
    pub slowest_top_limit: usize,

    /// Minimum request time in seconds to appear among the slowest URLs
    #[serde(default = "default_slowest_min_time")]
    pub slowest_min_time: f64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            slowest_top_limit: default_slowest_top_limit(),
            slowest_min_time: default_slowest_min_time(),
        }
    }
}

fn default_max_workers() -> usize {
    3
}

fn default_timeout() -> u64 {
    10
}

fn default_accept_encoding() -> String {
    "gzip, deflate, br".to_string()
}

fn default_device() -> String {
    "desktop".to_string()
}

fn default_max_queue_length() -> usize {
    9000
}

fn default_max_visited_urls() -> usize {
    10000
}

fn default_max_url_length() -> usize {
    2083
}

fn default_file_path_length_limit() -> usize {
    200
}

fn default_slowest_top_limit() -> usize {
    10
}

fn default_slowest_min_time() -> f64 {
    0.01
}
