//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - The frontier with its queue and visited tables
//! - HTTP fetching behind the `Fetcher` trait
//! - Link extraction and page metadata
//! - The worker pool driver

mod engine;
mod fetcher;
mod frontier;
mod parser;

pub use engine::{CrawlEngine, CrawlReport};
pub use fetcher::{
    add_random_query_param, build_http_client, FetchMethod, FetchRequest, FetchResponse, Fetcher,
    HttpFetcher,
};
pub use frontier::{Admission, Frontier, FrontierSettings, QueueEntry, UrlFilters};
pub use parser::{extract_metadata, resolve_link, LinkExtractor};

use crate::config::Config;
use crate::MirrorError;
use std::future::Future;

/// Runs a complete crawl over HTTP
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Build the HTTP client from the crawler configuration
/// 2. Seed the frontier with the configured URL
/// 3. Fetch pages with up to `max-workers` concurrent requests
/// 4. Extract and follow links
/// 5. Report one row per URL to the observers
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `observers` - Receivers of per-URL rows and the final statistics
/// * `shutdown` - Resolves when the crawl should stop early
///
/// # Returns
///
/// * `Ok(CrawlReport)` - Crawl completed or was interrupted
/// * `Err(MirrorError)` - Crawl failed
pub async fn crawl(
    config: &Config,
    observers: Vec<Box<dyn crate::output::CrawlObserver>>,
    shutdown: impl Future<Output = ()>,
) -> Result<CrawlReport, MirrorError> {
    let fetcher = HttpFetcher::new(&config.crawler)?;
    let mut engine = CrawlEngine::new(config, fetcher)?;
    for observer in observers {
        engine.add_observer(observer);
    }
    engine.run(shutdown).await
}
