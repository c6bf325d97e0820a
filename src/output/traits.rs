//! Output observer trait and row type
//!
//! The crawl engine emits one [`CrawlRow`] per completed fetch to every
//! registered [`CrawlObserver`], in completion order.

use crate::output::CrawlStats;
use crate::state::{ContentType, PageMetadata};
use std::time::Duration;

/// One completed fetch, as reported to observers
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlRow {
    pub url: String,
    /// HTTP status, or a negative network error code
    pub status: i32,
    pub elapsed: Duration,
    pub size: u64,
    pub content_type: ContentType,
    /// Requested extra columns, if any
    pub extras: Option<PageMetadata>,
    /// `(done, total)` URLs known to the frontier when the row was emitted
    pub progress: (usize, usize),
}

/// Receives crawl progress
///
/// Observers run on the engine's driver loop; they should not block.
pub trait CrawlObserver: Send {
    /// Called once for every completed fetch
    fn on_row(&mut self, row: &CrawlRow);

    /// Called once when the crawl ends, including interrupted crawls
    fn on_finish(&mut self, _stats: &CrawlStats) {}
}
