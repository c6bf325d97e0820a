//! Output module for crawl progress and reports
//!
//! This module handles:
//! - Per-URL progress rows through the `CrawlObserver` trait
//! - Aggregate crawl statistics
//! - The slowest URLs report

mod console;
mod slowest;
pub mod stats;
mod traits;

pub use console::ConsoleOutput;
pub use slowest::{print_slowest, slowest_urls, SlowUrl};
pub use stats::{format_size, print_statistics, CrawlStats};
pub use traits::{CrawlObserver, CrawlRow};
