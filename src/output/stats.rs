//! Aggregate statistics over visited records
//!
//! Only records with a result take part; in-flight placeholders left by an
//! interrupted crawl are ignored.

use crate::state::VisitedRecord;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// Crawl statistics summary
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrawlStats {
    /// Wall time since the crawl started
    pub execution_time: Duration,

    /// Number of completed URLs
    pub total_urls: usize,

    /// Sum of response sizes in bytes
    pub total_size: u64,

    /// Sum of request times
    pub total_request_time: Duration,
    pub avg_request_time: Duration,
    pub min_request_time: Duration,
    pub max_request_time: Duration,

    /// Count of URLs per status code, ordered by status
    pub count_by_status: BTreeMap<i32, usize>,

    /// True when the crawl was interrupted before the queue drained
    pub partial: bool,
}

impl CrawlStats {
    /// Computes statistics over every completed record
    pub fn from_records(records: &[VisitedRecord], started: Instant, partial: bool) -> Self {
        let mut stats = CrawlStats {
            execution_time: started.elapsed(),
            partial,
            ..Default::default()
        };

        let mut min: Option<Duration> = None;
        let mut max = Duration::ZERO;

        for result in records.iter().filter_map(VisitedRecord::result) {
            stats.total_urls += 1;
            stats.total_size += result.size;
            stats.total_request_time += result.elapsed;
            *stats.count_by_status.entry(result.status).or_insert(0) += 1;
            min = Some(min.map_or(result.elapsed, |m| m.min(result.elapsed)));
            max = max.max(result.elapsed);
        }

        if stats.total_urls > 0 {
            stats.avg_request_time = stats.total_request_time / stats.total_urls as u32;
        }
        stats.min_request_time = min.unwrap_or_default();
        stats.max_request_time = max;

        stats
    }
}

/// Formats a byte count with a binary unit (`1.5 MB`)
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "kB", "MB", "GB", "TB"];

    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", size, UNITS[unit])
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CrawlStats) {
    println!();
    if stats.partial {
        println!("=== Crawl Statistics (PARTIAL: crawl was interrupted) ===");
        println!("Only URLs processed before the stop are included.");
    } else {
        println!("=== Crawl Statistics ===");
    }
    println!();

    println!(
        "Total execution time: {:.3} s",
        stats.execution_time.as_secs_f64()
    );
    println!("Total processed URLs: {}", stats.total_urls);
    println!("Total size: {}", format_size(stats.total_size));
    println!(
        "Request times: total {:.3} s, avg {:.3} s, min {:.3} s, max {:.3} s",
        stats.total_request_time.as_secs_f64(),
        stats.avg_request_time.as_secs_f64(),
        stats.min_request_time.as_secs_f64(),
        stats.max_request_time.as_secs_f64()
    );
    println!();

    if !stats.count_by_status.is_empty() {
        println!("URLs by status:");
        for (status, count) in &stats.count_by_status {
            println!("  {}: {}", status_label(*status), count);
        }
        println!();
    }
}

/// Human label for a status, including the network error codes
pub fn status_label(status: i32) -> String {
    match crate::state::FetchError::from_status(status) {
        Some(error) => format!("{} ({})", status, error),
        None => status.to_string(),
    }
}
