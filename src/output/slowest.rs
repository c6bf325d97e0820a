use crate::state::{ContentType, VisitedRecord};
use std::time::Duration;

/// An entry of the slowest-URLs report
#[derive(Debug, Clone, PartialEq)]
pub struct SlowUrl {
    pub url: String,
    pub status: i32,
    pub elapsed: Duration,
}

/// Returns the `limit` slowest HTML pages taking at least `min_time` seconds
///
/// Results are sorted by request time, slowest first.
pub fn slowest_urls(records: &[VisitedRecord], limit: usize, min_time: f64) -> Vec<SlowUrl> {
    let min_time = Duration::from_secs_f64(min_time.max(0.0));

    let mut slow: Vec<SlowUrl> = records
        .iter()
        .filter_map(|record| {
            let result = record.result()?;
            (result.content_type == ContentType::Html && result.elapsed >= min_time).then(|| {
                SlowUrl {
                    url: record.url.clone(),
                    status: result.status,
                    elapsed: result.elapsed,
                }
            })
        })
        .collect();

    slow.sort_by(|a, b| b.elapsed.cmp(&a.elapsed));
    slow.truncate(limit);
    slow
}

/// Prints the slowest-URLs table
pub fn print_slowest(slow: &[SlowUrl], limit: usize, min_time: f64) {
    println!("=== TOP {} slowest URLs ===", limit);
    if slow.is_empty() {
        println!("No URLs slower than {} second(s) found.", min_time);
    }
    for entry in slow {
        println!(
            "  {:>7.3} s  {:>6}  {}",
            entry.elapsed.as_secs_f64(),
            entry.status,
            entry.url
        );
    }
    println!();
}
