use crate::output::stats::{format_size, print_statistics, status_label};
use crate::output::{CrawlObserver, CrawlRow, CrawlStats};
use crate::state::PageMetadata;

/// Prints one line per completed fetch and the final statistics block
#[derive(Debug, Default)]
pub struct ConsoleOutput {
    header_printed: bool,
    quiet: bool,
}

impl ConsoleOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only the final statistics are printed
    pub fn quiet() -> Self {
        Self {
            header_printed: false,
            quiet: true,
        }
    }

    pub fn format_row(row: &CrawlRow) -> String {
        let mut line = format!(
            "{:>11} | {:<60} | {:>14} | {:>7.3} s | {:>9} | {:<8}",
            format!("{}/{}", row.progress.0, row.progress.1),
            row.url,
            status_label(row.status),
            row.elapsed.as_secs_f64(),
            format_size(row.size),
            row.content_type.label(),
        );
        if let Some(extras) = &row.extras {
            line.push_str(&format_extras(extras));
        }
        line
    }
}

fn format_extras(extras: &PageMetadata) -> String {
    let mut out = String::new();
    if let Some(title) = &extras.title {
        out.push_str(&format!(" | {}", title));
    }
    if let Some(description) = &extras.description {
        out.push_str(&format!(" | {}", description));
    }
    if let Some(keywords) = &extras.keywords {
        out.push_str(&format!(" | {}", keywords));
    }
    if let Some(dom) = extras.dom_nodes {
        out.push_str(&format!(" | {}", dom));
    }
    out
}

impl CrawlObserver for ConsoleOutput {
    fn on_row(&mut self, row: &CrawlRow) {
        if self.quiet {
            return;
        }
        if !self.header_printed {
            println!(
                "{:>11} | {:<60} | {:>14} | {:>9} | {:>9} | {:<8}",
                "Progress", "URL", "Status", "Time", "Size", "Type"
            );
            self.header_printed = true;
        }
        println!("{}", Self::format_row(row));
    }

    fn on_finish(&mut self, stats: &CrawlStats) {
        print_statistics(stats);
    }
}
