//! Offline mirror export
//!
//! This module handles:
//! - Converting crawled URLs into path-correct relative references
//! - Turning those references into safe file names
//! - Writing the crawled bodies to disk with rewritten links

mod exporter;
mod relativize;
mod sanitize;

pub use exporter::{ExportSummary, OfflineExporter};
pub use relativize::{base_depth, RelativeUrl, Relativizer, SourceAttribute};
pub use sanitize::{query_hash, sanitize_file_path, ExportSettings};
