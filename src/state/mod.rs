//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `UrlState`: lifecycle of a single URL (discovered, queued, in flight, visited)
//! - `ContentType`: response classification by `Content-Type` header
//! - `VisitedRecord`: entry of the visited table with its `FetchSummary`

mod content_type;
mod url_state;
mod visited;

// Re-export main types
pub use content_type::ContentType;
pub use url_state::UrlState;
pub use visited::{FetchError, FetchSummary, PageMetadata, VisitedRecord};
