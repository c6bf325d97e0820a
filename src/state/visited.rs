//! Records kept in the visited table

use super::{ContentType, UrlState};
use crate::url::Fingerprint;
use std::time::Duration;
use thiserror::Error;

/// Network-level failure of a fetch, recorded as a negative status code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("connection failed")]
    ConnectionFail,

    #[error("request timed out")]
    Timeout,

    #[error("connection reset by server")]
    ServerReset,

    #[error("failed to send request")]
    SendError,
}

impl FetchError {
    /// Status code stored in the visited record
    pub fn status_code(&self) -> i32 {
        match self {
            Self::ConnectionFail => -1,
            Self::Timeout => -2,
            Self::ServerReset => -3,
            Self::SendError => -4,
        }
    }

    /// Maps a stored status back to the failure, if it is one
    pub fn from_status(status: i32) -> Option<Self> {
        match status {
            -1 => Some(Self::ConnectionFail),
            -2 => Some(Self::Timeout),
            -3 => Some(Self::ServerReset),
            -4 => Some(Self::SendError),
            _ => None,
        }
    }
}

/// Optional page details requested via `extra-columns`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
    pub keywords: Option<String>,
    pub dom_nodes: Option<usize>,
}

impl PageMetadata {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.keywords.is_none()
            && self.dom_nodes.is_none()
    }
}

/// Outcome of one completed fetch
#[derive(Debug, Clone, PartialEq)]
pub struct FetchSummary {
    /// HTTP status, or a negative [`FetchError`] code
    pub status: i32,
    pub elapsed: Duration,
    /// Body size in bytes (`content-length` for HEAD requests)
    pub size: u64,
    pub content_type: ContentType,
    pub metadata: Option<PageMetadata>,
}

impl FetchSummary {
    /// Summary for a request that never produced an HTTP response
    pub fn failed(error: FetchError, elapsed: Duration) -> Self {
        Self {
            status: error.status_code(),
            elapsed,
            size: 0,
            content_type: ContentType::Other,
            metadata: None,
        }
    }

    pub fn error(&self) -> Option<FetchError> {
        FetchError::from_status(self.status)
    }
}

/// Entry of the visited table
///
/// A record is created as an in-flight placeholder when a worker takes the
/// URL and receives its result exactly once.
#[derive(Debug, Clone, PartialEq)]
pub struct VisitedRecord {
    pub fingerprint: Fingerprint,
    pub url: String,
    pub source: Option<Fingerprint>,
    pub is_external: bool,
    pub is_allowed_for_crawling: bool,
    result: Option<FetchSummary>,
}

impl VisitedRecord {
    pub fn placeholder(
        fingerprint: Fingerprint,
        url: String,
        source: Option<Fingerprint>,
        is_external: bool,
        is_allowed_for_crawling: bool,
    ) -> Self {
        Self {
            fingerprint,
            url,
            source,
            is_external,
            is_allowed_for_crawling,
            result: None,
        }
    }

    pub fn result(&self) -> Option<&FetchSummary> {
        self.result.as_ref()
    }

    pub fn state(&self) -> UrlState {
        if self.result.is_some() {
            UrlState::Visited
        } else {
            UrlState::InFlight
        }
    }

    /// Stores the fetch result
    ///
    /// Returns false (and keeps the first result) when a result was
    /// already set.
    pub fn set_result(&mut self, summary: FetchSummary) -> bool {
        if self.result.is_some() {
            return false;
        }
        self.result = Some(summary);
        true
    }

    pub fn status(&self) -> Option<i32> {
        self.result.as_ref().map(|r| r.status)
    }

    pub fn content_type(&self) -> Option<ContentType> {
        self.result.as_ref().map(|r| r.content_type)
    }
}
