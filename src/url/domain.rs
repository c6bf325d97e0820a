use super::{matches_wildcard, ParsedUrl};
use std::fmt;
use url::Url;

/// Extracts the lowercase host from an absolute URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use site_mirror::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.com:8080/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// How a link target relates to the seed domain and to the page linking it
///
/// The relation decides how the relativization engine climbs back to the
/// mirror root and whether the target lives in a `_host/` subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetDomainRelation {
    /// Target on the seed host, linked from a seed-host page
    InitialSameBaseSame,
    /// Backlink to the seed host from a foreign page
    InitialSameBaseDifferent,
    /// Foreign target linked from a page on the same foreign host
    InitialDifferentBaseSame,
    /// Foreign target linked from a page on another host
    InitialDifferentBaseDifferent,
}

impl TargetDomainRelation {
    /// Classifies `target` against the seed URL and the linking page
    ///
    /// A target without host (a relative reference) is on the same host as
    /// both.
    pub fn classify(initial: &ParsedUrl, base: &ParsedUrl, target: &ParsedUrl) -> Self {
        let (initial_same, base_same) = match target.host() {
            None => (true, true),
            Some(host) => (Some(host) == initial.host(), Some(host) == base.host()),
        };

        match (initial_same, base_same) {
            (true, true) => Self::InitialSameBaseSame,
            (true, false) => Self::InitialSameBaseDifferent,
            (false, true) => Self::InitialDifferentBaseSame,
            (false, false) => Self::InitialDifferentBaseDifferent,
        }
    }

    /// Returns true if the target is not on the seed host
    pub fn is_external(&self) -> bool {
        matches!(
            self,
            Self::InitialDifferentBaseSame | Self::InitialDifferentBaseDifferent
        )
    }
}

impl fmt::Display for TargetDomainRelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::InitialSameBaseSame => "initial-same/base-same",
            Self::InitialSameBaseDifferent => "initial-same/base-different",
            Self::InitialDifferentBaseSame => "initial-different/base-same",
            Self::InitialDifferentBaseDifferent => "initial-different/base-different",
        };
        f.write_str(label)
    }
}

/// Answers which foreign hosts may be mirrored
pub trait DomainPolicy {
    /// Static assets (images, scripts, fonts, ...) from this host may be stored
    fn is_domain_allowed_for_static_files(&self, host: &str) -> bool;

    /// Pages from this foreign host may be crawled and stored
    fn is_external_domain_allowed_for_crawling(&self, host: &str) -> bool;
}

/// [`DomainPolicy`] backed by two lists of wildcard domain patterns
#[derive(Debug, Clone, Default)]
pub struct DomainAllowList {
    crawling: Vec<String>,
    static_files: Vec<String>,
}

impl DomainAllowList {
    pub fn new(crawling: Vec<String>, static_files: Vec<String>) -> Self {
        Self {
            crawling,
            static_files,
        }
    }
}

impl DomainPolicy for DomainAllowList {
    fn is_domain_allowed_for_static_files(&self, host: &str) -> bool {
        let host = host.to_lowercase();
        self.static_files
            .iter()
            .chain(self.crawling.iter())
            .any(|pattern| matches_wildcard(pattern, &host))
    }

    fn is_external_domain_allowed_for_crawling(&self, host: &str) -> bool {
        let host = host.to_lowercase();
        self.crawling
            .iter()
            .any(|pattern| matches_wildcard(pattern, &host))
    }
}
