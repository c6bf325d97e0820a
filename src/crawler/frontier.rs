//! Crawl frontier: queue table, visited table and admission policy
//!
//! The frontier is owned by the crawl engine's driver loop and is only
//! mutated between `.await` points, so no locking is involved. Both tables
//! are keyed by [`Fingerprint`]; a fingerprint is never present in both at
//! the same time.

use crate::config::{compile_user_regexes, Config};
use crate::state::{FetchSummary, UrlState, VisitedRecord};
use crate::url::{normalize_url, DomainAllowList, DomainPolicy, Fingerprint, ParsedUrl};
use crate::{AdmissionError, CapacityResource, ConfigError};
use regex::Regex;
use std::collections::{HashMap, HashSet, VecDeque};

/// Result of offering a URL to the frontier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// URL was added to the queue
    Queued,
    /// URL is already queued or visited
    Duplicate,
    /// Rejected by the include/ignore filters
    Filtered,
    /// Not an absolute http(s) URL
    Unparsable,
    /// Looks like a static file while asset crawling is off
    NotCrawlable,
}

/// A URL waiting in the queue table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    pub fingerprint: Fingerprint,
    pub url: String,
    /// Page the URL was discovered on (`None` for the seed)
    pub source: Option<Fingerprint>,
}

/// Include/ignore URL filters
///
/// An empty include list allows everything; any ignore match rejects.
#[derive(Debug, Clone, Default)]
pub struct UrlFilters {
    include: Vec<Regex>,
    ignore: Vec<Regex>,
}

impl UrlFilters {
    pub fn new(include: Vec<Regex>, ignore: Vec<Regex>) -> Self {
        Self { include, ignore }
    }

    pub fn from_patterns(include: &[String], ignore: &[String]) -> Result<Self, ConfigError> {
        Ok(Self::new(
            compile_user_regexes(include)?,
            compile_user_regexes(ignore)?,
        ))
    }

    pub fn allows(&self, url: &str) -> bool {
        let included = self.include.is_empty() || self.include.iter().any(|re| re.is_match(url));
        included && !self.ignore.iter().any(|re| re.is_match(url))
    }
}

/// Capacity limits and admission switches
#[derive(Debug, Clone)]
pub struct FrontierSettings {
    pub max_queue_length: usize,
    pub max_visited_urls: usize,
    pub max_url_length: usize,
    pub remove_query_params: bool,
    /// Static-looking URLs are admitted only when some asset category is crawled
    pub crawl_assets: bool,
}

impl FrontierSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_queue_length: config.limits.max_queue_length,
            max_visited_urls: config.limits.max_visited_urls,
            max_url_length: config.limits.max_url_length,
            remove_query_params: config.crawler.remove_query_params,
            crawl_assets: !config.crawler.crawl_assets.is_empty(),
        }
    }
}

pub struct Frontier {
    initial: ParsedUrl,
    settings: FrontierSettings,
    filters: UrlFilters,
    policy: DomainAllowList,
    queue: VecDeque<QueueEntry>,
    queued: HashSet<Fingerprint>,
    visited: Vec<VisitedRecord>,
    visited_index: HashMap<Fingerprint, usize>,
    active_workers: usize,
    done_urls: usize,
}

impl Frontier {
    pub fn new(
        initial_url: &str,
        settings: FrontierSettings,
        filters: UrlFilters,
        policy: DomainAllowList,
    ) -> Self {
        Self {
            initial: ParsedUrl::parse(initial_url),
            settings,
            filters,
            policy,
            queue: VecDeque::new(),
            queued: HashSet::new(),
            visited: Vec::new(),
            visited_index: HashMap::new(),
            active_workers: 0,
            done_urls: 0,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let filters =
            UrlFilters::from_patterns(&config.crawler.include_regex, &config.crawler.ignore_regex)?;
        Ok(Self::new(
            &config.crawler.url,
            FrontierSettings::from_config(config),
            filters,
            config.domain_policy(),
        ))
    }

    pub fn initial_url(&self) -> &ParsedUrl {
        &self.initial
    }

    pub fn fingerprint(&self, url: &str) -> Fingerprint {
        Fingerprint::of(&ParsedUrl::parse(url), !self.settings.remove_query_params)
    }

    /// Offers a discovered URL to the queue
    ///
    /// Checks run in order: filters, dedup, parse, extension policy. Only
    /// the URL length and queue capacity checks are fatal.
    pub fn enqueue(
        &mut self,
        url: &str,
        source: Option<Fingerprint>,
    ) -> Result<Admission, AdmissionError> {
        if !self.filters.allows(url) {
            tracing::debug!(url, "Filtered by include/ignore patterns");
            return Ok(Admission::Filtered);
        }

        let fingerprint = self.fingerprint(url);
        if self.contains(&fingerprint) {
            return Ok(Admission::Duplicate);
        }

        if normalize_url(url).is_err() {
            tracing::debug!(url, "Skipping unparsable URL");
            return Ok(Admission::Unparsable);
        }

        if !self.settings.crawl_assets && !is_html_url(url) {
            tracing::debug!(url, "Skipping static file, asset crawling disabled");
            return Ok(Admission::NotCrawlable);
        }

        self.push(fingerprint, url, source)?;
        Ok(Admission::Queued)
    }

    /// Queues the seed URL, bypassing filters and the extension policy
    pub fn enqueue_seed(&mut self, url: &str) -> Result<Admission, AdmissionError> {
        let fingerprint = self.fingerprint(url);
        if self.contains(&fingerprint) {
            return Ok(Admission::Duplicate);
        }
        self.push(fingerprint, url, None)?;
        Ok(Admission::Queued)
    }

    fn push(
        &mut self,
        fingerprint: Fingerprint,
        url: &str,
        source: Option<Fingerprint>,
    ) -> Result<(), AdmissionError> {
        if url.len() > self.settings.max_url_length {
            return Err(AdmissionError::CapacityExceeded {
                resource: CapacityResource::UrlLength,
                limit: self.settings.max_url_length,
                url: url.to_string(),
            });
        }
        if self.queue.len() >= self.settings.max_queue_length {
            return Err(AdmissionError::CapacityExceeded {
                resource: CapacityResource::Queue,
                limit: self.settings.max_queue_length,
                url: url.to_string(),
            });
        }

        tracing::debug!(url, %fingerprint, "Queued");
        self.queued.insert(fingerprint);
        self.queue.push_back(QueueEntry {
            fingerprint,
            url: url.to_string(),
            source,
        });
        Ok(())
    }

    /// Moves the next queued URL into the visited table as in-flight
    ///
    /// When the visited table is full the entry stays queued and the
    /// capacity error is returned.
    pub fn pop_next(&mut self) -> Result<Option<QueueEntry>, AdmissionError> {
        let Some(front) = self.queue.front() else {
            return Ok(None);
        };

        if self.visited.len() >= self.settings.max_visited_urls {
            return Err(AdmissionError::CapacityExceeded {
                resource: CapacityResource::Visited,
                limit: self.settings.max_visited_urls,
                url: front.url.clone(),
            });
        }

        let Some(entry) = self.queue.pop_front() else {
            return Ok(None);
        };
        self.queued.remove(&entry.fingerprint);

        let host = ParsedUrl::parse(&entry.url).host().map(str::to_string);
        let is_external = host.is_some() && host.as_deref() != self.initial.host();
        let is_allowed_for_crawling = !is_external
            || host
                .as_deref()
                .is_some_and(|h| self.policy.is_external_domain_allowed_for_crawling(h));

        self.visited_index
            .insert(entry.fingerprint, self.visited.len());
        self.visited.push(VisitedRecord::placeholder(
            entry.fingerprint,
            entry.url.clone(),
            entry.source,
            is_external,
            is_allowed_for_crawling,
        ));
        self.active_workers += 1;

        Ok(Some(entry))
    }

    /// Stores the result of a finished fetch
    ///
    /// Returns the completed record, or `None` when the fingerprint is
    /// unknown or already has a result.
    pub fn complete(
        &mut self,
        fingerprint: &Fingerprint,
        summary: FetchSummary,
    ) -> Option<&VisitedRecord> {
        self.release_worker();

        let idx = *self.visited_index.get(fingerprint)?;
        let record = &mut self.visited[idx];
        if !record.set_result(summary) {
            tracing::warn!(url = %record.url, "Ignoring second result for visited URL");
            return None;
        }
        self.done_urls += 1;
        Some(&self.visited[idx])
    }

    /// Frees a worker slot whose fetch never reported back
    pub fn release_worker(&mut self) {
        self.active_workers = self.active_workers.saturating_sub(1);
    }

    pub fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.queued.contains(fingerprint) || self.visited_index.contains_key(fingerprint)
    }

    pub fn state_of(&self, fingerprint: &Fingerprint) -> Option<UrlState> {
        if self.queued.contains(fingerprint) {
            return Some(UrlState::Queued);
        }
        self.record(fingerprint).map(VisitedRecord::state)
    }

    pub fn record(&self, fingerprint: &Fingerprint) -> Option<&VisitedRecord> {
        self.visited_index
            .get(fingerprint)
            .map(|&idx| &self.visited[idx])
    }

    /// Visited records in the order their fetches started
    pub fn records(&self) -> &[VisitedRecord] {
        &self.visited
    }

    pub fn into_records(self) -> Vec<VisitedRecord> {
        self.visited
    }

    /// URLs taken by a worker that never completed
    pub fn in_flight(&self) -> impl Iterator<Item = &VisitedRecord> {
        self.visited.iter().filter(|r| r.result().is_none())
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn visited_len(&self) -> usize {
        self.visited.len()
    }

    pub fn active_workers(&self) -> usize {
        self.active_workers
    }

    pub fn done_urls(&self) -> usize {
        self.done_urls
    }

    /// Every URL known to the frontier, done or not
    pub fn total_urls(&self) -> usize {
        self.queue.len() + self.visited.len()
    }

    pub fn is_finished(&self) -> bool {
        self.queue.is_empty() && self.active_workers == 0
    }
}

/// Returns true when the URL's path does not end with a short file
/// extension or names an HTML document
///
/// The query is ignored, so `/search?q=report.pdf` is a page.
fn is_html_url(url: &str) -> bool {
    let parsed = ParsedUrl::parse(url);
    let segment = parsed
        .path()
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();

    match segment.rsplit_once('.') {
        Some((_, "html" | "shtml" | "phtml")) => true,
        Some((_, ext)) => {
            !((2..=4).contains(&ext.len()) && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        }
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ContentType;
    use std::time::Duration;

    fn settings() -> FrontierSettings {
        FrontierSettings {
            max_queue_length: 100,
            max_visited_urls: 100,
            max_url_length: 200,
            remove_query_params: false,
            crawl_assets: false,
        }
    }

    fn frontier_with(settings: FrontierSettings) -> Frontier {
        Frontier::new(
            "https://example.com/",
            settings,
            UrlFilters::default(),
            DomainAllowList::default(),
        )
    }

    fn summary() -> FetchSummary {
        FetchSummary {
            status: 200,
            elapsed: Duration::from_millis(5),
            size: 10,
            content_type: ContentType::Html,
            metadata: None,
        }
    }

    #[test]
    fn test_enqueue_is_idempotent() {
        let mut frontier = frontier_with(settings());
        assert_eq!(
            frontier.enqueue("https://example.com/a", None).unwrap(),
            Admission::Queued
        );
        assert_eq!(
            frontier.enqueue("https://example.com/a", None).unwrap(),
            Admission::Duplicate
        );
        assert_eq!(frontier.queue_len(), 1);
    }

    #[test]
    fn test_visited_url_is_not_requeued() {
        let mut frontier = frontier_with(settings());
        frontier.enqueue_seed("https://example.com/").unwrap();
        let entry = frontier.pop_next().unwrap().unwrap();

        assert_eq!(
            frontier.enqueue("https://example.com/", None).unwrap(),
            Admission::Duplicate
        );
        frontier.complete(&entry.fingerprint, summary());
        assert_eq!(
            frontier.enqueue("https://example.com/", None).unwrap(),
            Admission::Duplicate
        );
        assert_eq!(frontier.queue_len(), 0);
    }

    #[test]
    fn test_fingerprint_never_in_both_tables() {
        let mut frontier = frontier_with(settings());
        for path in ["a", "b", "c"] {
            frontier
                .enqueue(&format!("https://example.com/{}", path), None)
                .unwrap();
        }
        frontier.pop_next().unwrap();
        frontier.pop_next().unwrap();

        for record in frontier.records() {
            assert_eq!(
                frontier.state_of(&record.fingerprint),
                Some(UrlState::InFlight)
            );
            assert!(!frontier.queued.contains(&record.fingerprint));
        }
        assert_eq!(frontier.queue_len() + frontier.visited_len(), 3);
    }

    #[test]
    fn test_queue_capacity_is_fatal_and_leaves_queue_untouched() {
        let mut frontier = frontier_with(FrontierSettings {
            max_queue_length: 2,
            ..settings()
        });
        frontier.enqueue("https://example.com/a", None).unwrap();
        frontier.enqueue("https://example.com/b", None).unwrap();

        let err = frontier.enqueue("https://example.com/c", None).unwrap_err();
        assert_eq!(
            err,
            AdmissionError::CapacityExceeded {
                resource: CapacityResource::Queue,
                limit: 2,
                url: "https://example.com/c".to_string(),
            }
        );
        assert_eq!(frontier.queue_len(), 2);
        assert!(err.to_string().contains("max-queue-length"));
    }

    #[test]
    fn test_visited_capacity_keeps_entry_queued() {
        let mut frontier = frontier_with(FrontierSettings {
            max_visited_urls: 1,
            ..settings()
        });
        frontier.enqueue("https://example.com/a", None).unwrap();
        frontier.enqueue("https://example.com/b", None).unwrap();
        frontier.pop_next().unwrap();

        let err = frontier.pop_next().unwrap_err();
        assert!(matches!(
            err,
            AdmissionError::CapacityExceeded {
                resource: CapacityResource::Visited,
                ..
            }
        ));
        assert_eq!(frontier.queue_len(), 1);
        assert_eq!(frontier.visited_len(), 1);
    }

    #[test]
    fn test_url_length_limit() {
        let mut frontier = frontier_with(FrontierSettings {
            max_url_length: 30,
            ..settings()
        });
        let long = format!("https://example.com/{}", "x".repeat(40));
        let err = frontier.enqueue(&long, None).unwrap_err();
        assert!(err.to_string().contains("max-url-length"));
        assert_eq!(frontier.queue_len(), 0);
    }

    #[test]
    fn test_filters() {
        let filters = UrlFilters::from_patterns(
            &["/docs/".to_string()],
            &["/\\/docs\\/private/".to_string()],
        )
        .unwrap();
        let mut frontier = Frontier::new(
            "https://example.com/",
            settings(),
            filters,
            DomainAllowList::default(),
        );

        assert_eq!(
            frontier.enqueue("https://example.com/blog/", None).unwrap(),
            Admission::Filtered
        );
        assert_eq!(
            frontier
                .enqueue("https://example.com/docs/private/x", None)
                .unwrap(),
            Admission::Filtered
        );
        assert_eq!(
            frontier.enqueue("https://example.com/docs/intro", None).unwrap(),
            Admission::Queued
        );
    }

    #[test]
    fn test_seed_bypasses_filters() {
        let filters = UrlFilters::from_patterns(&["/docs/".to_string()], &[]).unwrap();
        let mut frontier = Frontier::new(
            "https://example.com/",
            settings(),
            filters,
            DomainAllowList::default(),
        );
        assert_eq!(
            frontier.enqueue_seed("https://example.com/").unwrap(),
            Admission::Queued
        );
    }

    #[test]
    fn test_unparsable_url() {
        let mut frontier = frontier_with(settings());
        assert_eq!(
            frontier.enqueue("ftp://example.com/file", None).unwrap(),
            Admission::Unparsable
        );
    }

    #[test]
    fn test_extension_policy() {
        let mut frontier = frontier_with(settings());
        assert_eq!(
            frontier.enqueue("https://example.com/logo.png", None).unwrap(),
            Admission::NotCrawlable
        );
        assert_eq!(
            frontier.enqueue("https://example.com/page.html", None).unwrap(),
            Admission::Queued
        );
        assert_eq!(
            frontier.enqueue("https://example.com/about", None).unwrap(),
            Admission::Queued
        );

        let mut frontier = frontier_with(FrontierSettings {
            crawl_assets: true,
            ..settings()
        });
        assert_eq!(
            frontier.enqueue("https://example.com/logo.png", None).unwrap(),
            Admission::Queued
        );
    }

    #[test]
    fn test_query_is_part_of_identity_unless_removed() {
        let mut frontier = frontier_with(settings());
        frontier.enqueue("https://example.com/p?a=1", None).unwrap();
        assert_eq!(
            frontier.enqueue("https://example.com/p?a=2", None).unwrap(),
            Admission::Queued
        );

        let mut frontier = frontier_with(FrontierSettings {
            remove_query_params: true,
            ..settings()
        });
        frontier.enqueue("https://example.com/p?a=1", None).unwrap();
        assert_eq!(
            frontier.enqueue("https://example.com/p?a=2", None).unwrap(),
            Admission::Duplicate
        );
    }

    #[test]
    fn test_complete_sets_result_once_and_counts() {
        let mut frontier = frontier_with(settings());
        frontier.enqueue_seed("https://example.com/").unwrap();
        let entry = frontier.pop_next().unwrap().unwrap();
        assert_eq!(frontier.active_workers(), 1);

        assert!(frontier.complete(&entry.fingerprint, summary()).is_some());
        assert_eq!(frontier.active_workers(), 0);
        assert_eq!(frontier.done_urls(), 1);
        assert!(frontier.is_finished());

        assert!(frontier.complete(&entry.fingerprint, summary()).is_none());
        assert_eq!(frontier.done_urls(), 1);
    }

    #[test]
    fn test_is_html_url() {
        assert!(is_html_url("https://example.com/"));
        assert!(is_html_url("https://example.com/a.shtml"));
        assert!(is_html_url("https://example.com/docs/v1.2.3-beta"));
        assert!(!is_html_url("https://example.com/a.css"));
        assert!(!is_html_url("https://example.com/a.woff"));
        assert!(!is_html_url("https://example.com/a.PDF"));
    }

    #[test]
    fn test_extension_policy_ignores_query_and_host() {
        assert!(is_html_url("https://example.com/search?q=report.pdf"));
        assert!(is_html_url("https://example.com"));
        assert!(is_html_url("https://example.com/list?sort=a.css#x.png"));
        assert!(!is_html_url("https://example.com/files/report.pdf?download=1"));

        let mut frontier = frontier_with(settings());
        assert_eq!(
            frontier
                .enqueue("https://example.com/search?q=report.pdf", None)
                .unwrap(),
            Admission::Queued
        );
    }
}
