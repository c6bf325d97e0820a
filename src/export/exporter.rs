//! Offline mirror writer
//!
//! Stores every successfully crawled URL under the export directory and
//! rewrites the links inside HTML and CSS bodies so the copy can be
//! browsed from disk.

use super::relativize::{Relativizer, SourceAttribute};
use super::sanitize::ExportSettings;
use crate::config::{compile_user_regexes, Config, ExportConfig};
use crate::crawler::CrawlReport;
use crate::state::{ContentType, VisitedRecord};
use crate::url::{DomainAllowList, DomainPolicy, Fingerprint, ParsedUrl, TargetDomainRelation};
use crate::{ExportError, MirrorError};
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use url::Url;

/// Status codes whose responses are worth storing
const EXPORTED_STATUSES: &[i32] = &[200, 201, 301, 302, 303, 308];

const ATTRIBUTE_PATTERN: &str = r#"(?i)(\s(href|src)\s*=\s*)(?:"([^"]*)"|'([^']*)')"#;
const CSS_URL_PATTERN: &str = r#"(?i)(url\(\s*["']?)([^"')\s]+)(["']?\s*\))"#;
const FILE_EXTENSION_PATTERN: &str = r"(?i)\.[a-z0-9\-]{1,15}$";

/// What an export run did
#[derive(Debug, Default)]
pub struct ExportSummary {
    pub stored: usize,
    pub skipped: usize,
    /// Non-fatal problems (files not written)
    pub notices: Vec<String>,
}

/// Writes a crawl to disk as a browsable offline copy
pub struct OfflineExporter<P: DomainPolicy> {
    directory: PathBuf,
    relativizer: Relativizer<P>,
    store_only: Vec<Regex>,
    ignore_store_file_error: bool,
    attribute_pattern: Regex,
    css_url_pattern: Regex,
    file_extension_pattern: Regex,
}

impl OfflineExporter<DomainAllowList> {
    /// Builds the exporter for the `[export]` section of a configuration
    pub fn from_config(config: &Config, export: &ExportConfig) -> Result<Self, MirrorError> {
        let settings = ExportSettings::from_config(export)?;
        let mut exporter = Self::new(
            export.directory.clone(),
            ParsedUrl::parse(&config.crawler.url),
            config.domain_policy(),
            settings,
        )?;
        exporter.store_only = compile_user_regexes(&export.store_only_url_regex)?;
        exporter.ignore_store_file_error = export.ignore_store_file_error;
        Ok(exporter)
    }
}

impl<P: DomainPolicy> OfflineExporter<P> {
    pub fn new(
        directory: impl Into<PathBuf>,
        initial: ParsedUrl,
        policy: P,
        settings: ExportSettings,
    ) -> Result<Self, MirrorError> {
        Ok(Self {
            directory: directory.into(),
            relativizer: Relativizer::new(initial, policy, settings),
            store_only: Vec::new(),
            ignore_store_file_error: false,
            attribute_pattern: Regex::new(ATTRIBUTE_PATTERN)?,
            css_url_pattern: Regex::new(CSS_URL_PATTERN)?,
            file_extension_pattern: Regex::new(FILE_EXTENSION_PATTERN)?,
        })
    }

    /// Only URLs matching one of these patterns are stored
    pub fn with_store_only(mut self, patterns: Vec<Regex>) -> Self {
        self.store_only = patterns;
        self
    }

    /// Write failures become notices instead of errors
    pub fn with_ignore_store_file_error(mut self, ignore: bool) -> Self {
        self.ignore_store_file_error = ignore;
        self
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Stores every exportable record of the crawl
    ///
    /// # Returns
    ///
    /// * `Ok(ExportSummary)` - Counts and notices of the run
    /// * `Err(ExportError)` - A directory could not be created, or a file
    ///   with an extension could not be written
    pub async fn export(&self, report: &CrawlReport) -> Result<ExportSummary, ExportError> {
        let started = Instant::now();
        let urls_by_fingerprint: HashMap<Fingerprint, &str> = report
            .records
            .iter()
            .map(|r| (r.fingerprint, r.url.as_str()))
            .collect();

        tracing::info!(directory = %self.directory.display(), "Exporting offline website");

        let mut summary = ExportSummary::default();
        for record in &report.records {
            if !self.is_exported(record) || !self.should_store(record) {
                summary.skipped += 1;
                continue;
            }

            let base = record
                .source
                .and_then(|source| urls_by_fingerprint.get(&source))
                .map(|url| ParsedUrl::parse(url))
                .unwrap_or_else(|| self.relativizer.initial().clone());

            let body = report
                .bodies
                .get(&record.fingerprint)
                .map(Vec::as_slice)
                .unwrap_or_default();

            if self.store_file(record, &base, body, &mut summary).await? {
                summary.stored += 1;
            } else {
                summary.skipped += 1;
            }
        }

        tracing::info!(
            stored = summary.stored,
            skipped = summary.skipped,
            notices = summary.notices.len(),
            "Offline website generated to '{}' in {:.2}s",
            self.directory.display(),
            started.elapsed().as_secs_f64()
        );
        Ok(summary)
    }

    /// Completed with a storable status and a valid absolute URL
    fn is_exported(&self, record: &VisitedRecord) -> bool {
        record
            .status()
            .is_some_and(|status| EXPORTED_STATUSES.contains(&status))
            && Url::parse(&record.url).is_ok()
    }

    /// Applies `store-only-url-regex` and the foreign domain allow-lists
    pub fn should_store(&self, record: &VisitedRecord) -> bool {
        if !self.store_only.is_empty() && !self.store_only.iter().any(|re| re.is_match(&record.url))
        {
            return false;
        }

        if !record.is_external {
            return true;
        }

        let parsed = ParsedUrl::parse(&record.url);
        let Some(host) = parsed.host() else {
            return false;
        };
        let policy = self.relativizer.policy();
        let is_static = record.content_type().is_some_and(|ct| ct.is_static_file())
            || parsed.is_static_file();

        policy.is_external_domain_allowed_for_crawling(host)
            || (is_static && policy.is_domain_allowed_for_static_files(host))
    }

    /// Path of the record's file, relative to the export directory
    ///
    /// The record is relativized against the page it was found on and the
    /// `../` hops are dropped. Foreign hosts live under `_host/`.
    pub fn file_path_for(&self, record: &VisitedRecord, base: &ParsedUrl) -> String {
        let hint = if record.content_type() == Some(ContentType::Image) {
            SourceAttribute::Src
        } else {
            SourceAttribute::Href
        };
        let relative = self.relativizer.relativize(
            base,
            &ParsedUrl::parse(&record.url),
            Some(hint),
            false,
        );

        let path = relative
            .path
            .replace("../", "")
            .trim_start_matches(|c| c == '/' || c == ' ')
            .to_string();

        match relative.relation {
            TargetDomainRelation::InitialDifferentBaseSame
            | TargetDomainRelation::InitialDifferentBaseDifferent => {
                let prefix = format!("_{}", relative.rewritten.host().unwrap_or_default());
                if path.starts_with(&prefix) {
                    path
                } else {
                    format!("{}/{}", prefix, path)
                }
            }
            TargetDomainRelation::InitialSameBaseSame
            | TargetDomainRelation::InitialSameBaseDifferent => path,
        }
    }

    /// Rewrites `href`/`src` attributes and CSS `url(...)` references
    pub fn rewrite_html(&self, html: &str, page: &ParsedUrl) -> String {
        let rewritten = self
            .attribute_pattern
            .replace_all(html, |caps: &Captures| {
                let (value, quote) = match (caps.get(3), caps.get(4)) {
                    (Some(value), _) => (value.as_str(), '"'),
                    (None, Some(value)) => (value.as_str(), '\''),
                    (None, None) => return caps[0].to_string(),
                };
                let hint = if caps[2].eq_ignore_ascii_case("src") {
                    SourceAttribute::Src
                } else {
                    SourceAttribute::Href
                };
                format!(
                    "{}{}{}{}",
                    &caps[1],
                    quote,
                    self.relative_reference(page, value, hint),
                    quote
                )
            })
            .into_owned();

        self.rewrite_css(&rewritten, page)
    }

    /// Rewrites `url(...)` references in a stylesheet
    pub fn rewrite_css(&self, css: &str, page: &ParsedUrl) -> String {
        self.css_url_pattern
            .replace_all(css, |caps: &Captures| {
                format!(
                    "{}{}{}",
                    &caps[1],
                    self.relative_reference(page, &caps[2], SourceAttribute::Src),
                    &caps[3]
                )
            })
            .into_owned()
    }

    fn relative_reference(&self, page: &ParsedUrl, value: &str, hint: SourceAttribute) -> String {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.starts_with("data:") {
            return value.to_string();
        }
        self.relativizer
            .relativize(page, &ParsedUrl::parse(trimmed), Some(hint), true)
            .path
    }

    /// Writes one record; returns false when the file was left alone
    async fn store_file(
        &self,
        record: &VisitedRecord,
        base: &ParsedUrl,
        body: &[u8],
        summary: &mut ExportSummary,
    ) -> Result<bool, ExportError> {
        let relative_path = self.file_path_for(record, base);
        let relative_path = relative_path
            .split_once('#')
            .map_or(relative_path.as_str(), |(path, _)| path);
        let store_path = self.directory.join(relative_path);

        if let Some(directory) = store_path.parent() {
            tokio::fs::create_dir_all(directory)
                .await
                .map_err(|source| ExportError::CreateDirectory {
                    path: directory.display().to_string(),
                    source,
                })?;
        }

        let page = ParsedUrl::parse(&record.url);
        if self.relativizer.initial().is_https()
            && !page.is_https()
            && tokio::fs::try_exists(&store_path).await.unwrap_or(false)
        {
            let message = format!(
                "File '{}' already exists and will not be overwritten because initial request was HTTPS and this request is HTTP: {}",
                store_path.display(),
                record.url
            );
            tracing::warn!("{}", message);
            summary.notices.push(message);
            return Ok(false);
        }

        let content = match record.content_type() {
            Some(ContentType::Html) | Some(ContentType::Stylesheet) => {
                match std::str::from_utf8(body) {
                    Ok(text) if record.content_type() == Some(ContentType::Html) => {
                        self.rewrite_html(text, &page).into_bytes()
                    }
                    Ok(text) => self.rewrite_css(text, &page).into_bytes(),
                    Err(_) => body.to_vec(),
                }
            }
            _ => body.to_vec(),
        };

        tracing::debug!(url = %record.url, path = %store_path.display(), "Storing file");
        if let Err(source) = tokio::fs::write(&store_path, content).await {
            let path = store_path.display().to_string();
            if self.file_extension_pattern.is_match(&path) && !self.ignore_store_file_error {
                return Err(ExportError::WriteFile { path, source });
            }
            let message = format!(
                "Cannot store file '{}' ({}). Original URL: {}",
                path, source, record.url
            );
            tracing::warn!("{}", message);
            summary.notices.push(message);
            return Ok(false);
        }

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::FetchSummary;
    use std::time::Duration;

    fn exporter(policy: DomainAllowList) -> OfflineExporter<DomainAllowList> {
        OfflineExporter::new(
            "/tmp/unused",
            ParsedUrl::parse("https://example.com/"),
            policy,
            ExportSettings::default(),
        )
        .unwrap()
    }

    fn record(url: &str, status: i32, content_type: ContentType, is_external: bool) -> VisitedRecord {
        let mut record = VisitedRecord::placeholder(
            Fingerprint::of(&ParsedUrl::parse(url), false),
            url.to_string(),
            None,
            is_external,
            !is_external,
        );
        record.set_result(FetchSummary {
            status,
            elapsed: Duration::from_millis(10),
            size: 0,
            content_type,
            metadata: None,
        });
        record
    }

    #[test]
    fn test_file_path_for_seed_host() {
        let e = exporter(DomainAllowList::default());
        let base = ParsedUrl::parse("https://example.com/a/b/c");

        let r = record("https://example.com/x", 200, ContentType::Html, false);
        assert_eq!(e.file_path_for(&r, &base), "x.html");

        let r = record("https://example.com/", 200, ContentType::Html, false);
        assert_eq!(e.file_path_for(&r, &base), "index.html");

        let r = record("https://example.com/img/logo", 200, ContentType::Image, false);
        assert_eq!(e.file_path_for(&r, &base), "img/logo.jpg");
    }

    #[test]
    fn test_file_path_for_foreign_host() {
        let e = exporter(DomainAllowList::new(vec![], vec!["cdn.net".to_string()]));
        let base = ParsedUrl::parse("https://example.com/blog/post");

        let r = record("https://cdn.net/lib/app.js", 200, ContentType::Script, true);
        assert_eq!(e.file_path_for(&r, &base), "_cdn.net/lib/app.js");

        let foreign_base = ParsedUrl::parse("https://cdn.net/lib/index.html");
        let r = record("https://cdn.net/lib/other.js", 200, ContentType::Script, true);
        assert_eq!(e.file_path_for(&r, &foreign_base), "_cdn.net/lib/other.js");
    }

    #[test]
    fn test_should_store_filters() {
        let e = exporter(DomainAllowList::new(vec![], vec!["cdn.net".to_string()]));
        assert!(e.should_store(&record("https://example.com/a", 200, ContentType::Html, false)));
        assert!(e.should_store(&record("https://cdn.net/a.css", 200, ContentType::Stylesheet, true)));
        assert!(!e.should_store(&record("https://cdn.net/page", 200, ContentType::Html, true)));
        assert!(!e.should_store(&record("https://other.net/a.css", 200, ContentType::Stylesheet, true)));

        let e = exporter(DomainAllowList::default())
            .with_store_only(vec![Regex::new(r"/docs/").unwrap()]);
        assert!(e.should_store(&record("https://example.com/docs/a", 200, ContentType::Html, false)));
        assert!(!e.should_store(&record("https://example.com/blog/a", 200, ContentType::Html, false)));
    }

    #[test]
    fn test_is_exported_by_status() {
        let e = exporter(DomainAllowList::default());
        for status in [200, 201, 301, 302, 303, 308] {
            assert!(e.is_exported(&record("https://example.com/", status, ContentType::Html, false)));
        }
        for status in [304, 404, 500, -1] {
            assert!(!e.is_exported(&record("https://example.com/", status, ContentType::Html, false)));
        }
    }

    #[test]
    fn test_rewrite_html_links() {
        let e = exporter(DomainAllowList::default());
        let page = ParsedUrl::parse("https://example.com/blog/post");
        let html = r##"<a href="/about">A</a> <img src='/img/42'> <a href="#top">T</a> <a href="https://other.org/x">O</a> <a href="mailto:a@b.c">M</a>"##;

        let out = e.rewrite_html(html, &page);
        assert_eq!(
            out,
            r##"<a href="../about.html">A</a> <img src='../img/42.jpg'> <a href="#top">T</a> <a href="https://other.org/x">O</a> <a href="mailto:a@b.c">M</a>"##
        );
    }

    #[test]
    fn test_rewrite_css_urls() {
        let e = exporter(DomainAllowList::default());
        let page = ParsedUrl::parse("https://example.com/css/site.css");
        let css = r#"body { background: url("/img/bg.png"); } @font-face { src: url(../fonts/a.woff2) }"#;

        let out = e.rewrite_css(css, &page);
        assert_eq!(
            out,
            r#"body { background: url("../img/bg.png"); } @font-face { src: url(../fonts/a.woff2) }"#
        );
    }

    #[test]
    fn test_data_uris_untouched() {
        let e = exporter(DomainAllowList::default());
        let page = ParsedUrl::parse("https://example.com/");
        let css = "a { background: url(data:image/png;base64,AAAA) }";
        assert_eq!(e.rewrite_css(css, &page), css);
    }

    fn report(records: Vec<VisitedRecord>) -> CrawlReport {
        let bodies = records
            .iter()
            .map(|r| (r.fingerprint, b"PNG".to_vec()))
            .collect();
        CrawlReport {
            initial_url: "https://example.com/".to_string(),
            stats: crate::output::CrawlStats::from_records(&records, Instant::now(), false),
            records,
            bodies,
            interrupted: false,
            incomplete: Vec::new(),
        }
    }

    fn exporter_in(directory: &Path) -> OfflineExporter<DomainAllowList> {
        OfflineExporter::new(
            directory,
            ParsedUrl::parse("https://example.com/"),
            DomainAllowList::default(),
            ExportSettings::default(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_write_failure_is_fatal_for_files_with_extension() {
        let dir = tempfile::TempDir::new().unwrap();
        // A directory where the file should go makes the write fail
        std::fs::create_dir(dir.path().join("logo.png")).unwrap();

        let crawl = report(vec![record(
            "https://example.com/logo.png",
            200,
            ContentType::Image,
            false,
        )]);
        let result = exporter_in(dir.path()).export(&crawl).await;

        match result {
            Err(ExportError::WriteFile { path, .. }) => assert!(path.ends_with("logo.png")),
            other => panic!("expected a write error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_write_failure_becomes_notice_when_ignored() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("logo.png")).unwrap();

        let crawl = report(vec![
            record("https://example.com/logo.png", 200, ContentType::Image, false),
            record("https://example.com/bg.png", 200, ContentType::Image, false),
        ]);
        let summary = exporter_in(dir.path())
            .with_ignore_store_file_error(true)
            .export(&crawl)
            .await
            .unwrap();

        assert_eq!(summary.stored, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.notices.len(), 1);
        assert!(summary.notices[0].contains("https://example.com/logo.png"));
        assert_eq!(std::fs::read(dir.path().join("bg.png")).unwrap(), b"PNG");
    }

    #[tokio::test]
    async fn test_http_record_does_not_overwrite_https_file() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("logo.png"), "HTTPS").unwrap();

        let crawl = report(vec![record(
            "http://example.com/logo.png",
            200,
            ContentType::Image,
            false,
        )]);
        let summary = exporter_in(dir.path()).export(&crawl).await.unwrap();

        assert_eq!(summary.stored, 0);
        assert_eq!(summary.notices.len(), 1);
        assert!(summary.notices[0].contains("will not be overwritten"));
        assert_eq!(
            std::fs::read_to_string(dir.path().join("logo.png")).unwrap(),
            "HTTPS"
        );

        // The same file from an https URL is written as usual
        let crawl = report(vec![record(
            "https://example.com/logo.png",
            200,
            ContentType::Image,
            false,
        )]);
        let summary = exporter_in(dir.path()).export(&crawl).await.unwrap();
        assert_eq!(summary.stored, 1);
        assert_eq!(std::fs::read(dir.path().join("logo.png")).unwrap(), b"PNG");
    }
}
