//! HTML scanning for links and page metadata
//!
//! Links are found with a fixed set of regular expressions over the raw
//! body, so references inside inline styles and scripts are picked up too.
//! Metadata for the optional output columns is read with `scraper`.

use crate::config::{AssetKind, ExtraColumn};
use crate::state::PageMetadata;
use crate::url::{is_requestable_resource, ParsedUrl};
use regex::Regex;
use scraper::{Html, Selector};
use url::Url;

const ANCHOR_PATTERN: &str = r#"(?i)<a[^>]*\shref=["']([^"']+)["'][^>]*>"#;
const FONT_PATTERN: &str = r#"(?i)url\s*\(\s*['"]([^'"]+\.(?:eot|ttf|woff2|woff))"#;
const IMAGE_PATTERN: &str = r#"(?i)<img\s+.*?src=["']([^"']+)["'][^>]*>"#;
const STYLE_PATTERN: &str = r#"(?i)<link\s+.*?href=["']([^"']+)["'][^>]*>"#;
const SCRIPT_PATTERN: &str = r#"(?i)<script\s+.*?src=["']([^"']+)["'][^>]*>"#;

/// Finds link candidates in an HTML body
#[derive(Debug, Clone)]
pub struct LinkExtractor {
    rules: Vec<Regex>,
}

impl LinkExtractor {
    /// Builds an extractor for anchors plus the given asset categories
    pub fn new(assets: &[AssetKind]) -> Result<Self, regex::Error> {
        let mut rules = vec![Regex::new(ANCHOR_PATTERN)?];
        for kind in assets {
            let pattern = match kind {
                AssetKind::Fonts => FONT_PATTERN,
                AssetKind::Images => IMAGE_PATTERN,
                AssetKind::Styles => STYLE_PATTERN,
                AssetKind::Scripts => SCRIPT_PATTERN,
            };
            rules.push(Regex::new(pattern)?);
        }
        Ok(Self { rules })
    }

    /// Returns every raw reference found, in rule order
    pub fn extract<'a>(&self, body: &'a str) -> Vec<&'a str> {
        self.rules
            .iter()
            .flat_map(|rule| rule.captures_iter(body))
            .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
            .collect()
    }
}

/// Turns a raw reference into an absolute URL for the queue
///
/// Returns `None` for non-requestable references (`mailto:`, `tel:`, ...)
/// and for anything on a host other than the seed's. Scheme-relative
/// references take the seed scheme; relative ones are resolved against
/// the page they were found on. The fragment is always removed, the query
/// only when `remove_query` is set.
///
/// # Examples
///
/// ```
/// use site_mirror::crawler::resolve_link;
/// use site_mirror::url::ParsedUrl;
/// use url::Url;
///
/// let seed = ParsedUrl::parse("https://example.com/");
/// let page = Url::parse("https://example.com/docs/intro").unwrap();
///
/// assert_eq!(
///     resolve_link("../img/a.png#x", &page, &seed, false).as_deref(),
///     Some("https://example.com/img/a.png")
/// );
/// assert_eq!(resolve_link("https://other.org/", &page, &seed, false), None);
/// ```
pub fn resolve_link(
    reference: &str,
    page_url: &Url,
    initial: &ParsedUrl,
    remove_query: bool,
) -> Option<String> {
    let reference = reference.trim();
    if reference.is_empty() || !is_requestable_resource(reference) {
        return None;
    }

    let parsed = ParsedUrl::parse(reference);
    if let Some(host) = parsed.host() {
        if Some(host) != initial.host() {
            return None;
        }
    }

    let absolute = if parsed.host().is_some() && parsed.scheme().is_none() {
        let scheme = initial.scheme().unwrap_or("https");
        Url::parse(&format!("{}:{}", scheme, reference)).ok()?
    } else {
        page_url.join(reference).ok()?
    };

    if absolute.scheme() != "http" && absolute.scheme() != "https" {
        return None;
    }

    let mut absolute = absolute;
    absolute.set_fragment(None);
    if remove_query {
        absolute.set_query(None);
    }
    Some(absolute.to_string())
}

/// Extracts the requested metadata columns from an HTML document
///
/// Returns `None` when no column was requested.
pub fn extract_metadata(html: &str, columns: &[ExtraColumn]) -> Option<PageMetadata> {
    if columns.is_empty() {
        return None;
    }

    let document = Html::parse_document(html);
    let mut metadata = PageMetadata::default();

    for column in columns {
        match column {
            ExtraColumn::Title => metadata.title = extract_title(&document),
            ExtraColumn::Description => {
                metadata.description = extract_meta_content(&document, "description")
            }
            ExtraColumn::Keywords => metadata.keywords = extract_meta_content(&document, "keywords"),
            ExtraColumn::Dom => metadata.dom_nodes = count_elements(&document),
        }
    }

    Some(metadata)
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn extract_meta_content(document: &Html, name: &str) -> Option<String> {
    let selector = Selector::parse(&format!("meta[name='{}'][content]", name)).ok()?;

    document
        .select(&selector)
        .next()
        .and_then(|element| element.value().attr("content"))
        .map(|content| content.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn count_elements(document: &Html) -> Option<usize> {
    let selector = Selector::parse("*").ok()?;
    Some(document.select(&selector).count())
}
