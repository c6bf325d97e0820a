//! Structural URL model used by the frontier and the relativization engine
//!
//! Unlike [`url::Url`], a [`ParsedUrl`] can hold relative references
//! (`../img/a.png`, `//cdn.example.com/x.js`, `#top`), which is what the
//! mirror rewriting has to deal with. Values are immutable: every change
//! produces a new value and appends a human readable step to its trace.

use std::fmt;

/// Static file extensions recognized when deciding whether a URL is an asset
const STATIC_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "webp", "avif", "svg", "ico", "bmp", "tif", "tiff", "js", "mjs",
    "css", "txt", "woff2", "woff", "ttf", "otf", "eot", "mp4", "webm", "ogg", "mp3", "wav", "flac",
    "avi", "mov", "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "odt", "ods", "zip", "rar",
    "gz", "bz2", "7z", "tar", "xml", "json", "map", "csv", "rss",
];

/// Extensions of server-rendered pages which are still HTML documents
const DYNAMIC_PAGE_EXTENSIONS: &[&str] = &[
    "php", "asp", "aspx", "jsp", "jspx", "cfm", "cfml", "cgi", "do", "action", "pl", "py", "rb",
];

/// A parsed, possibly relative URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedUrl {
    url: String,
    scheme: Option<String>,
    host: Option<String>,
    port: Option<u16>,
    path: String,
    query: Option<String>,
    fragment: Option<String>,
    extension: Option<String>,
    trace: Vec<String>,
}

impl ParsedUrl {
    /// Parses an absolute or relative URL reference
    ///
    /// Parsing never fails: anything that is not recognized as a scheme or
    /// authority ends up in the path. Scheme and host are lowercased.
    ///
    /// # Examples
    ///
    /// ```
    /// use site_mirror::url::ParsedUrl;
    ///
    /// let url = ParsedUrl::parse("https://Example.com:8443/docs/guide.html?v=2#intro");
    /// assert_eq!(url.scheme(), Some("https"));
    /// assert_eq!(url.host(), Some("example.com"));
    /// assert_eq!(url.port(), Some(8443));
    /// assert_eq!(url.path(), "/docs/guide.html");
    /// assert_eq!(url.query(), Some("v=2"));
    /// assert_eq!(url.fragment(), Some("intro"));
    /// assert_eq!(url.extension(), Some("html"));
    /// ```
    pub fn parse(input: &str) -> Self {
        let url = input.trim().to_string();

        let (rest, fragment) = match url.split_once('#') {
            Some((rest, fragment)) => (rest, Some(fragment.to_string())),
            None => (url.as_str(), None),
        };
        let (rest, query) = match rest.split_once('?') {
            Some((rest, query)) => (rest, Some(query.to_string())),
            None => (rest, None),
        };

        let (scheme, rest) = split_scheme(rest);

        let (host, port, path) = match rest.strip_prefix("//") {
            Some(after) => {
                let end = after.find('/').unwrap_or(after.len());
                let (host, port) = split_authority(&after[..end]);
                (host, port, after[end..].to_string())
            }
            None => (None, None, rest.to_string()),
        };

        let extension = detect_extension(&path);

        Self {
            url: url.clone(),
            scheme,
            host,
            port,
            path,
            query,
            fragment,
            extension,
            trace: Vec::new(),
        }
    }

    /// The original input this value was parsed from
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn scheme(&self) -> Option<&str> {
        self.scheme.as_deref()
    }

    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn fragment(&self) -> Option<&str> {
        self.fragment.as_deref()
    }

    /// Lowercased extension of the last path segment, if it has one
    pub fn extension(&self) -> Option<&str> {
        self.extension.as_deref()
    }

    /// Transformation steps applied since parsing
    pub fn trace(&self) -> &[String] {
        &self.trace
    }

    /// Returns true for a bare `#fragment` reference
    pub fn is_only_fragment(&self) -> bool {
        self.scheme.is_none()
            && self.host.is_none()
            && self.path.is_empty()
            && self.query.is_none()
            && self.fragment.is_some()
    }

    pub fn is_https(&self) -> bool {
        self.scheme.as_deref() == Some("https")
    }

    /// Returns true if the extension names a static asset (image, script, font, ...)
    pub fn is_static_file(&self) -> bool {
        self.extension
            .as_deref()
            .is_some_and(|ext| STATIC_EXTENSIONS.contains(&ext))
    }

    /// Returns true if the URL points to something that renders as an HTML page
    ///
    /// URLs without extension count as HTML, as do `*.htm*` and the usual
    /// server-side page extensions.
    pub fn is_html_like(&self) -> bool {
        match self.extension.as_deref() {
            None => true,
            Some(ext) => ext.contains("htm") || DYNAMIC_PAGE_EXTENSIONS.contains(&ext),
        }
    }

    /// Returns a copy with a new path
    pub fn with_path(&self, path: impl Into<String>, reason: &str) -> Self {
        let mut next = self.clone();
        next.path = path.into();
        next.extension = detect_extension(&next.path);
        next.record(reason);
        next
    }

    /// Returns a copy with a new (or removed) query string
    pub fn with_query(&self, query: Option<String>, reason: &str) -> Self {
        let mut next = self.clone();
        next.query = query;
        next.record(reason);
        next
    }

    /// Returns a copy without the fragment
    pub fn without_fragment(&self) -> Self {
        let mut next = self.clone();
        next.fragment = None;
        next
    }

    /// Prefixes the path with `depth` parent-directory hops
    ///
    /// The leading `/` of a root-relative path is dropped so the result is
    /// relative to the directory `depth` levels below the mirror root.
    pub fn change_depth(&self, depth: usize, reason: &str) -> Self {
        let path = format!("{}{}", "../".repeat(depth), self.path.trim_start_matches('/'));
        self.with_path(path, reason)
    }

    /// Rebuilds the URL string
    ///
    /// With `include_scheme_and_host == false` only the path, query and
    /// (optionally) fragment are emitted.
    pub fn full_url(&self, include_scheme_and_host: bool, include_fragment: bool) -> String {
        let mut out = String::with_capacity(self.url.len());

        if include_scheme_and_host {
            match (&self.scheme, &self.host) {
                (Some(scheme), Some(host)) => {
                    out.push_str(scheme);
                    out.push_str("://");
                    out.push_str(host);
                }
                (None, Some(host)) => {
                    out.push_str("//");
                    out.push_str(host);
                }
                (Some(scheme), None) => {
                    out.push_str(scheme);
                    out.push(':');
                }
                (None, None) => {}
            }
            if self.host.is_some() {
                if let Some(port) = self.port {
                    out.push(':');
                    out.push_str(&port.to_string());
                }
            }
        }

        out.push_str(&self.path);

        if let Some(query) = &self.query {
            out.push('?');
            out.push_str(query);
        }
        if include_fragment {
            if let Some(fragment) = &self.fragment {
                out.push('#');
                out.push_str(fragment);
            }
        }

        out
    }

    fn record(&mut self, reason: &str) {
        tracing::trace!(url = %self.url, path = %self.path, "{}", reason);
        self.trace.push(format!("{} => {}", reason, self.full_url(true, true)));
    }
}

impl fmt::Display for ParsedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_url(true, true))
    }
}

/// Splits a leading `scheme:` off the reference, if there is a valid one
fn split_scheme(input: &str) -> (Option<String>, &str) {
    let Some(idx) = input.find(':') else {
        return (None, input);
    };
    let candidate = &input[..idx];
    let valid = candidate
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic())
        && candidate
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));

    if valid {
        (Some(candidate.to_ascii_lowercase()), &input[idx + 1..])
    } else {
        (None, input)
    }
}

/// Splits `user@host:port` into a lowercase host and optional port
fn split_authority(authority: &str) -> (Option<String>, Option<u16>) {
    let host_port = authority
        .rsplit_once('@')
        .map(|(_, hp)| hp)
        .unwrap_or(authority);

    if host_port.is_empty() {
        return (None, None);
    }

    // IPv6 literal: [::1]:8080
    if let Some(rest) = host_port.strip_prefix('[') {
        if let Some((addr, tail)) = rest.split_once(']') {
            let port = tail.strip_prefix(':').and_then(|p| p.parse().ok());
            return (Some(format!("[{}]", addr.to_ascii_lowercase())), port);
        }
    }

    match host_port.rsplit_once(':') {
        Some((host, port)) if port.chars().all(|c| c.is_ascii_digit()) && !port.is_empty() => {
            (Some(host.to_ascii_lowercase()), port.parse().ok())
        }
        _ => (Some(host_port.to_ascii_lowercase()), None),
    }
}

/// Detects the extension of the last path segment (`.jpg`, `.php`, ...)
///
/// An extension is 1-10 ASCII alphanumerics containing at least one
/// letter, so version-like suffixes such as `v1.2` are not extensions.
fn detect_extension(path: &str) -> Option<String> {
    let segment = path.rsplit('/').next().unwrap_or(path);
    let (_, ext) = segment.rsplit_once('.')?;
    let valid = (1..=10).contains(&ext.len())
        && ext.chars().all(|c| c.is_ascii_alphanumeric())
        && ext.chars().any(|c| c.is_ascii_alphabetic());
    valid.then(|| ext.to_ascii_lowercase())
}
