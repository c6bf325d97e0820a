use crate::UrlError;
use url::Url;

/// Schemes that never point to something a crawler can fetch
const NON_REQUESTABLE_SCHEMES: &[&str] = &["mailto", "tel", "phone", "javascript", "data", "sms"];

/// Parses and normalizes an absolute crawl URL
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Accept only `http` and `https`
/// 3. Require a host (lowercased by the parser)
/// 4. Resolve dot segments (done by the parser)
/// 5. Remove the fragment
///
/// The query string is kept; stripping it is a frontier policy decision.
///
/// # Examples
///
/// ```
/// use site_mirror::url::normalize_url;
///
/// let url = normalize_url("https://EXAMPLE.com/a/../b?x=1#top").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/b?x=1");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingDomain);
    }

    url.set_fragment(None);
    Ok(url)
}

/// Returns false for references like `mailto:`, `tel:` or `javascript:`
///
/// # Examples
///
/// ```
/// use site_mirror::url::is_requestable_resource;
///
/// assert!(is_requestable_resource("/about"));
/// assert!(is_requestable_resource("https://example.com/"));
/// assert!(!is_requestable_resource("mailto:info@example.com"));
/// assert!(!is_requestable_resource("JavaScript:void(0)"));
/// ```
pub fn is_requestable_resource(href: &str) -> bool {
    let href = href.trim();
    match href.split_once(':') {
        Some((scheme, _)) => {
            let scheme = scheme.to_ascii_lowercase();
            !NON_REQUESTABLE_SCHEMES.contains(&scheme.as_str())
        }
        None => true,
    }
}
