/// Checks if a host matches a domain allow-list pattern
///
/// Two pattern forms are supported:
/// 1. Exact: `"cdn.example.net"` matches only that host
/// 2. Wildcard: `"*.example.net"` matches `example.net` and every subdomain
///
/// Hosts are expected to be lowercase already.
///
/// # Examples
///
/// ```
/// use site_mirror::url::matches_wildcard;
///
/// assert!(matches_wildcard("cdn.example.net", "cdn.example.net"));
/// assert!(matches_wildcard("*.example.net", "example.net"));
/// assert!(matches_wildcard("*.example.net", "img.cdn.example.net"));
/// assert!(!matches_wildcard("*.example.net", "badexample.net"));
/// ```
pub fn matches_wildcard(pattern: &str, host: &str) -> bool {
    match pattern.strip_prefix("*.") {
        Some(base) => {
            host == base
                || host
                    .strip_suffix(base)
                    .is_some_and(|prefix| prefix.ends_with('.'))
        }
        None => pattern == "*" || host == pattern,
    }
}
