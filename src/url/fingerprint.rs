use super::ParsedUrl;
use md5::{Digest, Md5};
use std::fmt;

/// Dedup key of a URL in the frontier tables
///
/// The key is the MD5 digest of `host + path` (the path defaults to `/`),
/// so `http://` and `https://` variants and fragment variants of the same
/// page collapse into one entry. The query string takes part only when the
/// caller asks for it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint([u8; 16]);

impl Fingerprint {
    /// Computes the fingerprint of a parsed URL
    ///
    /// # Examples
    ///
    /// ```
    /// use site_mirror::url::{Fingerprint, ParsedUrl};
    ///
    /// let a = Fingerprint::of(&ParsedUrl::parse("https://example.com/a?x=1#top"), false);
    /// let b = Fingerprint::of(&ParsedUrl::parse("http://example.com/a"), false);
    /// assert_eq!(a, b);
    ///
    /// let c = Fingerprint::of(&ParsedUrl::parse("https://example.com/a?x=1"), true);
    /// assert_ne!(a, c);
    /// ```
    pub fn of(url: &ParsedUrl, include_query: bool) -> Self {
        let path = if url.path().is_empty() { "/" } else { url.path() };
        let mut key = format!("{}{}", url.host().unwrap_or(""), path);
        if include_query {
            if let Some(query) = url.query().filter(|q| !q.is_empty()) {
                key.push('?');
                key.push_str(query);
            }
        }
        Self(Md5::digest(key.as_bytes()).into())
    }

    /// Hex representation of the digest
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self.to_hex())
    }
}

/// Lowercase hex MD5 digest of a string
pub fn md5_hex(input: &str) -> String {
    hex::encode(Md5::digest(input.as_bytes()))
}
