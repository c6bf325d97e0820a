//! Mirror file names
//!
//! Turns a relativized path (possibly still carrying a query string and a
//! fragment) into something every common filesystem accepts.

use crate::config::{parse_replace_rules, ExportConfig, FilenameSanitization, ReplaceRule};
use crate::url::md5_hex;
use crate::ConfigError;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Characters that are not allowed (or are awkward) in file names on some platforms
const SPECIAL_CHARS: &[&str] = &[
    "\\", ":", "%20", "%", "*", "?", "\"", "'", "<", ">", "|", "+", " ",
];

/// Extensions which, when found on a directory segment, get a `_` suffix
/// so that `next.js/` and `next.js` can coexist
const FILE_LIKE_DIR_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "webp", "svg", "ico", "js", "css", "txt", "woff2", "woff", "ttf",
    "eot", "mp4", "webm", "ogg", "mp3", "wav", "flac", "pdf", "doc", "docx", "xls", "xlsx", "ppt",
    "pptx", "zip", "rar", "gz", "bz2", "7z", "tar", "xml", "json", "action", "asp", "aspx", "cfm",
    "cfml", "cgi", "do", "gsp", "jsp", "jspx", "lasso", "phtml", "php", "php3", "php4", "php5",
    "php7", "php8", "php9", "pl", "py", "rb", "rbw", "rhtml", "shtml", "srv", "vm", "vmdk",
];

/// Server-side page extensions that get `.html` appended in the mirror
const DYNAMIC_EXTENSIONS: &[&str] = &[
    "action", "asp", "aspx", "cfm", "cfml", "cgi", "do", "gsp", "jsp", "jspx", "lasso", "phtml",
    "php3", "php4", "php5", "php7", "php8", "php9", "php", "pl", "py", "rb", "rbw", "rhtml",
    "shtml", "srv", "vm",
];

/// Basenames up to this length are never shortened
const SHORTENABLE_BASENAME_LENGTH: usize = 40;

/// PHP `urlencode` keeps `-_.` and alphanumerics
const URLENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.');

/// RFC 3986 unreserved characters stay, like PHP `rawurlencode`
const RAWURLENCODE_SET: &AsciiSet = &URLENCODE_SET.remove(b'~');

/// Settings shared by every relativization of one export
#[derive(Debug, Clone)]
pub struct ExportSettings {
    pub file_path_length_limit: usize,
    pub filename_sanitization: FilenameSanitization,
    /// When non-empty, query strings are rewritten by these rules
    /// instead of being hashed
    pub replace_rules: Vec<ReplaceRule>,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            file_path_length_limit: 200,
            filename_sanitization: FilenameSanitization::default(),
            replace_rules: Vec::new(),
        }
    }
}

impl ExportSettings {
    pub fn from_config(config: &ExportConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            file_path_length_limit: config.file_path_length_limit,
            filename_sanitization: config.filename_sanitization,
            replace_rules: parse_replace_rules(&config.replace_query_string)?,
        })
    }
}

/// Returns the file name token that stands in for a query string
///
/// Without replace rules this is the first 10 hex characters of the MD5
/// of the URL- and HTML-decoded query, so `a=1&amp;b=2` and `a=1&b=2`
/// produce the same name. With rules, they are applied in order and `/`
/// becomes `~`.
///
/// # Examples
///
/// ```
/// use site_mirror::export::query_hash;
///
/// assert_eq!(query_hash("a=1&b=2", &[]), query_hash("a=1&amp;b=2", &[]));
/// assert_eq!(query_hash("a=1", &[]).len(), 10);
/// ```
pub fn query_hash(query: &str, rules: &[ReplaceRule]) -> String {
    if rules.is_empty() {
        let decoded = html_decode(&url_decode(query));
        let mut digest = md5_hex(&decoded);
        digest.truncate(10);
        return digest;
    }

    let replaced = rules
        .iter()
        .fold(query.to_string(), |acc, rule| rule.apply(&acc));
    replaced.replace('/', "~")
}

/// Makes a relative mirror path safe to use as a file name
///
/// # Arguments
///
/// * `path` - Relativized path, optionally with `?query` and `#fragment`
/// * `keep_fragment` - Whether the `#fragment` survives
/// * `settings` - Sanitization mode, length limit and query rules
///
/// # Returns
///
/// The sanitized path. A query on a path with extension is folded into
/// the name (`page.<hash>.html`), a too long basename is replaced by a
/// short digest, directory segments that look like files get a `_`
/// suffix and dynamic page extensions get `.html` appended.
pub fn sanitize_file_path(path: &str, keep_fragment: bool, settings: &ExportSettings) -> String {
    let mut file_path = path.to_string();

    let (without_fragment, fragment) = match path.split_once('#') {
        Some((rest, fragment)) => (rest, Some(fragment)),
        None => (path, None),
    };
    let (path_part, query) = match without_fragment.split_once('?') {
        Some((path_part, query)) => (path_part, Some(query)),
        None => (without_fragment, None),
    };

    let extension_split = split_extension(path_part);
    if let (Some((start, extension)), Some(query)) = (extension_split, query) {
        if !query.trim().is_empty() {
            file_path = format!(
                "{}.{}.{}",
                start,
                query_hash(query, &settings.replace_rules),
                extension
            );
            if keep_fragment {
                if let Some(fragment) = fragment.filter(|f| !f.is_empty()) {
                    file_path.push('#');
                    file_path.push_str(fragment);
                }
            }
        }
    }

    file_path = sanitize_filename(&file_path, settings.filename_sanitization);
    file_path = shorten_long_basename(
        &file_path,
        extension_split.map(|(_, ext)| ext),
        settings.file_path_length_limit,
    );
    file_path = suffix_file_like_directories(&file_path);
    file_path = append_html_to_dynamic_extension(file_path);

    if !keep_fragment {
        file_path = strip_fragment(&file_path).to_string();
    }

    file_path
}

/// Applies the configured sanitization mode
fn sanitize_filename(file_path: &str, mode: FilenameSanitization) -> String {
    match mode {
        FilenameSanitization::SpecialCharsToUnderscore => {
            collapse_runs(&replace_special_chars(file_path, "_"), '_')
        }
        FilenameSanitization::SpecialCharsToDash => {
            collapse_runs(&replace_special_chars(file_path, "-"), '-')
        }
        FilenameSanitization::SpecialCharsToEmpty => replace_special_chars(file_path, ""),
        FilenameSanitization::Urlencode => map_last_segment(file_path, |segment| {
            utf8_percent_encode(segment, URLENCODE_SET)
                .to_string()
                .replace("%20", "+")
        })
        .replace("%23", "#"),
        FilenameSanitization::Rawurlencode => map_last_segment(file_path, |segment| {
            utf8_percent_encode(segment, RAWURLENCODE_SET).to_string()
        })
        .replace("%23", "#"),
        FilenameSanitization::Md5 => {
            let (rest, fragment) = match file_path.split_once('#') {
                Some((rest, fragment)) => (rest, Some(fragment)),
                None => (file_path, None),
            };
            let path_only = rest.split('?').next().unwrap_or(rest);
            let extension = last_segment(path_only)
                .rsplit_once('.')
                .map(|(_, ext)| ext.to_string())
                .unwrap_or_default();

            let mut hashed = map_last_segment(rest, |segment| {
                if extension.is_empty() {
                    md5_hex(segment)
                } else {
                    format!("{}.{}", md5_hex(segment), extension)
                }
            });
            if let Some(fragment) = fragment {
                hashed.push('#');
                hashed.push_str(fragment);
            }
            hashed
        }
    }
}

fn replace_special_chars(input: &str, replacement: &str) -> String {
    SPECIAL_CHARS
        .iter()
        .fold(input.to_string(), |acc, special| acc.replace(special, replacement))
}

fn collapse_runs(input: &str, c: char) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        if ch == c && out.ends_with(c) {
            continue;
        }
        out.push(ch);
    }
    out
}

fn last_segment(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Rewrites the part after the last `/`
fn map_last_segment(path: &str, f: impl FnOnce(&str) -> String) -> String {
    let (dir, segment) = match path.rfind('/') {
        Some(idx) => path.split_at(idx + 1),
        None => ("", path),
    };
    if segment.is_empty() {
        return path.to_string();
    }
    format!("{}{}", dir, f(segment))
}

/// Splits `start.ext` where ext is 1-10 ASCII alphanumerics
fn split_extension(path: &str) -> Option<(&str, &str)> {
    let (start, extension) = path.rsplit_once('.')?;
    let valid = !start.is_empty()
        && (1..=10).contains(&extension.len())
        && extension.chars().all(|c| c.is_ascii_alphanumeric());
    valid.then_some((start, extension))
}

fn shorten_long_basename(file_path: &str, extension: Option<&str>, limit: usize) -> String {
    if strip_fragment(file_path).len() <= limit {
        return file_path.to_string();
    }

    let basename = last_segment(file_path);
    if basename.len() <= SHORTENABLE_BASENAME_LENGTH {
        return file_path.to_string();
    }

    let extension = extension
        .map(str::to_string)
        .or_else(|| basename.rsplit_once('.').map(|(_, ext)| ext.to_string()))
        .unwrap_or_default();
    let mut short = md5_hex(basename);
    short.truncate(10);
    if !extension.is_empty() {
        short.push('.');
        short.push_str(&extension);
    }

    tracing::debug!(path = %file_path, short = %short, "Shortening long file name");
    let dir = &file_path[..file_path.len() - basename.len()];
    format!("{}{}", dir, short)
}

fn suffix_file_like_directories(file_path: &str) -> String {
    let segments: Vec<&str> = file_path.split('/').collect();
    let last = segments.len().saturating_sub(1);

    segments
        .iter()
        .enumerate()
        .map(|(i, segment)| {
            if i < last && looks_like_file(segment) {
                format!("{}_", segment)
            } else {
                segment.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn looks_like_file(segment: &str) -> bool {
    match segment.rsplit_once('.') {
        Some((stem, ext)) => {
            !stem.is_empty()
                && !stem.ends_with('.')
                && FILE_LIKE_DIR_EXTENSIONS
                    .iter()
                    .any(|known| known.eq_ignore_ascii_case(ext))
        }
        None => false,
    }
}

fn append_html_to_dynamic_extension(file_path: String) -> String {
    let is_dynamic = file_path
        .rsplit_once('.')
        .is_some_and(|(_, ext)| DYNAMIC_EXTENSIONS.iter().any(|d| d.eq_ignore_ascii_case(ext)));
    if is_dynamic {
        format!("{}.html", file_path)
    } else {
        file_path
    }
}

/// Drops a non-empty `#fragment`
fn strip_fragment(file_path: &str) -> &str {
    match file_path.split_once('#') {
        Some((rest, fragment)) if !fragment.is_empty() => rest,
        _ => file_path,
    }
}

fn url_decode(input: &str) -> String {
    percent_decode_str(&input.replace('+', " "))
        .decode_utf8_lossy()
        .into_owned()
}

fn html_decode(input: &str) -> String {
    input
        .replace("&quot;", "\"")
        .replace("&#039;", "'")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}
