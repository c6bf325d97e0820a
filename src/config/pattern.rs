//! User-supplied regular expressions and replace rules
//!
//! Patterns may be given either plain (`^/blog/`) or delimited with flags
//! (`/^\/blog\//i`), the way they are usually written in crawler configs.

use crate::ConfigError;
use regex::Regex;

/// Compiles a plain or delimited (`/pattern/flags`) regular expression
///
/// Supported delimiters are `/`, `#`, `~` and `%`. Flags `i`, `m`, `s`,
/// `x` and `U` map to the inline flags of the same name; others are ignored.
///
/// # Examples
///
/// ```
/// use site_mirror::config::compile_user_regex;
///
/// let re = compile_user_regex("/^\\/BLOG\\//i").unwrap();
/// assert!(re.is_match("/blog/post"));
///
/// let re = compile_user_regex("\\.pdf$").unwrap();
/// assert!(re.is_match("/files/a.pdf"));
/// ```
pub fn compile_user_regex(pattern: &str) -> Result<Regex, ConfigError> {
    let source = match split_delimited(pattern) {
        Some((body, flags)) => {
            let inline: String = flags
                .chars()
                .filter(|c| matches!(c, 'i' | 'm' | 's' | 'x' | 'U'))
                .collect();
            if inline.is_empty() {
                body.to_string()
            } else {
                format!("(?{}){}", inline, body)
            }
        }
        None => pattern.to_string(),
    };

    Regex::new(&source).map_err(|e| ConfigError::InvalidRegex {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })
}

/// Compiles a list of patterns, failing on the first invalid one
pub fn compile_user_regexes(patterns: &[String]) -> Result<Vec<Regex>, ConfigError> {
    patterns.iter().map(|p| compile_user_regex(p)).collect()
}

/// Returns `(body, flags)` when the pattern is wrapped in delimiters
fn split_delimited(pattern: &str) -> Option<(&str, &str)> {
    let delimiter = pattern.chars().next()?;
    if !matches!(delimiter, '/' | '#' | '~' | '%') {
        return None;
    }
    let end = pattern.rfind(delimiter)?;
    if end == 0 {
        return None;
    }
    let flags = &pattern[end + 1..];
    if !flags.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    Some((&pattern[1..end], flags))
}

/// One `from -> to` rewrite applied to query strings before they become
/// part of a mirror file name
#[derive(Debug, Clone)]
pub enum ReplaceRule {
    Literal { from: String, to: String },
    Pattern { regex: Regex, to: String },
}

impl ReplaceRule {
    /// Parses a rule such as `utm_[a-z]+=[^&]* -> ` or `/(\d+)/ -> n$1`
    pub fn parse(rule: &str) -> Result<Self, ConfigError> {
        let (from, to) = match rule.split_once("->") {
            Some((from, to)) => (from.trim(), to.trim()),
            None => (rule.trim(), ""),
        };

        if from.is_empty() {
            return Err(ConfigError::Validation(format!(
                "Replace rule '{}' has an empty left side",
                rule
            )));
        }

        if split_delimited(from).is_some() {
            Ok(Self::Pattern {
                regex: compile_user_regex(from)?,
                to: braced_group_refs(to),
            })
        } else {
            Ok(Self::Literal {
                from: from.to_string(),
                to: to.to_string(),
            })
        }
    }

    pub fn apply(&self, input: &str) -> String {
        match self {
            Self::Literal { from, to } => input.replace(from.as_str(), to),
            Self::Pattern { regex, to } => regex.replace_all(input, to.as_str()).into_owned(),
        }
    }
}

/// Parses every rule in order
pub fn parse_replace_rules(rules: &[String]) -> Result<Vec<ReplaceRule>, ConfigError> {
    rules.iter().map(|r| ReplaceRule::parse(r)).collect()
}

/// Rewrites `$1` and `\1` group references to `${1}`
fn braced_group_refs(replacement: &str) -> String {
    let mut out = String::with_capacity(replacement.len() + 4);
    let mut chars = replacement.chars().peekable();

    while let Some(c) = chars.next() {
        let is_ref = matches!(c, '$' | '\\') && chars.peek().is_some_and(|n| n.is_ascii_digit());
        if !is_ref {
            out.push(c);
            continue;
        }
        let mut group = String::new();
        while let Some(d) = chars.peek().copied().filter(|d| d.is_ascii_digit()) {
            group.push(d);
            chars.next();
        }
        out.push_str("${");
        out.push_str(&group);
        out.push('}');
    }

    out
}
