//! URL relativization engine
//!
//! Rewrites a link found on one crawled page into a relative reference to
//! the file the target is stored under in the offline mirror. The mirror
//! keeps the seed host at its root and every other host under a `_host/`
//! directory, so the number of `../` hops depends on how the target, the
//! linking page and the seed relate (see [`TargetDomainRelation`]).
//!
//! Each step works on an immutable [`ParsedUrl`] and records itself in the
//! value's trace, visible with `RUST_LOG=site_mirror=trace`.

use super::sanitize::{query_hash, sanitize_file_path, ExportSettings};
use crate::url::{is_requestable_resource, DomainPolicy, ParsedUrl, TargetDomainRelation};

/// HTML attribute a reference was found in
///
/// Used as a hint when the target URL has no extension: images linked by
/// `src`/`srcset` must not end up as `.html` files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceAttribute {
    Href,
    Src,
    Srcset,
}

impl SourceAttribute {
    fn is_image(&self) -> bool {
        matches!(self, Self::Src | Self::Srcset)
    }
}

/// Result of one relativization
#[derive(Debug, Clone)]
pub struct RelativeUrl {
    /// Reference to write into the mirrored page
    pub path: String,
    pub relation: TargetDomainRelation,
    /// Target after every applied step, with its trace
    pub rewritten: ParsedUrl,
}

/// Relativizes links for one mirror
#[derive(Debug, Clone)]
pub struct Relativizer<P: DomainPolicy> {
    initial: ParsedUrl,
    policy: P,
    settings: ExportSettings,
}

impl<P: DomainPolicy> Relativizer<P> {
    pub fn new(initial: ParsedUrl, policy: P, settings: ExportSettings) -> Self {
        Self {
            initial,
            policy,
            settings,
        }
    }

    pub fn initial(&self) -> &ParsedUrl {
        &self.initial
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    pub fn settings(&self) -> &ExportSettings {
        &self.settings
    }

    /// Converts `target`, found on page `base`, to a mirror-relative reference
    ///
    /// # Arguments
    ///
    /// * `base` - Absolute URL of the page containing the link
    /// * `target` - The link as written in the page (absolute or relative)
    /// * `hint` - Attribute the link was found in, if known
    /// * `keep_fragment` - Whether `#fragment` is kept in the result
    ///
    /// # Examples
    ///
    /// ```
    /// use site_mirror::export::{ExportSettings, Relativizer, SourceAttribute};
    /// use site_mirror::url::{DomainAllowList, ParsedUrl};
    ///
    /// let relativizer = Relativizer::new(
    ///     ParsedUrl::parse("https://example.com/"),
    ///     DomainAllowList::default(),
    ///     ExportSettings::default(),
    /// );
    /// let base = ParsedUrl::parse("https://example.com/a/b/c");
    /// let target = ParsedUrl::parse("/x");
    ///
    /// let relative = relativizer.relativize(&base, &target, Some(SourceAttribute::Href), true);
    /// assert_eq!(relative.path, "../../x.html");
    /// ```
    pub fn relativize(
        &self,
        base: &ParsedUrl,
        target: &ParsedUrl,
        hint: Option<SourceAttribute>,
        keep_fragment: bool,
    ) -> RelativeUrl {
        let relation = TargetDomainRelation::classify(&self.initial, base, target);

        if let Some(forced) = self.forced_url(target, relation, hint) {
            tracing::trace!(target = %target, forced = %forced, "Reference kept as is");
            return RelativeUrl {
                path: forced,
                relation,
                rewritten: target.clone(),
            };
        }

        let rewritten = self.with_file_name(target, hint);
        let rewritten = apply_depth(&self.initial, base, rewritten, relation);
        let path = sanitize_file_path(
            &rewritten.full_url(false, keep_fragment),
            keep_fragment,
            &self.settings,
        );

        tracing::trace!(
            target = %target,
            relation = %relation,
            steps = ?rewritten.trace(),
            path = %path,
            "Relativized"
        );

        RelativeUrl {
            path,
            relation,
            rewritten,
        }
    }

    /// References that cannot or must not point into the mirror
    fn forced_url(
        &self,
        target: &ParsedUrl,
        relation: TargetDomainRelation,
        hint: Option<SourceAttribute>,
    ) -> Option<String> {
        if target.is_only_fragment() {
            return Some(format!("#{}", target.fragment().unwrap_or_default()));
        }

        let foreign_scheme = target
            .scheme()
            .is_some_and(|scheme| scheme != "http" && scheme != "https");
        if foreign_scheme || !is_requestable_resource(target.url()) {
            return Some(target.url().to_string());
        }

        let host = target.host().filter(|_| relation.is_external())?;

        let mirrored = self.policy.is_external_domain_allowed_for_crawling(host)
            || (target.is_static_file() && self.policy.is_domain_allowed_for_static_files(host))
            || (!target.is_static_file()
                && hint == Some(SourceAttribute::Src)
                && self.policy.is_domain_allowed_for_static_files(host));

        (!mirrored).then(|| target.full_url(true, true))
    }

    /// Gives the target a file name with extension, folding the query into it
    fn with_file_name(&self, target: &ParsedUrl, hint: Option<SourceAttribute>) -> ParsedUrl {
        let hash = target
            .query()
            .filter(|q| !q.is_empty())
            .map(|q| query_hash(q, &self.settings.replace_rules));

        if target.path().trim_matches(|c| c == '/' || c == ' ').is_empty() {
            return match hash {
                Some(hash) => target
                    .with_path(
                        format!("/index.{}.html", hash),
                        "Empty path with query, use hashed index",
                    )
                    .with_query(None, "Query folded into file name"),
                None if target.path().is_empty() && target.fragment().is_some() => target.clone(),
                None => target.with_path("/index.html", "Empty path, use index"),
            };
        }

        let extension = match target.extension() {
            Some(ext) => ext.to_string(),
            None if hint.is_some_and(|h| h.is_image()) => {
                if target.full_url(true, true).to_lowercase().contains("icon") {
                    "svg".to_string()
                } else {
                    "jpg".to_string()
                }
            }
            None if hint == Some(SourceAttribute::Href)
                && target.url().to_lowercase().contains("fonts.googleapis.com/css") =>
            {
                "css".to_string()
            }
            None => "html".to_string(),
        };

        let suffix = match &hash {
            Some(hash) => format!("{}.{}", hash, extension),
            None => extension,
        };

        let path = if target.path().ends_with('/') {
            format!("{}index.{}", target.path(), suffix)
        } else {
            format!("{}.{}", strip_extension(target.path()), suffix)
        };

        let named = target.with_path(path, "Add file name and extension");
        if hash.is_some() {
            named.with_query(None, "Query folded into file name")
        } else {
            named
        }
    }
}

/// Number of directories below the mirror root a page path lives in
pub fn base_depth(base: &ParsedUrl) -> usize {
    base.path()
        .trim_start_matches(|c| c == '/' || c == ' ')
        .matches('/')
        .count()
}

/// Adds the `../` hops that lead from the linking page to the target
fn apply_depth(
    initial: &ParsedUrl,
    base: &ParsedUrl,
    target: ParsedUrl,
    relation: TargetDomainRelation,
) -> ParsedUrl {
    let depth = base_depth(base);

    let target = match relation {
        TargetDomainRelation::InitialSameBaseSame | TargetDomainRelation::InitialDifferentBaseSame => {
            if target.path().starts_with('/') {
                target.change_depth(depth, "Root-relative path, climb to host root")
            } else {
                target
            }
        }
        TargetDomainRelation::InitialSameBaseDifferent => {
            let path = format!(
                "{}{}",
                "../".repeat(depth + 1),
                target.path().trim_start_matches(|c| c == '/' || c == ' ')
            );
            target.with_path(path, "Backlink to the seed host, climb to mirror root")
        }
        TargetDomainRelation::InitialDifferentBaseDifferent => {
            let extra = usize::from(base.host() != initial.host());
            let path = format!(
                "{}_{}{}",
                "../".repeat(depth + extra),
                target.host().unwrap_or_default(),
                target.path()
            );
            target.with_path(path, "Foreign host, climb to mirror root and enter its directory")
        }
    };

    if target.path().starts_with('/') {
        let path = target
            .path()
            .trim_start_matches(|c| c == '/' || c == ' ')
            .to_string();
        target.with_path(path, "Remove leading slash")
    } else {
        target
    }
}

/// Removes a trailing `.ext` of 1-10 ASCII alphanumerics
fn strip_extension(path: &str) -> &str {
    let segment_start = path.rfind('/').map_or(0, |i| i + 1);
    match path[segment_start..].rfind('.') {
        Some(dot) => {
            let ext = &path[segment_start + dot + 1..];
            if (1..=10).contains(&ext.len()) && ext.chars().all(|c| c.is_ascii_alphanumeric()) {
                &path[..segment_start + dot]
            } else {
                path
            }
        }
        None => path,
    }
}
