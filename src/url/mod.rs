//! URL handling module for site-mirror
//!
//! This module provides the structural URL model, frontier fingerprints,
//! wildcard host matching, the domain relation classifier and the domain
//! allow-list capability used by the relativization engine.

mod domain;
mod fingerprint;
mod matcher;
mod normalize;
mod parsed;

// Re-export main types and functions
pub use domain::{extract_domain, DomainAllowList, DomainPolicy, TargetDomainRelation};
pub use fingerprint::{md5_hex, Fingerprint};
pub use matcher::matches_wildcard;
pub use normalize::{is_requestable_resource, normalize_url};
pub use parsed::ParsedUrl;
