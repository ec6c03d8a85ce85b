//! Input validation for values injected into the tree
//!
//! Two checks gate every substitution the list renderer performs:
//! [`Validators::validate_url`] for media sources and
//! [`Validators::validate_security_xss`] for markup. Hosts with their own
//! policy implement [`Validators`]; [`DefaultValidators`] is used otherwise.

use std::sync::OnceLock;

use regex::RegexSet;
use url::Url;

/// URL and markup safety checks
pub trait Validators {
    /// True if `value` is an acceptable media source / link target
    fn validate_url(&self, value: &str) -> bool;

    /// True if `value` is safe to insert as markup
    fn validate_security_xss(&self, value: &str) -> bool;
}

/// Schemes accepted for absolute URLs
const URL_SCHEMES: &[&str] = &["http", "https", "data", "blob"];

const XSS_PATTERNS: &[&str] = &[
    r"(?i)<\s*/?\s*(script|iframe|object|embed|frame|frameset|meta|link|base|style)\b",
    r"(?i)(javascript|vbscript|livescript)\s*:",
    r"(?i)\bon[a-z]+\s*=",
    r"(?i)\bsrcdoc\s*=",
    r"(?i)data\s*:\s*text/html",
    r"(?i)expression\s*\(",
];

static XSS_SET: OnceLock<Option<RegexSet>> = OnceLock::new();

/// Built-in validators
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultValidators;

impl Validators for DefaultValidators {
    fn validate_url(&self, value: &str) -> bool {
        let value = value.trim();
        if value.is_empty() || value.chars().any(char::is_whitespace) {
            return false;
        }
        match Url::parse(value) {
            Ok(url) => {
                URL_SCHEMES.contains(&url.scheme())
                    && (url.cannot_be_a_base() || url.host_str().is_some_and(|h| !h.is_empty()))
            }
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                value.starts_with('/') || value.starts_with("./") || value.starts_with("../")
            }
            Err(_) => false,
        }
    }

    fn validate_security_xss(&self, value: &str) -> bool {
        match XSS_SET.get_or_init(|| RegexSet::new(XSS_PATTERNS).ok()) {
            Some(set) => !set.is_match(value),
            None => false,
        }
    }
}

/// Display text for a label, shortening URLs to `host/…/last-segment`
pub fn choose_presentation(validators: &dyn Validators, label: &str) -> String {
    if !validators.validate_url(label) {
        return label.to_string();
    }
    let Ok(url) = Url::parse(label.trim()) else {
        return label.to_string();
    };
    let Some(host) = url.host_str() else {
        return label.to_string();
    };
    let host = host.strip_prefix("www.").unwrap_or(host);
    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();
    match segments.as_slice() {
        [] => host.to_string(),
        [only] => format!("{host}/{only}"),
        [.., last] => format!("{host}/…/{last}"),
    }
}
