//! Masking of personal data and credentials before they reach log output.

use std::fmt;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

const TOKEN_MASK: &str = "[REDACTED_TOKEN]";

// Three base64url segments separated by dots.
#[allow(clippy::unwrap_used)]
static JWT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Za-z0-9_-]{8,}\.[A-Za-z0-9_-]{8,}\.[A-Za-z0-9_-]{8,}\b").unwrap());

#[allow(clippy::unwrap_used)]
static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{1,}\b").unwrap());

// Long opaque runs: base64/base64url secrets, hex digests, session ids.
#[allow(clippy::unwrap_used)]
static OPAQUE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[A-Za-z0-9+/_-]{24,}={0,2}").unwrap());

fn mask_email(caps: &Captures) -> String {
    let full = &caps[0];
    match full.split_once('@') {
        Some((local, domain)) => match local.chars().next() {
            Some(first) => format!("{first}***@{domain}"),
            None => format!("@{domain}"),
        },
        None => full.to_string(),
    }
}

/// Mask signed tokens, emails and opaque secrets in `input`.
///
/// Tokens are replaced before emails so a JWT payload is never partially
/// rewritten.
pub fn redact(input: &str) -> String {
    let without_jwts = JWT.replace_all(input, TOKEN_MASK);
    let without_emails = EMAIL.replace_all(&without_jwts, mask_email);
    OPAQUE.replace_all(&without_emails, TOKEN_MASK).into_owned()
}

/// Display wrapper applying [`redact`] when formatted.
pub struct Redacted<'a>(pub &'a str);

impl fmt::Display for Redacted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&redact(self.0))
    }
}

impl fmt::Debug for Redacted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&redact(self.0))
    }
}
