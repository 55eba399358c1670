//! Locating the bearer credential on an inbound request.
//!
//! Search order (first match wins): `Authorization: Bearer`, the
//! `access_token` cookie, then the `token` query parameter. Extraction never
//! fails; a malformed source is skipped.

use std::collections::HashMap;

use actix_web::http::header;
use actix_web::{web, HttpRequest};

pub const ACCESS_COOKIE: &str = "access_token";
pub const REFRESH_COOKIE: &str = "refresh_token";
pub const TOKEN_QUERY_PARAM: &str = "token";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Header,
    Cookie,
    Query,
    Body,
}

impl CredentialSource {
    pub const fn as_str(&self) -> &'static str {
        match self {
            CredentialSource::Header => "header",
            CredentialSource::Cookie => "cookie",
            CredentialSource::Query => "query",
            CredentialSource::Body => "body",
        }
    }
}

/// An unverified token and where it was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub token: String,
    pub source: CredentialSource,
}

impl Credential {
    fn new(token: impl Into<String>, source: CredentialSource) -> Self {
        Self {
            token: token.into(),
            source,
        }
    }
}

pub fn extract_credential(req: &HttpRequest) -> Option<Credential> {
    bearer_from_header(req.headers().get(header::AUTHORIZATION))
        .map(|t| Credential::new(t, CredentialSource::Header))
        .or_else(|| {
            cookie_value(req, ACCESS_COOKIE).map(|t| Credential::new(t, CredentialSource::Cookie))
        })
        .or_else(|| {
            token_from_query(req.query_string())
                .map(|t| Credential::new(t, CredentialSource::Query))
        })
}

/// Refresh token from the request body field, else the `refresh_token` cookie.
pub fn extract_refresh_credential(
    req: &HttpRequest,
    body_token: Option<&str>,
) -> Option<Credential> {
    body_token
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| Credential::new(t, CredentialSource::Body))
        .or_else(|| {
            cookie_value(req, REFRESH_COOKIE).map(|t| Credential::new(t, CredentialSource::Cookie))
        })
}

fn bearer_from_header(value: Option<&header::HeaderValue>) -> Option<String> {
    let raw = value?.to_str().ok()?;
    let mut parts = raw.split_whitespace();
    let scheme = parts.next()?;
    let token = parts.next()?;
    if parts.next().is_some() || !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    Some(token.to_string())
}

fn cookie_value(req: &HttpRequest, name: &str) -> Option<String> {
    req.cookie(name)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}

fn token_from_query(query: &str) -> Option<String> {
    if query.is_empty() {
        return None;
    }
    let params = web::Query::<HashMap<String, String>>::from_query(query).ok()?;
    params
        .get(TOKEN_QUERY_PARAM)
        .cloned()
        .filter(|value| !value.is_empty())
}
