//! Error codes for the wellness API.
//!
//! This module defines all error codes used throughout the application.
//! Add new codes here; never pass ad-hoc strings as error codes.
//!
//! All error codes are SCREAMING_SNAKE_CASE and map 1:1 to the strings
//! that appear in HTTP responses. Clients branch on these, so existing
//! strings must never change.

use core::fmt;

use serde::{Serialize, Serializer};

/// Centralized error codes for the wellness API.
///
/// Top-level codes appear in the envelope `code` field. Detail codes appear
/// in the per-field `errors[].code` entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Top-level taxonomy
    /// No, invalid or expired credential
    Unauthorized,
    /// Known identity lacking the required role or ownership
    Forbidden,
    /// Malformed request shape, with field-level detail
    ValidationError,
    /// Storage-level uniqueness conflict
    Conflict,
    /// Missing resource or route
    NotFound,
    /// Malformed request syntax or dangling reference
    BadRequest,
    /// Rate admission rejected the request
    TooManyRequests,
    /// Unclassified failure
    InternalServerError,

    // Token detail codes
    /// Signature, structure, issuer, audience or class mismatch
    InvalidToken,
    /// Expiry timestamp has passed
    TokenExpired,
    /// No credential found in any transport location
    MissingCredential,

    // Field detail codes
    /// Required field absent or empty
    Required,
    /// Field present but of the wrong shape
    InvalidFormat,
    /// Field has the wrong JSON type
    InvalidType,
    /// Field not accepted by this endpoint
    UnknownField,
}

impl ErrorCode {
    /// Returns the canonical SCREAMING_SNAKE_CASE string for this error code.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::Conflict => "CONFLICT",
            Self::NotFound => "NOT_FOUND",
            Self::BadRequest => "BAD_REQUEST",
            Self::TooManyRequests => "TOO_MANY_REQUESTS",
            Self::InternalServerError => "INTERNAL_SERVER_ERROR",

            Self::InvalidToken => "INVALID_TOKEN",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::MissingCredential => "MISSING_CREDENTIAL",

            Self::Required => "REQUIRED",
            Self::InvalidFormat => "INVALID_FORMAT",
            Self::InvalidType => "INVALID_TYPE",
            Self::UnknownField => "UNKNOWN_FIELD",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
