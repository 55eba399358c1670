use std::error::Error as StdError;

use actix_web::error::ResponseError;
use actix_web::http::{header, StatusCode};
use actix_web::HttpResponse;
use serde::Serialize;
use thiserror::Error;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::auth::jwt::TokenError;
use crate::errors::validation::field_error_from_serde;
use crate::errors::{ErrorCode, FieldError, StorageError};
use crate::infra::db_errors::map_db_err;
use crate::trace_ctx;

/// Generic message sent instead of internal detail when it must not leak.
pub const REDACTED_INTERNAL_MESSAGE: &str = "An unexpected error occurred";

type BoxedSource = Box<dyn StdError + Send + Sync + 'static>;

/// How much internal detail an error response may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exposure {
    /// Development: real 5xx messages and the `stack` field.
    Full,
    /// Everything else: generic 5xx message, no `stack`.
    Redacted,
}

/// Client-visible error envelope.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelope {
    pub success: bool,
    pub message: String,
    pub code: ErrorCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Unauthorized: {detail}")]
    Unauthorized {
        detail: String,
        reason: Option<FieldError>,
    },
    #[error("Forbidden: {detail}")]
    Forbidden { detail: String },
    #[error("Validation error: {detail}")]
    Validation {
        detail: String,
        errors: Vec<FieldError>,
    },
    #[error("Bad request: {detail}")]
    BadRequest { detail: String },
    #[error("Not found: {detail}")]
    NotFound { detail: String },
    #[error("Conflict: {detail}")]
    Conflict { detail: String },
    #[error("Too many requests: {detail}")]
    TooManyRequests {
        detail: String,
        retry_after_secs: Option<u64>,
    },
    #[error("Internal error: {detail}")]
    Internal {
        detail: String,
        #[source]
        source: Option<BoxedSource>,
    },
}

impl AppError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Unauthorized { .. } => ErrorCode::Unauthorized,
            AppError::Forbidden { .. } => ErrorCode::Forbidden,
            AppError::Validation { .. } => ErrorCode::ValidationError,
            AppError::BadRequest { .. } => ErrorCode::BadRequest,
            AppError::NotFound { .. } => ErrorCode::NotFound,
            AppError::Conflict { .. } => ErrorCode::Conflict,
            AppError::TooManyRequests { .. } => ErrorCode::TooManyRequests,
            AppError::Internal { .. } => ErrorCode::InternalServerError,
        }
    }

    /// Get the HTTP status code for this error
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            AppError::Forbidden { .. } => StatusCode::FORBIDDEN,
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::TooManyRequests { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Unredacted detail, for logs only.
    pub fn detail(&self) -> &str {
        match self {
            AppError::Unauthorized { detail, .. }
            | AppError::Forbidden { detail }
            | AppError::Validation { detail, .. }
            | AppError::BadRequest { detail }
            | AppError::NotFound { detail }
            | AppError::Conflict { detail }
            | AppError::TooManyRequests { detail, .. }
            | AppError::Internal { detail, .. } => detail,
        }
    }

    /// Message as shown to clients under the given exposure.
    pub fn public_message(&self, exposure: Exposure) -> String {
        match (self, exposure) {
            (AppError::Internal { .. }, Exposure::Redacted) => {
                REDACTED_INTERNAL_MESSAGE.to_string()
            }
            _ => self.detail().to_string(),
        }
    }

    pub fn field_errors(&self) -> Option<Vec<FieldError>> {
        match self {
            AppError::Validation { errors, .. } => Some(errors.clone()),
            AppError::Unauthorized {
                reason: Some(reason),
                ..
            } => Some(vec![reason.clone()]),
            _ => None,
        }
    }

    fn stack(&self) -> String {
        let mut chain = format!("{self}");
        let mut source = self.source();
        while let Some(cause) = source {
            chain.push_str("\ncaused by: ");
            chain.push_str(&cause.to_string());
            source = cause.source();
        }
        chain
    }

    pub fn envelope(&self, exposure: Exposure, request_id: Option<String>) -> ErrorEnvelope {
        ErrorEnvelope {
            success: false,
            message: self.public_message(exposure),
            code: self.code(),
            errors: self.field_errors(),
            timestamp: OffsetDateTime::now_utc()
                .format(&Rfc3339)
                .unwrap_or_default(),
            request_id,
            stack: match exposure {
                Exposure::Full => Some(self.stack()),
                Exposure::Redacted => None,
            },
        }
    }

    /// Build the HTTP response for this error.
    pub fn render(&self, exposure: Exposure) -> HttpResponse {
        let envelope = self.envelope(exposure, trace_ctx::current());

        let mut builder = HttpResponse::build(self.status());
        match self {
            AppError::Unauthorized { .. } => {
                builder.insert_header((header::WWW_AUTHENTICATE, "Bearer"));
            }
            AppError::TooManyRequests {
                retry_after_secs: Some(secs),
                ..
            } => {
                builder.insert_header((header::RETRY_AFTER, secs.to_string()));
            }
            _ => {}
        }
        builder.json(envelope)
    }

    pub fn unauthorized(detail: impl Into<String>) -> Self {
        Self::Unauthorized {
            detail: detail.into(),
            reason: None,
        }
    }

    pub fn missing_credential() -> Self {
        Self::Unauthorized {
            detail: "Authentication required".to_string(),
            reason: Some(FieldError::new(
                "token",
                "No access token provided",
                ErrorCode::MissingCredential,
            )),
        }
    }

    pub fn forbidden(detail: impl Into<String>) -> Self {
        Self::Forbidden {
            detail: detail.into(),
        }
    }

    pub fn validation(errors: Vec<FieldError>) -> Self {
        Self::Validation {
            detail: "Request validation failed".to_string(),
            errors,
        }
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::BadRequest {
            detail: detail.into(),
        }
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::NotFound {
            detail: detail.into(),
        }
    }

    pub fn conflict(detail: impl Into<String>) -> Self {
        Self::Conflict {
            detail: detail.into(),
        }
    }

    pub fn too_many_requests(retry_after_secs: Option<u64>) -> Self {
        Self::TooManyRequests {
            detail: "Too many requests, please try again later".to_string(),
            retry_after_secs,
        }
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self::Internal {
            detail: detail.into(),
            source: None,
        }
    }

    pub fn internal_with_source(
        detail: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::Internal {
            detail: detail.into(),
            source: Some(Box::new(source)),
        }
    }
}

impl From<TokenError> for AppError {
    fn from(e: TokenError) -> Self {
        let reason = match &e {
            TokenError::Invalid => {
                FieldError::new("token", "Invalid token", ErrorCode::InvalidToken)
            }
            TokenError::Expired { expired_at } => {
                let message = expired_at
                    .and_then(|ts| OffsetDateTime::from_unix_timestamp(ts).ok())
                    .and_then(|at| at.format(&Rfc3339).ok())
                    .map(|at| format!("Token expired at {at}"))
                    .unwrap_or_else(|| "Token expired".to_string());
                FieldError::new("token", message, ErrorCode::TokenExpired)
            }
        };
        let detail = match e {
            TokenError::Invalid => "Invalid token",
            TokenError::Expired { .. } => "Token expired",
        };
        AppError::Unauthorized {
            detail: detail.to_string(),
            reason: Some(reason),
        }
    }
}

impl From<StorageError> for AppError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::UniqueViolation(detail) => AppError::conflict(detail),
            StorageError::RecordNotFound(detail) => AppError::not_found(detail),
            StorageError::ForeignKeyViolation(detail) => AppError::bad_request(detail),
            StorageError::Unavailable(_) | StorageError::Other(_) => {
                let detail = e.to_string();
                AppError::internal_with_source(detail, e)
            }
        }
    }
}

impl From<sea_orm::DbErr> for AppError {
    fn from(e: sea_orm::DbErr) -> Self {
        map_db_err(e).into()
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        match e.classify() {
            serde_json::error::Category::Data => {
                AppError::validation(vec![field_error_from_serde(&e.to_string())])
            }
            serde_json::error::Category::Syntax => {
                AppError::bad_request(format!("Invalid JSON at line {}", e.line()))
            }
            serde_json::error::Category::Eof => {
                AppError::bad_request("Invalid JSON: unexpected end of input")
            }
            serde_json::error::Category::Io => {
                AppError::bad_request("Invalid JSON: I/O error while reading body")
            }
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        self.status()
    }

    // Redacted by default; `ErrorNormalizer` re-renders with the configured exposure.
    fn error_response(&self) -> HttpResponse {
        self.render(Exposure::Redacted)
    }
}
