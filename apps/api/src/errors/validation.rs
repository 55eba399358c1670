//! Field-level validation detail carried by `VALIDATION_ERROR` responses.

use serde::Serialize;

use super::error_code::ErrorCode;

/// One entry of the envelope's `errors` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
    pub code: ErrorCode,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>, code: ErrorCode) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            code,
        }
    }

    pub fn required(field: impl Into<String>) -> Self {
        let field = field.into();
        let message = format!("{field} is required");
        Self::new(field, message, ErrorCode::Required)
    }
}

/// Semantic rules applied after a request body deserialized successfully.
///
/// Implementors push one `FieldError` per violated rule; an empty list
/// means the value is acceptable.
pub trait Validate {
    fn validate(&self) -> Vec<FieldError>;
}

/// Collects field errors with small helpers for common rules.
#[derive(Debug, Default)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn require_non_empty(&mut self, field: &str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.0.push(FieldError::required(field));
        }
        self
    }

    pub fn push(&mut self, error: FieldError) -> &mut Self {
        self.0.push(error);
        self
    }

    pub fn into_vec(self) -> Vec<FieldError> {
        self.0
    }
}

/// Best-effort field name from a serde_json data error message.
///
/// serde reports shape problems as "missing field `x`", "unknown field `x`"
/// or "invalid type: ... expected ..."; the first two name the field.
pub(crate) fn field_error_from_serde(message: &str) -> FieldError {
    if let Some(field) = backticked_after(message, "missing field ") {
        return FieldError::required(field);
    }
    if let Some(field) = backticked_after(message, "unknown field ") {
        return FieldError::new(
            field,
            format!("{field} is not allowed"),
            ErrorCode::UnknownField,
        );
    }

    // serde_json appends " at line L column C"; strip it for clients
    let trimmed = message
        .rsplit_once(" at line ")
        .map(|(head, _)| head)
        .unwrap_or(message);
    FieldError::new("body", trimmed, ErrorCode::InvalidType)
}

fn backticked_after<'a>(message: &'a str, prefix: &str) -> Option<&'a str> {
    let rest = &message[message.find(prefix)? + prefix.len()..];
    let rest = rest.strip_prefix('`')?;
    let end = rest.find('`')?;
    Some(&rest[..end])
}
