//! Assertions for the client error envelope.

use actix_web::body::MessageBody;
use actix_web::dev::ServiceResponse;
use actix_web::http::StatusCode;
use serde::Deserialize;

/// Mirror of the API's error envelope.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelopeLike {
    pub success: bool,
    pub message: String,
    pub code: String,
    #[serde(default)]
    pub errors: Option<Vec<FieldErrorLike>>,
    pub timestamp: String,
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default)]
    pub stack: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FieldErrorLike {
    pub field: String,
    pub message: String,
    pub code: String,
}

impl ErrorEnvelopeLike {
    /// First field-level code, if any.
    pub fn first_field_code(&self) -> Option<&str> {
        self.errors
            .as_ref()
            .and_then(|errors| errors.first())
            .map(|e| e.code.as_str())
    }
}

/// Assert that `resp` is an error envelope with the given status and code,
/// whose `requestId` matches the `x-request-id` header.
pub async fn assert_error_envelope<B>(
    resp: ServiceResponse<B>,
    expected_status: StatusCode,
    expected_code: &str,
) -> ErrorEnvelopeLike
where
    B: MessageBody,
{
    assert_eq!(resp.status(), expected_status, "unexpected status");

    let header_id = resp
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let content_type = resp
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(
        content_type.starts_with("application/json"),
        "error responses must be JSON, got '{content_type}'"
    );

    let body = actix_web::test::read_body(resp).await;
    let envelope: ErrorEnvelopeLike = serde_json::from_slice(&body).unwrap_or_else(|e| {
        panic!(
            "body is not an error envelope ({e}): {}",
            String::from_utf8_lossy(&body)
        )
    });

    assert!(!envelope.success);
    assert_eq!(envelope.code, expected_code);
    assert!(!envelope.timestamp.is_empty());
    if let Some(header_id) = header_id {
        assert_eq!(
            envelope.request_id.as_deref(),
            Some(header_id.as_str()),
            "requestId in body should match x-request-id header"
        );
    }

    envelope
}
