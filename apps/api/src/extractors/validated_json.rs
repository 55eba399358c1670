use std::ops::{Deref, DerefMut};

use actix_web::dev::Payload;
use actix_web::http::header;
use actix_web::{FromRequest, HttpRequest};
use bytes::BytesMut;
use futures_util::future::LocalBoxFuture;
use futures_util::StreamExt;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::AppError;
use crate::errors::Validate;
use crate::logging::pii::Redacted;
use crate::trace_ctx;

/// Upper bound on buffered request bodies.
pub const MAX_BODY_BYTES: usize = 256 * 1024;

/// JSON body that has been deserialized and passed its `Validate` rules.
///
/// Syntax errors become `BAD_REQUEST`; shape errors and rule violations
/// become `VALIDATION_ERROR` with a field list.
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

impl<T> ValidatedJson<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for ValidatedJson<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> DerefMut for ValidatedJson<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

/// Deserialize and validate a raw JSON body.
pub fn parse_validated<T>(body: &[u8]) -> Result<T, AppError>
where
    T: DeserializeOwned + Validate,
{
    let value = serde_json::from_slice::<T>(body).map_err(|e| {
        debug!(
            trace_id = %trace_ctx::trace_id(),
            error = %Redacted(&e.to_string()),
            body_size = body.len(),
            "JSON parsing failed"
        );
        AppError::from(e)
    })?;

    let errors = value.validate();
    if errors.is_empty() {
        Ok(value)
    } else {
        Err(AppError::validation(errors))
    }
}

impl<T> FromRequest for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + 'static,
{
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let is_json = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|ct| ct.to_str().ok())
            .map(|ct| ct.starts_with("application/json"))
            .unwrap_or(false);
        let mut payload = payload.take();

        Box::pin(async move {
            if !is_json {
                return Err(AppError::bad_request(
                    "Content-Type must be application/json",
                ));
            }

            let mut body = BytesMut::new();
            while let Some(chunk) = payload.next().await {
                let chunk = chunk.map_err(|e| {
                    warn!(
                        trace_id = %trace_ctx::trace_id(),
                        error = %e,
                        "Failed to read request body chunk"
                    );
                    AppError::bad_request("Failed to read request body")
                })?;
                if body.len() + chunk.len() > MAX_BODY_BYTES {
                    return Err(AppError::bad_request("Request body too large"));
                }
                body.extend_from_slice(&chunk);
            }

            parse_validated(&body).map(ValidatedJson)
        })
    }
}
