//! Single boundary turning every failure into the client error envelope.
//!
//! Handles both `Err` results from inner services and responses that carry an
//! attached error (how actix represents handler and extractor failures).
//! `AppError`s keep their code and status; foreign actix errors are mapped.
//! Headers added by inner layers survive the rewrite.
//! Successful responses and hand-built responses pass through untouched.

use actix_web::body::{BoxBody, MessageBody};
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::error::{
    InternalError, JsonPayloadError, PathError, PayloadError, QueryPayloadError, UrlencodedError,
};
use actix_web::http::header::{HeaderMap, HeaderName, CONTENT_LENGTH, CONTENT_TYPE};
use actix_web::http::StatusCode;
use actix_web::{Error, HttpMessage, HttpResponse};
use futures_util::future::{ready, LocalBoxFuture, Ready};
use tracing::{error, warn};

use crate::auth::AuthContext;
use crate::error::{AppError, Exposure};
use crate::errors::validation::field_error_from_serde;
use crate::middleware::client_addr::origin;
use crate::trace_ctx;

#[derive(Debug, Clone, Copy)]
pub struct ErrorNormalizer {
    exposure: Exposure,
}

impl ErrorNormalizer {
    pub fn new(exposure: Exposure) -> Self {
        Self { exposure }
    }
}

impl<S, B> Transform<S, ServiceRequest> for ErrorNormalizer
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type InitError = ();
    type Transform = ErrorNormalizerMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ErrorNormalizerMiddleware {
            service,
            exposure: self.exposure,
        }))
    }
}

pub struct ErrorNormalizerMiddleware<S> {
    service: S,
    exposure: Exposure,
}

/// Request facts captured before the request is handed downstream.
struct RequestFacts {
    method: String,
    path: String,
    origin: String,
}

impl<S, B> Service<ServiceRequest> for ErrorNormalizerMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // Owned facts only: a cloned HttpRequest held across the inner call
        // would break the router's exclusive access to the request.
        let facts = RequestFacts {
            method: req.method().to_string(),
            path: req.path().to_string(),
            origin: origin(req.request()),
        };
        let exposure = self.exposure;
        let fut = self.service.call(req);

        Box::pin(async move {
            match fut.await {
                Ok(res) => {
                    let normalized = res.response().error().map(|err| {
                        let user_id = res
                            .request()
                            .extensions()
                            .get::<AuthContext>()
                            .map(|ctx| ctx.user_id().to_string());
                        normalize(err, res.status(), &facts, user_id.as_deref(), exposure)
                    });
                    match normalized {
                        Some(mut response) => {
                            carry_headers(res.headers(), response.headers_mut());
                            Ok(res.into_response(response))
                        }
                        None => Ok(res.map_into_boxed_body()),
                    }
                }
                // Inner services report rejections as responses; an `Err` here
                // has no request left to attach to, so actix renders the
                // envelope built below.
                Err(err) => {
                    let status = err.as_response_error().status_code();
                    let response = normalize(&err, status, &facts, None, exposure);
                    Err(InternalError::from_response(err, response).into())
                }
            }
        })
    }
}

/// Keep headers set by inner layers (rate-limit counters, cookies) on the
/// rendered envelope. Headers the envelope sets itself win.
fn carry_headers(from: &HeaderMap, to: &mut HeaderMap) {
    let rendered: Vec<HeaderName> = to.keys().cloned().collect();
    for (name, value) in from {
        if name == CONTENT_TYPE || name == CONTENT_LENGTH || rendered.contains(name) {
            continue;
        }
        to.append(name.clone(), value.clone());
    }
}

fn normalize(
    err: &Error,
    status: StatusCode,
    facts: &RequestFacts,
    user_id: Option<&str>,
    exposure: Exposure,
) -> HttpResponse {
    let render = |app: &AppError| {
        log_failure(app, facts, user_id);
        app.render(exposure)
    };

    match err.as_error::<AppError>() {
        Some(app) => render(app),
        None => render(&from_foreign(err, status)),
    }
}

/// Map errors raised by actix itself (extractors, routing, CORS) into `AppError`.
pub fn from_foreign(err: &Error, status: StatusCode) -> AppError {
    if let Some(json) = err.as_error::<JsonPayloadError>() {
        return match json {
            JsonPayloadError::Deserialize(e) if e.is_data() => {
                AppError::validation(vec![field_error_from_serde(&e.to_string())])
            }
            JsonPayloadError::Overflow { .. } | JsonPayloadError::OverflowKnownLength { .. } => {
                AppError::bad_request("Request body too large")
            }
            JsonPayloadError::ContentType => {
                AppError::bad_request("Content-Type must be application/json")
            }
            _ => AppError::bad_request("Malformed JSON body"),
        };
    }
    if let Some(query) = err.as_error::<QueryPayloadError>() {
        return AppError::validation(vec![field_error_from_serde(&query.to_string())]);
    }
    if err.as_error::<PathError>().is_some() {
        return AppError::bad_request("Invalid path parameter");
    }
    if err.as_error::<UrlencodedError>().is_some() || err.as_error::<PayloadError>().is_some() {
        return AppError::bad_request("Malformed request body");
    }

    match status {
        StatusCode::UNAUTHORIZED => AppError::unauthorized("Authentication required"),
        StatusCode::FORBIDDEN => AppError::forbidden(err.to_string()),
        StatusCode::NOT_FOUND => AppError::not_found("Resource not found"),
        StatusCode::CONFLICT => AppError::conflict(err.to_string()),
        StatusCode::TOO_MANY_REQUESTS => AppError::too_many_requests(None),
        s if s.is_client_error() => AppError::bad_request(err.to_string()),
        _ => AppError::internal(err.to_string()),
    }
}

fn log_failure(app: &AppError, facts: &RequestFacts, user_id: Option<&str>) {
    let status = app.status().as_u16();
    let code = app.code();
    let request_id = trace_ctx::trace_id();
    let user_id = user_id.unwrap_or("anonymous");

    if app.status().is_server_error() {
        error!(
            status,
            code = %code,
            message = %app,
            method = %facts.method,
            path = %facts.path,
            origin = %facts.origin,
            request_id = %request_id,
            user_id,
            error = ?app,
            "request failed"
        );
    } else {
        warn!(
            status,
            code = %code,
            message = %app.detail(),
            method = %facts.method,
            path = %facts.path,
            origin = %facts.origin,
            request_id = %request_id,
            user_id,
            "request rejected"
        );
    }
}
