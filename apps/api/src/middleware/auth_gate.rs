//! Builds the request identity context from the bearer credential.
//!
//! `AuthGate::required()` rejects requests without a valid access token.
//! `AuthGate::optional()` lets them through unauthenticated, including when a
//! credential is present but fails verification.

use actix_web::body::EitherBody;
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{web, Error, HttpMessage};
use futures_util::future::{ready, LocalBoxFuture, Ready};
use futures_util::FutureExt;
use tracing::debug;

use crate::auth::credentials::extract_credential;
use crate::auth::jwt::TokenError;
use crate::auth::{AuthContext, GateState, TokenClass};
use crate::error::AppError;
use crate::logging::security;
use crate::middleware::client_addr::origin;
use crate::state::app_state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateMode {
    Required,
    Optional,
}

#[derive(Debug, Clone, Copy)]
pub struct AuthGate {
    mode: GateMode,
}

impl AuthGate {
    pub fn required() -> Self {
        Self {
            mode: GateMode::Required,
        }
    }

    pub fn optional() -> Self {
        Self {
            mode: GateMode::Optional,
        }
    }

    pub fn mode(&self) -> GateMode {
        self.mode
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthGate
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthGateMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthGateMiddleware {
            service,
            mode: self.mode,
        }))
    }
}

pub struct AuthGateMiddleware<S> {
    service: S,
    mode: GateMode,
}

fn advance(state: &mut GateState, next: GateState, path: &str) {
    debug!(from = %state, to = %next, path, "auth gate transition");
    *state = next;
}

fn token_failure_reason(e: &TokenError) -> &'static str {
    match e {
        TokenError::Invalid => "invalid_token",
        TokenError::Expired { .. } => "token_expired",
    }
}

/// Run the gate for one request. `Ok(None)` means continue unauthenticated.
fn authenticate(req: &ServiceRequest, mode: GateMode) -> Result<Option<AuthContext>, AppError> {
    let path = req.path().to_string();
    let mut state = GateState::Unchecked;

    advance(&mut state, GateState::Extracting, &path);
    let Some(credential) = extract_credential(req.request()) else {
        advance(&mut state, GateState::Rejected, &path);
        return match mode {
            GateMode::Required => {
                security::auth_failed("missing_credential", &path, &origin(req.request()));
                Err(AppError::missing_credential())
            }
            GateMode::Optional => Ok(None),
        };
    };

    advance(&mut state, GateState::Verifying, &path);
    let app_state = req
        .app_data::<web::Data<AppState>>()
        .ok_or_else(|| AppError::internal("AppState not available"))?;

    match app_state.tokens.verify(&credential.token, TokenClass::Access) {
        Ok(claims) => {
            advance(&mut state, GateState::Authenticated, &path);
            Ok(Some(AuthContext::new(claims)))
        }
        Err(e) => {
            advance(&mut state, GateState::Rejected, &path);
            match mode {
                GateMode::Required => {
                    security::auth_failed(token_failure_reason(&e), &path, &origin(req.request()));
                    Err(e.into())
                }
                GateMode::Optional => {
                    debug!(
                        reason = token_failure_reason(&e),
                        source = credential.source.as_str(),
                        "optional auth ignored unusable credential"
                    );
                    Ok(None)
                }
            }
        }
    }
}

impl<S, B> Service<ServiceRequest> for AuthGateMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        match authenticate(&req, self.mode) {
            Ok(context) => {
                if let Some(ctx) = context {
                    req.extensions_mut().insert(ctx);
                }
                self.service
                    .call(req)
                    .map(|res| res.map(ServiceResponse::map_into_left_body))
                    .boxed_local()
            }
            // Rejection rides on the response so the normalizer can read the request.
            Err(e) => Box::pin(ready(Ok(req.error_response(e).map_into_right_body()))),
        }
    }
}
