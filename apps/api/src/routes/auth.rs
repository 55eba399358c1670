use actix_web::cookie::time::Duration as CookieDuration;
use actix_web::cookie::{Cookie, SameSite};
use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::credentials::{extract_refresh_credential, ACCESS_COOKIE, REFRESH_COOKIE};
use crate::auth::jwt::TokenError;
use crate::auth::{Identity, TokenClass};
use crate::config::RuntimeEnv;
use crate::error::AppError;
use crate::errors::{ErrorCode, FieldError, Validate};
use crate::extractors::validated_json::parse_validated;
use crate::extractors::{Authenticated, MaybeAuthenticated};
use crate::logging::security;
use crate::middleware::client_addr::origin;
use crate::middleware::rate_limit::{RateLimitAudit, RateLimits, RatePolicy};
use crate::middleware::AuthGate;
use crate::state::app_state::AppState;

const REFRESH_COOKIE_PATH: &str = "/api/auth";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl Validate for RefreshRequest {
    fn validate(&self) -> Vec<FieldError> {
        match &self.refresh_token {
            Some(token) if token.trim().is_empty() => vec![FieldError::new(
                "refreshToken",
                "refreshToken must not be blank",
                ErrorCode::InvalidFormat,
            )],
            _ => Vec::new(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MeResponse<'a> {
    #[serde(flatten)]
    identity: &'a Identity,
    expires_at: i64,
}

#[derive(Debug, Serialize)]
struct SessionResponse<'a> {
    authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    user: Option<&'a Identity>,
}

fn token_cookie(
    name: &'static str,
    value: String,
    path: &'static str,
    max_age_secs: i64,
    secure: bool,
) -> Cookie<'static> {
    Cookie::build(name, value)
        .path(path)
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(CookieDuration::seconds(max_age_secs))
        .finish()
}

fn secure_cookies(app_state: &AppState) -> bool {
    app_state.env() != RuntimeEnv::Development
}

fn missing_refresh_token() -> AppError {
    AppError::Unauthorized {
        detail: "Refresh token required".to_string(),
        reason: Some(FieldError::new(
            "refreshToken",
            "No refresh token provided",
            ErrorCode::MissingCredential,
        )),
    }
}

/// Exchange a valid refresh token for a new access/refresh pair.
async fn refresh(
    req: HttpRequest,
    body: web::Bytes,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let request: RefreshRequest = if body.iter().all(u8::is_ascii_whitespace) {
        RefreshRequest::default()
    } else {
        parse_validated(&body)?
    };

    let credential = extract_refresh_credential(&req, request.refresh_token.as_deref())
        .ok_or_else(missing_refresh_token)?;

    let claims = app_state
        .tokens
        .verify(&credential.token, TokenClass::Refresh)
        .map_err(|e| {
            let reason = match e {
                TokenError::Invalid => "invalid_refresh_token",
                TokenError::Expired { .. } => "refresh_token_expired",
            };
            security::auth_failed(reason, req.path(), &origin(&req));
            AppError::from(e)
        })?;

    let pair = app_state.tokens.issue_pair(&claims.identity)?;
    info!(user_id = %claims.identity.user_id, "token pair refreshed");

    let security = app_state.tokens.security();
    let secure = secure_cookies(&app_state);
    let refresh_max_age = i64::try_from(security.refresh_ttl.as_secs()).unwrap_or(i64::MAX);

    Ok(HttpResponse::Ok()
        .cookie(token_cookie(
            ACCESS_COOKIE,
            pair.access_token.clone(),
            "/",
            pair.expires_in,
            secure,
        ))
        .cookie(token_cookie(
            REFRESH_COOKIE,
            pair.refresh_token.clone(),
            REFRESH_COOKIE_PATH,
            refresh_max_age,
            secure,
        ))
        .json(serde_json::json!({ "success": true, "data": pair })))
}

/// Clear both token cookies. Works with or without a valid session.
async fn logout(
    auth: MaybeAuthenticated,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    if let Some(ctx) = auth.as_ref() {
        info!(user_id = %ctx.user_id(), "user logged out");
    }

    let secure = secure_cookies(&app_state);
    Ok(HttpResponse::Ok()
        .cookie(token_cookie(ACCESS_COOKIE, String::new(), "/", 0, secure))
        .cookie(token_cookie(
            REFRESH_COOKIE,
            String::new(),
            REFRESH_COOKIE_PATH,
            0,
            secure,
        ))
        .json(serde_json::json!({ "success": true, "message": "Logged out" })))
}

async fn me(auth: Authenticated) -> Result<HttpResponse, AppError> {
    let data = MeResponse {
        identity: &auth.claims.identity,
        expires_at: auth.claims.exp,
    };
    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true, "data": data })))
}

async fn session(auth: MaybeAuthenticated) -> Result<HttpResponse, AppError> {
    let user = auth.as_ref().map(|ctx| &ctx.claims.identity);
    let data = SessionResponse {
        authenticated: user.is_some(),
        user,
    };
    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true, "data": data })))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig, limits: &RateLimits) {
    cfg.service(
        web::resource("/refresh")
            .wrap(limits.limiter(RatePolicy::AuthSensitive))
            .wrap(RateLimitAudit)
            .route(web::post().to(refresh)),
    )
    .service(
        web::resource("/logout")
            .wrap(AuthGate::optional())
            .route(web::post().to(logout)),
    )
    .service(
        web::resource("/me")
            .wrap(AuthGate::required())
            .wrap(limits.limiter(RatePolicy::PerIdentity))
            .wrap(RateLimitAudit)
            .route(web::get().to(me)),
    )
    .service(
        web::resource("/session")
            .wrap(AuthGate::optional())
            .route(web::get().to(session)),
    );
}
