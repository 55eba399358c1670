use actix_web::{web, HttpResponse};
use serde::Serialize;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::error::AppError;
use crate::state::app_state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReadinessResponse {
    status: &'static str,
    environment: &'static str,
    app_version: &'static str,
    rate_limiting: bool,
    time: String,
}

async fn liveness() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

async fn readiness(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let time = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .map_err(|e| AppError::internal_with_source("Failed to format time", e))?;

    Ok(HttpResponse::Ok().json(ReadinessResponse {
        status: "ready",
        environment: app_state.env().as_str(),
        app_version: env!("CARGO_PKG_VERSION"),
        rate_limiting: app_state.config.rate_limit_enabled,
        time,
    }))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("", web::get().to(liveness))
        .route("/ready", web::get().to(readiness));
}
