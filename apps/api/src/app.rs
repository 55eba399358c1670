use actix_web::body::MessageBody;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{web, App, Error};

use crate::error::AppError;
use crate::extractors::validated_json::MAX_BODY_BYTES;
use crate::middleware::{
    cors_middleware, ErrorNormalizer, RateLimits, RequestTrace, SecurityHeaders,
    StructuredLogger, TraceSpan,
};
use crate::routes;
use crate::state::app_state::AppState;

async fn route_not_found() -> Result<web::Json<()>, AppError> {
    Err(AppError::not_found("Route not found"))
}

/// Assemble the application with its full middleware pipeline.
///
/// Outermost first: request id, span, access log, security headers, error
/// normalizer, CORS, then per-scope rate limiters and auth gates.
pub fn build_app(
    state: web::Data<AppState>,
    limits: RateLimits,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = Error,
        InitError = (),
    >,
> {
    let exposure = state.exposure();
    let cors = cors_middleware(&state.config.cors_allowed_origins);

    App::new()
        .app_data(state)
        .app_data(web::JsonConfig::default().limit(MAX_BODY_BYTES))
        .configure(|cfg| routes::configure(cfg, &limits))
        .default_service(web::to(route_not_found))
        .wrap(cors)
        .wrap(ErrorNormalizer::new(exposure))
        .wrap(SecurityHeaders)
        .wrap(StructuredLogger)
        .wrap(TraceSpan)
        .wrap(RequestTrace)
}
