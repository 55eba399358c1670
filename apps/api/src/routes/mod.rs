use actix_web::web;

use crate::middleware::rate_limit::{RateLimitAudit, RateLimits, RatePolicy};

pub mod auth;
pub mod health;

/// Register every route. `/health` is never rate limited; everything under
/// `/api` counts against the global origin quota in addition to any
/// per-route policy.
pub fn configure(cfg: &mut web::ServiceConfig, limits: &RateLimits) {
    cfg.service(web::scope("/health").configure(health::configure_routes));

    cfg.service(
        web::scope("/api")
            .wrap(limits.limiter(RatePolicy::Global))
            .wrap(RateLimitAudit)
            .service(web::scope("/auth").configure(|c| auth::configure_routes(c, limits))),
    );
}
