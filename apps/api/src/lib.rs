#![deny(clippy::wildcard_imports)]
#![cfg_attr(test, allow(clippy::wildcard_imports))]

pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod errors;
pub mod extractors;
pub mod infra;
pub mod logging;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod telemetry;
pub mod trace_ctx;


pub use app::build_app;
pub use auth::jwt::{IssuedToken, TokenCodec, TokenError, TokenPair};
pub use auth::{AuthContext, Identity, IdentityClaims, Role, TokenClass};
pub use config::{AppConfig, ConfigError, RuntimeEnv};
pub use error::{AppError, ErrorEnvelope, Exposure};
pub use errors::{ErrorCode, FieldError, StorageError, Validate};
pub use extractors::{Authenticated, MaybeAuthenticated, ValidatedJson};
pub use middleware::{
    AuthGate, ErrorNormalizer, OwnerOrAdmin, RateLimitAudit, RateLimits, RatePolicy,
    RequestTrace, RequireRole, SecurityHeaders, StructuredLogger, TraceSpan,
};
pub use state::{AppState, SecurityConfig};

// Auto-initialize logging for unit tests
#[cfg(test)]
#[ctor::ctor]
fn init_test_logging() {
    test_bootstrap::logging::init();
}
