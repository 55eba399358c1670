pub mod auth_gate;
pub mod authorize;
pub mod client_addr;
pub mod cors;
pub mod error_normalizer;
pub mod rate_limit;
pub mod request_trace;
pub mod security_headers;
pub mod structured_logger;
pub mod trace_span;

pub use auth_gate::AuthGate;
pub use authorize::{OwnerOrAdmin, RequireRole};
pub use cors::cors_middleware;
pub use error_normalizer::ErrorNormalizer;
pub use rate_limit::{RateLimitAudit, RateLimits, RatePolicy};
pub use request_trace::RequestTrace;
pub use security_headers::SecurityHeaders;
pub use structured_logger::StructuredLogger;
pub use trace_span::TraceSpan;
