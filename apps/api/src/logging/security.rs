use tracing::warn;

use crate::logging::pii::Redacted;
use crate::trace_ctx;

/// Log a rejected credential (missing, invalid or expired).
pub fn auth_failed(reason: &str, path: &str, origin: &str) {
    let trace_id = trace_ctx::trace_id();

    warn!(
        event = "SECURITY_AUTH_FAILED",
        %trace_id,
        reason,
        path,
        origin = %Redacted(origin),
        "Authentication failure"
    );
}

/// Log an authenticated caller being refused by a role or ownership check.
pub fn access_denied(user_id: &str, reason: &str) {
    let trace_id = trace_ctx::trace_id();

    warn!(
        event = "SECURITY_ACCESS_DENIED",
        %trace_id,
        user_id,
        reason,
        "Authorization failure"
    );
}

/// Log a request turned away by a rate policy.
pub fn rate_limit_hit(policy: &str, origin: &str, method: &str, path: &str, user_id: Option<&str>) {
    let trace_id = trace_ctx::trace_id();

    warn!(
        event = "SECURITY_RATE_LIMIT_HIT",
        %trace_id,
        policy,
        origin = %Redacted(origin),
        method,
        path,
        user_id = user_id.unwrap_or("anonymous"),
        "Rate limit exceeded"
    );
}
