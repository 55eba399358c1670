//! Task-local request correlation context.
//!
//! `RequestTrace` establishes the scope for every inbound request, so any
//! code running inside the request future (error rendering, storage error
//! translation, security logging) can read the correlation id without it
//! being threaded through every signature.

use std::cell::RefCell;

use tokio::task_local;

task_local! {
    static REQUEST_ID: RefCell<Option<String>>;
}

/// Correlation id for the current task, or "unknown" outside a request.
pub fn trace_id() -> String {
    current().unwrap_or_else(|| "unknown".to_string())
}

/// Correlation id for the current task, if one was established.
pub fn current() -> Option<String> {
    REQUEST_ID
        .try_with(|cell| cell.borrow().as_ref().cloned())
        .ok()
        .flatten()
}

/// Run a future with `request_id` as its correlation id.
pub async fn with_trace_id<F, R>(request_id: String, future: F) -> R
where
    F: std::future::Future<Output = R>,
{
    REQUEST_ID.scope(RefCell::new(Some(request_id)), future).await
}
