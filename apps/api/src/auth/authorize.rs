//! Role and ownership checks over an established identity context.

use std::future::Future;

use crate::auth::claims::{AuthContext, Role};
use crate::logging::security;
use crate::AppError;

/// Pass iff there is an identity whose role is in `allowed`.
pub fn require_role(ctx: Option<&AuthContext>, allowed: &[Role]) -> Result<(), AppError> {
    let ctx = ctx.ok_or_else(AppError::missing_credential)?;

    if allowed.contains(&ctx.role()) {
        return Ok(());
    }

    security::access_denied(ctx.user_id(), "role_not_permitted");
    Err(AppError::forbidden("Insufficient permissions"))
}

/// Pass iff the caller is an admin or owns the resource.
///
/// Admins never trigger the owner lookup. Lookup failures are returned as-is.
pub async fn require_owner_or_admin<F, Fut>(
    ctx: Option<&AuthContext>,
    resolve_owner: F,
) -> Result<(), AppError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<String, AppError>>,
{
    let ctx = ctx.ok_or_else(AppError::missing_credential)?;

    if ctx.is_admin() {
        return Ok(());
    }

    let owner_id = resolve_owner().await?;
    if owner_id == ctx.user_id() {
        return Ok(());
    }

    security::access_denied(ctx.user_id(), "not_resource_owner");
    Err(AppError::forbidden("You do not have access to this resource"))
}
