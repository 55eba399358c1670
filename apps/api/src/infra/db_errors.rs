//! SeaORM -> StorageError translation helpers.
//!
//! Repositories should convert `sea_orm::DbErr` into
//! `crate::errors::StorageError` here, and higher layers can then map
//! `StorageError` to `AppError` via `From`.

use tracing::{error, warn};

use crate::errors::StorageError;
use crate::logging::pii::Redacted;
use crate::trace_ctx;

fn mentions_sqlstate(msg: &str, code: &str) -> bool {
    msg.contains(code) || msg.contains(&format!("SQLSTATE({code})"))
}

/// Extract table.column from SQLite "UNIQUE constraint failed: table.column" messages.
fn extract_sqlite_table_column(error_msg: &str) -> Option<&str> {
    let prefix = error_msg.find("UNIQUE constraint failed: ")?;
    let rest = &error_msg[prefix + "UNIQUE constraint failed: ".len()..];
    rest.split_whitespace().next()
}

/// Extract the constraint name from PostgreSQL "violates ... constraint \"name\"" messages.
fn extract_postgres_constraint(error_msg: &str) -> Option<&str> {
    let start = error_msg.find("constraint \"")? + "constraint \"".len();
    let rest = &error_msg[start..];
    let end = rest.find('"')?;
    Some(&rest[..end])
}

fn unique_detail(error_msg: &str) -> String {
    if let Some(table_column) = extract_sqlite_table_column(error_msg) {
        // users.email -> "email"
        let column = table_column.rsplit('.').next().unwrap_or(table_column);
        return format!("A record with this {column} already exists");
    }
    if let Some(constraint) = extract_postgres_constraint(error_msg) {
        if constraint.ends_with("_email_key") {
            return "A record with this email already exists".to_string();
        }
    }
    "A record with these values already exists".to_string()
}

/// Translate a `DbErr` into a `StorageError` with sanitized, PII-safe detail.
pub fn map_db_err(e: sea_orm::DbErr) -> StorageError {
    let error_msg = e.to_string();
    let trace_id = trace_ctx::trace_id();

    match &e {
        sea_orm::DbErr::RecordNotFound(_) => {
            return StorageError::RecordNotFound("Record not found".to_string());
        }
        sea_orm::DbErr::ConnectionAcquire(_) | sea_orm::DbErr::Conn(_) => {
            warn!(trace_id = %trace_id, raw_error = %Redacted(&error_msg), "Database unavailable");
            return StorageError::Unavailable("Database unavailable".to_string());
        }
        _ => {}
    }

    if mentions_sqlstate(&error_msg, "23505")
        || error_msg.contains("duplicate key value violates unique constraint")
        || error_msg.contains("UNIQUE constraint failed")
    {
        warn!(trace_id = %trace_id, raw_error = %Redacted(&error_msg), "Unique constraint violation");
        return StorageError::UniqueViolation(unique_detail(&error_msg));
    }

    if mentions_sqlstate(&error_msg, "23503")
        || error_msg.contains("violates foreign key constraint")
        || error_msg.contains("FOREIGN KEY constraint failed")
    {
        warn!(trace_id = %trace_id, raw_error = %Redacted(&error_msg), "Foreign key constraint violation");
        return StorageError::ForeignKeyViolation(
            "Referenced record does not exist".to_string(),
        );
    }

    if error_msg.contains("pool timed out") || error_msg.contains("connection refused") {
        warn!(trace_id = %trace_id, raw_error = %Redacted(&error_msg), "Database timeout or pool issue");
        return StorageError::Unavailable("Database unavailable".to_string());
    }

    error!(trace_id = %trace_id, raw_error = %Redacted(&error_msg), "Unhandled database error");
    StorageError::Other("Database operation failed".to_string())
}
