// Unit tests for error mapping - pure conversions without HTTP round-trips
use crate::auth::jwt::TokenError;
use crate::errors::StorageError;
use crate::{AppError, ErrorCode};

#[test]
fn maps_unique_violation_to_409() {
    let app: AppError = StorageError::UniqueViolation("email exists".into()).into();
    assert_eq!(app.code(), ErrorCode::Conflict);
    assert_eq!(app.status().as_u16(), 409);
}

#[test]
fn maps_missing_record_to_404() {
    let app: AppError = StorageError::RecordNotFound("no goal".into()).into();
    assert_eq!(app.code(), ErrorCode::NotFound);
    assert_eq!(app.status().as_u16(), 404);
}

#[test]
fn maps_foreign_key_violation_to_400() {
    let app: AppError = StorageError::ForeignKeyViolation("no user".into()).into();
    assert_eq!(app.code(), ErrorCode::BadRequest);
    assert_eq!(app.status().as_u16(), 400);
}

#[test]
fn maps_unavailable_storage_to_500() {
    let app: AppError = StorageError::Unavailable("down".into()).into();
    assert_eq!(app.code(), ErrorCode::InternalServerError);
    assert_eq!(app.status().as_u16(), 500);
    assert!(matches!(app, AppError::Internal { source: Some(_), .. }));
}

#[test]
fn maps_db_err_through_storage_error() {
    let app: AppError = sea_orm::DbErr::RecordNotFound("plans".into()).into();
    assert_eq!(app.status().as_u16(), 404);
}

#[test]
fn maps_token_errors_to_401_with_distinct_detail_codes() {
    let invalid: AppError = TokenError::Invalid.into();
    let expired: AppError = TokenError::Expired { expired_at: None }.into();

    assert_eq!(invalid.status().as_u16(), 401);
    assert_eq!(expired.status().as_u16(), 401);
    assert_eq!(invalid.code(), ErrorCode::Unauthorized);
    assert_eq!(expired.code(), ErrorCode::Unauthorized);

    assert_eq!(invalid.field_errors().unwrap()[0].code, ErrorCode::InvalidToken);
    assert_eq!(expired.field_errors().unwrap()[0].code, ErrorCode::TokenExpired);
}

#[test]
fn maps_json_syntax_to_bad_request_and_shape_to_validation() {
    #[derive(Debug, serde::Deserialize)]
    #[allow(dead_code)]
    struct Body {
        goal: String,
    }

    let syntax = serde_json::from_str::<Body>(r#"{"goal": }"#).unwrap_err();
    let app: AppError = syntax.into();
    assert_eq!(app.code(), ErrorCode::BadRequest);

    let shape = serde_json::from_str::<Body>(r#"{}"#).unwrap_err();
    let app: AppError = shape.into();
    assert_eq!(app.code(), ErrorCode::ValidationError);
    let fields = app.field_errors().unwrap();
    assert_eq!(fields[0].field, "goal");
    assert_eq!(fields[0].code, ErrorCode::Required);
}
