// Role and owner-or-admin checks layered behind the mandatory gate.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use actix_http::Request;
use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::{header, StatusCode};
use actix_web::{test, web, App, Error, HttpRequest, HttpResponse};
use api_test_support::assert_error_envelope;
use wellness_api::{
    AppConfig, AppError, AppState, AuthGate, ErrorNormalizer, Exposure, OwnerOrAdmin,
    RequestTrace, RequireRole, Role, RuntimeEnv,
};

use crate::support::app_builder::test_config;
use crate::support::auth::access_token_for;

async fn ok() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "success": true }))
}

async fn resolve_goal_owner(req: HttpRequest) -> Result<String, AppError> {
    match req.match_info().get("goal_id") {
        Some("goal-1") => Ok("owner-1".to_string()),
        Some("goal-broken") => Err(AppError::internal("owner lookup failed")),
        _ => Err(AppError::not_found("Goal not found")),
    }
}

async fn authz_app(
    config: AppConfig,
    resolver_calls: Arc<AtomicUsize>,
) -> impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = Error> {
    let resolver = move |req: HttpRequest| {
        resolver_calls.fetch_add(1, Ordering::SeqCst);
        resolve_goal_owner(req)
    };

    test::init_service(
        App::new()
            .app_data(web::Data::new(AppState::new(config)))
            .service(
                web::resource("/records/clinical")
                    .wrap(RequireRole::any_of([Role::Doctor, Role::Admin]))
                    .wrap(AuthGate::required())
                    .route(web::get().to(ok)),
            )
            .service(
                web::resource("/goals/{goal_id}")
                    .wrap(OwnerOrAdmin::new(resolver))
                    .wrap(AuthGate::required())
                    .route(web::get().to(ok)),
            )
            .wrap(ErrorNormalizer::new(Exposure::Redacted))
            .wrap(RequestTrace),
    )
    .await
}

fn get_as(uri: &str, token: &str) -> Request {
    test::TestRequest::get()
        .uri(uri)
        .insert_header((header::AUTHORIZATION, format!("Bearer {token}")))
        .to_request()
}

#[actix_web::test]
async fn role_outside_allowed_set_is_forbidden() {
    let config = test_config(RuntimeEnv::Production);
    let patient = access_token_for(&config, "patient-1", Role::Patient);
    let app = authz_app(config, Arc::default()).await;

    let resp = test::call_service(&app, get_as("/records/clinical", &patient)).await;
    assert_error_envelope(resp, StatusCode::FORBIDDEN, "FORBIDDEN").await;
}

#[actix_web::test]
async fn any_allowed_role_is_admitted() {
    let config = test_config(RuntimeEnv::Production);
    let doctor = access_token_for(&config, "doc-1", Role::Doctor);
    let admin = access_token_for(&config, "admin-1", Role::Admin);
    let app = authz_app(config, Arc::default()).await;

    for token in [doctor, admin] {
        let resp = test::call_service(&app, get_as("/records/clinical", &token)).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }
}

#[actix_web::test]
async fn unauthenticated_caller_gets_401_not_403() {
    let app = authz_app(test_config(RuntimeEnv::Production), Arc::default()).await;

    for uri in ["/records/clinical", "/goals/goal-1"] {
        let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        assert_error_envelope(resp, StatusCode::UNAUTHORIZED, "UNAUTHORIZED").await;
    }
}

#[actix_web::test]
async fn owner_is_admitted_and_stranger_is_forbidden() {
    let config = test_config(RuntimeEnv::Production);
    let owner = access_token_for(&config, "owner-1", Role::Patient);
    let stranger = access_token_for(&config, "someone-else", Role::Patient);
    let app = authz_app(config, Arc::default()).await;

    let resp = test::call_service(&app, get_as("/goals/goal-1", &owner)).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = test::call_service(&app, get_as("/goals/goal-1", &stranger)).await;
    assert_error_envelope(resp, StatusCode::FORBIDDEN, "FORBIDDEN").await;
}

#[actix_web::test]
async fn admin_bypasses_ownership_without_resolving_owner() {
    let config = test_config(RuntimeEnv::Production);
    let admin = access_token_for(&config, "admin-1", Role::Admin);
    let calls = Arc::new(AtomicUsize::new(0));
    let app = authz_app(config, Arc::clone(&calls)).await;

    let resp = test::call_service(&app, get_as("/goals/goal-1", &admin)).await;
    assert_eq!(resp.status(), StatusCode::OK);

    // Admins pass even where the owner would not resolve.
    let resp = test::call_service(&app, get_as("/goals/goal-missing", &admin)).await;
    assert_eq!(resp.status(), StatusCode::OK);

    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[actix_web::test]
async fn resolver_failures_propagate_unchanged() {
    let config = test_config(RuntimeEnv::Production);
    let user = access_token_for(&config, "owner-1", Role::User);
    let calls = Arc::new(AtomicUsize::new(0));
    let app = authz_app(config, Arc::clone(&calls)).await;

    let resp = test::call_service(&app, get_as("/goals/goal-missing", &user)).await;
    assert_error_envelope(resp, StatusCode::NOT_FOUND, "NOT_FOUND").await;

    let resp = test::call_service(&app, get_as("/goals/goal-broken", &user)).await;
    let envelope =
        assert_error_envelope(resp, StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_SERVER_ERROR")
            .await;
    assert_ne!(envelope.message, "owner lookup failed");

    assert_eq!(calls.load(Ordering::SeqCst), 2);
}
