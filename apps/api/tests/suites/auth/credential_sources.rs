// Credential lookup order as seen through the HTTP surface.

use actix_web::cookie::Cookie;
use actix_web::http::{header, StatusCode};
use actix_web::test;
use api_test_support::assert_error_envelope;
use wellness_api::Role;

use crate::common::json_body;
use crate::support::app_builder::TestAppBuilder;
use crate::support::auth::access_token_for;

#[actix_web::test]
async fn access_cookie_authenticates() {
    let builder = TestAppBuilder::new().rate_limiting(false);
    let token = access_token_for(&builder.state().config, "cookie-user", Role::User);
    let app = builder.build().await;

    let req = test::TestRequest::get()
        .uri("/api/auth/me")
        .cookie(Cookie::new("access_token", token))
        .to_request();
    let body = json_body(test::call_service(&app, req).await).await;
    assert_eq!(body["data"]["userId"], "cookie-user");
}

#[actix_web::test]
async fn query_parameter_authenticates() {
    let builder = TestAppBuilder::new().rate_limiting(false);
    let token = access_token_for(&builder.state().config, "query-user", Role::User);
    let app = builder.build().await;

    let req = test::TestRequest::get()
        .uri(&format!("/api/auth/me?token={token}"))
        .to_request();
    let body = json_body(test::call_service(&app, req).await).await;
    assert_eq!(body["data"]["userId"], "query-user");
}

#[actix_web::test]
async fn header_takes_precedence_over_cookie() {
    let builder = TestAppBuilder::new().rate_limiting(false);
    let config = builder.state().config;
    let header_token = access_token_for(&config, "header-user", Role::User);
    let cookie_token = access_token_for(&config, "cookie-user", Role::User);
    let app = builder.build().await;

    let req = test::TestRequest::get()
        .uri("/api/auth/me")
        .insert_header((header::AUTHORIZATION, format!("Bearer {header_token}")))
        .cookie(Cookie::new("access_token", cookie_token))
        .to_request();
    let body = json_body(test::call_service(&app, req).await).await;
    assert_eq!(body["data"]["userId"], "header-user");
}

#[actix_web::test]
async fn bad_bearer_token_does_not_fall_back_to_cookie() {
    let builder = TestAppBuilder::new().rate_limiting(false);
    let cookie_token = access_token_for(&builder.state().config, "cookie-user", Role::User);
    let app = builder.build().await;

    let req = test::TestRequest::get()
        .uri("/api/auth/me")
        .insert_header((header::AUTHORIZATION, "Bearer tampered"))
        .cookie(Cookie::new("access_token", cookie_token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_error_envelope(resp, StatusCode::UNAUTHORIZED, "UNAUTHORIZED").await;
}

#[actix_web::test]
async fn non_bearer_scheme_is_skipped() {
    let builder = TestAppBuilder::new().rate_limiting(false);
    let cookie_token = access_token_for(&builder.state().config, "cookie-user", Role::User);
    let app = builder.build().await;

    let req = test::TestRequest::get()
        .uri("/api/auth/me")
        .insert_header((header::AUTHORIZATION, "Basic dXNlcjpwYXNz"))
        .cookie(Cookie::new("access_token", cookie_token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}
