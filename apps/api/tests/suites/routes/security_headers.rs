use actix_web::http::{header, Method, StatusCode};
use actix_web::test;

use crate::support::app_builder::create_test_app;

const HARDENING: &[(&str, &str)] = &[
    ("x-content-type-options", "nosniff"),
    ("x-frame-options", "DENY"),
    ("referrer-policy", "strict-origin-when-cross-origin"),
];

#[actix_web::test]
async fn success_and_error_responses_are_hardened() {
    let app = create_test_app().await;

    for uri in ["/api/auth/session", "/api/auth/me", "/api/missing"] {
        let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        for (name, value) in HARDENING {
            assert_eq!(resp.headers().get(*name).unwrap(), value, "{name} on {uri}");
        }
        assert!(resp.headers().contains_key("strict-transport-security"));
        assert!(resp.headers().contains_key("content-security-policy"));
        assert_eq!(resp.headers().get(header::CACHE_CONTROL).unwrap(), "no-store");
    }
}

#[actix_web::test]
async fn allowed_origin_gets_credentialed_cors() {
    let app = create_test_app().await;

    let req = test::TestRequest::get()
        .uri("/api/auth/session")
        .insert_header((header::ORIGIN, "http://localhost:3000"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "http://localhost:3000"
    );
    assert_eq!(
        resp.headers().get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
        "true"
    );
}

#[actix_web::test]
async fn preflight_allows_authorization_header() {
    let app = create_test_app().await;

    let req = test::TestRequest::default()
        .method(Method::OPTIONS)
        .uri("/api/auth/me")
        .insert_header((header::ORIGIN, "http://localhost:3000"))
        .insert_header((header::ACCESS_CONTROL_REQUEST_METHOD, "GET"))
        .insert_header((header::ACCESS_CONTROL_REQUEST_HEADERS, "authorization"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let allowed = resp
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_HEADERS)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();
    assert!(allowed.contains("authorization"), "allow-headers: {allowed}");
}

#[actix_web::test]
async fn unknown_origin_gets_no_cors_grant() {
    let app = create_test_app().await;

    let req = test::TestRequest::get()
        .uri("/api/auth/session")
        .insert_header((header::ORIGIN, "https://evil.example"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}
