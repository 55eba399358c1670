// Rate admission: quotas, bucket keys, window reset and the test-mode bypass.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use actix_http::Request;
use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::{header, StatusCode};
use actix_web::{test, web, App, Error, HttpResponse};
use api_test_support::assert_error_envelope;
use wellness_api::middleware::rate_limit::KeyBasis;
use wellness_api::{
    AppConfig, AppState, ErrorNormalizer, Exposure, RateLimitAudit, RateLimits, RatePolicy,
    RequestTrace, Role, RuntimeEnv,
};

use crate::support::app_builder::{test_config, TestAppBuilder};
use crate::support::auth::access_token_for;

async fn ok() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "success": true }))
}

/// Minimal app mounting each `(path, policy)` pair behind its own limiter.
async fn limited_app(
    config: AppConfig,
    routes: Vec<(&'static str, RatePolicy)>,
) -> impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = Error> {
    let limits = RateLimits::new(true, Exposure::Redacted);
    test::init_service(
        App::new()
            .app_data(web::Data::new(AppState::new(config)))
            .configure(|cfg| {
                for (path, policy) in routes {
                    cfg.service(
                        web::resource(path)
                            .wrap(limits.limiter(policy))
                            .wrap(RateLimitAudit)
                            .route(web::get().to(ok)),
                    );
                }
            })
            .wrap(ErrorNormalizer::new(Exposure::Redacted))
            .wrap(RequestTrace),
    )
    .await
}

/// Request arriving over a TCP connection from `origin`.
fn from_origin(method: test::TestRequest, uri: &str, origin: &str) -> test::TestRequest {
    let ip: IpAddr = origin.parse().expect("test origin is an IP address");
    method.uri(uri).peer_addr(SocketAddr::new(ip, 40000))
}

fn custom(name: &'static str, window: Duration, quota: u64, key_basis: KeyBasis) -> RatePolicy {
    RatePolicy::Custom {
        name,
        window,
        quota,
        key_basis,
    }
}

#[actix_web::test]
async fn auth_sensitive_quota_rejects_the_eleventh_attempt() {
    let app = TestAppBuilder::new().rate_limiting(true).build().await;

    for attempt in 1..=10 {
        let req = from_origin(test::TestRequest::post(), "/api/auth/refresh", "203.0.113.10")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "attempt {attempt}");
        assert!(resp.headers().contains_key("x-ratelimit-remaining"));
    }

    let req =
        from_origin(test::TestRequest::post(), "/api/auth/refresh", "203.0.113.10").to_request();
    let resp = test::call_service(&app, req).await;
    let retry_after: u64 = resp
        .headers()
        .get(header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .expect("Retry-After header");
    assert!(retry_after > 0 && retry_after <= 15 * 60);

    let envelope =
        assert_error_envelope(resp, StatusCode::TOO_MANY_REQUESTS, "TOO_MANY_REQUESTS").await;
    assert!(envelope.message.to_lowercase().contains("too many"));

    // A different origin still has its own budget.
    let req =
        from_origin(test::TestRequest::post(), "/api/auth/refresh", "203.0.113.11").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn window_expiry_restores_the_budget() {
    let policy = custom("burst", Duration::from_secs(1), 2, KeyBasis::Origin);
    let app = limited_app(test_config(RuntimeEnv::Production), vec![("/burst", policy)]).await;

    let call = |origin: &'static str| {
        from_origin(test::TestRequest::get(), "/burst", origin).to_request()
    };

    assert_eq!(test::call_service(&app, call("192.0.2.1")).await.status(), StatusCode::OK);
    assert_eq!(test::call_service(&app, call("192.0.2.1")).await.status(), StatusCode::OK);
    assert_eq!(
        test::call_service(&app, call("192.0.2.1")).await.status(),
        StatusCode::TOO_MANY_REQUESTS
    );

    tokio::time::sleep(Duration::from_millis(1500)).await;

    assert_eq!(test::call_service(&app, call("192.0.2.1")).await.status(), StatusCode::OK);
}

#[actix_web::test]
async fn identity_bucket_follows_the_user_across_origins() {
    let config = test_config(RuntimeEnv::Production);
    let alice = access_token_for(&config, "alice", Role::Patient);
    let bob = access_token_for(&config, "bob", Role::Patient);
    let policy = custom("per-user", Duration::from_secs(60), 2, KeyBasis::IdentityOrOrigin);
    let app = limited_app(config, vec![("/per-user", policy)]).await;

    let as_user = |token: &str, origin: &str| {
        from_origin(test::TestRequest::get(), "/per-user", origin)
            .insert_header((header::AUTHORIZATION, format!("Bearer {token}")))
            .to_request()
    };

    let resp = test::call_service(&app, as_user(&alice, "198.51.100.1")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let resp = test::call_service(&app, as_user(&alice, "198.51.100.2")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let resp = test::call_service(&app, as_user(&alice, "198.51.100.3")).await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);

    // Same origin, different identity: separate bucket.
    let resp = test::call_service(&app, as_user(&bob, "198.51.100.1")).await;
    assert_eq!(resp.status(), StatusCode::OK);

    // Anonymous callers fall back to their origin.
    let req = from_origin(test::TestRequest::get(), "/per-user", "198.51.100.1").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
}

#[actix_web::test]
async fn ipv6_clients_in_one_slash_56_share_a_bucket() {
    let policy = custom("v6", Duration::from_secs(60), 1, KeyBasis::Origin);
    let app = limited_app(test_config(RuntimeEnv::Production), vec![("/v6", policy)]).await;

    let req = from_origin(test::TestRequest::get(), "/v6", "2001:db8:abcd:1201::1").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = from_origin(test::TestRequest::get(), "/v6", "2001:db8:abcd:12ff::2").to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::TOO_MANY_REQUESTS
    );

    let req = from_origin(test::TestRequest::get(), "/v6", "2001:db8:abcd:1300::1").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
}

#[actix_web::test]
async fn policies_count_independently_on_a_shared_backend() {
    let first = custom("first", Duration::from_secs(60), 1, KeyBasis::Origin);
    let second = custom("second", Duration::from_secs(60), 1, KeyBasis::Origin);
    let app = limited_app(
        test_config(RuntimeEnv::Production),
        vec![("/first", first), ("/second", second)],
    )
    .await;

    let req = from_origin(test::TestRequest::get(), "/first", "192.0.2.50").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
    let req = from_origin(test::TestRequest::get(), "/first", "192.0.2.50").to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::TOO_MANY_REQUESTS
    );

    let req = from_origin(test::TestRequest::get(), "/second", "192.0.2.50").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_environment_bypasses_admission_entirely() {
    let config = test_config(RuntimeEnv::Test);
    assert!(!config.rate_limit_enabled);
    let app = TestAppBuilder::with_config(config).build().await;

    for _ in 0..15 {
        let req = from_origin(test::TestRequest::post(), "/api/auth/refresh", "203.0.113.99")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert!(resp.headers().get("x-ratelimit-limit").is_none());
    }
}

#[actix_web::test]
async fn rotating_forwarded_header_from_one_peer_is_still_limited() {
    let app = TestAppBuilder::new().rate_limiting(true).build().await;

    let mut statuses = Vec::new();
    for attempt in 1..=11 {
        let req = from_origin(test::TestRequest::post(), "/api/auth/refresh", "10.0.0.1")
            .insert_header(("x-forwarded-for", format!("203.0.113.{attempt}")))
            .to_request();
        statuses.push(test::call_service(&app, req).await.status());
    }

    assert!(statuses[..10].iter().all(|s| *s == StatusCode::UNAUTHORIZED));
    assert_eq!(statuses[10], StatusCode::TOO_MANY_REQUESTS);
}

#[actix_web::test]
async fn trusted_proxy_keys_on_the_forwarded_client() {
    let mut config = test_config(RuntimeEnv::Production);
    config.trust_proxy = true;
    let policy = custom("proxied", Duration::from_secs(60), 1, KeyBasis::Origin);
    let app = limited_app(config, vec![("/proxied", policy)]).await;

    let via_proxy = |client: &str| {
        from_origin(test::TestRequest::get(), "/proxied", "10.0.0.1")
            .insert_header(("x-forwarded-for", client.to_string()))
            .to_request()
    };

    assert_eq!(test::call_service(&app, via_proxy("203.0.113.1")).await.status(), StatusCode::OK);
    assert_eq!(
        test::call_service(&app, via_proxy("203.0.113.1")).await.status(),
        StatusCode::TOO_MANY_REQUESTS
    );
    // Same proxy, different client behind it.
    assert_eq!(test::call_service(&app, via_proxy("203.0.113.2")).await.status(), StatusCode::OK);
}
