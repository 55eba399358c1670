//! Rate admission policies on top of `actix-extensible-rate-limit`.
//!
//! Every policy shares one fixed-window `InMemoryBackend`; bucket keys are
//! prefixed with the policy name so counters never mix across policies.
//! Keys are either the authenticated user or an anonymized client origin
//! (IPv4 address, or the /56 prefix of an IPv6 address) taken from the TCP
//! peer unless `trust_proxy` is configured.

use std::fmt;
use std::future::{ready, Ready};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use actix_extensible_rate_limit::backend::memory::InMemoryBackend;
use actix_extensible_rate_limit::backend::{SimpleInput, SimpleOutput};
use actix_extensible_rate_limit::RateLimiter;
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::StatusCode;
use actix_web::middleware::Condition;
use actix_web::{web, Error, HttpMessage};
use futures_util::future::LocalBoxFuture;
use tokio::time::Instant;

use crate::auth::credentials::extract_credential;
use crate::auth::{AuthContext, TokenClass};
use crate::error::{AppError, Exposure};
use crate::logging::security;
use crate::middleware::client_addr::{client_addr, origin};
use crate::state::app_state::AppState;

const IPV6_PREFIX_BITS: u32 = 56;

/// What a policy counts requests against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyBasis {
    Origin,
    /// The verified user when there is one, else the origin.
    IdentityOrOrigin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatePolicy {
    Global,
    AuthSensitive,
    Strict,
    PerIdentity,
    Upload,
    Custom {
        name: &'static str,
        window: Duration,
        quota: u64,
        key_basis: KeyBasis,
    },
}

impl RatePolicy {
    pub fn name(&self) -> &'static str {
        match self {
            RatePolicy::Global => "global",
            RatePolicy::AuthSensitive => "auth",
            RatePolicy::Strict => "strict",
            RatePolicy::PerIdentity => "identity",
            RatePolicy::Upload => "upload",
            RatePolicy::Custom { name, .. } => name,
        }
    }

    pub fn window(&self) -> Duration {
        match self {
            RatePolicy::Global | RatePolicy::AuthSensitive => Duration::from_secs(15 * 60),
            RatePolicy::Strict | RatePolicy::Upload => Duration::from_secs(60 * 60),
            RatePolicy::PerIdentity => Duration::from_secs(60),
            RatePolicy::Custom { window, .. } => *window,
        }
    }

    pub fn quota(&self) -> u64 {
        match self {
            RatePolicy::Global => 100,
            RatePolicy::AuthSensitive => 10,
            RatePolicy::Strict => 5,
            RatePolicy::PerIdentity => 60,
            RatePolicy::Upload => 50,
            RatePolicy::Custom { quota, .. } => *quota,
        }
    }

    pub fn key_basis(&self) -> KeyBasis {
        match self {
            RatePolicy::Global | RatePolicy::AuthSensitive | RatePolicy::Strict => KeyBasis::Origin,
            RatePolicy::PerIdentity | RatePolicy::Upload => KeyBasis::IdentityOrOrigin,
            RatePolicy::Custom { key_basis, .. } => *key_basis,
        }
    }
}

/// Counter key within a policy.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BucketKey {
    User(String),
    Ipv4(Ipv4Addr),
    /// Address with everything past the first 56 bits zeroed
    Ipv6Prefix(Ipv6Addr),
    UnknownOrigin,
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BucketKey::User(id) => write!(f, "user:{id}"),
            BucketKey::Ipv4(addr) => write!(f, "ip:{addr}"),
            BucketKey::Ipv6Prefix(prefix) => write!(f, "ip6:{prefix}/{IPV6_PREFIX_BITS}"),
            BucketKey::UnknownOrigin => f.write_str("ip:unknown"),
        }
    }
}

/// Reduce a client address (optionally with port) to its bucket key.
pub fn anonymize_origin(raw: Option<&str>) -> BucketKey {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return BucketKey::UnknownOrigin;
    };

    let ip = raw
        .parse::<IpAddr>()
        .or_else(|_| raw.parse::<SocketAddr>().map(|sa| sa.ip()));

    match ip {
        Ok(IpAddr::V4(v4)) => BucketKey::Ipv4(v4),
        Ok(IpAddr::V6(v6)) => match v6.to_ipv4_mapped() {
            Some(v4) => BucketKey::Ipv4(v4),
            None => {
                let mask = u128::MAX << (128 - IPV6_PREFIX_BITS);
                BucketKey::Ipv6Prefix(Ipv6Addr::from(u128::from(v6) & mask))
            }
        },
        Err(_) => BucketKey::UnknownOrigin,
    }
}

/// Resolve the bucket for a request. Identity comes from an established
/// `AuthContext`, or from verifying the presented access token directly.
pub fn bucket_key(req: &ServiceRequest, basis: KeyBasis) -> BucketKey {
    if basis == KeyBasis::IdentityOrOrigin {
        if let Some(ctx) = req.extensions().get::<AuthContext>() {
            return BucketKey::User(ctx.user_id().to_string());
        }

        let verified = req.app_data::<web::Data<AppState>>().and_then(|state| {
            let credential = extract_credential(req.request())?;
            state.tokens.verify(&credential.token, TokenClass::Access).ok()
        });
        if let Some(claims) = verified {
            return BucketKey::User(claims.identity.user_id);
        }
    }

    anonymize_origin(client_addr(req.request()).as_deref())
}

/// Which policy and bucket last admitted or denied this request.
#[derive(Debug, Clone)]
pub struct AppliedLimit {
    pub policy: &'static str,
    pub bucket: BucketKey,
}

fn retry_after_secs(reset: Instant) -> u64 {
    let wait = reset.saturating_duration_since(Instant::now());
    let secs = wait.as_secs() + u64::from(wait.subsec_nanos() > 0);
    secs.max(1)
}

/// Builds policy limiters over one shared backend.
#[derive(Clone)]
pub struct RateLimits {
    backend: InMemoryBackend,
    enabled: bool,
    exposure: Exposure,
}

impl RateLimits {
    pub fn new(enabled: bool, exposure: Exposure) -> Self {
        Self {
            backend: InMemoryBackend::builder().build(),
            enabled,
            exposure,
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Limiter for `policy`; a pass-through when rate limiting is disabled.
    pub fn limiter(
        &self,
        policy: RatePolicy,
    ) -> Condition<
        RateLimiter<
            InMemoryBackend,
            SimpleOutput,
            impl Fn(&ServiceRequest) -> Ready<Result<SimpleInput, Error>> + 'static,
        >,
    > {
        let name = policy.name();
        let interval = policy.window();
        let max_requests = policy.quota();
        let basis = policy.key_basis();
        let exposure = self.exposure;

        let input = move |req: &ServiceRequest| {
            let bucket = bucket_key(req, basis);
            let key = format!("{name}:{bucket}");
            req.extensions_mut().insert(AppliedLimit {
                policy: name,
                bucket,
            });
            ready(Ok(SimpleInput {
                interval,
                max_requests,
                key,
            }))
        };

        let limiter = RateLimiter::builder(self.backend.clone(), input)
            .add_headers()
            .request_denied_response(move |output: &SimpleOutput| {
                AppError::too_many_requests(Some(retry_after_secs(output.reset))).render(exposure)
            })
            .build();

        Condition::new(self.enabled, limiter)
    }
}

/// Logs requests turned away by a limiter it wraps.
pub struct RateLimitAudit;

impl<S, B> Transform<S, ServiceRequest> for RateLimitAudit
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RateLimitAuditMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitAuditMiddleware { service }))
    }
}

pub struct RateLimitAuditMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for RateLimitAuditMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let method = req.method().to_string();
        let path = req.path().to_string();
        let fut = self.service.call(req);

        Box::pin(async move {
            let res = fut.await?;
            if res.status() == StatusCode::TOO_MANY_REQUESTS {
                // Removed once logged so enclosing audits stay quiet.
                let applied = res.request().extensions_mut().remove::<AppliedLimit>();
                if let Some(applied) = applied {
                    let user_id = match &applied.bucket {
                        BucketKey::User(id) => Some(id.as_str()),
                        _ => None,
                    };
                    let origin = origin(res.request());
                    security::rate_limit_hit(applied.policy, &origin, &method, &path, user_id);
                }
            }
            Ok(res)
        })
    }
}
