//! Route-level forms of the role and owner-or-admin checks.
//!
//! Both expect an `AuthGate` to have run first; without an identity context
//! they reject with `UNAUTHORIZED`.

use std::future::Future;
use std::rc::Rc;

use actix_web::body::EitherBody;
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{Error, HttpMessage, HttpRequest};
use futures_util::future::{ready, LocalBoxFuture, Ready};
use futures_util::FutureExt;

use crate::auth::authorize::{require_owner_or_admin, require_role};
use crate::auth::{AuthContext, Role};
use crate::error::AppError;

/// Admit only callers whose role is in the set.
#[derive(Debug, Clone)]
pub struct RequireRole {
    allowed: Rc<[Role]>,
}

impl RequireRole {
    pub fn any_of(roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            allowed: roles.into_iter().collect(),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequireRole
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireRoleMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireRoleMiddleware {
            service,
            allowed: Rc::clone(&self.allowed),
        }))
    }
}

pub struct RequireRoleMiddleware<S> {
    service: S,
    allowed: Rc<[Role]>,
}

impl<S, B> Service<ServiceRequest> for RequireRoleMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let decision = {
            let extensions = req.extensions();
            require_role(extensions.get::<AuthContext>(), &self.allowed)
        };

        match decision {
            Ok(()) => self
                .service
                .call(req)
                .map(|res| res.map(ServiceResponse::map_into_left_body))
                .boxed_local(),
            Err(e) => Box::pin(ready(Ok(req.error_response(e).map_into_right_body()))),
        }
    }
}

/// Admit admins, or the owner of the addressed resource.
///
/// The resolver receives the request (path params, app data) and returns the
/// owner's user id. It is not called for admins.
pub struct OwnerOrAdmin<F> {
    resolver: Rc<F>,
}

impl<F, Fut> OwnerOrAdmin<F>
where
    F: Fn(HttpRequest) -> Fut + 'static,
    Fut: Future<Output = Result<String, AppError>> + 'static,
{
    pub fn new(resolver: F) -> Self {
        Self {
            resolver: Rc::new(resolver),
        }
    }
}

impl<S, B, F, Fut> Transform<S, ServiceRequest> for OwnerOrAdmin<F>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
    F: Fn(HttpRequest) -> Fut + 'static,
    Fut: Future<Output = Result<String, AppError>> + 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = OwnerOrAdminMiddleware<S, F>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(OwnerOrAdminMiddleware {
            service: Rc::new(service),
            resolver: Rc::clone(&self.resolver),
        }))
    }
}

pub struct OwnerOrAdminMiddleware<S, F> {
    service: Rc<S>,
    resolver: Rc<F>,
}

impl<S, B, F, Fut> Service<ServiceRequest> for OwnerOrAdminMiddleware<S, F>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
    F: Fn(HttpRequest) -> Fut + 'static,
    Fut: Future<Output = Result<String, AppError>> + 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let ctx = req.extensions().get::<AuthContext>().cloned();
        let resolver = Rc::clone(&self.resolver);
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            // The resolver's request handle is dropped before routing continues.
            let decision = {
                let http_req = req.request().clone();
                require_owner_or_admin(ctx.as_ref(), || resolver(http_req)).await
            };

            match decision {
                Ok(()) => service.call(req).await.map(ServiceResponse::map_into_left_body),
                Err(e) => Ok(req.error_response(e).map_into_right_body()),
            }
        })
    }
}
