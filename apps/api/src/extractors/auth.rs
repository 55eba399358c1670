use std::ops::Deref;

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpMessage, HttpRequest};
use futures_util::future::{ready, Ready};

use crate::auth::AuthContext;
use crate::error::AppError;

/// Identity established by `AuthGate`; missing context is `UNAUTHORIZED`.
#[derive(Debug, Clone)]
pub struct Authenticated(pub AuthContext);

impl Authenticated {
    pub fn into_inner(self) -> AuthContext {
        self.0
    }
}

impl Deref for Authenticated {
    type Target = AuthContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequest for Authenticated {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let ctx = req.extensions().get::<AuthContext>().cloned();
        ready(ctx.map(Authenticated).ok_or_else(AppError::missing_credential))
    }
}

/// Identity if one was established; never fails.
#[derive(Debug, Clone)]
pub struct MaybeAuthenticated(pub Option<AuthContext>);

impl MaybeAuthenticated {
    pub fn as_ref(&self) -> Option<&AuthContext> {
        self.0.as_ref()
    }

    pub fn into_inner(self) -> Option<AuthContext> {
        self.0
    }
}

impl FromRequest for MaybeAuthenticated {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Ok(MaybeAuthenticated(
            req.extensions().get::<AuthContext>().cloned(),
        )))
    }
}
