//! Client address for rate-limit keys and security logs.
//!
//! Forwarding headers are client-controlled, so they are only read when
//! `AppConfig::trust_proxy` is set. Otherwise the TCP peer is the client.

use actix_web::{web, HttpRequest};

use crate::state::app_state::AppState;

pub fn client_addr(req: &HttpRequest) -> Option<String> {
    let trust_proxy = req
        .app_data::<web::Data<AppState>>()
        .is_some_and(|state| state.config.trust_proxy);

    if trust_proxy {
        req.connection_info()
            .realip_remote_addr()
            .map(str::to_string)
    } else {
        req.peer_addr().map(|addr| addr.ip().to_string())
    }
}

/// [`client_addr`] for logging; `"unknown"` when there is none.
pub fn origin(req: &HttpRequest) -> String {
    client_addr(req).unwrap_or_else(|| "unknown".to_string())
}
