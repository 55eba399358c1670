use crate::auth::jwt::TokenCodec;
use crate::config::{AppConfig, RuntimeEnv};
use crate::error::Exposure;

/// Process-wide state shared by every worker through `web::Data`.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub tokens: TokenCodec,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let tokens = TokenCodec::new(config.security.clone());
        Self { config, tokens }
    }

    pub fn env(&self) -> RuntimeEnv {
        self.config.env
    }

    pub fn exposure(&self) -> Exposure {
        self.config.env.exposure()
    }
}
