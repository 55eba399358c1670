use actix_http::Request;
use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::{test, web, Error};
use wellness_api::{build_app, AppConfig, AppState, RateLimits, RuntimeEnv};

pub const TEST_ACCESS_SECRET: &str = "integration-access-secret-0123456789abcdef";
pub const TEST_REFRESH_SECRET: &str = "integration-refresh-secret-0123456789abcdef";

/// Configuration as the binary would load it for `APP_ENV=<env>`.
pub fn test_config(env: RuntimeEnv) -> AppConfig {
    let vars = [
        ("APP_ENV", env.as_str()),
        ("JWT_SECRET", TEST_ACCESS_SECRET),
        ("JWT_REFRESH_SECRET", TEST_REFRESH_SECRET),
    ];
    AppConfig::from_lookup(|name| {
        vars.iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.to_string())
    })
    .expect("test configuration is valid")
}

/// Builds the real application (full middleware pipeline) for tests.
pub struct TestAppBuilder {
    config: AppConfig,
    rate_limiting: Option<bool>,
}

impl TestAppBuilder {
    /// Production configuration (redacted errors, rate limiting on).
    pub fn new() -> Self {
        Self::with_config(test_config(RuntimeEnv::Production))
    }

    pub fn with_config(config: AppConfig) -> Self {
        Self {
            config,
            rate_limiting: None,
        }
    }

    /// Override the configured rate-limit switch.
    pub fn rate_limiting(mut self, enabled: bool) -> Self {
        self.rate_limiting = Some(enabled);
        self
    }

    pub fn state(&self) -> AppState {
        AppState::new(self.config.clone())
    }

    pub async fn build(
        self,
    ) -> impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = Error> {
        let enabled = self
            .rate_limiting
            .unwrap_or(self.config.rate_limit_enabled);
        let exposure = self.config.env.exposure();
        let limits = RateLimits::new(enabled, exposure);
        let data = web::Data::new(AppState::new(self.config));

        test::init_service(build_app(data, limits)).await
    }
}

impl Default for TestAppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Production-configured app with rate limiting disabled.
pub async fn create_test_app(
) -> impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = Error> {
    TestAppBuilder::new().rate_limiting(false).build().await
}
