//! Process configuration loaded from environment variables.

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::error::Exposure;
use crate::state::security_config::{
    SecurityConfig, DEFAULT_ACCESS_TTL, DEFAULT_AUDIENCE, DEFAULT_ISSUER, DEFAULT_REFRESH_TTL,
};

const MIN_PRODUCTION_SECRET_LEN: usize = 32;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{var} is invalid: {message}")]
    Invalid { var: &'static str, message: String },
    #[error("{0} must be at least {MIN_PRODUCTION_SECRET_LEN} bytes in production")]
    WeakSecret(&'static str),
    #[error("JWT_SECRET and JWT_REFRESH_SECRET must differ")]
    SharedSecret,
}

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeEnv {
    Development,
    Test,
    Production,
}

impl RuntimeEnv {
    pub const fn as_str(&self) -> &'static str {
        match self {
            RuntimeEnv::Development => "development",
            RuntimeEnv::Test => "test",
            RuntimeEnv::Production => "production",
        }
    }

    /// Only development clients see internal error detail.
    pub const fn exposure(&self) -> Exposure {
        match self {
            RuntimeEnv::Development => Exposure::Full,
            RuntimeEnv::Test | RuntimeEnv::Production => Exposure::Redacted,
        }
    }
}

impl fmt::Display for RuntimeEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuntimeEnv {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(RuntimeEnv::Development),
            "test" => Ok(RuntimeEnv::Test),
            "production" | "prod" => Ok(RuntimeEnv::Production),
            other => Err(ConfigError::Invalid {
                var: "APP_ENV",
                message: format!("unknown environment '{other}'"),
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: RuntimeEnv,
    pub host: String,
    pub port: u16,
    pub security: SecurityConfig,
    /// Effective switch: always false under `RuntimeEnv::Test`
    pub rate_limit_enabled: bool,
    /// Take the client address from `Forwarded` / `X-Forwarded-For`.
    /// Only safe behind a proxy that overwrites those headers.
    pub trust_proxy: bool,
    pub cors_allowed_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = match lookup("APP_ENV") {
            Some(raw) => raw.parse()?,
            None => RuntimeEnv::Development,
        };

        let host = lookup("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = parse_or("API_PORT", lookup("API_PORT"), 3001u16)?;

        let access_secret = required_secret("JWT_SECRET", lookup("JWT_SECRET"), env)?;
        let refresh_secret =
            required_secret("JWT_REFRESH_SECRET", lookup("JWT_REFRESH_SECRET"), env)?;
        if access_secret == refresh_secret {
            return Err(ConfigError::SharedSecret);
        }

        let access_ttl = Duration::from_secs(parse_or(
            "JWT_ACCESS_TTL_SECS",
            lookup("JWT_ACCESS_TTL_SECS"),
            DEFAULT_ACCESS_TTL.as_secs(),
        )?);
        let refresh_ttl = Duration::from_secs(parse_or(
            "JWT_REFRESH_TTL_SECS",
            lookup("JWT_REFRESH_TTL_SECS"),
            DEFAULT_REFRESH_TTL.as_secs(),
        )?);
        if access_ttl.is_zero() || refresh_ttl.is_zero() {
            return Err(ConfigError::Invalid {
                var: "JWT_ACCESS_TTL_SECS",
                message: "token lifetimes must be positive".to_string(),
            });
        }

        let issuer = lookup("JWT_ISSUER").unwrap_or_else(|| DEFAULT_ISSUER.to_string());
        let audience = lookup("JWT_AUDIENCE").unwrap_or_else(|| DEFAULT_AUDIENCE.to_string());

        let security = SecurityConfig::new(access_secret, refresh_secret)
            .with_ttls(access_ttl, refresh_ttl)
            .with_issuer(issuer, audience);

        let rate_limit_requested = parse_bool("RATE_LIMIT_ENABLED", lookup("RATE_LIMIT_ENABLED"))?
            .unwrap_or(true);
        let rate_limit_enabled = rate_limit_requested && env != RuntimeEnv::Test;

        let trust_proxy = parse_bool("TRUST_PROXY", lookup("TRUST_PROXY"))?.unwrap_or(false);

        let cors_allowed_origins = parse_origins(lookup("CORS_ALLOWED_ORIGINS").as_deref());

        Ok(Self {
            env,
            host,
            port,
            security,
            rate_limit_enabled,
            trust_proxy,
            cors_allowed_origins,
        })
    }
}

fn required_secret(
    var: &'static str,
    value: Option<String>,
    env: RuntimeEnv,
) -> Result<Vec<u8>, ConfigError> {
    let secret = value
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::Missing(var))?;
    if env == RuntimeEnv::Production && secret.len() < MIN_PRODUCTION_SECRET_LEN {
        return Err(ConfigError::WeakSecret(var));
    }
    Ok(secret.into_bytes())
}

fn parse_or<T: FromStr>(
    var: &'static str,
    value: Option<String>,
    default: T,
) -> Result<T, ConfigError>
where
    T::Err: fmt::Display,
{
    match value {
        None => Ok(default),
        Some(raw) => raw.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
            var,
            message: format!("'{raw}': {e}"),
        }),
    }
}

fn parse_bool(var: &'static str, value: Option<String>) -> Result<Option<bool>, ConfigError> {
    let Some(raw) = value else {
        return Ok(None);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(Some(true)),
        "0" | "false" | "no" | "off" => Ok(Some(false)),
        _ => Err(ConfigError::Invalid {
            var,
            message: format!("'{raw}' is not a boolean"),
        }),
    }
}

/// Comma list of http(s) origins; empty and "null" entries are ignored.
fn parse_origins(raw: Option<&str>) -> Vec<String> {
    let origins: Vec<String> = raw
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty() && *s != "null")
        .filter(|s| s.starts_with("http://") || s.starts_with("https://"))
        .map(str::to_string)
        .collect();

    if origins.is_empty() {
        vec![
            "http://localhost:3000".to_string(),
            "http://127.0.0.1:3000".to_string(),
        ]
    } else {
        origins
    }
}
