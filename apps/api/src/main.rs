use actix_web::{web, HttpServer};
use tracing::{error, info};
use wellness_api::{build_app, telemetry, AppConfig, AppState, RateLimits};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    telemetry::init_tracing();

    // Configuration comes from the process environment only; source .env
    // files before starting (e.g. set -a; . ./.env; set +a).
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            eprintln!("❌ {e}");
            std::process::exit(1);
        }
    };

    let host = config.host.clone();
    let port = config.port;
    let limits = RateLimits::new(config.rate_limit_enabled, config.env.exposure());

    info!(
        environment = %config.env,
        rate_limiting = config.rate_limit_enabled,
        "🚀 Starting Wellness API on http://{host}:{port}"
    );

    let data = web::Data::new(AppState::new(config));

    HttpServer::new(move || build_app(data.clone(), limits.clone()))
        .bind((host.as_str(), port))?
        .run()
        .await
}
