//! # Tollgate API Server
//!
//! The main entry point for the Actix-web HTTP server.

use actix_web::{App, HttpServer, web};
use tracing_actix_web::TracingLogger;

mod background;
mod config;
mod handlers;
mod middleware;
mod state;
mod telemetry;

use config::AppConfig;
use middleware::tenant::TenantResolver;
use state::AppState;
use telemetry::TelemetryConfig;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    telemetry::init_telemetry(&TelemetryConfig::from_env());

    let config = AppConfig::from_env().map_err(std::io::Error::other)?;

    tracing::info!(
        "Starting Tollgate API Server on {}:{}",
        config.host,
        config.port
    );

    let state = AppState::new(&config)
        .await
        .map_err(std::io::Error::other)?;

    #[cfg(feature = "scheduler")]
    let mut scheduler = background::start_sweeper(
        config.scheduler.clone(),
        tollgate_infra::WindowSweeper::new(state.limiter.clone(), &config.rate_limit),
        config.rate_limit.sweep_interval,
    )
    .await
    .map_err(std::io::Error::other)?;

    #[cfg(not(feature = "scheduler"))]
    tracing::warn!("Built without scheduler feature - stale rate limit windows are never swept");

    let server_state = state.clone();
    let result = HttpServer::new(move || {
        let state = server_state.clone();
        App::new()
            .wrap(TenantResolver::new(state.tokens.clone()))
            .wrap(TracingLogger::default())
            .app_data(web::Data::new(state.clone()))
            .configure(|cfg| handlers::configure_routes(cfg, &state))
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await;

    #[cfg(feature = "scheduler")]
    {
        if let Err(e) = scheduler.shutdown().await {
            tracing::error!("Failed to stop scheduler: {}", e);
        }
    }

    result
}
