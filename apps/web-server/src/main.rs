//! # Quill Web Server
//!
//! Server-rendered blog frontend on Actix-web.

use actix_web::middleware::{NormalizePath, TrailingSlash};
use actix_web::{App, HttpServer, web};
use tracing_actix_web::TracingLogger;

mod config;
mod handlers;
mod middleware;
mod render;
mod state;
mod telemetry;

use config::AppConfig;
use state::AppState;
use telemetry::{TelemetryConfig, init_telemetry};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_telemetry(&TelemetryConfig::from_env());
    let config = AppConfig::from_env();

    tracing::info!("Starting Quill on {}:{}", config.host, config.port);

    let state = AppState::new(&config)
        .await
        .map_err(|e| std::io::Error::other(format!("failed to load templates: {e}")))?;

    HttpServer::new(move || {
        App::new()
            .wrap(NormalizePath::new(TrailingSlash::Always))
            .wrap(TracingLogger::default())
            .app_data(web::Data::new(state.clone()))
            .configure(handlers::configure_routes)
            .default_service(web::to(handlers::not_found))
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
