//! Application configuration loaded from environment variables.

use std::env;

use quill_infra::JwtConfig;
use quill_infra::database::DatabaseConfig;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// `None` runs the blog on the in-memory store.
    pub database: Option<DatabaseConfig>,
    pub jwt: JwtConfig,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            database: DatabaseConfig::from_env(),
            jwt: JwtConfig::from_env(),
        }
    }
}
