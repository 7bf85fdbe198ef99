use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    /// Optional admin account seeded on startup.
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Root of the active content tree.
    pub uploads_root: PathBuf,
    /// Root of the retained-backup tree.
    pub backups_root: PathBuf,
    /// Ceiling on total stored bytes (active + backups) across all works.
    pub quota_bytes: u64,
    /// Per-request upload cap in bytes.
    pub max_upload_size: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            .set_default("storage.uploads_root", "./data/uploads")?
            .set_default("storage.backups_root", "./data/backups")?
            .set_default("storage.quota_bytes", 10 * 1024 * 1024 * 1024u64)?
            .set_default("storage.max_upload_size", 128 * 1024 * 1024u64)?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., ATELIER__AUTH__JWT_SECRET)
            .add_source(Environment::with_prefix("ATELIER").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
