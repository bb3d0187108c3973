//! Application configuration
//!
//! This module provides centralized configuration management using the `config` crate.
//! Configuration can be loaded from environment variables and config files.

use crate::error::AppError;
use chrono_tz::Tz;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub maps: MapsConfig,
    pub mail: MailConfig,
    pub pricing: PricingConfig,
}

/// HTTP server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Number of worker threads
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Comma separated list of allowed CORS origins
    #[serde(default = "default_cors_origins")]
    pub cors_origins: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_workers() -> usize {
    num_cpus::get()
}

fn default_cors_origins() -> String {
    "http://localhost:3000,http://127.0.0.1:3000".to_string()
}

/// Database configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Apply embedded migrations at startup
    #[serde(default = "default_run_migrations")]
    pub run_migrations: bool,
}

fn default_max_connections() -> u32 {
    10
}

fn default_run_migrations() -> bool {
    true
}

/// Authentication configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// JWT signing secret
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,

    /// JWT token expiration in minutes
    #[serde(default = "default_jwt_expiration")]
    pub jwt_expiration_minutes: i64,

    /// Administrator created at startup when missing
    pub admin_username: Option<String>,

    /// Password for the bootstrap administrator
    pub admin_password: Option<String>,
}

fn default_jwt_secret() -> String {
    "dev-key".to_string()
}

fn default_jwt_expiration() -> i64 {
    1440 // 24 hours
}

impl AuthConfig {
    /// Whether the signing secret is still the development default
    pub fn uses_default_secret(&self) -> bool {
        self.jwt_secret == default_jwt_secret()
    }
}

/// Distance provider (Google Distance Matrix) configuration
#[derive(Debug, Deserialize, Clone)]
pub struct MapsConfig {
    /// API key sent with every distance request
    #[serde(default)]
    pub api_key: String,

    /// Distance Matrix endpoint
    #[serde(default = "default_maps_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_maps_timeout")]
    pub timeout_secs: u64,
}

fn default_maps_url() -> String {
    "https://maps.googleapis.com/maps/api/distancematrix/json".to_string()
}

fn default_maps_timeout() -> u64 {
    15
}

/// Outbound email configuration
#[derive(Debug, Deserialize, Clone)]
pub struct MailConfig {
    /// SendGrid API key (mail delivery is disabled without it)
    pub sendgrid_api_key: Option<String>,

    /// SendGrid v3 mail send endpoint
    #[serde(default = "default_sendgrid_url")]
    pub sendgrid_url: String,

    /// Sender address for all outgoing mail
    pub default_sender: Option<String>,

    /// Recipient of new booking alerts
    pub admin_email: Option<String>,

    /// Maximum number of queued notifications
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_sendgrid_url() -> String {
    "https://api.sendgrid.com/v3/mail/send".to_string()
}

fn default_queue_capacity() -> usize {
    100
}

/// Fare engine configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PricingConfig {
    /// IANA timezone used for night and weekend surcharges
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_timezone() -> String {
    "Africa/Abidjan".to_string()
}

impl PricingConfig {
    /// Parse the configured timezone
    pub fn tz(&self) -> Result<Tz, AppError> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| AppError::Config(format!("Invalid pricing.timezone: {}", e)))
    }
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
        }
    }
}

/// Rewrite `postgres://` URLs (as issued by some hosting providers) to `postgresql://`
pub fn normalize_database_url(url: &str) -> String {
    match url.strip_prefix("postgres://") {
        Some(rest) => format!("postgresql://{}", rest),
        None => url.to_string(),
    }
}

/// First non-empty value among the given environment variables
fn first_env(names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| env::var(name).ok())
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
}

impl AppConfig {
    /// Load configuration from environment and optional config file
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("server.workers", num_cpus::get() as i64)?
            .set_default("database.max_connections", 10)?
            .set_default("auth.jwt_expiration_minutes", 1440)?
            .set_default("maps.timeout_secs", default_maps_timeout() as i64)?
            .set_default("mail.queue_capacity", default_queue_capacity() as i64)?
            .set_default("pricing.timezone", "Africa/Abidjan")?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Load from environment variables with NAVETTE_ prefix
            .add_source(
                Environment::with_prefix("NAVETTE")
                    .separator("__")
                    .try_parsing(true),
            )
            // Support legacy environment variables
            .set_override_option("database.url", first_env(&["DATABASE_URL"]))?
            .set_override_option("server.port", first_env(&["PORT"]))?
            .set_override_option("auth.jwt_secret", first_env(&["SECRET_KEY"]))?
            .set_override_option("maps.api_key", first_env(&["GOOGLE_MAPS_KEY"]))?
            .set_override_option("mail.sendgrid_api_key", first_env(&["SENDGRID_API_KEY"]))?
            .set_override_option(
                "mail.default_sender",
                first_env(&["MAIL_DEFAULT_SENDER", "MAIL_USERNAME"]),
            )?
            .set_override_option("mail.admin_email", first_env(&["ADMIN_EMAIL"]))?
            .build()?;

        let mut app_config: AppConfig = config.try_deserialize()?;
        app_config.database.url = normalize_database_url(&app_config.database.url);
        Ok(app_config)
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(Environment::with_prefix("NAVETTE").separator("__"))
            .build()?;

        let mut app_config: AppConfig = config.try_deserialize()?;
        app_config.database.url = normalize_database_url(&app_config.database.url);
        Ok(app_config)
    }

    /// Get the server bind address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
