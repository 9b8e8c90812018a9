//! Configuration management for the Production Planner server
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with PLANNER_ prefix

use chrono::Duration;
use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// JWT authentication configuration
    pub jwt: JwtConfig,

    /// Order workflow configuration
    pub orders: OrdersConfig,

    /// Dashboard thresholds
    pub dashboard: DashboardConfig,

    /// Log output configuration
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    /// Secret key for signing JWT tokens
    pub secret: String,

    /// Access token expiration in seconds
    pub access_token_expiry: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OrdersConfig {
    /// Seconds after creation during which item quantities may be edited
    pub edit_window_secs: i64,
}

impl OrdersConfig {
    pub fn edit_window(&self) -> Duration {
        Duration::seconds(self.edit_window_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    /// Materials expiring within this many days are flagged
    pub expiry_horizon_days: i64,

    /// Maximum entries per dashboard list
    pub list_limit: usize,

    /// Days covered by the order series
    pub series_days: u32,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct LoggingConfig {
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("PLANNER_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("jwt.access_token_expiry", 3600)?
            .set_default("orders.edit_window_secs", shared::DEFAULT_EDIT_WINDOW_SECS)?
            .set_default(
                "dashboard.expiry_horizon_days",
                shared::DEFAULT_EXPIRY_HORIZON_DAYS,
            )?
            .set_default("dashboard.list_limit", shared::DEFAULT_LIST_LIMIT as i64)?
            .set_default("dashboard.series_days", i64::from(shared::DEFAULT_SERIES_DAYS))?
            .set_default("logging.json", false)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (PLANNER_ prefix)
            .add_source(
                Environment::with_prefix("PLANNER")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: "0.0.0.0".to_string(),
        }
    }
}

impl Default for OrdersConfig {
    fn default() -> Self {
        Self {
            edit_window_secs: shared::DEFAULT_EDIT_WINDOW_SECS,
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            expiry_horizon_days: shared::DEFAULT_EXPIRY_HORIZON_DAYS,
            list_limit: shared::DEFAULT_LIST_LIMIT,
            series_days: shared::DEFAULT_SERIES_DAYS,
        }
    }
}
