use config::{Config, ConfigError, Environment, File};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info};
use validator::{Validate, ValidationError, ValidationErrors};

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_PORT: u16 = 8080;
const CONFIG_DIR: &str = "config";
const DEFAULT_CART_BACKEND: &str = "in-memory";
const DEFAULT_NOTIFICATION_BACKEND: &str = "log";
const DEFAULT_NOTIFICATION_QUEUE: &str = "marketplace:notifications";
const DEFAULT_CART_TTL_SECS: u64 = 604_800; // 7 days
const DEFAULT_DOWNLOAD_ROOT: &str = "downloads";

/// Application configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Database connection URL
    pub database_url: String,

    /// Redis connection URL (used by the redis cart and notification backends)
    pub redis_url: String,

    /// Server host address
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Application environment
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    #[validate(custom = "validate_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Whether to run database migrations on startup
    #[serde(default)]
    pub auto_migrate: bool,

    /// CORS: comma-separated list of allowed origins (production)
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,

    /// Allow permissive CORS fallback
    #[serde(default = "default_false_bool")]
    pub cors_allow_any_origin: bool,

    /// CORS: allow credentials
    #[serde(default)]
    pub cors_allow_credentials: bool,

    /// DB pool: max connections
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,

    /// DB pool: min connections
    #[serde(default = "default_db_min_connections")]
    pub db_min_connections: u32,

    /// DB timeouts (seconds)
    #[serde(default = "default_db_connect_timeout_secs")]
    pub db_connect_timeout_secs: u64,
    #[serde(default = "default_db_idle_timeout_secs")]
    pub db_idle_timeout_secs: u64,
    #[serde(default = "default_db_acquire_timeout_secs")]
    pub db_acquire_timeout_secs: u64,

    /// Event channel capacity for async event processing
    #[serde(default = "default_event_channel_capacity")]
    #[validate(custom = "validate_event_channel_capacity")]
    pub event_channel_capacity: usize,

    /// Cart storage backend selection ("in-memory" or "redis")
    #[serde(default = "default_cart_backend")]
    #[validate(custom = "validate_cart_backend")]
    pub cart_backend: String,

    /// Seconds an idle session cart survives before expiry
    #[serde(default = "default_cart_ttl_secs")]
    pub cart_ttl_secs: u64,

    /// Notification sink backend ("log" or "redis")
    #[serde(default = "default_notification_backend")]
    #[validate(custom = "validate_notification_backend")]
    pub notification_backend: String,

    /// Redis list the notification sink pushes onto (drained by the mailer)
    #[serde(default = "default_notification_queue")]
    pub notification_queue: String,

    /// Flat shipping fee charged when an order contains physical items
    #[serde(default = "default_shipping_flat_fee")]
    #[validate(custom = "validate_shipping_flat_fee")]
    pub shipping_flat_fee: Decimal,

    /// Display currency code for prices and totals
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Default download quota granted per purchased downloadable item
    #[serde(default = "default_max_downloads")]
    #[validate(range(min = 1))]
    pub default_max_downloads: i32,

    /// Directory product download files are resolved under
    #[serde(default = "default_download_root")]
    pub download_root: String,

    /// Recipient for admin order/demo/contact notifications
    #[serde(default = "default_admin_email")]
    #[validate(email)]
    pub admin_email: String,

    /// Default page size for paginated API responses
    #[serde(default = "default_api_page_size")]
    pub api_default_page_size: u64,

    /// Maximum page size allowed for paginated API responses
    #[serde(default = "default_api_max_page_size")]
    pub api_max_page_size: u64,
}

impl AppConfig {
    /// Gets database URL reference
    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    /// Creates a new configuration with defaults for everything optional
    pub fn new(
        database_url: String,
        redis_url: String,
        host: String,
        port: u16,
        environment: String,
    ) -> Self {
        Self {
            database_url,
            redis_url,
            host,
            port,
            environment,
            log_level: default_log_level(),
            log_json: false,
            auto_migrate: false,
            cors_allowed_origins: None,
            cors_allow_any_origin: false,
            cors_allow_credentials: false,
            db_max_connections: default_db_max_connections(),
            db_min_connections: default_db_min_connections(),
            db_connect_timeout_secs: default_db_connect_timeout_secs(),
            db_idle_timeout_secs: default_db_idle_timeout_secs(),
            db_acquire_timeout_secs: default_db_acquire_timeout_secs(),
            event_channel_capacity: default_event_channel_capacity(),
            cart_backend: default_cart_backend(),
            cart_ttl_secs: default_cart_ttl_secs(),
            notification_backend: default_notification_backend(),
            notification_queue: default_notification_queue(),
            shipping_flat_fee: default_shipping_flat_fee(),
            currency: default_currency(),
            default_max_downloads: default_max_downloads(),
            download_root: default_download_root(),
            admin_email: default_admin_email(),
            api_default_page_size: default_api_page_size(),
            api_max_page_size: default_api_max_page_size(),
        }
    }

    /// Gets Redis URL reference
    pub fn redis_url(&self) -> &str {
        &self.redis_url
    }

    /// Checks if running in production environment
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    /// Checks if running in development environment
    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }

    /// Returns true if explicit CORS origins are configured
    pub fn has_cors_allowed_origins(&self) -> bool {
        self.cors_allowed_origins
            .as_ref()
            .map(|raw| raw.split(',').any(|origin| !origin.trim().is_empty()))
            .unwrap_or(false)
    }

    /// Whether we should fall back to permissive CORS
    pub fn should_allow_permissive_cors(&self) -> bool {
        self.is_development() || self.cors_allow_any_origin
    }

    /// Gets log level reference
    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    /// Session cart time-to-live as a Duration
    pub fn cart_ttl(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.cart_ttl_secs)
    }

    fn validate_additional_constraints(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if !self.should_allow_permissive_cors() && !self.has_cors_allowed_origins() {
            let mut err = ValidationError::new("cors_allowed_origins_required");
            err.message = Some(
                "Set APP__CORS_ALLOWED_ORIGINS for non-development environments or explicitly opt-in via APP__CORS_ALLOW_ANY_ORIGIN=true".into(),
            );
            errors.add("cors_allowed_origins", err);
        }

        if self.download_root.trim().is_empty() {
            let mut err = ValidationError::new("download_root_required");
            err.message = Some("download_root must point at a directory".into());
            errors.add("download_root", err);
        }

        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Configuration loading failed: {0}")]
    Load(#[from] ConfigError),

    #[error("Configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Default value functions
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_db_max_connections() -> u32 {
    16
}
fn default_db_min_connections() -> u32 {
    2
}
fn default_db_connect_timeout_secs() -> u64 {
    30
}
fn default_db_idle_timeout_secs() -> u64 {
    600
}
fn default_db_acquire_timeout_secs() -> u64 {
    8
}

fn default_false_bool() -> bool {
    false
}

fn default_event_channel_capacity() -> usize {
    1024
}

fn default_cart_backend() -> String {
    DEFAULT_CART_BACKEND.to_string()
}

fn default_cart_ttl_secs() -> u64 {
    DEFAULT_CART_TTL_SECS
}

fn default_notification_backend() -> String {
    DEFAULT_NOTIFICATION_BACKEND.to_string()
}

fn default_notification_queue() -> String {
    DEFAULT_NOTIFICATION_QUEUE.to_string()
}

fn default_shipping_flat_fee() -> Decimal {
    dec!(300.00)
}

fn default_currency() -> String {
    "KES".to_string()
}

fn default_max_downloads() -> i32 {
    5
}

fn default_download_root() -> String {
    DEFAULT_DOWNLOAD_ROOT.to_string()
}

fn default_admin_email() -> String {
    "admin@dravtech.com".to_string()
}

fn default_api_page_size() -> u64 {
    20
}

fn default_api_max_page_size() -> u64 {
    100
}

fn validate_cart_backend(value: &str) -> Result<(), ValidationError> {
    match value.to_ascii_lowercase().as_str() {
        "in-memory" | "redis" => Ok(()),
        _ => {
            let mut err = ValidationError::new("cart_backend");
            err.message = Some("Must be one of: in-memory, redis".into());
            Err(err)
        }
    }
}

fn validate_notification_backend(value: &str) -> Result<(), ValidationError> {
    match value.to_ascii_lowercase().as_str() {
        "log" | "redis" => Ok(()),
        _ => {
            let mut err = ValidationError::new("notification_backend");
            err.message = Some("Must be one of: log, redis".into());
            Err(err)
        }
    }
}

/// Validates log level values
fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if valid_levels.contains(&level.to_lowercase().as_str()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("log_level");
        err.message = Some("Must be one of: trace, debug, info, warn, error".into());
        Err(err)
    }
}

fn validate_shipping_flat_fee(fee: &Decimal) -> Result<(), ValidationError> {
    if fee.is_sign_negative() {
        let mut err = ValidationError::new("shipping_flat_fee");
        err.message = Some("shipping_flat_fee cannot be negative".into());
        return Err(err);
    }
    Ok(())
}

fn validate_event_channel_capacity(capacity: usize) -> Result<(), ValidationError> {
    if capacity == 0 {
        let mut err = ValidationError::new("event_channel_capacity");
        err.message = Some("event_channel_capacity must be greater than 0".into());
        return Err(err);
    }
    Ok(())
}

/// Initializes tracing using the provided log level as the default filter
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::fmt;

    let default_directive = format!("marketplace_api={},tower_http=debug", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    if json {
        let _ = fmt().with_env_filter(filter_directive).json().try_init();
    } else {
        let _ = fmt().with_env_filter(filter_directive).try_init();
    }
}

/// Loads application configuration
///
/// Layers configuration sources in this order:
/// 1. Default config (config/default.toml)
/// 2. Environment-specific config (config/{env}.toml)
/// 3. Docker config (config/docker.toml) if DOCKER env var is set
/// 4. Environment variables (APP__*)
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    // Support both RUN_ENV and APP_ENV for selecting config profile
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    if !Path::new(CONFIG_DIR).exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            CONFIG_DIR
        );
    }

    let mut builder = Config::builder()
        .set_default("database_url", "sqlite://marketplace.db?mode=rwc")?
        .set_default("redis_url", "redis://localhost:6379")?
        .set_default("host", "0.0.0.0")?
        .set_default("port", DEFAULT_PORT)?
        .set_default("environment", DEFAULT_ENV)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false));

    if env::var("DOCKER").is_ok() {
        info!("Docker environment detected");
        builder =
            builder.add_source(File::with_name(&format!("{}/docker", CONFIG_DIR)).required(false));
    }

    let config = builder
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    let app_config: AppConfig = config.try_deserialize()?;

    app_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    app_config.validate_additional_constraints().map_err(|e| {
        error!("Configuration security validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    info!("Configuration loaded successfully");
    Ok(app_config)
}


#[cfg(test)]
mod commerce_defaults_tests {
    use super::*;

    #[test]
    fn shipping_fee_defaults_to_flat_kes_rate() {
        let cfg = AppConfig::new(
            "sqlite://marketplace.db?mode=memory".into(),
            "redis://127.0.0.1:6379".into(),
            "127.0.0.1".into(),
            8080,
            "development".into(),
        );
        assert_eq!(cfg.shipping_flat_fee, dec!(300.00));
        assert_eq!(cfg.currency, "KES");
        assert_eq!(cfg.default_max_downloads, 5);
    }

    #[test]
    fn negative_shipping_fee_rejected() {
        assert!(validate_shipping_flat_fee(&dec!(-1)).is_err());
        assert!(validate_shipping_flat_fee(&dec!(0)).is_ok());
        assert!(validate_shipping_flat_fee(&dec!(300.00)).is_ok());
    }

    #[test]
    fn cart_backend_values_validated() {
        assert!(validate_cart_backend("in-memory").is_ok());
        assert!(validate_cart_backend("redis").is_ok());
        assert!(validate_cart_backend("REDIS").is_ok());
        assert!(validate_cart_backend("postgres").is_err());
    }

    #[test]
    fn log_level_values_validated() {
        assert!(validate_log_level("info").is_ok());
        assert!(validate_log_level("WARN").is_ok());
        assert!(validate_log_level("verbose").is_err());
    }
}
