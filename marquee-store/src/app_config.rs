use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub catalog: CatalogConfig,
    pub recommender: RecommenderConfig,
    pub payments: PaymentsConfig,
    pub identity: IdentityConfig,
    pub smtp: SmtpConfig,
    pub business_rules: BusinessRules,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RedisConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CatalogConfig {
    pub base_url: String,
    pub api_token: String,
    pub timeout_seconds: u64,
    pub now_playing_ttl_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RecommenderConfig {
    /// Unset disables the external recommender; browsing falls back to
    /// active shows.
    pub base_url: Option<String>,
    pub timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PaymentsConfig {
    pub api_base: String,
    pub secret_key: String,
    pub webhook_secret: String,
    pub currency: String,
    pub success_url: String,
    pub cancel_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IdentityConfig {
    pub jwt_secret: String,
    pub webhook_secret: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SmtpConfig {
    pub server: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_email: String,
    pub from_name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BusinessRules {
    /// Seconds before an unpaid booking's seats are released.
    pub hold_expiry_seconds: u64,
    /// Reminder fan-out looks this far ahead.
    pub reminder_lookahead_hours: i64,
    /// Six-field cron expression for the reminder schedule.
    pub reminder_cron: String,
    /// Maximum movies returned by the recommendation endpoint.
    pub recommendation_count: usize,
    #[serde(default = "default_rate_limit")]
    pub rate_limit_per_minute: i64,
}

fn default_rate_limit() -> i64 {
    100
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(config::File::with_name("config/default"))
            // Add in the current environment file (optional)
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add in a local configuration file, not checked in to git
            .add_source(config::File::with_name("config/local").required(false))
            // Add in settings from the environment (with a prefix of MARQUEE)
            // E.g. `MARQUEE__SERVER__PORT=8080` sets `server.port`
            .add_source(config::Environment::with_prefix("MARQUEE").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
