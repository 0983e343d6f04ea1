use rust_decimal::Decimal;
use std::env;

const DEFAULT_DATABASE_URL: &str = "sqlite://polycopy.db";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    pub host: String,
    pub port: u16,

    // Bearer token for the signal-generator write surface (optional)
    pub api_token: Option<String>,

    // Config store limits
    pub max_position_cap_usdc: Decimal,

    // Expiry sweep for pending decisions that never executed
    pub expiry_sweep_enabled: bool,
    pub expiry_horizon_secs: i64,
    pub expiry_sweep_interval_secs: u64,

    // Log output: "json" or anything else for plain text
    pub log_format: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.into(),
            db_max_connections: 5,
            host: "0.0.0.0".into(),
            port: 8080,
            api_token: None,
            max_position_cap_usdc: Decimal::from(100_000),
            expiry_sweep_enabled: false,
            expiry_horizon_secs: 6 * 3600,
            expiry_sweep_interval_secs: 300,
            log_format: "text".into(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();

        Ok(Self {
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "5".into())
                .parse()?,
            host: env::var("HOST").unwrap_or(defaults.host),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()?,

            api_token: env::var("API_TOKEN").ok().filter(|t| !t.is_empty()),

            max_position_cap_usdc: env::var("MAX_POSITION_CAP_USDC")
                .unwrap_or_else(|_| "100000".into())
                .parse()
                .unwrap_or(defaults.max_position_cap_usdc),

            expiry_sweep_enabled: env::var("EXPIRY_SWEEP_ENABLED")
                .unwrap_or_else(|_| "false".into())
                .parse()
                .unwrap_or(false),
            expiry_horizon_secs: env::var("EXPIRY_HORIZON_SECS")
                .unwrap_or_else(|_| "21600".into())
                .parse()
                .unwrap_or(defaults.expiry_horizon_secs),
            expiry_sweep_interval_secs: env::var("EXPIRY_SWEEP_INTERVAL_SECS")
                .unwrap_or_else(|_| "300".into())
                .parse()
                .unwrap_or(defaults.expiry_sweep_interval_secs),

            log_format: env::var("LOG_FORMAT").unwrap_or(defaults.log_format),
        })
    }

    /// Returns true if the internal write routes require a bearer token.
    pub fn has_api_token(&self) -> bool {
        self.api_token.is_some()
    }
}
