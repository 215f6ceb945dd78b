use std::net::SocketAddr;

use rust_decimal::Decimal;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    /// Base URL of Encar's read API, overridable for tests.
    pub encar_api_base: String,
    pub encar_request_timeout_secs: u64,
    pub encar_user_agent: String,
    /// Listings requested per seller-catalog page.
    pub encar_page_size: u32,
    pub encar_inter_request_delay_ms: u64,
    pub encar_max_retries: u32,
    pub encar_retry_backoff_base_secs: u64,
    /// Live FX rate endpoint; when unset the fallback rate is used as-is.
    pub fx_endpoint: Option<String>,
    /// KRW per USD served when no live rate is available.
    pub fx_fallback_rate: Decimal,
    pub fx_refresh_secs: u64,
    /// Upper bound on the extraction phase of one import run.
    pub import_timeout_secs: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("encar_api_base", &self.encar_api_base)
            .field(
                "encar_request_timeout_secs",
                &self.encar_request_timeout_secs,
            )
            .field("encar_user_agent", &self.encar_user_agent)
            .field("encar_page_size", &self.encar_page_size)
            .field(
                "encar_inter_request_delay_ms",
                &self.encar_inter_request_delay_ms,
            )
            .field("encar_max_retries", &self.encar_max_retries)
            .field(
                "encar_retry_backoff_base_secs",
                &self.encar_retry_backoff_base_secs,
            )
            .field("fx_endpoint", &self.fx_endpoint)
            .field("fx_fallback_rate", &self.fx_fallback_rate)
            .field("fx_refresh_secs", &self.fx_refresh_secs)
            .field("import_timeout_secs", &self.import_timeout_secs)
            .finish()
    }
}
