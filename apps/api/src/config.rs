//! Server configuration from the environment.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiConfigError {
    #[error("missing environment variable: {0}")]
    MissingVar(&'static str),
}

/// Process-level settings; merchant and gateway settings live in
/// [`bayon_khqr::KhqrConfig`].
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Address to bind, e.g. `0.0.0.0:3000`.
    pub bind_addr: String,

    /// PostgreSQL connection URL.
    pub database_url: String,
}

impl ApiConfig {
    /// Loads configuration from `BIND_ADDR` (default `0.0.0.0:3000`)
    /// and `DATABASE_URL` (required).
    pub fn from_env() -> Result<Self, ApiConfigError> {
        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|v| !v.is_empty())
            .ok_or(ApiConfigError::MissingVar("DATABASE_URL"))?;

        let bind_addr =
            std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        Ok(ApiConfig {
            bind_addr,
            database_url,
        })
    }
}
