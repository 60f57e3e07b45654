//! Merchant and gateway configuration, loaded from the environment.

use thiserror::Error;

use crate::client::DEFAULT_BASE_URL;
use crate::qr::{Currency, MerchantInfo};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable: {0}")]
    MissingVar(&'static str),

    #[error("invalid value for {var}: {value}")]
    InvalidValue { var: &'static str, value: String },
}

/// Everything the KHQR adapter needs: the merchant identity embedded in
/// every QR, and the Bakong credentials for verification.
#[derive(Debug, Clone)]
pub struct KhqrConfig {
    /// Bakong API bearer token.
    pub bakong_token: String,

    /// Bakong API host; overridable for sandbox testing.
    pub base_url: String,

    /// Bakong account id, e.g. `shop@bank`.
    pub account_id: String,

    pub merchant_name: String,
    pub merchant_city: String,
    pub store_label: String,
    pub terminal_label: String,
    pub currency: Currency,
}

impl KhqrConfig {
    /// Loads configuration from the environment.
    ///
    /// Required: `BAKONG_TOKEN`, `BAKONG_ACCOUNT_ID`, `MERCHANT_NAME`.
    /// Optional with defaults: `BAKONG_BASE_URL`, `MERCHANT_CITY`
    /// ("Phnom Penh"), `STORE_LABEL` (merchant name), `TERMINAL_LABEL`
    /// ("POS-01"), `KHQR_CURRENCY` ("USD").
    pub fn from_env() -> Result<Self, ConfigError> {
        let bakong_token = require("BAKONG_TOKEN")?;
        let account_id = require("BAKONG_ACCOUNT_ID")?;
        let merchant_name = require("MERCHANT_NAME")?;

        let currency_raw = optional("KHQR_CURRENCY").unwrap_or_else(|| "USD".to_string());
        let currency = Currency::parse(&currency_raw).ok_or(ConfigError::InvalidValue {
            var: "KHQR_CURRENCY",
            value: currency_raw,
        })?;

        Ok(KhqrConfig {
            bakong_token,
            base_url: optional("BAKONG_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            account_id,
            merchant_city: optional("MERCHANT_CITY").unwrap_or_else(|| "Phnom Penh".to_string()),
            store_label: optional("STORE_LABEL").unwrap_or_else(|| merchant_name.clone()),
            terminal_label: optional("TERMINAL_LABEL").unwrap_or_else(|| "POS-01".to_string()),
            merchant_name,
            currency,
        })
    }

    /// The merchant identity for QR generation.
    pub fn merchant_info(&self) -> MerchantInfo {
        MerchantInfo {
            account_id: self.account_id.clone(),
            merchant_name: self.merchant_name.clone(),
            merchant_city: self.merchant_city.clone(),
            store_label: self.store_label.clone(),
            terminal_label: self.terminal_label.clone(),
            currency: self.currency,
        }
    }
}

fn require(var: &'static str) -> Result<String, ConfigError> {
    std::env::var(var)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::MissingVar(var))
}

fn optional(var: &'static str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.is_empty())
}
