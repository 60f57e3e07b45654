//! # Bakong Gateway Client
//!
//! The HTTP side of payment verification: asking the gateway whether a
//! transaction reference (the QR payload's MD5) has been paid.
//!
//! The [`PaymentGateway`] trait is the seam for tests; handlers depend
//! on the trait, never on [`BakongClient`] directly.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{GatewayError, GatewayResult};

/// Default Bakong API host.
pub const DEFAULT_BASE_URL: &str = "https://api-bakong.nbc.gov.kh";

const CHECK_BY_MD5_PATH: &str = "/v1/check_transaction_by_md5";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// =============================================================================
// Gateway Trait
// =============================================================================

/// Verifies payments by transaction reference.
///
/// Implemented by [`BakongClient`] in production and by in-memory fakes
/// in tests.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Asks the gateway whether the transaction identified by `md5` has
    /// settled. A transport failure is an error; a gateway-level
    /// decline is a successful call whose response carries a non-zero
    /// code.
    async fn check_transaction(&self, md5: &str) -> GatewayResult<GatewayResponse>;
}

/// The gateway's verdict on a transaction.
///
/// `response_code` 0 means the payment settled; any other value is a
/// decline whose code and message are surfaced to the client verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayResponse {
    pub response_code: i64,
    pub response_message: String,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

impl GatewayResponse {
    /// Whether the gateway confirmed the payment.
    pub fn is_success(&self) -> bool {
        self.response_code == 0
    }
}

// =============================================================================
// Bakong Client
// =============================================================================

/// Production [`PaymentGateway`] backed by the Bakong open API.
#[derive(Debug, Clone)]
pub struct BakongClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl BakongClient {
    /// Creates a client against the production Bakong host.
    pub fn new(token: impl Into<String>) -> GatewayResult<Self> {
        Self::with_base_url(token, DEFAULT_BASE_URL)
    }

    /// Creates a client against a specific host (sandbox, test server).
    pub fn with_base_url(
        token: impl Into<String>,
        base_url: impl Into<String>,
    ) -> GatewayResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        Ok(BakongClient {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }
}

#[derive(Serialize)]
struct CheckByMd5Request<'a> {
    md5: &'a str,
}

#[async_trait]
impl PaymentGateway for BakongClient {
    async fn check_transaction(&self, md5: &str) -> GatewayResult<GatewayResponse> {
        let url = format!("{}{}", self.base_url, CHECK_BY_MD5_PATH);
        debug!(md5 = %md5, "Checking transaction with gateway");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(&CheckByMd5Request { md5 })
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        // Bakong reports both settled and not-found transactions as
        // structured JSON, so parse the body before judging the status.
        let parsed: GatewayResponse = serde_json::from_str(&body).map_err(|_| {
            GatewayError::InvalidResponse(format!("HTTP {status}: {}", truncate_body(&body)))
        })?;

        debug!(
            code = parsed.response_code,
            message = %parsed.response_message,
            "Gateway responded"
        );

        Ok(parsed)
    }
}

fn truncate_body(body: &str) -> &str {
    match body.char_indices().nth(200) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
