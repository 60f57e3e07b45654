//! Error types for the payment gateway boundary.

use thiserror::Error;

/// Errors from QR generation or gateway communication.
///
/// A gateway-level decline is not an error here: the client returns the
/// parsed [`GatewayResponse`] with its non-zero code, and the caller
/// decides what to surface.
///
/// [`GatewayResponse`]: crate::client::GatewayResponse
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The HTTP round trip to the gateway failed (network, TLS,
    /// timeout). The payment state is unknown; the order stays pending
    /// and verification can be retried.
    #[error("gateway request failed: {0}")]
    Transport(String),

    /// The gateway answered with a body this adapter cannot interpret.
    #[error("unexpected gateway response: {0}")]
    InvalidResponse(String),

    /// A merchant field cannot be encoded into the QR payload.
    #[error("invalid QR field: {0}")]
    InvalidField(String),
}

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;
