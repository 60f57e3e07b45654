//! # bayon-khqr: KHQR Payment Gateway Adapter
//!
//! Generates EMV-compatible KHQR payloads and talks to the Bakong
//! gateway to verify that a shopper actually paid.
//!
//! ## Payment Flow
//! ```text
//! checkout/qr                                verify
//!      │                                        │
//!      ▼                                        ▼
//! ┌────────────────┐                   ┌─────────────────────┐
//! │ qr::generate   │                   │ BakongClient        │
//! │  EMV TLV + CRC │                   │  check_transaction  │
//! │  md5 reference │                   │  by md5 reference   │
//! └────────────────┘                   └─────────────────────┘
//!      │                                        │
//!      ▼                                        ▼
//!  shopper scans, pays in their          responseCode == 0
//!  banking app (out of band)             → order can complete
//! ```
//!
//! The QR payload is built entirely locally; only verification makes a
//! network round trip. The MD5 hash of the payload doubles as the
//! transaction reference the gateway settles under.
//!
//! ## Module Organization
//!
//! - [`qr`] - EMV TLV payload construction and the md5 reference
//! - [`client`] - The [`PaymentGateway`] trait and the Bakong HTTP client
//! - [`config`] - Merchant and gateway configuration from the environment
//! - [`error`] - Gateway error types

pub mod client;
pub mod config;
pub mod error;
pub mod qr;

pub use client::{BakongClient, GatewayResponse, PaymentGateway};
pub use config::{ConfigError, KhqrConfig};
pub use error::GatewayError;
pub use qr::{Currency, MerchantInfo, QrPayload};
