//! Route definitions.

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

pub mod orders;
pub mod payments;

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/orders/summary", get(orders::summary))
        .route("/api/orders", get(orders::index))
        .route("/api/orders/checkout/cash", post(orders::checkout_cash))
        .route("/api/payments/checkout/qr", post(payments::checkout_qr))
        .route("/api/payments/verify", post(payments::verify))
        .route("/health", get(health))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
