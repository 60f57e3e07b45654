//! # Bayon POS API Server
//!
//! The HTTP surface of the checkout engine.
//!
//! ## Request Flow
//! ```text
//! HTTP request
//!      │
//!      ▼
//! extract::UserId        ← x-user-id header, 401 without it
//!      │
//!      ▼
//! routes::{orders,payments}
//!      │
//!      ├──► bayon_db::CheckoutService   (transactions, locks)
//!      └──► bayon_khqr::PaymentGateway  (Bakong verification)
//! ```
//!
//! ## Endpoints
//!
//! | Method | Path                        | Purpose                      |
//! |--------|-----------------------------|------------------------------|
//! | GET    | /api/orders/summary         | Priced cart preview          |
//! | GET    | /api/orders                 | Completed order history      |
//! | POST   | /api/orders/checkout/cash   | Cash checkout                |
//! | POST   | /api/payments/checkout/qr   | Generate KHQR, pending order |
//! | POST   | /api/payments/verify        | Verify payment, complete     |
//! | GET    | /health                     | Liveness probe               |

use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use bayon_db::{CheckoutService, Database, DbConfig};
use bayon_khqr::{BakongClient, KhqrConfig};

mod config;
mod error;
mod extract;
mod routes;
mod state;

use config::ApiConfig;
use state::AppState;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(err) = run().await {
        error!(error = %err, "Server failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = ApiConfig::from_env()?;
    let khqr = KhqrConfig::from_env()?;

    let db = Database::connect(DbConfig::new(&config.database_url)).await?;
    let gateway = BakongClient::with_base_url(&khqr.bakong_token, &khqr.base_url)?;

    let state = AppState {
        checkout: CheckoutService::new(db),
        gateway: Arc::new(gateway),
        merchant: khqr.merchant_info(),
    };

    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %config.bind_addr, "Bayon POS API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "Failed to listen for shutdown signal");
        return;
    }
    info!("Shutdown signal received");
}
