//! Shared application state.

use std::sync::Arc;

use bayon_db::CheckoutService;
use bayon_khqr::{MerchantInfo, PaymentGateway};

/// State handed to every handler. Cloning is cheap: the checkout
/// service wraps a pooled database handle and the gateway is shared
/// behind an `Arc`.
///
/// The gateway is held as a trait object so tests can swap in a fake
/// without a network.
#[derive(Clone)]
pub struct AppState {
    pub checkout: CheckoutService,
    pub gateway: Arc<dyn PaymentGateway>,
    pub merchant: MerchantInfo,
}
