//! # bayon-core: Pure Business Logic for Bayon POS
//!
//! This crate is the heart of the checkout engine. It contains all
//! business logic as pure functions with zero I/O dependencies.
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, CartLine, Order, OrderLine)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`pricing`] - Checkout pricing: subtotal, tax, total
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64) to avoid float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use bayon_core::pricing::{price_lines, LineItem};
//!
//! let lines = vec![
//!     LineItem { unit_price_cents: 1000, quantity: 2 },
//!     LineItem { unit_price_cents: 500, quantity: 1 },
//! ];
//!
//! let totals = price_lines(&lines).unwrap();
//! assert_eq!(totals.sub_total_cents, 2500); // $25.00
//! assert_eq!(totals.tax_cents, 250);        // 10% tax
//! assert_eq!(totals.total_cents, 2750);     // $27.50
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod pricing;
pub mod types;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::CoreError;
pub use money::Money;
pub use pricing::{price_lines, LineItem, OrderTotals};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// The checkout tax rate: a fixed 10% (1000 basis points).
///
/// This is a configuration constant of the store, not derived from
/// products. Every order persists the rate it was priced with, so a
/// future change here never rewrites history.
pub const CHECKOUT_TAX_RATE: types::TaxRate = types::TaxRate::from_bps(1000);
