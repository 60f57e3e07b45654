//! # Error Types
//!
//! Domain-specific error types for bayon-core.
//!
//! ## Error Hierarchy
//! ```text
//! bayon-core errors (this file)
//! └── CoreError        - Pure business rule violations
//!
//! bayon-db errors (separate crate)
//! ├── DbError          - Storage failures
//! └── CheckoutError    - Checkout-transaction outcomes
//!
//! bayon-khqr errors (separate crate)
//! └── GatewayError     - Payment gateway failures
//!
//! API errors (in app)
//! └── ApiError         - What clients see (serialized)
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Errors are enum variants carrying typed fields, never packed strings
//! 3. Each variant maps to one client-facing condition

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Pure business rule violations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// The cart has no lines; there is nothing to price or check out.
    #[error("there are no products in cart")]
    EmptyCart,

    /// A cart line carried a non-positive quantity. Cart management
    /// deletes lines instead of storing zero, so this indicates a
    /// corrupted line.
    #[error("invalid quantity {quantity} for product {product_id}")]
    InvalidQuantity { product_id: String, quantity: i64 },
}

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
