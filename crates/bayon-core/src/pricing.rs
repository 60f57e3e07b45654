//! # Pricing Engine
//!
//! Pure checkout pricing: subtotal, tax, and total from a set of priced
//! cart lines. No user context, no side effects; cart ownership is the
//! caller's problem. An empty input is rejected here, so no caller can
//! produce a zero-line order.
//!
//! ## Contract
//! ```text
//! sub_total = Σ unit_price × quantity      (exact integer cents)
//! tax       = sub_total × 10%              (rounded half up, once)
//! total     = sub_total + tax
//! ```

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::money::Money;
use crate::types::TaxRate;
use crate::CHECKOUT_TAX_RATE;

// =============================================================================
// Input / Output Types
// =============================================================================

/// One priced line of input: what it costs and how many.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub unit_price_cents: i64,
    pub quantity: i64,
}

impl LineItem {
    /// The line total in exact integer cents.
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.unit_price_cents).multiply_quantity(self.quantity)
    }
}

/// The computed totals of one checkout, persisted verbatim on the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    pub sub_total_cents: i64,
    pub tax_rate_bps: u32,
    pub tax_cents: i64,
    pub total_cents: i64,
}

impl OrderTotals {
    /// The tax rate as a whole percentage (10), for API payloads.
    #[inline]
    pub fn tax_rate_percent(&self) -> u32 {
        TaxRate::from_bps(self.tax_rate_bps).percent()
    }

    /// The tax rate as a ratio (0.10), for API payloads. Display only.
    #[inline]
    pub fn tax_ratio(&self) -> f64 {
        TaxRate::from_bps(self.tax_rate_bps).ratio()
    }
}

// =============================================================================
// Pricing
// =============================================================================

/// Prices a non-empty collection of cart lines at the fixed store rate.
///
/// ## Errors
/// `CoreError::EmptyCart` when `lines` is empty.
pub fn price_lines(lines: &[LineItem]) -> Result<OrderTotals, CoreError> {
    price_lines_at(lines, CHECKOUT_TAX_RATE)
}

/// Prices cart lines at an explicit rate.
///
/// Split out so tests can exercise rounding at arbitrary rates; the
/// checkout paths always go through [`price_lines`].
pub fn price_lines_at(lines: &[LineItem], rate: TaxRate) -> Result<OrderTotals, CoreError> {
    if lines.is_empty() {
        return Err(CoreError::EmptyCart);
    }

    let mut sub_total = Money::zero();
    for line in lines {
        sub_total += line.line_total();
    }

    // The only rounding point of the whole checkout.
    let tax = sub_total.calculate_tax(rate);
    let total = sub_total + tax;

    Ok(OrderTotals {
        sub_total_cents: sub_total.cents(),
        tax_rate_bps: rate.bps(),
        tax_cents: tax.cents(),
        total_cents: total.cents(),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
