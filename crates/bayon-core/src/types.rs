//! # Domain Types
//!
//! Core domain types used throughout the checkout engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │     Order       │   │   OrderLine     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  order_id (FK)  │       │
//! │  │  name           │   │  status         │   │  product_id     │       │
//! │  │  price_cents    │   │  payment_method │   │  quantity       │       │
//! │  │  stock_quantity │   │  total_cents    │   │  price_at_sale  │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    CartLine     │   │  OrderStatus    │   │ PaymentMethod   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  user_id        │   │  Pending        │   │  Cash           │       │
//! │  │  product_id     │   │  Completed      │   │  Khqr           │       │
//! │  │  quantity ≥ 1   │   └─────────────────┘   └─────────────────┘       │
//! │  └─────────────────┘                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000, so integer arithmetic stays exact.
/// 1000 bps = 10% (the store's checkout rate).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a whole percentage (1000 bps → 10).
    #[inline]
    pub const fn percent(&self) -> u32 {
        self.0 / 100
    }

    /// Returns the rate as a ratio (1000 bps → 0.10). Display only.
    #[inline]
    pub fn ratio(&self) -> f64 {
        self.0 as f64 / 10000.0
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
///
/// The catalog itself (CRUD, images) is managed elsewhere; checkout
/// treats every field except `stock_quantity` as a read-only input.
/// `stock_quantity` is the single shared mutable resource of the system
/// and is only ever changed under a row lock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown on summaries and order lines.
    pub name: String,

    /// Price in cents (smallest currency unit).
    pub price_cents: i64,

    /// Current stock level. Invariant: never negative at a
    /// transaction boundary.
    pub stock_quantity: i64,

    /// Optional product image URL (managed by the catalog service).
    pub image_url: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Checks whether `quantity` units can be taken from stock.
    #[inline]
    pub fn has_stock_for(&self, quantity: i64) -> bool {
        quantity <= self.stock_quantity
    }
}

// =============================================================================
// Cart Line
// =============================================================================

/// A line in a user's cart.
///
/// Owned by the user and mutated by the cart-management collaborator;
/// checkout only reads cart lines and deletes them on success.
/// Quantity is always >= 1: a line that would reach zero is deleted,
/// never persisted at zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLine {
    pub id: String,
    pub user_id: String,
    pub product_id: String,
    pub quantity: i64,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Order Status
// =============================================================================

/// The lifecycle state of an order.
///
/// There is no Failed or Cancelled state: a pending KHQR order whose
/// payment never settles simply stays `Pending`. It holds no stock, so
/// it is inert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Created, stock not yet committed (KHQR awaiting settlement).
    Pending,
    /// Terminal: stock committed, order lines attached, cart cleared.
    Completed,
}

impl OrderStatus {
    /// The single legal transition is `Pending → Completed`.
    #[inline]
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Pending, OrderStatus::Completed)
        )
    }

    /// Completed orders never change again.
    #[inline]
    pub fn is_terminal(self) -> bool {
        self == OrderStatus::Completed
    }

    /// Stable string form used in the database and on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Completed => "completed",
        }
    }

    /// Parses the stable string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(OrderStatus::Pending),
            "completed" => Some(OrderStatus::Completed),
            _ => None,
        }
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash, settled at the counter.
    Cash,
    /// KHQR payment, settled later by the Bakong gateway.
    Khqr,
}

impl PaymentMethod {
    /// Cash settles immediately, so a cash order is born `Completed`
    /// and never passes through `Pending`.
    #[inline]
    pub fn skips_pending(self) -> bool {
        matches!(self, PaymentMethod::Cash)
    }

    /// The status a freshly created order starts in.
    #[inline]
    pub fn initial_status(self) -> OrderStatus {
        if self.skips_pending() {
            OrderStatus::Completed
        } else {
            OrderStatus::Pending
        }
    }

    /// Stable string form used in the database and on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Khqr => "khqr",
        }
    }

    /// Parses the stable string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "cash" => Some(PaymentMethod::Cash),
            "khqr" => Some(PaymentMethod::Khqr),
            _ => None,
        }
    }
}

// =============================================================================
// Order
// =============================================================================

/// A checkout attempt, durable once created.
///
/// Totals are computed exactly once at pricing time and never
/// recomputed; catalog price changes after creation do not affect them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub user_id: String,
    pub payment_method: PaymentMethod,
    pub status: OrderStatus,
    pub sub_total_cents: i64,
    /// Tax rate in basis points at pricing time.
    pub tax_rate_bps: i32,
    /// Tax amount in cents (`sub_total × rate`, rounded half up once).
    pub tax_cents: i64,
    pub total_cents: i64,
    /// MD5 of the KHQR payload for gateway lookup. None for cash.
    pub transaction_ref: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Order Line
// =============================================================================

/// A line item attached to an order.
/// Uses the snapshot pattern to freeze product data at time of sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    /// Product name at time of sale (frozen).
    pub name_snapshot: String,
    /// Quantity sold.
    pub quantity: i64,
    /// Unit price in cents at time of sale (frozen). Never recomputed
    /// from the live catalog price.
    pub price_at_sale_cents: i64,
    pub created_at: DateTime<Utc>,
}

impl OrderLine {
    /// Returns the line total (price at sale × quantity) as Money.
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.price_at_sale_cents * self.quantity)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tax_rate_conversions() {
        let rate = TaxRate::from_bps(1000);
        assert_eq!(rate.bps(), 1000);
        assert_eq!(rate.percent(), 10);
        assert!((rate.ratio() - 0.10).abs() < f64::EPSILON);
    }

    #[test]
    fn test_order_status_transitions() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Completed));
        assert!(!OrderStatus::Completed.can_transition_to(OrderStatus::Pending));
        assert!(!OrderStatus::Completed.can_transition_to(OrderStatus::Completed));
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Pending));
    }

    #[test]
    fn test_order_status_terminal() {
        assert!(OrderStatus::Completed.is_terminal());
        assert!(!OrderStatus::Pending.is_terminal());
    }

    #[test]
    fn test_cash_skips_pending() {
        assert_eq!(
            PaymentMethod::Cash.initial_status(),
            OrderStatus::Completed
        );
        assert_eq!(PaymentMethod::Khqr.initial_status(), OrderStatus::Pending);
    }

    #[test]
    fn test_enum_string_round_trips() {
        for status in [OrderStatus::Pending, OrderStatus::Completed] {
            assert_eq!(OrderStatus::parse(status.as_str()), Some(status));
        }
        for method in [PaymentMethod::Cash, PaymentMethod::Khqr] {
            assert_eq!(PaymentMethod::parse(method.as_str()), Some(method));
        }
        assert_eq!(OrderStatus::parse("voided"), None);
        assert_eq!(PaymentMethod::parse("card"), None);
    }

    #[test]
    fn test_product_stock_check() {
        let product = Product {
            id: "p1".to_string(),
            name: "Coffee".to_string(),
            price_cents: 350,
            stock_quantity: 2,
            image_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(product.has_stock_for(2));
        assert!(!product.has_stock_for(3));
    }
}
