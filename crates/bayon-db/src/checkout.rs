//! # Checkout Transaction
//!
//! The only path by which cart contents become a durable order and
//! stock is mutated.
//!
//! ## Cash Checkout (single transaction)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  1. read cart lines + product identity     (no lock)               │
//! │  2. EmptyCart if none                                              │
//! │  3. lock product rows, ascending id        (FOR UPDATE)            │
//! │  4. re-validate qty ≤ locked stock         (InsufficientStock)     │
//! │  5. price the locked lines                 (PricingEngine)         │
//! │  6. insert order                           (cash → completed)      │
//! │  7. insert order lines                     (price_at_sale frozen)  │
//! │  8. decrement stock per line                                       │
//! │  9. clear the cart                                                 │
//! │ 10. commit                                                         │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//! Any failure drops the transaction, which rolls back every write: no
//! order, no stock change, cart untouched. The stock check runs under
//! the row lock immediately before the mutations that depend on it,
//! which closes the check-then-act race an unlocked read would permit.
//!
//! ## KHQR Path
//! QR creation runs only steps 1-2 and 5 plus an advisory stock check,
//! inserts a `pending` order, and holds no locks while the shopper pays
//! (the gateway round trip has unbounded latency). Verification re-runs
//! steps 3-9 against the existing pending order and transitions it to
//! `completed`. A repeated verify finds the completed order and returns
//! it without touching stock again.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use bayon_core::pricing::{price_lines, LineItem, OrderTotals};
use bayon_core::{CoreError, Order, OrderLine, OrderStatus, PaymentMethod, Product};
use sqlx::PgConnection;

use crate::error::DbError;
use crate::pool::Database;
use crate::repository::cart::CartLineView;

// =============================================================================
// Errors
// =============================================================================

/// Outcomes of a checkout or verification attempt.
///
/// The first three are business-rule violations surfaced to the client
/// with structured fields; `Storage` is an opaque internal failure.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The user's cart has no lines.
    #[error("there are no products in cart")]
    EmptyCart,

    /// A cart line requests more than the product's current stock.
    /// `available_stock` is the literal remaining stock; zero means
    /// sold out.
    #[error("not enough stock for {product_name}: {available_stock} available")]
    InsufficientStock {
        product_name: String,
        available_stock: i64,
    },

    /// No order of the requesting user matches the transaction
    /// reference. Also covers attempts against someone else's order.
    #[error("order not found")]
    OrderNotFound,

    /// Storage-level failure; rolled back, nothing partial observable.
    #[error(transparent)]
    Storage(#[from] DbError),
}

impl From<CoreError> for CheckoutError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::EmptyCart => CheckoutError::EmptyCart,
            CoreError::InvalidQuantity { .. } => {
                CheckoutError::Storage(DbError::CorruptRow(err.to_string()))
            }
        }
    }
}

// =============================================================================
// Result Types
// =============================================================================

/// One line of the priced checkout preview.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryItem {
    pub product_id: String,
    pub product_name: String,
    pub product_price_cents: i64,
    pub product_quantity: i64,
    pub product_sub_total_cents: i64,
}

/// The priced preview of a cart: read-only, no locks.
#[derive(Debug, Clone, Serialize)]
pub struct OrderSummary {
    pub items: Vec<SummaryItem>,
    pub totals: OrderTotals,
}

/// An order together with its lines, as returned to callers.
#[derive(Debug, Clone, Serialize)]
pub struct HydratedOrder {
    pub order: Order,
    pub lines: Vec<OrderLine>,
}

// =============================================================================
// Checkout Service
// =============================================================================

/// Orchestrates checkout transactions over the repositories.
#[derive(Debug, Clone)]
pub struct CheckoutService {
    db: Database,
}

impl CheckoutService {
    /// Creates a new CheckoutService.
    pub fn new(db: Database) -> Self {
        CheckoutService { db }
    }

    /// Prices the user's cart without locking or mutating anything.
    pub async fn order_summary(&self, user_id: &str) -> Result<OrderSummary, CheckoutError> {
        let lines = self.db.carts().lines_for_user(user_id).await?;
        if lines.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let totals = price_lines(&to_line_items(&lines))?;
        let items = lines
            .iter()
            .map(|line| SummaryItem {
                product_id: line.product_id.clone(),
                product_name: line.product_name.clone(),
                product_price_cents: line.unit_price_cents,
                product_quantity: line.quantity,
                product_sub_total_cents: line.unit_price_cents * line.quantity,
            })
            .collect();

        Ok(OrderSummary { items, totals })
    }

    /// Cash checkout: the full algorithm, one transaction, the order is
    /// born `completed`.
    pub async fn checkout_cash(&self, user_id: &str) -> Result<HydratedOrder, CheckoutError> {
        let carts = self.db.carts();
        let orders = self.db.orders();

        let mut tx = self.db.begin().await?;

        let lines = carts.lines_for_user_tx(&mut tx, user_id).await?;
        if lines.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let products = self.lock_and_validate(&mut tx, &lines).await?;

        // Price from the locked rows, not the unlocked join.
        let priced: Vec<LineItem> = lines
            .iter()
            .map(|line| LineItem {
                unit_price_cents: products[&line.product_id].price_cents,
                quantity: line.quantity,
            })
            .collect();
        let totals = price_lines(&priced)?;

        let now = Utc::now();
        let order = new_order(user_id, PaymentMethod::Cash, &totals, None, now);
        orders.insert(&mut tx, &order).await?;

        let order_lines = self
            .attach_and_decrement(&mut tx, &order.id, &lines, &products, now)
            .await?;

        carts.clear_for_user(&mut tx, user_id).await?;

        tx.commit().await.map_err(DbError::from)?;

        info!(
            order_id = %order.id,
            user_id = %user_id,
            total = order.total_cents,
            lines = order_lines.len(),
            "Cash checkout completed"
        );

        Ok(HydratedOrder {
            order,
            lines: order_lines,
        })
    }

    /// QR creation prelude: the cart must be non-empty, every line must
    /// pass an advisory stock check, and the totals are computed.
    ///
    /// Advisory means unlocked: it gives the shopper early feedback
    /// before they pay, but the binding check happens under lock at
    /// verification. No rows are locked or mutated here because the
    /// gateway round trip that follows must not hold database locks.
    pub async fn prepare_qr(&self, user_id: &str) -> Result<OrderTotals, CheckoutError> {
        let lines = self.db.carts().lines_for_user(user_id).await?;
        if lines.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        for line in &lines {
            if line.quantity > line.stock_quantity {
                return Err(CheckoutError::InsufficientStock {
                    product_name: line.product_name.clone(),
                    available_stock: line.stock_quantity,
                });
            }
        }

        Ok(price_lines(&to_line_items(&lines))?)
    }

    /// Persists the `pending` order for a generated QR payload. Stock
    /// is untouched; the order only records what the shopper owes and
    /// the reference the gateway will settle under.
    pub async fn create_pending_qr_order(
        &self,
        user_id: &str,
        totals: &OrderTotals,
        transaction_ref: &str,
    ) -> Result<Order, CheckoutError> {
        let now = Utc::now();
        let order = new_order(
            user_id,
            PaymentMethod::Khqr,
            totals,
            Some(transaction_ref.to_string()),
            now,
        );

        let mut tx = self.db.begin().await?;
        self.db.orders().insert(&mut tx, &order).await?;
        tx.commit().await.map_err(DbError::from)?;

        info!(
            order_id = %order.id,
            user_id = %user_id,
            transaction_ref = %transaction_ref,
            "Pending KHQR order created"
        );

        Ok(order)
    }

    /// Completion tail for a verified KHQR payment: re-runs the
    /// locking, validating, and mutating steps against the existing
    /// pending order, then transitions it to `completed`.
    ///
    /// Idempotent: the order row is locked first, and a reference that
    /// already resolved to a completed order returns that order without
    /// decrementing anything again.
    pub async fn complete_qr_order(
        &self,
        user_id: &str,
        transaction_ref: &str,
    ) -> Result<HydratedOrder, CheckoutError> {
        let carts = self.db.carts();
        let orders = self.db.orders();

        let mut tx = self.db.begin().await?;

        let order = orders
            .find_for_verify(&mut tx, user_id, transaction_ref)
            .await?
            .ok_or(CheckoutError::OrderNotFound)?;

        if order.status.is_terminal() {
            // Replayed verify; release the lock and return as-is.
            drop(tx);
            debug!(order_id = %order.id, "Verify replay on completed order");
            let (order, lines) = orders
                .get_with_lines(&order.id)
                .await?
                .ok_or(CheckoutError::OrderNotFound)?;
            return Ok(HydratedOrder { order, lines });
        }

        let lines = carts.lines_for_user_tx(&mut tx, user_id).await?;
        if lines.is_empty() {
            // The cart was consumed since the QR was issued (e.g. by a
            // cash checkout); there is nothing to fulfill against.
            return Err(CheckoutError::EmptyCart);
        }

        let products = self.lock_and_validate(&mut tx, &lines).await?;

        let now = Utc::now();
        orders.mark_completed(&mut tx, &order.id, now).await?;

        let order_lines = self
            .attach_and_decrement(&mut tx, &order.id, &lines, &products, now)
            .await?;

        carts.clear_for_user(&mut tx, user_id).await?;

        tx.commit().await.map_err(DbError::from)?;

        info!(
            order_id = %order.id,
            user_id = %user_id,
            transaction_ref = %transaction_ref,
            "KHQR order completed"
        );

        let mut order = order;
        order.status = OrderStatus::Completed;
        order.completed_at = Some(now);
        order.updated_at = now;

        Ok(HydratedOrder {
            order,
            lines: order_lines,
        })
    }

    /// Reads an order with lines, scoped to its owner.
    pub async fn get_order(
        &self,
        user_id: &str,
        order_id: &str,
    ) -> Result<HydratedOrder, CheckoutError> {
        let (order, lines) = self
            .db
            .orders()
            .get_with_lines(order_id)
            .await?
            .ok_or(CheckoutError::OrderNotFound)?;

        if order.user_id != user_id {
            return Err(CheckoutError::OrderNotFound);
        }

        Ok(HydratedOrder { order, lines })
    }

    /// Lists the user's completed orders with their lines.
    pub async fn completed_orders(&self, user_id: &str) -> Result<Vec<HydratedOrder>, CheckoutError> {
        let orders = self.db.orders().list_completed_for_user(user_id).await?;
        Ok(orders
            .into_iter()
            .map(|(order, lines)| HydratedOrder { order, lines })
            .collect())
    }

    // =========================================================================
    // Transaction Internals
    // =========================================================================

    /// Steps 3-4: lock the referenced product rows (ascending id) and
    /// re-validate every line against the locked stock. The first
    /// violation aborts the whole attempt.
    async fn lock_and_validate(
        &self,
        conn: &mut PgConnection,
        lines: &[CartLineView],
    ) -> Result<HashMap<String, Product>, CheckoutError> {
        let ids: Vec<String> = lines.iter().map(|l| l.product_id.clone()).collect();
        let locked = self.db.products().lock_and_read(conn, &ids).await?;

        let products: HashMap<String, Product> =
            locked.into_iter().map(|p| (p.id.clone(), p)).collect();

        for line in lines {
            let product = &products[&line.product_id];
            if !product.has_stock_for(line.quantity) {
                return Err(CheckoutError::InsufficientStock {
                    product_name: product.name.clone(),
                    available_stock: product.stock_quantity,
                });
            }
        }

        Ok(products)
    }

    /// Steps 7-8: attach one order line per cart line, snapshotting
    /// name and price from the locked product row, and decrement stock.
    async fn attach_and_decrement(
        &self,
        conn: &mut PgConnection,
        order_id: &str,
        lines: &[CartLineView],
        products: &HashMap<String, Product>,
        now: DateTime<Utc>,
    ) -> Result<Vec<OrderLine>, CheckoutError> {
        let orders = self.db.orders();
        let product_repo = self.db.products();

        let mut order_lines = Vec::with_capacity(lines.len());
        for line in lines {
            let product = &products[&line.product_id];

            let order_line = OrderLine {
                id: Uuid::new_v4().to_string(),
                order_id: order_id.to_string(),
                product_id: product.id.clone(),
                name_snapshot: product.name.clone(),
                quantity: line.quantity,
                price_at_sale_cents: product.price_cents,
                created_at: now,
            };
            orders.insert_line(conn, &order_line).await?;

            product_repo
                .decrement_stock(conn, &product.id, line.quantity)
                .await?;

            order_lines.push(order_line);
        }

        Ok(order_lines)
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn to_line_items(lines: &[CartLineView]) -> Vec<LineItem> {
    lines
        .iter()
        .map(|line| LineItem {
            unit_price_cents: line.unit_price_cents,
            quantity: line.quantity,
        })
        .collect()
}

fn new_order(
    user_id: &str,
    method: PaymentMethod,
    totals: &OrderTotals,
    transaction_ref: Option<String>,
    now: DateTime<Utc>,
) -> Order {
    let status = method.initial_status();
    Order {
        id: Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        payment_method: method,
        status,
        sub_total_cents: totals.sub_total_cents,
        tax_rate_bps: totals.tax_rate_bps as i32,
        tax_cents: totals.tax_cents,
        total_cents: totals.total_cents,
        transaction_ref,
        created_at: now,
        updated_at: now,
        completed_at: status.is_terminal().then_some(now),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_error_mapping() {
        let err: CheckoutError = CoreError::EmptyCart.into();
        assert!(matches!(err, CheckoutError::EmptyCart));
    }

    #[test]
    fn test_new_order_cash_born_completed() {
        let totals = OrderTotals {
            sub_total_cents: 2500,
            tax_rate_bps: 1000,
            tax_cents: 250,
            total_cents: 2750,
        };
        let order = new_order("u1", PaymentMethod::Cash, &totals, None, Utc::now());
        assert_eq!(order.status, OrderStatus::Completed);
        assert!(order.completed_at.is_some());
        assert!(order.transaction_ref.is_none());
    }

    #[test]
    fn test_new_order_khqr_born_pending() {
        let totals = OrderTotals {
            sub_total_cents: 1000,
            tax_rate_bps: 1000,
            tax_cents: 100,
            total_cents: 1100,
        };
        let order = new_order(
            "u1",
            PaymentMethod::Khqr,
            &totals,
            Some("abc123".to_string()),
            Utc::now(),
        );
        assert_eq!(order.status, OrderStatus::Pending);
        assert!(order.completed_at.is_none());
        assert_eq!(order.transaction_ref.as_deref(), Some("abc123"));
    }
}
