//! # Cart Repository
//!
//! Read access to cart lines and the post-checkout clear.
//!
//! Cart line CRUD (add / remove / adjust quantity) belongs to the cart
//! management service; checkout only ever reads a user's lines joined
//! with product identity and deletes them all once an order commits.

use sqlx::{FromRow, PgConnection, PgPool};
use tracing::debug;

use crate::error::DbResult;

/// A cart line joined with its product, as checkout consumes it.
///
/// `unit_price_cents` and `stock_quantity` come from the product row at
/// read time. On the unlocked read path they are advisory; the checkout
/// transaction re-reads both under a row lock before trusting them.
#[derive(Debug, Clone, FromRow)]
pub struct CartLineView {
    pub product_id: String,
    pub product_name: String,
    pub unit_price_cents: i64,
    pub stock_quantity: i64,
    pub quantity: i64,
}

/// Ordered by product id so iteration order matches lock order.
const SELECT_LINES: &str = r#"
    SELECT
        c.product_id,
        p.name AS product_name,
        p.price_cents AS unit_price_cents,
        p.stock_quantity,
        c.quantity
    FROM cart_lines c
    INNER JOIN products p ON p.id = c.product_id
    WHERE c.user_id = $1
    ORDER BY c.product_id
"#;

/// Repository for cart line database operations.
#[derive(Debug, Clone)]
pub struct CartRepository {
    pool: PgPool,
}

impl CartRepository {
    /// Creates a new CartRepository.
    pub fn new(pool: PgPool) -> Self {
        CartRepository { pool }
    }

    /// Reads a user's cart lines with product snapshots. No locks; used
    /// by the summary preview and the advisory QR pre-check.
    pub async fn lines_for_user(&self, user_id: &str) -> DbResult<Vec<CartLineView>> {
        let lines = sqlx::query_as::<_, CartLineView>(SELECT_LINES)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        debug!(user_id = %user_id, count = lines.len(), "Read cart lines");
        Ok(lines)
    }

    /// Same read, executed on the checkout transaction's connection.
    ///
    /// Still lock-free: the product rows get locked afterwards by
    /// `ProductRepository::lock_and_read`, and stock is re-validated
    /// against the locked values, so a stale read here is harmless.
    pub async fn lines_for_user_tx(
        &self,
        conn: &mut PgConnection,
        user_id: &str,
    ) -> DbResult<Vec<CartLineView>> {
        let lines = sqlx::query_as::<_, CartLineView>(SELECT_LINES)
            .bind(user_id)
            .fetch_all(&mut *conn)
            .await?;

        Ok(lines)
    }

    /// Deletes all of a user's cart lines, as the final write of a
    /// successful checkout. Runs on the checkout transaction so a later
    /// failure rolls the deletion back with everything else.
    pub async fn clear_for_user(&self, conn: &mut PgConnection, user_id: &str) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM cart_lines WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *conn)
            .await?;

        debug!(user_id = %user_id, deleted = result.rows_affected(), "Cleared cart");
        Ok(result.rows_affected())
    }

    /// Inserts a cart line directly.
    ///
    /// Cart management is an external collaborator; this exists for
    /// seeding and integration tests.
    pub async fn insert_line(
        &self,
        id: &str,
        user_id: &str,
        product_id: &str,
        quantity: i64,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO cart_lines (id, user_id, product_id, quantity)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(product_id)
        .bind(quantity)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
