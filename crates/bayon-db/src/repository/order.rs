//! # Order Repository
//!
//! Persistence for orders and their lines.
//!
//! Orders are written inside the checkout transaction; the hydrating
//! reads used by API responses run on the pool afterwards.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection, PgPool};
use tracing::debug;

use bayon_core::{Order, OrderLine, OrderStatus, PaymentMethod};

use crate::error::{DbError, DbResult};

// =============================================================================
// Row Types
// =============================================================================

/// Raw order row; status and payment method come back as TEXT and are
/// parsed into the domain enums.
#[derive(Debug, Clone, FromRow)]
struct OrderRow {
    id: String,
    user_id: String,
    payment_method: String,
    status: String,
    sub_total_cents: i64,
    tax_rate_bps: i32,
    tax_cents: i64,
    total_cents: i64,
    transaction_ref: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl TryFrom<OrderRow> for Order {
    type Error = DbError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let payment_method = PaymentMethod::parse(&row.payment_method).ok_or_else(|| {
            DbError::CorruptRow(format!(
                "order {}: unknown payment method '{}'",
                row.id, row.payment_method
            ))
        })?;
        let status = OrderStatus::parse(&row.status).ok_or_else(|| {
            DbError::CorruptRow(format!(
                "order {}: unknown status '{}'",
                row.id, row.status
            ))
        })?;

        Ok(Order {
            id: row.id,
            user_id: row.user_id,
            payment_method,
            status,
            sub_total_cents: row.sub_total_cents,
            tax_rate_bps: row.tax_rate_bps,
            tax_cents: row.tax_cents,
            total_cents: row.total_cents,
            transaction_ref: row.transaction_ref,
            created_at: row.created_at,
            updated_at: row.updated_at,
            completed_at: row.completed_at,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
struct OrderLineRow {
    id: String,
    order_id: String,
    product_id: String,
    name_snapshot: String,
    quantity: i64,
    price_at_sale_cents: i64,
    created_at: DateTime<Utc>,
}

impl From<OrderLineRow> for OrderLine {
    fn from(row: OrderLineRow) -> Self {
        OrderLine {
            id: row.id,
            order_id: row.order_id,
            product_id: row.product_id,
            name_snapshot: row.name_snapshot,
            quantity: row.quantity,
            price_at_sale_cents: row.price_at_sale_cents,
            created_at: row.created_at,
        }
    }
}

const SELECT_ORDER: &str = r#"
    SELECT id, user_id, payment_method, status,
           sub_total_cents, tax_rate_bps, tax_cents, total_cents,
           transaction_ref, created_at, updated_at, completed_at
    FROM orders
"#;

// =============================================================================
// Repository
// =============================================================================

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: PgPool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: PgPool) -> Self {
        OrderRepository { pool }
    }

    /// Inserts an order on the checkout transaction.
    pub async fn insert(&self, conn: &mut PgConnection, order: &Order) -> DbResult<()> {
        debug!(id = %order.id, method = order.payment_method.as_str(), "Inserting order");

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, user_id, payment_method, status,
                sub_total_cents, tax_rate_bps, tax_cents, total_cents,
                transaction_ref, created_at, updated_at, completed_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(&order.id)
        .bind(&order.user_id)
        .bind(order.payment_method.as_str())
        .bind(order.status.as_str())
        .bind(order.sub_total_cents)
        .bind(order.tax_rate_bps)
        .bind(order.tax_cents)
        .bind(order.total_cents)
        .bind(&order.transaction_ref)
        .bind(order.created_at)
        .bind(order.updated_at)
        .bind(order.completed_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Attaches a line to an order on the checkout transaction.
    ///
    /// ## Snapshot Pattern
    /// The caller fills `name_snapshot` and `price_at_sale_cents` from
    /// the locked product row; they are frozen here and never touched
    /// by later catalog changes.
    pub async fn insert_line(&self, conn: &mut PgConnection, line: &OrderLine) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO order_lines (
                id, order_id, product_id, name_snapshot,
                quantity, price_at_sale_cents, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(&line.id)
        .bind(&line.order_id)
        .bind(&line.product_id)
        .bind(&line.name_snapshot)
        .bind(line.quantity)
        .bind(line.price_at_sale_cents)
        .bind(line.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Finds the caller's order for a transaction reference, locking
    /// the order row.
    ///
    /// The `FOR UPDATE` serializes concurrent verify calls for the same
    /// reference: the second caller blocks here until the first commits
    /// and then observes the completed status.
    pub async fn find_for_verify(
        &self,
        conn: &mut PgConnection,
        user_id: &str,
        transaction_ref: &str,
    ) -> DbResult<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "{SELECT_ORDER} WHERE user_id = $1 AND transaction_ref = $2 FOR UPDATE"
        ))
        .bind(user_id)
        .bind(transaction_ref)
        .fetch_optional(&mut *conn)
        .await?;

        row.map(Order::try_from).transpose()
    }

    /// Transitions an order from `pending` to `completed`.
    ///
    /// The status predicate makes the transition exactly-once even if a
    /// caller bypasses the row lock: a second attempt affects zero rows.
    pub async fn mark_completed(
        &self,
        conn: &mut PgConnection,
        order_id: &str,
        completed_at: DateTime<Utc>,
    ) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET status = 'completed',
                completed_at = $2,
                updated_at = $2
            WHERE id = $1 AND status = 'pending'
            "#,
        )
        .bind(order_id)
        .bind(completed_at)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order (pending)", order_id));
        }

        Ok(())
    }

    /// Reads an order with its lines (pool; used to hydrate responses).
    pub async fn get_with_lines(&self, order_id: &str) -> DbResult<Option<(Order, Vec<OrderLine>)>> {
        let row = sqlx::query_as::<_, OrderRow>(&format!("{SELECT_ORDER} WHERE id = $1"))
            .bind(order_id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let order = Order::try_from(row)?;

        let lines = sqlx::query_as::<_, OrderLineRow>(
            r#"
            SELECT id, order_id, product_id, name_snapshot,
                   quantity, price_at_sale_cents, created_at
            FROM order_lines
            WHERE order_id = $1
            ORDER BY product_id
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some((order, lines.into_iter().map(OrderLine::from).collect())))
    }

    /// Lists a user's completed orders with their lines, newest first.
    pub async fn list_completed_for_user(
        &self,
        user_id: &str,
    ) -> DbResult<Vec<(Order, Vec<OrderLine>)>> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "{SELECT_ORDER} WHERE user_id = $1 AND status = 'completed' ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            orders.push(Order::try_from(row)?);
        }

        let order_ids: Vec<String> = orders.iter().map(|o| o.id.clone()).collect();
        let line_rows = sqlx::query_as::<_, OrderLineRow>(
            r#"
            SELECT id, order_id, product_id, name_snapshot,
                   quantity, price_at_sale_cents, created_at
            FROM order_lines
            WHERE order_id = ANY($1)
            ORDER BY product_id
            "#,
        )
        .bind(&order_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut hydrated: Vec<(Order, Vec<OrderLine>)> =
            orders.into_iter().map(|o| (o, Vec::new())).collect();
        for line_row in line_rows {
            let line = OrderLine::from(line_row);
            if let Some((_, lines)) = hydrated.iter_mut().find(|(o, _)| o.id == line.order_id) {
                lines.push(line);
            }
        }

        Ok(hydrated)
    }
}
