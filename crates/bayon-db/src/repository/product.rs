//! # Product Repository
//!
//! Stock ledger operations: locked reads and atomic decrements.
//!
//! ## Locking Discipline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │              Why lock ordering matters                              │
//! │                                                                     │
//! │  Checkout 1 cart: [B, A]        Checkout 2 cart: [A, B]            │
//! │                                                                     │
//! │  Without ordering: 1 locks B then waits on A,                      │
//! │                    2 locks A then waits on B  → deadlock           │
//! │                                                                     │
//! │  With ORDER BY id: both lock A first, then B → one simply waits    │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `decrement_stock` must only run while the caller holds the row lock
//! from `lock_and_read` on the same transaction, after explicitly
//! checking the requested quantity against the locked stock value.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection, PgPool};
use tracing::debug;

use bayon_core::Product;

use crate::error::{DbError, DbResult};

/// Row shape for product reads.
#[derive(Debug, Clone, FromRow)]
struct ProductRow {
    id: String,
    name: String,
    price_cents: i64,
    stock_quantity: i64,
    image_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            name: row.name,
            price_cents: row.price_cents,
            stock_quantity: row.stock_quantity,
            image_url: row.image_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: PgPool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: PgPool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by its ID (no lock).
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT id, name, price_cents, stock_quantity, image_url,
                   created_at, updated_at
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Product::from))
    }

    /// Acquires exclusive row locks on exactly the given products and
    /// returns their current state.
    ///
    /// `ORDER BY id` fixes the lock acquisition order to ascending
    /// product id, so two checkouts over overlapping product sets can
    /// never deadlock. The locks are held until the transaction commits
    /// or rolls back.
    ///
    /// ## Errors
    /// `DbError::NotFound` if any requested id has no product row.
    pub async fn lock_and_read(
        &self,
        conn: &mut PgConnection,
        ids: &[String],
    ) -> DbResult<Vec<Product>> {
        debug!(count = ids.len(), "Locking product rows");

        let rows = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT id, name, price_cents, stock_quantity, image_url,
                   created_at, updated_at
            FROM products
            WHERE id = ANY($1)
            ORDER BY id
            FOR UPDATE
            "#,
        )
        .bind(ids)
        .fetch_all(&mut *conn)
        .await?;

        if rows.len() != ids.len() {
            let found: Vec<&str> = rows.iter().map(|r| r.id.as_str()).collect();
            let missing = ids
                .iter()
                .find(|id| !found.contains(&id.as_str()))
                .map(String::as_str)
                .unwrap_or("unknown");
            return Err(DbError::not_found("Product", missing));
        }

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Subtracts `qty` from a product's stock.
    ///
    /// Caller contract: the product row lock from [`lock_and_read`] is
    /// held on this transaction and the quantity was checked against
    /// the locked stock value. The `stock_quantity >= $2` guard is a
    /// backstop, not the check.
    ///
    /// [`lock_and_read`]: ProductRepository::lock_and_read
    pub async fn decrement_stock(
        &self,
        conn: &mut PgConnection,
        id: &str,
        qty: i64,
    ) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET stock_quantity = stock_quantity - $2,
                updated_at = NOW()
            WHERE id = $1 AND stock_quantity >= $2
            "#,
        )
        .bind(id)
        .bind(qty)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product (with sufficient stock)", id));
        }

        debug!(id = %id, qty = %qty, "Decremented stock");
        Ok(())
    }

    /// Inserts a product directly.
    ///
    /// Catalog CRUD is an external collaborator; this exists for
    /// seeding and integration tests.
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, price_cents, stock_quantity,
                                  image_url, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(product.price_cents)
        .bind(product.stock_quantity)
        .bind(&product.image_url)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates a product's price (seed/test support; checkout never
    /// writes prices).
    pub async fn set_price(&self, id: &str, price_cents: i64) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE products SET price_cents = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(price_cents)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }
}
