//! # Database Pool Management
//!
//! Connection pool creation and configuration for PostgreSQL.
//!
//! ## Lifecycle
//! ```text
//! App startup
//!      │
//!      ▼
//! DbConfig::new(url)          ← configure pool settings
//!      │
//!      ▼
//! Database::connect(config)   ← create pool + run migrations
//!      │
//!      ▼
//! db.carts() / db.products() / db.orders()
//! ```

use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, Transaction};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::cart::CartRepository;
use crate::repository::order::OrderRepository;
use crate::repository::product::ProductRepository;

// =============================================================================
// Configuration
// =============================================================================

/// Database configuration.
///
/// ## Example
/// ```rust,ignore
/// let config = DbConfig::new("postgres://localhost/bayon_pos")
///     .max_connections(10);
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,

    /// Maximum number of connections in the pool.
    /// Default: 10
    pub max_connections: u32,

    /// Minimum number of connections to keep alive.
    /// Default: 1
    pub min_connections: u32,

    /// Connection acquire timeout.
    /// Default: 30 seconds
    pub connect_timeout: Duration,

    /// Whether to run migrations on connect.
    /// Default: true
    pub run_migrations: bool,
}

impl DbConfig {
    /// Creates a new database configuration with the given URL.
    pub fn new(url: impl Into<String>) -> Self {
        DbConfig {
            database_url: url.into(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            run_migrations: true,
        }
    }

    /// Sets the maximum number of connections.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Sets the minimum number of connections.
    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    /// Sets the connection acquire timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets whether to run migrations on connect.
    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }
}

// =============================================================================
// Database Handle
// =============================================================================

/// Shared database handle: the pool plus repository accessors.
///
/// Cloning is cheap (the pool is reference counted); every layer that
/// needs database access holds a clone.
#[derive(Debug, Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connects to PostgreSQL and (by default) runs pending migrations.
    pub async fn connect(config: DbConfig) -> DbResult<Self> {
        debug!(
            max_connections = config.max_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            .connect(&config.database_url)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        let db = Database { pool };

        if config.run_migrations {
            migrations::run_migrations(&db.pool).await?;
        }

        info!("Database ready");
        Ok(db)
    }

    /// Wraps an existing pool (used by tests that manage their own).
    pub fn from_pool(pool: PgPool) -> Self {
        Database { pool }
    }

    /// Returns the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Begins a new transaction.
    ///
    /// Dropping the returned transaction without calling `commit`
    /// rolls back everything executed on it.
    pub async fn begin(&self) -> DbResult<Transaction<'_, Postgres>> {
        Ok(self.pool.begin().await?)
    }

    /// Cart repository accessor.
    pub fn carts(&self) -> CartRepository {
        CartRepository::new(self.pool.clone())
    }

    /// Product repository accessor.
    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone())
    }

    /// Order repository accessor.
    pub fn orders(&self) -> OrderRepository {
        OrderRepository::new(self.pool.clone())
    }
}
