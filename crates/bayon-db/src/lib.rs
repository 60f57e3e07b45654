//! # bayon-db: Database Layer for Bayon POS
//!
//! PostgreSQL access for the checkout engine, built on sqlx.
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repositories (cart, product, order)
//! - [`checkout`] - The checkout transaction orchestrator
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bayon_db::{CheckoutService, Database, DbConfig};
//!
//! let config = DbConfig::new("postgres://localhost/bayon_pos");
//! let db = Database::connect(config).await?;
//!
//! let checkout = CheckoutService::new(db.clone());
//! let order = checkout.checkout_cash("user-1").await?;
//! ```
//!
//! ## Transaction Discipline
//!
//! Repositories expose two kinds of methods: pool-backed reads for
//! request handling, and connection-backed operations that take a
//! `&mut PgConnection` so the checkout orchestrator can thread one
//! `sqlx::Transaction` through every lock, read, and write. Dropping
//! the transaction without commit rolls back every write, which is the
//! all-or-nothing guarantee the checkout relies on.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checkout;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use checkout::{CheckoutError, CheckoutService, HydratedOrder, OrderSummary};
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::cart::CartRepository;
pub use repository::order::OrderRepository;
pub use repository::product::ProductRepository;
