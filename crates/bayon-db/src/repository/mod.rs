//! # Repository Module
//!
//! Database repository implementations for the checkout engine.
//!
//! ## Repository Pattern
//! The repositories abstract SQL behind a clean API so the checkout
//! orchestrator and the HTTP handlers never touch query strings. Each
//! repository holds the pool for plain reads and additionally exposes
//! `&mut PgConnection` methods for the operations that must run inside
//! the checkout transaction.
//!
//! ## Available Repositories
//!
//! - [`cart::CartRepository`] - Cart line reads and the post-checkout clear
//! - [`product::ProductRepository`] - Locked stock reads and decrements
//! - [`order::OrderRepository`] - Order and order line persistence

pub mod cart;
pub mod order;
pub mod product;
