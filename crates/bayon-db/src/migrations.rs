//! # Database Migrations
//!
//! Embedded SQL migrations for the checkout schema.
//!
//! ## Adding New Migrations
//!
//! 1. Create a new file in `migrations/postgres/` with the next sequence number
//! 2. Name format: `NNN_description.sql` (e.g. `002_add_receipts.sql`)
//! 3. Write idempotent SQL (use `IF NOT EXISTS` where possible)
//! 4. NEVER modify existing migrations - always add new ones

use sqlx::PgPool;
use tracing::info;

use crate::error::DbResult;

/// Embedded migrations from the `migrations/postgres` directory.
///
/// The `sqlx::migrate!()` macro embeds all SQL files from the specified
/// directory into the binary at compile time. No runtime file access
/// needed.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/postgres");

/// Runs all pending database migrations.
///
/// Idempotent and ordered: sqlx records each applied migration in
/// `_sqlx_migrations` and only runs what is new, in filename order.
pub async fn run_migrations(pool: &PgPool) -> DbResult<()> {
    info!("Checking for pending migrations");

    MIGRATOR.run(pool).await?;

    info!("All migrations applied successfully");
    Ok(())
}
