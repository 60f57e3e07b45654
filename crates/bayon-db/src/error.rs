//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! PostgreSQL error (sqlx::Error)
//!      │
//!      ▼
//! DbError (this module)  ← adds context and categorization
//!      │
//!      ▼
//! CheckoutError / ApiError ← what callers and clients see
//! ```

use thiserror::Error;

/// Database operation errors.
///
/// These errors wrap sqlx errors and provide additional context
/// for debugging and user feedback.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation (e.g. a duplicate transaction
    /// reference on a pending order).
    #[error("duplicate {field}: already exists")]
    UniqueViolation { field: String },

    /// Foreign key constraint violation (e.g. a cart line referencing
    /// a product that no longer exists).
    #[error("foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Check constraint violation. The stock backstop constraint lands
    /// here if the explicit pre-check is ever bypassed.
    #[error("check constraint violation: {message}")]
    CheckViolation { message: String },

    /// Database connection failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("connection pool exhausted")]
    PoolExhausted,

    /// A row carried a value the application cannot interpret
    /// (e.g. an unknown order status string).
    #[error("corrupt row: {0}")]
    CorruptRow(String),

    /// Internal database error.
    #[error("internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }
}

/// Convert sqlx errors to DbError.
///
/// PostgreSQL signals constraint classes through SQLSTATE codes:
/// `23505` unique, `23503` foreign key, `23514` check.
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|c| c.to_string()).unwrap_or_default();
                match code.as_str() {
                    "23505" => DbError::UniqueViolation {
                        field: db_err
                            .constraint()
                            .unwrap_or("unknown")
                            .to_string(),
                    },
                    "23503" => DbError::ForeignKeyViolation {
                        message: db_err.message().to_string(),
                    },
                    "23514" => DbError::CheckViolation {
                        message: db_err.message().to_string(),
                    },
                    _ => DbError::QueryFailed(db_err.message().to_string()),
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;
