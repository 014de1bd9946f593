//! # Database Error Types
//!
//! Error types for the persistence layer.
//!
//! ## Error Flow
//! ```text
//! sqlx::Error ──► DbError (this module) ──► service errors
//!                                           (CheckoutError, FavoriteError)
//! ```
//!
//! Business-rule failures (unknown product, oversell, empty cart) are
//! `kasir_core::CoreError`, not `DbError`. This enum covers the storage
//! engine only.

use thiserror::Error;

/// Database operation errors.
///
/// Wraps sqlx errors and adds enough context to tell a duplicate barcode
/// apart from a broken connection.
#[derive(Debug, Error)]
pub enum DbError {
    /// No row for the given id.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// UNIQUE index violation.
    ///
    /// Raised for duplicate barcodes, member codes, and category names
    /// (category names are unique case-insensitively).
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key violation.
    ///
    /// Raised when deleting a category that still has products, or a
    /// member/product referenced by a recorded sale. Those rows are
    /// deactivated, never hard-deleted.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Could not open or create the database file.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Schema migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed at runtime.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// A multi-statement transaction could not commit.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// All pool connections are in use.
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Anything sqlx reports that has no better category.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and id.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates a UniqueViolation error.
    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Convert sqlx errors to DbError.
///
/// SQLite reports constraint failures as flat message strings, so the
/// mapping inspects the message text:
/// ```text
/// "UNIQUE constraint failed: products.barcode" → UniqueViolation
/// "FOREIGN KEY constraint failed"              → ForeignKeyViolation
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                if msg.contains("UNIQUE constraint failed") {
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::UniqueViolation {
                        field,
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

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

/// Errors from write paths that enforce business rules on top of storage.
///
/// Pure reads return [`DbError`]; writes that can fail a business rule
/// (duplicate barcode is storage, deleting a non-empty category is not)
/// return this.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Core(#[from] kasir_core::CoreError),

    #[error(transparent)]
    Db(#[from] DbError),
}

impl From<kasir_core::ValidationError> for StoreError {
    fn from(err: kasir_core::ValidationError) -> Self {
        StoreError::Core(err.into())
    }
}

/// Result type for rule-enforcing write operations.
pub type StoreResult<T> = Result<T, StoreError>;
