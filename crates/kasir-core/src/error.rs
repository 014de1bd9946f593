//! # Error Types
//!
//! Domain-specific error types for kasir-core.
//!
//! ## Error Hierarchy
//! ```text
//! kasir-core (this file)
//! ├── CoreError        - business rule violations
//! └── ValidationError  - input validation failures
//!
//! kasir-db (separate crate)
//! ├── DbError          - database operation failures
//! ├── CheckoutError    - checkout service surface
//! └── FavoriteError    - favorites manager surface
//!
//! Flow: ValidationError → CoreError → service error → HTTP response
//! ```
//!
//! ## Design Principles
//! 1. `thiserror` derive macros, not manual impls
//! 2. Context in the message (product name, code, quantities)
//! 3. Errors are enum variants, never bare strings

use thiserror::Error;

/// Core business logic errors.
///
/// These represent business rule violations detected before or during a
/// checkout. They are reported before any mutation begins, so a failed
/// request leaves the store state untouched.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Cart line references an id with no product row.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Product exists but has been soft-deleted.
    #[error("Product is inactive: {0}")]
    ProductInactive(String),

    /// Member code did not resolve to an active member.
    #[error("Member not found: {0}")]
    MemberNotFound(String),

    /// Requested quantity exceeds available stock.
    ///
    /// Surfaced from the pre-commit validation pass; the commit-time
    /// conditional decrement re-checks this atomically.
    #[error("Insufficient stock for {name}: available {available}, requested {requested}")]
    InsufficientStock {
        name: String,
        available: i64,
        requested: i64,
    },

    /// Checkout was called with no cart lines.
    #[error("Cart is empty")]
    EmptyCart,

    /// Category still owns products and cannot be deleted.
    #[error("Category {name} still has {product_count} products")]
    CategoryNotEmpty { name: String, product_count: i64 },

    /// Sale id did not resolve.
    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Input validation errors.
///
/// Detected early, before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// A fraction-encoded rate outside [0, 1].
    #[error("{field} must be a fraction between 0 and 1")]
    InvalidRate { field: String },

    /// Invalid format (bad UUID, malformed barcode, etc.).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (e.g. duplicate barcode or category name).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;
