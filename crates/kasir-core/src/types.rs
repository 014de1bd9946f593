//! # Domain Types
//!
//! Core domain types for the kasir POS.
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business id where humans need one: member `code` ("MBR001"),
//!   `sale_number`, `barcode`
//!
//! ## Snapshot Pattern
//! Sale items freeze the product name, barcode and unit price at sale
//! time. Later catalog edits never rewrite history, and receipts can be
//! rebuilt without joins.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::{DiscountRate, Money};

// =============================================================================
// Product & Category
// =============================================================================

/// A product available for sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown to the cashier and on receipts.
    pub name: String,

    /// Barcode (EAN-13 etc.); unique when present, optional for loose
    /// counter items.
    pub barcode: Option<String>,

    /// Current selling price. Checkout always uses this, never a
    /// client-cached price.
    pub price: Money,

    /// Current stock level. Mutated only through the conditional
    /// stock-adjustment primitive.
    pub stock: i64,

    /// Weak reference to the owning category.
    pub category_id: Option<String>,

    /// Soft-delete flag. Products referenced by sales are deactivated,
    /// never hard-deleted.
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Checks whether `quantity` can be sold against current stock.
    ///
    /// The pre-commit validation check; the commit re-validates atomically.
    pub fn can_sell(&self, quantity: i64, allow_negative_stock: bool) -> bool {
        allow_negative_stock || self.stock >= quantity
    }
}

/// A product category. Owns zero or more products by weak back-reference.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Category {
    pub id: String,
    /// Unique, case-insensitive.
    pub name: String,
    pub description: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Member
// =============================================================================

/// A loyalty member.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Member {
    pub id: String,

    /// Human-facing member code entered at the till, e.g. "MBR001".
    pub code: String,

    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,

    /// Loyalty discount applied to the pre-tax subtotal.
    pub discount_rate: DiscountRate,

    /// Lifetime spend, accumulated inside the checkout transaction.
    pub total_purchase: Money,

    /// Number of completed sales, accumulated with `total_purchase`.
    pub visit_count: i64,

    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Physical cash payment.
    Cash,
    /// Card payment on an external terminal.
    Card,
    /// QRIS wallet payment.
    Qris,
}

impl Default for PaymentMethod {
    fn default() -> Self {
        PaymentMethod::Cash
    }
}

// =============================================================================
// Sale & SaleItem
// =============================================================================

/// A committed sale transaction. Immutable after creation.
///
/// ## Monetary Invariants
/// Computed once at commit time and never recomputed:
/// - `total == subtotal - total_discount + tax`
/// - `total_discount == member_discount + transaction_discount`
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: String,

    /// Display identifier printed on the receipt, e.g. "POS-20260830-0412".
    pub sale_number: String,

    pub subtotal: Money,
    pub member_discount: Money,
    pub transaction_discount: Money,
    pub total_discount: Money,
    pub tax: Money,
    pub total: Money,

    pub payment_method: PaymentMethod,

    /// Weak reference to the member, if one was attached.
    pub member_id: Option<String>,

    /// The operator who rang the sale (audit field).
    pub user_id: String,

    pub notes: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Sale {
    /// Checks the stored monetary identity.
    pub fn totals_consistent(&self) -> bool {
        self.total_discount == self.member_discount + self.transaction_discount
            && self.total == self.subtotal - self.total_discount + self.tax
    }
}

/// A line item owned by its sale. Created once, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,

    /// Weak reference back to the product (which must have been active at
    /// sale time; it may be deactivated later).
    pub product_id: String,

    /// Product name at time of sale (frozen).
    pub name_snapshot: String,

    /// Barcode at time of sale (frozen).
    pub barcode_snapshot: Option<String>,

    /// Unit price at time of sale (frozen).
    pub unit_price: Money,

    /// Quantity sold; always positive.
    pub quantity: i64,

    /// `unit_price × quantity`.
    pub line_subtotal: Money,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Stock Movements (audit trail)
// =============================================================================

/// Direction of a stock change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[ts(export)]
#[serde(rename_all = "UPPERCASE")]
pub enum StockMovementType {
    In,
    Out,
}

/// Append-only audit record of a stock quantity change and its cause.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct StockMovement {
    pub id: String,
    pub product_id: String,
    pub movement: StockMovementType,

    /// Magnitude of the change; always positive, direction in `movement`.
    pub quantity: i64,

    pub previous_stock: i64,
    pub new_stock: i64,

    /// What caused the movement, e.g. a sale number or "restock".
    pub reference: Option<String>,

    pub user_id: String,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================
