//! # Pricing: the checkout totals computation
//!
//! The fixed-order money pipeline at the center of every sale:
//!
//! ```text
//! subtotal (Σ current price × qty)
//!    │
//!    ├─► member discount   (subtotal × member rate, if enabled)
//!    ├─► transaction discount (manual input: % of subtotal or amount)
//!    │
//!    ▼
//! total discount = member + transaction, clamped to the subtotal
//!    │
//!    ▼
//! tax = (subtotal − total discount) × tax rate   ← post-discount base,
//!    │                                             never the raw subtotal
//!    ▼
//! total = subtotal − total discount + tax
//! ```
//!
//! The ordering is a correctness contract, not an implementation detail:
//! discount-before-tax is what makes the stored invariant
//! `total == subtotal - total_discount + tax` reproducible. The frontends
//! may preview these numbers, but the server-side computation here is the
//! single source of truth.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::discount::ManualDiscount;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::{DiscountRate, Money};
use crate::settings::StoreSettings;
use crate::{MAX_CART_LINES, MAX_LINE_QUANTITY};

/// A raw cart line as submitted for checkout.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: String,
    pub quantity: i64,
}

/// A cart line after resolution against the catalog: product snapshot
/// fields plus the quantity. The unit price here is the product's current
/// price, read server-side; client-submitted prices are never trusted.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PricedLine {
    pub product_id: String,
    pub name: String,
    pub barcode: Option<String>,
    pub unit_price: Money,
    pub quantity: i64,
}

impl PricedLine {
    /// `unit_price × quantity`.
    pub fn line_subtotal(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }
}

/// The six monetary fields of a sale, computed once at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleTotals {
    pub subtotal: Money,
    pub member_discount: Money,
    pub transaction_discount: Money,
    pub total_discount: Money,
    pub tax: Money,
    pub total: Money,
}

/// Validates the shape of a submitted cart before anything is resolved.
///
/// Fail fast: no lookup or mutation happens for a structurally invalid
/// cart.
pub fn validate_cart(lines: &[CartLine]) -> CoreResult<()> {
    if lines.is_empty() {
        return Err(CoreError::EmptyCart);
    }

    if lines.len() > MAX_CART_LINES {
        return Err(ValidationError::OutOfRange {
            field: "cart lines".to_string(),
            min: 1,
            max: MAX_CART_LINES as i64,
        }
        .into());
    }

    for line in lines {
        if line.quantity <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "quantity".to_string(),
            }
            .into());
        }
        if line.quantity > MAX_LINE_QUANTITY {
            return Err(ValidationError::OutOfRange {
                field: "quantity".to_string(),
                min: 1,
                max: MAX_LINE_QUANTITY,
            }
            .into());
        }
    }

    Ok(())
}

/// Computes the sale totals in the fixed order described in the module
/// docs.
///
/// `member_rate` is the resolved member's rate, already looked up by the
/// caller; `None` when no member is attached. Member discounts only apply
/// when the settings flag enables them.
///
/// ## Clamping
/// `total_discount` never exceeds the subtotal. When the pair would, the
/// transaction discount (the operator's manual entry) is reduced first,
/// then the member discount, so the stored pair always sums exactly to
/// `total_discount`.
pub fn compute_totals(
    lines: &[PricedLine],
    member_rate: Option<DiscountRate>,
    manual: ManualDiscount,
    settings: &StoreSettings,
) -> SaleTotals {
    let subtotal: Money = lines.iter().map(PricedLine::line_subtotal).sum();

    let mut member_discount = match member_rate {
        Some(rate) if settings.member_discount_enabled => rate.apply(subtotal),
        _ => Money::zero(),
    };
    member_discount = member_discount.min(subtotal);

    let transaction_discount = manual
        .amount_on(subtotal)
        .min(subtotal.saturating_sub(member_discount));

    let total_discount = member_discount + transaction_discount;
    let taxable = subtotal - total_discount;

    let tax = if settings.tax_enabled {
        settings.tax_rate.apply(taxable)
    } else {
        Money::zero()
    };

    SaleTotals {
        subtotal,
        member_discount,
        transaction_discount,
        total_discount,
        tax,
        total: taxable + tax,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
