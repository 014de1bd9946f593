//! # Money Module
//!
//! Monetary values and percentage rates for the kasir POS.
//!
//! ## Why Integer Money?
//! `0.1 + 0.2 != 0.3` in floating point, and a till that drifts by a
//! rupiah per sale drifts by thousands per month. Every monetary value in
//! the system is an `i64` in the smallest currency unit (whole rupiah for
//! IDR) and only the UI formats it for display.
//!
//! Percentage math (tax, discounts) goes through basis points with a single
//! integer rounding rule, so `subtotal - total_discount + tax` reproduces
//! the stored `total` exactly for every committed sale.
//!
//! ## Usage
//! ```rust
//! use kasir_core::money::{Money, TaxRate};
//!
//! let subtotal = Money::new(14_500);
//! let tax = TaxRate::from_bps(1100).apply(subtotal); // 11%
//! assert_eq!(tax.amount(), 1_595);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money
// =============================================================================

/// A monetary value in the smallest currency unit.
///
/// ## Design Decisions
/// - **i64 (signed)**: refunds and corrections need negative values even
///   though committed sale fields are always non-negative
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **`sqlx(transparent)`**: stored as a plain INTEGER column
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from the smallest currency unit.
    #[inline]
    pub const fn new(amount: i64) -> Self {
        Money(amount)
    }

    /// Returns the raw amount in the smallest currency unit.
    #[inline]
    pub const fn amount(&self) -> i64 {
        self.0
    }

    /// Zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the smaller of two amounts.
    #[inline]
    pub fn min(self, other: Self) -> Self {
        Money(self.0.min(other.0))
    }

    /// Subtraction clamped at zero.
    ///
    /// Used for discount clamping: the discounted base may never go
    /// negative.
    #[inline]
    pub const fn saturating_sub(self, other: Self) -> Self {
        let diff = self.0 - other.0;
        Money(if diff < 0 { 0 } else { diff })
    }

    /// Multiplies by a line quantity.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl fmt::Display for Money {
    /// Debug-friendly display: `Rp14.500` with dot-grouped thousands,
    /// the way Indonesian receipts print amounts. UI layers do their own
    /// localized formatting.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}Rp{}", sign, group_thousands(self.0.unsigned_abs()))
    }
}

fn group_thousands(mut n: u64) -> String {
    let mut groups = Vec::new();
    loop {
        let (rest, group) = (n / 1000, n % 1000);
        if rest == 0 {
            groups.push(format!("{}", group));
            break;
        }
        groups.push(format!("{:03}", group));
        n = rest;
    }
    groups.reverse();
    groups.join(".")
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Basis-point rates
// =============================================================================

/// Shared rounding rule for percentage math.
///
/// `(amount * bps + 5000) / 10000` over i128: round-half-up on the exact
/// product, immune to overflow for any realistic till amount.
#[inline]
fn apply_bps(amount: i64, bps: u32) -> i64 {
    ((amount as i128 * bps as i128 + 5000) / 10000) as i64
}

/// Tax rate in basis points (1100 = 11%, the Indonesian PPN rate).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Builds a rate from the fraction encoding used by the settings rows
    /// (`"0.11"` → 1100 bps). Out-of-range fractions are rejected so a
    /// corrupt setting falls back to the default instead.
    pub fn from_fraction(fraction: f64) -> Option<Self> {
        if !(0.0..=1.0).contains(&fraction) || !fraction.is_finite() {
            return None;
        }
        Some(TaxRate((fraction * 10_000.0).round() as u32))
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    /// Tax due on `base`.
    pub fn apply(&self, base: Money) -> Money {
        Money::new(apply_bps(base.amount(), self.0))
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

/// Discount rate in basis points (500 = 5%).
///
/// Used for both the member loyalty rate and percentage-style manual
/// discounts. Always within `0..=10000`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[ts(export)]
pub struct DiscountRate(u32);

impl DiscountRate {
    /// Creates a discount rate, rejecting anything above 100%.
    pub fn from_bps(bps: u32) -> Option<Self> {
        if bps > 10_000 {
            return None;
        }
        Some(DiscountRate(bps))
    }

    /// Creates a discount rate, clamping anything above 100% down to it.
    /// For compile-time defaults where the bound is known to hold.
    pub const fn from_bps_clamped(bps: u32) -> Self {
        DiscountRate(if bps > 10_000 { 10_000 } else { bps })
    }

    /// From the fraction encoding (`0.05` → 500 bps).
    pub fn from_fraction(fraction: f64) -> Option<Self> {
        if !(0.0..=1.0).contains(&fraction) || !fraction.is_finite() {
            return None;
        }
        Some(DiscountRate((fraction * 10_000.0).round() as u32))
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// The fraction encoding for persistence (500 bps → 0.05).
    #[inline]
    pub fn fraction(&self) -> f64 {
        self.0 as f64 / 10_000.0
    }

    #[inline]
    pub const fn zero() -> Self {
        DiscountRate(0)
    }

    /// Discount amount off `base`.
    pub fn apply(&self, base: Money) -> Money {
        Money::new(apply_bps(base.amount(), self.0))
    }
}

impl Default for DiscountRate {
    fn default() -> Self {
        DiscountRate::zero()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
