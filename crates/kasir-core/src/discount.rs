//! # Manual Discount Parsing
//!
//! The cashier can type a per-sale discount at the till: either a bare
//! number ("5000", an absolute amount off) or a percentage literal
//! ("10%", off the pre-tax subtotal).
//!
//! Parsing is deliberately permissive: a malformed entry becomes
//! [`ManualDiscount::None`] (discount 0), never an error. A kiosk must not
//! block a queue of customers over a typo in an optional field.
//!
//! One parse function, one tagged type. Call sites never sniff strings.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::{DiscountRate, Money};

/// A parsed manual discount input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum ManualDiscount {
    /// Percentage of the pre-tax subtotal ("10%" → 1000 bps).
    Percent(DiscountRate),
    /// Absolute amount off ("5000").
    Amount(Money),
    /// No discount: missing, empty or unparseable input.
    None,
}

impl ManualDiscount {
    /// Parses a raw till input string.
    ///
    /// Rules:
    /// - trailing `%` → percentage; decimals allowed ("7.5%"), capped at 100%
    /// - otherwise → absolute amount in whole currency units
    /// - empty, negative or unparseable → `None`
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        if input.is_empty() {
            return ManualDiscount::None;
        }

        if let Some(number) = input.strip_suffix('%') {
            return match number.trim().parse::<f64>() {
                Ok(pct) if pct.is_finite() && pct >= 0.0 => {
                    match DiscountRate::from_fraction(pct / 100.0) {
                        Some(rate) => ManualDiscount::Percent(rate),
                        None => ManualDiscount::None,
                    }
                }
                _ => ManualDiscount::None,
            };
        }

        match input.parse::<f64>() {
            Ok(amount) if amount.is_finite() && amount >= 0.0 => {
                ManualDiscount::Amount(Money::new(amount.round() as i64))
            }
            _ => ManualDiscount::None,
        }
    }

    /// Parses an optional input; `Option::None` means no discount.
    pub fn parse_opt(input: Option<&str>) -> Self {
        match input {
            Some(raw) => Self::parse(raw),
            None => ManualDiscount::None,
        }
    }

    /// The discount amount this input yields on `subtotal`, before
    /// clamping against the subtotal.
    pub fn amount_on(&self, subtotal: Money) -> Money {
        match self {
            ManualDiscount::Percent(rate) => rate.apply(subtotal),
            ManualDiscount::Amount(amount) => *amount,
            ManualDiscount::None => Money::zero(),
        }
    }
}

impl Default for ManualDiscount {
    fn default() -> Self {
        ManualDiscount::None
    }
}
