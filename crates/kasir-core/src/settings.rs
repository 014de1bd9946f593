//! # Store Settings
//!
//! The store configuration is persisted as key/value rows with a runtime
//! type tag (NUMBER / BOOLEAN / JSON / STRING). In code it is a
//! strongly-typed struct with an explicit default per field.
//!
//! ## Defaults-merge-on-read
//! Reading folds stored rows over [`StoreSettings::default`]. A missing
//! key never fails a read, and a row that fails to decode (wrong tag,
//! out-of-range number, corrupt JSON) leaves that one field at its
//! default without affecting any other key.
//!
//! ## Writes
//! [`SettingValue`] carries the runtime-typed value; the kind tag is
//! inferred from it the way the admin API infers it from JSON. Known
//! numeric keys are range-checked before persistence (the tax rate and
//! member discount rate are fractions in [0, 1]).

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::{DiscountRate, TaxRate};

// =============================================================================
// Setting keys
// =============================================================================

pub const KEY_TAX_RATE: &str = "tax_rate";
pub const KEY_TAX_ENABLED: &str = "tax_enabled";
pub const KEY_MEMBER_DISCOUNT_RATE: &str = "member_discount_rate";
pub const KEY_MEMBER_DISCOUNT_ENABLED: &str = "member_discount_enabled";
pub const KEY_ALLOW_NEGATIVE_STOCK: &str = "allow_negative_stock";
pub const KEY_MIN_STOCK_ALERT: &str = "min_stock_alert";
pub const KEY_MAX_FAVORITES: &str = "max_favorites";
pub const KEY_STORE_NAME: &str = "store_name";
pub const KEY_STORE_ADDRESS: &str = "store_address";
pub const KEY_STORE_PHONE: &str = "store_phone";
pub const KEY_RECEIPT_FOOTER: &str = "receipt_footer";
pub const KEY_CURRENCY_SYMBOL: &str = "currency_symbol";

// =============================================================================
// Kind tag & runtime value
// =============================================================================

/// The runtime type tag stored next to each settings row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[ts(export)]
#[serde(rename_all = "UPPERCASE")]
pub enum SettingKind {
    Number,
    Boolean,
    Json,
    String,
}

/// A runtime-typed setting value, as written by the admin API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(untagged)]
pub enum SettingValue {
    Boolean(bool),
    Number(f64),
    Text(String),
    Json(JsonValue),
}

impl SettingValue {
    /// The kind tag to store with this value. Mirrors the inference the
    /// admin API applies to incoming JSON: number → NUMBER, bool →
    /// BOOLEAN, array/object → JSON, anything else → STRING.
    pub fn kind(&self) -> SettingKind {
        match self {
            SettingValue::Number(_) => SettingKind::Number,
            SettingValue::Boolean(_) => SettingKind::Boolean,
            SettingValue::Json(_) => SettingKind::Json,
            SettingValue::Text(_) => SettingKind::String,
        }
    }

    /// String encoding for the value column.
    pub fn encode(&self) -> String {
        match self {
            SettingValue::Number(n) => n.to_string(),
            SettingValue::Boolean(b) => b.to_string(),
            SettingValue::Json(v) => v.to_string(),
            SettingValue::Text(s) => s.clone(),
        }
    }

    /// Decodes a stored row back into a runtime value.
    ///
    /// `None` means the row is corrupt for its declared kind; callers fall
    /// back to the field default.
    pub fn decode(kind: SettingKind, raw: &str) -> Option<SettingValue> {
        match kind {
            SettingKind::Number => raw.parse::<f64>().ok().map(SettingValue::Number),
            SettingKind::Boolean => match raw {
                "true" => Some(SettingValue::Boolean(true)),
                "false" => Some(SettingValue::Boolean(false)),
                _ => None,
            },
            SettingKind::Json => serde_json::from_str(raw).ok().map(SettingValue::Json),
            SettingKind::String => Some(SettingValue::Text(raw.to_string())),
        }
    }

    /// Builds a value from an arbitrary JSON body entry (PUT /settings).
    pub fn from_json(value: &JsonValue) -> SettingValue {
        match value {
            JsonValue::Bool(b) => SettingValue::Boolean(*b),
            JsonValue::Number(n) => SettingValue::Number(n.as_f64().unwrap_or(0.0)),
            JsonValue::String(s) => SettingValue::Text(s.clone()),
            other => SettingValue::Json(other.clone()),
        }
    }
}

// =============================================================================
// Typed settings
// =============================================================================

/// Strongly-typed store settings with one explicit default per field.
///
/// Loaded once per request by the settings repository; the checkout engine
/// and favorites manager read policy flags from here rather than poking at
/// raw rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StoreSettings {
    /// Tax rate applied to the post-discount base.
    pub tax_rate: TaxRate,
    pub tax_enabled: bool,

    /// Default loyalty rate; individual members carry their own.
    pub member_discount_rate: DiscountRate,
    pub member_discount_enabled: bool,

    /// Policy flag: skip the stock-sufficiency guard when selling.
    pub allow_negative_stock: bool,

    /// Stock level at which the dashboard flags a product.
    pub min_stock_alert: i64,

    /// Cardinality bound for the favorites quick-access list.
    pub max_favorites: usize,

    pub store_name: String,
    pub store_address: String,
    pub store_phone: String,
    pub receipt_footer: String,
    pub currency_symbol: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        StoreSettings {
            tax_rate: TaxRate::from_bps(1100), // 11% PPN
            tax_enabled: true,
            member_discount_rate: DiscountRate::from_bps_clamped(500),
            member_discount_enabled: true,
            allow_negative_stock: false,
            min_stock_alert: 10,
            max_favorites: 6,
            store_name: "Toko Alat Tulis & Kantor".to_string(),
            store_address: "Jl. Pendidikan No. 123, Kudus".to_string(),
            store_phone: "0291-123456".to_string(),
            receipt_footer: "Terima kasih atas kunjungan Anda!".to_string(),
            currency_symbol: "Rp".to_string(),
        }
    }
}

impl StoreSettings {
    /// Folds one stored row into the struct.
    ///
    /// Unknown keys are ignored (they may belong to other features, e.g.
    /// the favorites list). A row that fails to decode for its key leaves
    /// the field at its current value.
    pub fn apply_row(&mut self, key: &str, kind: SettingKind, raw: &str) {
        let Some(value) = SettingValue::decode(kind, raw) else {
            return;
        };

        match (key, value) {
            (KEY_TAX_RATE, SettingValue::Number(n)) => {
                if let Some(rate) = TaxRate::from_fraction(n) {
                    self.tax_rate = rate;
                }
            }
            (KEY_TAX_ENABLED, SettingValue::Boolean(b)) => self.tax_enabled = b,
            (KEY_MEMBER_DISCOUNT_RATE, SettingValue::Number(n)) => {
                if let Some(rate) = DiscountRate::from_fraction(n) {
                    self.member_discount_rate = rate;
                }
            }
            (KEY_MEMBER_DISCOUNT_ENABLED, SettingValue::Boolean(b)) => {
                self.member_discount_enabled = b
            }
            (KEY_ALLOW_NEGATIVE_STOCK, SettingValue::Boolean(b)) => {
                self.allow_negative_stock = b
            }
            (KEY_MIN_STOCK_ALERT, SettingValue::Number(n)) => {
                if n.is_finite() && n >= 0.0 {
                    self.min_stock_alert = n as i64;
                }
            }
            (KEY_MAX_FAVORITES, SettingValue::Number(n)) => {
                if n.is_finite() && n >= 1.0 {
                    self.max_favorites = n as usize;
                }
            }
            (KEY_STORE_NAME, SettingValue::Text(s)) => self.store_name = s,
            (KEY_STORE_ADDRESS, SettingValue::Text(s)) => self.store_address = s,
            (KEY_STORE_PHONE, SettingValue::Text(s)) => self.store_phone = s,
            (KEY_RECEIPT_FOOTER, SettingValue::Text(s)) => self.receipt_footer = s,
            (KEY_CURRENCY_SYMBOL, SettingValue::Text(s)) => self.currency_symbol = s,
            _ => {}
        }
    }

    /// Builds settings from stored rows overlaid on the defaults.
    pub fn from_rows<'a, I>(rows: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, SettingKind, &'a str)>,
    {
        let mut settings = StoreSettings::default();
        for (key, kind, raw) in rows {
            settings.apply_row(key, kind, raw);
        }
        settings
    }

    /// The default rows written on reset / first seed.
    pub fn default_rows() -> Vec<(&'static str, SettingValue)> {
        let d = StoreSettings::default();
        vec![
            (KEY_TAX_RATE, SettingValue::Number(d.tax_rate.bps() as f64 / 10_000.0)),
            (KEY_TAX_ENABLED, SettingValue::Boolean(d.tax_enabled)),
            (
                KEY_MEMBER_DISCOUNT_RATE,
                SettingValue::Number(d.member_discount_rate.fraction()),
            ),
            (
                KEY_MEMBER_DISCOUNT_ENABLED,
                SettingValue::Boolean(d.member_discount_enabled),
            ),
            (KEY_MIN_STOCK_ALERT, SettingValue::Number(d.min_stock_alert as f64)),
            (KEY_STORE_NAME, SettingValue::Text(d.store_name)),
            (KEY_STORE_ADDRESS, SettingValue::Text(d.store_address)),
            (KEY_STORE_PHONE, SettingValue::Text(d.store_phone)),
            (KEY_RECEIPT_FOOTER, SettingValue::Text(d.receipt_footer)),
        ]
    }

    /// Range-checks a value for the keys with numeric constraints, before
    /// persistence. Rates are fractions in [0, 1]; counts must be
    /// non-negative.
    pub fn validate_value(key: &str, value: &SettingValue) -> Result<(), ValidationError> {
        match (key, value) {
            (KEY_TAX_RATE | KEY_MEMBER_DISCOUNT_RATE, SettingValue::Number(n)) => {
                crate::validation::validate_rate_fraction(key, *n)?;
            }
            (KEY_MIN_STOCK_ALERT, SettingValue::Number(n)) => {
                if !n.is_finite() || *n < 0.0 {
                    return Err(ValidationError::OutOfRange {
                        field: key.to_string(),
                        min: 0,
                        max: i64::MAX,
                    });
                }
            }
            (KEY_MAX_FAVORITES, SettingValue::Number(n)) => {
                if !n.is_finite() || *n < 1.0 || *n > 50.0 {
                    return Err(ValidationError::OutOfRange {
                        field: key.to_string(),
                        min: 1,
                        max: 50,
                    });
                }
            }
            _ => {}
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_store_policy() {
        let s = StoreSettings::default();
        assert_eq!(s.tax_rate.bps(), 1100);
        assert!(s.tax_enabled);
        assert_eq!(s.member_discount_rate.bps(), 500);
        assert!(s.member_discount_enabled);
        assert!(!s.allow_negative_stock);
        assert_eq!(s.max_favorites, 6);
    }

    #[test]
    fn rows_overlay_defaults() {
        let s = StoreSettings::from_rows([
            (KEY_TAX_RATE, SettingKind::Number, "0.10"),
            (KEY_TAX_ENABLED, SettingKind::Boolean, "false"),
            (KEY_STORE_NAME, SettingKind::String, "Toko Maju"),
        ]);

        assert_eq!(s.tax_rate.bps(), 1000);
        assert!(!s.tax_enabled);
        assert_eq!(s.store_name, "Toko Maju");
        // untouched fields keep their defaults
        assert_eq!(s.member_discount_rate.bps(), 500);
    }

    #[test]
    fn corrupt_row_falls_back_to_its_default_only() {
        let s = StoreSettings::from_rows([
            (KEY_TAX_RATE, SettingKind::Number, "not-a-number"),
            (KEY_STORE_NAME, SettingKind::String, "Toko Maju"),
        ]);

        assert_eq!(s.tax_rate.bps(), 1100); // default
        assert_eq!(s.store_name, "Toko Maju"); // unaffected
    }

    #[test]
    fn out_of_range_rate_falls_back() {
        let s = StoreSettings::from_rows([(KEY_TAX_RATE, SettingKind::Number, "1.5")]);
        assert_eq!(s.tax_rate.bps(), 1100);
    }

    #[test]
    fn wrong_kind_falls_back() {
        // tax_enabled stored with a NUMBER tag is not a boolean row
        let s = StoreSettings::from_rows([(KEY_TAX_ENABLED, SettingKind::Number, "1")]);
        assert!(s.tax_enabled);
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let s = StoreSettings::from_rows([
            ("favoriteProductIds", SettingKind::Json, r#"["a","b"]"#),
            ("some_future_flag", SettingKind::Boolean, "true"),
        ]);
        assert_eq!(s, StoreSettings::default());
    }

    #[test]
    fn from_rows_is_deterministic() {
        let rows = [
            (KEY_TAX_RATE, SettingKind::Number, "0.11"),
            (KEY_STORE_PHONE, SettingKind::String, "0291-999"),
        ];
        assert_eq!(StoreSettings::from_rows(rows), StoreSettings::from_rows(rows));
    }

    #[test]
    fn kind_inference_matches_json_shape() {
        assert_eq!(SettingValue::from_json(&serde_json::json!(0.11)).kind(), SettingKind::Number);
        assert_eq!(SettingValue::from_json(&serde_json::json!(true)).kind(), SettingKind::Boolean);
        assert_eq!(SettingValue::from_json(&serde_json::json!("Rp")).kind(), SettingKind::String);
        assert_eq!(
            SettingValue::from_json(&serde_json::json!(["a", "b"])).kind(),
            SettingKind::Json
        );
    }

    #[test]
    fn encode_decode_round_trip() {
        let cases = [
            SettingValue::Number(0.11),
            SettingValue::Boolean(false),
            SettingValue::Text("Toko".to_string()),
            SettingValue::Json(serde_json::json!(["a", "b"])),
        ];
        for value in cases {
            let decoded = SettingValue::decode(value.kind(), &value.encode()).unwrap();
            assert_eq!(decoded, value);
        }
    }

    #[test]
    fn validate_value_checks_ranges() {
        assert!(StoreSettings::validate_value(KEY_TAX_RATE, &SettingValue::Number(0.11)).is_ok());
        assert!(StoreSettings::validate_value(KEY_TAX_RATE, &SettingValue::Number(1.01)).is_err());
        assert!(
            StoreSettings::validate_value(KEY_MEMBER_DISCOUNT_RATE, &SettingValue::Number(-0.05))
                .is_err()
        );
        assert!(
            StoreSettings::validate_value(KEY_MAX_FAVORITES, &SettingValue::Number(0.0)).is_err()
        );
        // free-form keys carry no range rule
        assert!(
            StoreSettings::validate_value(KEY_STORE_NAME, &SettingValue::Text("x".into())).is_ok()
        );
    }
}
