//! # Receipt Projection
//!
//! Pure projection from a committed sale into the denormalized structure
//! the receipt printer and the frontends render. No I/O, no error paths:
//! missing optional fields become `None`.
//!
//! Line data comes from the sale items' frozen snapshots, so a receipt can
//! be rebuilt at any time regardless of later catalog edits.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::settings::StoreSettings;
use crate::types::{PaymentMethod, Sale, SaleItem};

/// Store header block at the top of every receipt.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StoreHeader {
    pub name: String,
    pub address: String,
    pub phone: String,
}

/// One printed line item.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptLine {
    pub name: String,
    pub barcode: Option<String>,
    pub quantity: i64,
    pub unit_price: Money,
    pub line_subtotal: Money,
}

/// Member block, when a member was attached to the sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptMember {
    pub code: String,
    pub name: String,
}

/// The full human-readable receipt.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptView {
    pub store: StoreHeader,
    pub sale_number: String,
    /// RFC 3339 timestamp of the sale.
    pub timestamp: String,
    pub cashier: String,
    pub member: Option<ReceiptMember>,
    pub lines: Vec<ReceiptLine>,
    pub subtotal: Money,
    pub member_discount: Money,
    pub transaction_discount: Money,
    pub total_discount: Money,
    pub tax: Money,
    pub total: Money,
    pub payment_method: PaymentMethod,
    pub footer: String,
}

impl ReceiptView {
    /// Builds the receipt for a committed sale.
    pub fn build(
        sale: &Sale,
        items: &[SaleItem],
        settings: &StoreSettings,
        cashier_name: &str,
        member: Option<ReceiptMember>,
    ) -> Self {
        ReceiptView {
            store: StoreHeader {
                name: settings.store_name.clone(),
                address: settings.store_address.clone(),
                phone: settings.store_phone.clone(),
            },
            sale_number: sale.sale_number.clone(),
            timestamp: sale.created_at.to_rfc3339(),
            cashier: cashier_name.to_string(),
            member,
            lines: items
                .iter()
                .map(|item| ReceiptLine {
                    name: item.name_snapshot.clone(),
                    barcode: item.barcode_snapshot.clone(),
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                    line_subtotal: item.line_subtotal,
                })
                .collect(),
            subtotal: sale.subtotal,
            member_discount: sale.member_discount,
            transaction_discount: sale.transaction_discount,
            total_discount: sale.total_discount,
            tax: sale.tax,
            total: sale.total,
            payment_method: sale.payment_method,
            footer: settings.receipt_footer.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn committed_sale() -> (Sale, Vec<SaleItem>) {
        let now = Utc::now();
        let sale = Sale {
            id: "s1".to_string(),
            sale_number: "POS-20260830-0001".to_string(),
            subtotal: Money::new(14_500),
            member_discount: Money::new(725),
            transaction_discount: Money::zero(),
            total_discount: Money::new(725),
            tax: Money::new(1_515),
            total: Money::new(15_290),
            payment_method: PaymentMethod::Cash,
            member_id: Some("m1".to_string()),
            user_id: "u1".to_string(),
            notes: None,
            created_at: now,
        };
        let items = vec![
            SaleItem {
                id: "i1".to_string(),
                sale_id: "s1".to_string(),
                product_id: "p1".to_string(),
                name_snapshot: "Pulpen Pilot G2".to_string(),
                barcode_snapshot: Some("8991234567890".to_string()),
                unit_price: Money::new(5_500),
                quantity: 2,
                line_subtotal: Money::new(11_000),
                created_at: now,
            },
            SaleItem {
                id: "i2".to_string(),
                sale_id: "s1".to_string(),
                product_id: "p2".to_string(),
                name_snapshot: "Buku Tulis 38 Lembar".to_string(),
                barcode_snapshot: None,
                unit_price: Money::new(3_500),
                quantity: 1,
                line_subtotal: Money::new(3_500),
                created_at: now,
            },
        ];
        (sale, items)
    }

    #[test]
    fn projects_sale_without_side_effects() {
        let (sale, items) = committed_sale();
        let settings = StoreSettings::default();

        let receipt = ReceiptView::build(
            &sale,
            &items,
            &settings,
            "Kasir 1",
            Some(ReceiptMember {
                code: "MBR001".to_string(),
                name: "Budi".to_string(),
            }),
        );

        assert_eq!(receipt.store.name, settings.store_name);
        assert_eq!(receipt.lines.len(), 2);
        assert_eq!(receipt.lines[0].name, "Pulpen Pilot G2");
        assert_eq!(receipt.lines[0].line_subtotal.amount(), 11_000);
        assert_eq!(receipt.lines[1].barcode, None);
        assert_eq!(receipt.total.amount(), 15_290);
        assert_eq!(receipt.member.as_ref().map(|m| m.code.as_str()), Some("MBR001"));
        assert_eq!(receipt.cashier, "Kasir 1");
    }

    #[test]
    fn missing_member_projects_to_none() {
        let (mut sale, items) = committed_sale();
        sale.member_id = None;

        let receipt = ReceiptView::build(&sale, &items, &StoreSettings::default(), "Kasir 1", None);
        assert!(receipt.member.is_none());
    }
}
