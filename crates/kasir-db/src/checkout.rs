//! # Checkout Service
//!
//! The one write path that commits a sale. Everything else in the system
//! exists to feed this transaction or read its output.
//!
//! ## Two-Phase Flow
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │ Phase 1: validate & price (pool reads, no mutation)              │
//! │                                                                  │
//! │   validate cart shape ─► load settings ─► resolve member         │
//! │        ─► resolve each product (exists? active? enough stock?)   │
//! │        ─► compute totals (kasir-core, fixed order)               │
//! │                                                                  │
//! │   Any failure here returns before a single row changes.          │
//! ├──────────────────────────────────────────────────────────────────┤
//! │ Phase 2: atomic commit (one SQLite transaction)                  │
//! │                                                                  │
//! │   BEGIN                                                          │
//! │     conditional stock decrement per line  ← FIRST, re-checks     │
//! │     insert sale header                      stock atomically     │
//! │     insert line items (snapshots)                                │
//! │     insert OUT stock movements                                   │
//! │     accumulate member lifetime stats                             │
//! │   COMMIT                                                         │
//! │                                                                  │
//! │   A tripped guard or any failure rolls the whole sale back:      │
//! │   no half-sold stock, no sale without its items.                 │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The decrement runs first so a race between two tills on the last unit
//! is decided by the database, not by the stale phase-1 read.

use chrono::Utc;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::DbError;
use crate::repository::member::MemberRepository;
use crate::repository::product::CatalogRepository;
use crate::repository::sale::{generate_sale_number, SaleRepository};
use crate::repository::settings::SettingsRepository;
use kasir_core::pricing::{compute_totals, validate_cart};
use kasir_core::receipt::{ReceiptMember, ReceiptView};
use kasir_core::{
    CartLine, CoreError, ManualDiscount, Member, PaymentMethod, PricedLine, Sale, SaleItem,
    StockMovement, StockMovementType, StoreSettings,
};

/// A checkout submission from the till.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub lines: Vec<CartLine>,

    /// Till-entered member code, e.g. "MBR001".
    pub member_code: Option<String>,

    /// Raw manual discount input ("10%", "5000", ...). Malformed input
    /// means no discount, never a failed checkout.
    pub manual_discount: Option<String>,

    pub payment_method: PaymentMethod,

    /// The operator ringing the sale (audit field).
    pub operator_id: String,

    pub notes: Option<String>,
}

/// A successfully committed sale with everything a receipt needs.
#[derive(Debug, Clone)]
pub struct CommittedSale {
    pub sale: Sale,
    pub items: Vec<SaleItem>,
    pub member: Option<Member>,
}

impl CommittedSale {
    /// Projects the receipt for this sale.
    pub fn receipt(&self, settings: &StoreSettings, cashier_name: &str) -> ReceiptView {
        let member = self.member.as_ref().map(|m| ReceiptMember {
            code: m.code.clone(),
            name: m.name.clone(),
        });
        ReceiptView::build(&self.sale, &self.items, settings, cashier_name, member)
    }
}

/// Checkout failures.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// A business rule failed during validation. Nothing was written.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Storage failed during the read phase. Nothing was written.
    #[error(transparent)]
    Db(#[from] DbError),

    /// The commit transaction rolled back: a stock guard tripped under a
    /// concurrent sale, or the database failed mid-commit. The store
    /// state is as if the checkout never happened.
    #[error("Checkout aborted: {0}")]
    TransactionAborted(String),
}

/// The checkout service. Holds the pool; every call is self-contained.
#[derive(Debug, Clone)]
pub struct CheckoutService {
    pool: SqlitePool,
}

impl CheckoutService {
    /// Creates a new CheckoutService.
    pub fn new(pool: SqlitePool) -> Self {
        CheckoutService { pool }
    }

    /// Runs a full checkout: validate, price, atomically commit.
    pub async fn checkout(&self, request: CheckoutRequest) -> Result<CommittedSale, CheckoutError> {
        // ---- Phase 1: validate & price ------------------------------------

        validate_cart(&request.lines)?;

        let settings = SettingsRepository::new(self.pool.clone()).load().await?;

        let member = match &request.member_code {
            Some(code) => {
                let member = MemberRepository::new(self.pool.clone())
                    .find_active_by_code(code)
                    .await?
                    .ok_or_else(|| CoreError::MemberNotFound(code.clone()))?;
                Some(member)
            }
            None => None,
        };

        let catalog = CatalogRepository::new(self.pool.clone());
        let mut priced = Vec::with_capacity(request.lines.len());
        for line in &request.lines {
            let product = catalog
                .get_by_id(&line.product_id)
                .await?
                .ok_or_else(|| CoreError::ProductNotFound(line.product_id.clone()))?;

            if !product.is_active {
                return Err(CoreError::ProductInactive(product.name).into());
            }
            if !product.can_sell(line.quantity, settings.allow_negative_stock) {
                return Err(CoreError::InsufficientStock {
                    name: product.name,
                    available: product.stock,
                    requested: line.quantity,
                }
                .into());
            }

            priced.push(PricedLine {
                product_id: product.id,
                name: product.name,
                barcode: product.barcode,
                unit_price: product.price,
                quantity: line.quantity,
            });
        }

        let manual = ManualDiscount::parse_opt(request.manual_discount.as_deref());
        let totals = compute_totals(
            &priced,
            member.as_ref().map(|m| m.discount_rate),
            manual,
            &settings,
        );

        debug!(
            subtotal = totals.subtotal.amount(),
            total_discount = totals.total_discount.amount(),
            tax = totals.tax.amount(),
            total = totals.total.amount(),
            "Cart priced"
        );

        // ---- Phase 2: atomic commit ---------------------------------------

        let sale_number = generate_sale_number();
        let now = Utc::now();
        let sale_id = Uuid::new_v4().to_string();

        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        // Stock decrements come first. The guard re-checks availability in
        // the same statement, so a concurrent sale that got there first
        // trips it here and the whole checkout rolls back.
        let mut stock_after = Vec::with_capacity(priced.len());
        for line in &priced {
            let new_stock = CatalogRepository::adjust_stock(
                &mut *tx,
                &line.product_id,
                -line.quantity,
                settings.allow_negative_stock,
            )
            .await
            .map_err(abort)?;

            match new_stock {
                Some(level) => stock_after.push(level),
                None => {
                    warn!(
                        product = %line.name,
                        requested = line.quantity,
                        "Stock guard tripped, rolling back checkout"
                    );
                    return Err(CheckoutError::TransactionAborted(format!(
                        "stock for {} was taken by a concurrent sale",
                        line.name
                    )));
                }
            }
        }

        let sale = Sale {
            id: sale_id.clone(),
            sale_number: sale_number.clone(),
            subtotal: totals.subtotal,
            member_discount: totals.member_discount,
            transaction_discount: totals.transaction_discount,
            total_discount: totals.total_discount,
            tax: totals.tax,
            total: totals.total,
            payment_method: request.payment_method,
            member_id: member.as_ref().map(|m| m.id.clone()),
            user_id: request.operator_id.clone(),
            notes: request.notes.clone(),
            created_at: now,
        };
        SaleRepository::insert_sale(&mut *tx, &sale)
            .await
            .map_err(abort)?;

        let mut items = Vec::with_capacity(priced.len());
        for (line, new_stock) in priced.iter().zip(&stock_after) {
            let item = SaleItem {
                id: Uuid::new_v4().to_string(),
                sale_id: sale_id.clone(),
                product_id: line.product_id.clone(),
                name_snapshot: line.name.clone(),
                barcode_snapshot: line.barcode.clone(),
                unit_price: line.unit_price,
                quantity: line.quantity,
                line_subtotal: line.line_subtotal(),
                created_at: now,
            };
            SaleRepository::insert_item(&mut *tx, &item)
                .await
                .map_err(abort)?;
            items.push(item);

            let movement = StockMovement {
                id: Uuid::new_v4().to_string(),
                product_id: line.product_id.clone(),
                movement: StockMovementType::Out,
                quantity: line.quantity,
                previous_stock: new_stock + line.quantity,
                new_stock: *new_stock,
                reference: Some(sale_number.clone()),
                user_id: request.operator_id.clone(),
                created_at: now,
            };
            CatalogRepository::record_movement(&mut *tx, &movement)
                .await
                .map_err(abort)?;
        }

        if let Some(member) = &member {
            MemberRepository::record_purchase(&mut *tx, &member.id, totals.total)
                .await
                .map_err(abort)?;
        }

        tx.commit()
            .await
            .map_err(|e| CheckoutError::TransactionAborted(e.to_string()))?;

        info!(
            sale_number = %sale_number,
            total = totals.total.amount(),
            lines = items.len(),
            member = member.as_ref().map(|m| m.code.as_str()).unwrap_or("-"),
            "Sale committed"
        );

        Ok(CommittedSale {
            sale,
            items,
            member,
        })
    }
}

/// Any storage failure inside the commit transaction aborts the checkout.
fn abort(err: DbError) -> CheckoutError {
    CheckoutError::TransactionAborted(err.to_string())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::member::NewMember;
    use crate::repository::product::NewProduct;
    use kasir_core::{DiscountRate, Money, Product};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn seed_product(db: &Database, name: &str, price: i64, stock: i64) -> Product {
        db.products()
            .insert(NewProduct {
                name: name.to_string(),
                barcode: None,
                price: Money::new(price),
                stock,
                category_id: None,
            })
            .await
            .unwrap()
    }

    async fn seed_member(db: &Database) -> Member {
        db.members()
            .insert(
                NewMember {
                    name: "Budi Santoso".to_string(),
                    email: None,
                    phone: None,
                    address: None,
                    discount_rate: None,
                },
                DiscountRate::from_bps(500).unwrap(),
            )
            .await
            .unwrap()
    }

    fn request(lines: Vec<(&Product, i64)>) -> CheckoutRequest {
        CheckoutRequest {
            lines: lines
                .into_iter()
                .map(|(product, quantity)| CartLine {
                    product_id: product.id.clone(),
                    quantity,
                })
                .collect(),
            member_code: None,
            manual_discount: None,
            payment_method: PaymentMethod::Cash,
            operator_id: "kasir-1".to_string(),
            notes: None,
        }
    }

    async fn sale_count(db: &Database) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(db.pool())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn plain_checkout_commits_everything() {
        let db = test_db().await;
        let pulpen = seed_product(&db, "Pulpen Pilot G2", 5_500, 10).await;
        let buku = seed_product(&db, "Buku Tulis 38 Lembar", 3_500, 50).await;

        let committed = db
            .checkout()
            .checkout(request(vec![(&pulpen, 2), (&buku, 1)]))
            .await
            .unwrap();

        // 14500 subtotal, 11% tax on the whole of it
        assert_eq!(committed.sale.subtotal, Money::new(14_500));
        assert_eq!(committed.sale.tax, Money::new(1_595));
        assert_eq!(committed.sale.total, Money::new(16_095));
        assert!(committed.sale.totals_consistent());

        // snapshots frozen on the items
        assert_eq!(committed.items.len(), 2);
        assert_eq!(committed.items[0].name_snapshot, "Pulpen Pilot G2");
        assert_eq!(committed.items[0].unit_price, Money::new(5_500));
        assert_eq!(committed.items[0].line_subtotal, Money::new(11_000));

        // stock decremented, audit trail written
        let products = db.products();
        assert_eq!(products.get_by_id(&pulpen.id).await.unwrap().unwrap().stock, 8);
        assert_eq!(products.get_by_id(&buku.id).await.unwrap().unwrap().stock, 49);

        let trail = products.movements(&pulpen.id, 10).await.unwrap();
        assert_eq!(trail.len(), 1);
        assert_eq!(trail[0].movement, StockMovementType::Out);
        assert_eq!(trail[0].previous_stock, 10);
        assert_eq!(trail[0].new_stock, 8);
        assert_eq!(trail[0].reference.as_deref(), Some(committed.sale.sale_number.as_str()));

        // readable back through the sale repository
        let stored = db.sales().get_by_id(&committed.sale.id).await.unwrap().unwrap();
        assert_eq!(stored.total, Money::new(16_095));
        assert_eq!(db.sales().items(&committed.sale.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn member_checkout_discounts_and_accumulates() {
        let db = test_db().await;
        let pulpen = seed_product(&db, "Pulpen Pilot G2", 5_500, 10).await;
        let buku = seed_product(&db, "Buku Tulis 38 Lembar", 3_500, 50).await;
        let member = seed_member(&db).await;

        let mut req = request(vec![(&pulpen, 2), (&buku, 1)]);
        req.member_code = Some(member.code.clone());

        let committed = db.checkout().checkout(req).await.unwrap();

        // 5% of 14500 = 725, tax on 13775 = 1515
        assert_eq!(committed.sale.member_discount, Money::new(725));
        assert_eq!(committed.sale.tax, Money::new(1_515));
        assert_eq!(committed.sale.total, Money::new(15_290));
        assert!(committed.sale.totals_consistent());

        let reloaded = db.members().get_by_id(&member.id).await.unwrap().unwrap();
        assert_eq!(reloaded.total_purchase, Money::new(15_290));
        assert_eq!(reloaded.visit_count, 1);

        // and the sale shows up under the member
        let history = db.sales().list_by_member(&member.id, 10).await.unwrap();
        assert_eq!(history.len(), 1);
    }

    #[tokio::test]
    async fn manual_discount_stacks_with_member() {
        let db = test_db().await;
        let pulpen = seed_product(&db, "Pulpen Pilot G2", 5_500, 10).await;
        let buku = seed_product(&db, "Buku Tulis 38 Lembar", 3_500, 50).await;
        let member = seed_member(&db).await;

        let mut req = request(vec![(&pulpen, 2), (&buku, 1)]);
        req.member_code = Some(member.code.clone());
        req.manual_discount = Some("10%".to_string());

        let committed = db.checkout().checkout(req).await.unwrap();

        assert_eq!(committed.sale.member_discount, Money::new(725));
        assert_eq!(committed.sale.transaction_discount, Money::new(1_450));
        assert_eq!(committed.sale.total_discount, Money::new(2_175));
        assert!(committed.sale.totals_consistent());
    }

    #[tokio::test]
    async fn malformed_discount_means_no_discount() {
        let db = test_db().await;
        let pulpen = seed_product(&db, "Pulpen Pilot G2", 5_500, 10).await;

        let mut req = request(vec![(&pulpen, 1)]);
        req.manual_discount = Some("tolong diskon".to_string());

        let committed = db.checkout().checkout(req).await.unwrap();
        assert_eq!(committed.sale.transaction_discount, Money::zero());
    }

    #[tokio::test]
    async fn unknown_product_fails_before_any_write() {
        let db = test_db().await;
        let pulpen = seed_product(&db, "Pulpen Pilot G2", 5_500, 10).await;

        let mut req = request(vec![(&pulpen, 1)]);
        req.lines.push(CartLine {
            product_id: "missing".to_string(),
            quantity: 1,
        });

        let err = db.checkout().checkout(req).await.unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Core(CoreError::ProductNotFound(_))
        ));

        // nothing committed, no stock touched
        assert_eq!(sale_count(&db).await, 0);
        assert_eq!(db.products().get_by_id(&pulpen.id).await.unwrap().unwrap().stock, 10);
    }

    #[tokio::test]
    async fn inactive_product_rejected() {
        let db = test_db().await;
        let pulpen = seed_product(&db, "Pulpen Pilot G2", 5_500, 10).await;
        db.products().deactivate(&pulpen.id).await.unwrap();

        let err = db.checkout().checkout(request(vec![(&pulpen, 1)])).await.unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Core(CoreError::ProductInactive(_))
        ));
        assert_eq!(sale_count(&db).await, 0);
    }

    #[tokio::test]
    async fn oversell_rejected_with_quantities() {
        let db = test_db().await;
        let pulpen = seed_product(&db, "Pulpen Pilot G2", 5_500, 3).await;

        let err = db.checkout().checkout(request(vec![(&pulpen, 5)])).await.unwrap_err();
        match err {
            CheckoutError::Core(CoreError::InsufficientStock {
                available,
                requested,
                ..
            }) => {
                assert_eq!(available, 3);
                assert_eq!(requested, 5);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(sale_count(&db).await, 0);
    }

    #[tokio::test]
    async fn negative_stock_policy_allows_oversell() {
        let db = test_db().await;
        let pulpen = seed_product(&db, "Pulpen Pilot G2", 5_500, 1).await;

        db.settings()
            .set_value(
                kasir_core::settings::KEY_ALLOW_NEGATIVE_STOCK,
                kasir_core::SettingValue::Boolean(true),
            )
            .await
            .unwrap();

        db.checkout().checkout(request(vec![(&pulpen, 3)])).await.unwrap();
        assert_eq!(db.products().get_by_id(&pulpen.id).await.unwrap().unwrap().stock, -2);
    }

    #[tokio::test]
    async fn empty_cart_rejected() {
        let db = test_db().await;
        let err = db
            .checkout()
            .checkout(CheckoutRequest {
                lines: vec![],
                member_code: None,
                manual_discount: None,
                payment_method: PaymentMethod::Cash,
                operator_id: "kasir-1".to_string(),
                notes: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::Core(CoreError::EmptyCart)));
    }

    #[tokio::test]
    async fn unknown_member_code_rejected() {
        let db = test_db().await;
        let pulpen = seed_product(&db, "Pulpen Pilot G2", 5_500, 10).await;

        let mut req = request(vec![(&pulpen, 1)]);
        req.member_code = Some("MBR999".to_string());

        let err = db.checkout().checkout(req).await.unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Core(CoreError::MemberNotFound(_))
        ));
        assert_eq!(sale_count(&db).await, 0);
    }

    #[tokio::test]
    async fn receipt_projects_snapshots_and_settings() {
        let db = test_db().await;
        let pulpen = seed_product(&db, "Pulpen Pilot G2", 5_500, 10).await;

        let committed = db.checkout().checkout(request(vec![(&pulpen, 2)])).await.unwrap();
        let settings = db.settings().load().await.unwrap();
        let receipt = committed.receipt(&settings, "Dewi");

        assert_eq!(receipt.store.name, "Toko Alat Tulis & Kantor");
        assert_eq!(receipt.cashier, "Dewi");
        assert_eq!(receipt.sale_number, committed.sale.sale_number);
        assert_eq!(receipt.lines.len(), 1);
        assert_eq!(receipt.lines[0].name, "Pulpen Pilot G2");
        assert_eq!(receipt.total, committed.sale.total);
        assert!(receipt.member.is_none());
    }

    /// Two tills race for the last unit; the database must sell it once.
    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_checkouts_never_oversell() {
        // In-memory SQLite is single-connection, so this one runs against
        // a throwaway file to get real connection-level concurrency.
        let path = std::env::temp_dir().join(format!("kasir-race-{}.db", Uuid::new_v4()));
        let db = Database::new(DbConfig::new(&path)).await.unwrap();

        let pulpen = seed_product(&db, "Pulpen Pilot G2", 5_500, 1).await;

        let service_a = db.checkout();
        let service_b = db.checkout();
        let req_a = request(vec![(&pulpen, 1)]);
        let req_b = request(vec![(&pulpen, 1)]);

        let (a, b) = tokio::join!(service_a.checkout(req_a), service_b.checkout(req_b));

        let successes = [&a, &b].iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1, "exactly one till may win the last unit");

        assert_eq!(db.products().get_by_id(&pulpen.id).await.unwrap().unwrap().stock, 0);
        assert_eq!(sale_count(&db).await, 1);

        db.close().await;
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
        }
    }
}
