//! # Sale Repository
//!
//! Read access to committed sales, plus the executor-generic insert
//! primitives the checkout transaction composes. Nothing outside
//! [`crate::checkout`] writes sales, and nothing ever updates one; a
//! committed sale is immutable history.

use chrono::Utc;
use sqlx::SqlitePool;

use crate::error::DbResult;
use kasir_core::{Sale, SaleItem};

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

const SALE_COLUMNS: &str = "id, sale_number, subtotal, member_discount, transaction_discount, \
                            total_discount, tax, total, payment_method, member_id, user_id, \
                            notes, created_at";

const ITEM_COLUMNS: &str = "id, sale_id, product_id, name_snapshot, barcode_snapshot, \
                            unit_price, quantity, line_subtotal, created_at";

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Fetches a sale by id.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let sale =
            sqlx::query_as::<_, Sale>(&format!("SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(sale)
    }

    /// Fetches the line items of a sale, in insertion order.
    pub async fn items(&self, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        let items = sqlx::query_as::<_, SaleItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM sale_items WHERE sale_id = ?1 ORDER BY created_at, id"
        ))
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Lists recent sales, newest first.
    pub async fn list_recent(&self, limit: u32) -> DbResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales ORDER BY created_at DESC LIMIT ?1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    /// Lists a member's sales, newest first.
    pub async fn list_by_member(&self, member_id: &str, limit: u32) -> DbResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE member_id = ?1 ORDER BY created_at DESC LIMIT ?2"
        ))
        .bind(member_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    /// Inserts a sale header row. Executor-generic for transaction use.
    pub async fn insert_sale<'e, E>(executor: E, sale: &Sale) -> DbResult<()>
    where
        E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
    {
        sqlx::query(
            r#"
            INSERT INTO sales
                (id, sale_number, subtotal, member_discount, transaction_discount,
                 total_discount, tax, total, payment_method, member_id, user_id,
                 notes, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.sale_number)
        .bind(sale.subtotal)
        .bind(sale.member_discount)
        .bind(sale.transaction_discount)
        .bind(sale.total_discount)
        .bind(sale.tax)
        .bind(sale.total)
        .bind(sale.payment_method)
        .bind(&sale.member_id)
        .bind(&sale.user_id)
        .bind(&sale.notes)
        .bind(sale.created_at)
        .execute(executor)
        .await?;

        Ok(())
    }

    /// Inserts one line item. Executor-generic for transaction use.
    pub async fn insert_item<'e, E>(executor: E, item: &SaleItem) -> DbResult<()>
    where
        E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
    {
        sqlx::query(
            r#"
            INSERT INTO sale_items
                (id, sale_id, product_id, name_snapshot, barcode_snapshot,
                 unit_price, quantity, line_subtotal, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&item.id)
        .bind(&item.sale_id)
        .bind(&item.product_id)
        .bind(&item.name_snapshot)
        .bind(&item.barcode_snapshot)
        .bind(item.unit_price)
        .bind(item.quantity)
        .bind(item.line_subtotal)
        .bind(item.created_at)
        .execute(executor)
        .await?;

        Ok(())
    }
}

/// Generates a display sale number: `POS-YYYYMMDD-nnnn`.
///
/// The suffix comes from the sub-second clock, enough to keep numbers
/// visually distinct on one till. `sales.id` is the real identity;
/// numbers are for receipts and verbal reference.
pub fn generate_sale_number() -> String {
    let now = Utc::now();
    format!(
        "POS-{}-{:04}",
        now.format("%Y%m%d"),
        now.timestamp_subsec_micros() % 10_000
    )
}

// =============================================================================
// Unit Tests
// =============================================================================
