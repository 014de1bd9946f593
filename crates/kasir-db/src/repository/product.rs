//! # Catalog Repository
//!
//! Database operations for products and their stock audit trail.
//!
//! ## Stock Discipline
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  products.stock is mutated through exactly one primitive:    │
//! │                                                              │
//! │  adjust_stock(executor, id, delta, allow_negative)           │
//! │                                                              │
//! │  UPDATE products                                             │
//! │  SET stock = stock + :delta                                  │
//! │  WHERE id = :id AND (:allow OR stock + :delta >= 0)          │
//! │  RETURNING stock                                             │
//! │                                                              │
//! │  Check and decrement are one statement, so two tills         │
//! │  selling the last unit can never both succeed.               │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//! Every adjustment gets a matching `stock_movements` row.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult, StoreResult};
use kasir_core::validation::{validate_barcode, validate_name, validate_price, validate_quantity};
use kasir_core::{Money, Product, StockMovement, StockMovementType, ValidationError};

/// Input for creating a product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub barcode: Option<String>,
    pub price: Money,
    pub stock: i64,
    pub category_id: Option<String>,
}

impl NewProduct {
    /// Checks field rules before any row is written.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_name(&self.name)?;
        if let Some(barcode) = &self.barcode {
            validate_barcode(barcode)?;
        }
        validate_price(self.price.amount())?;
        if self.stock < 0 {
            return Err(ValidationError::MustBePositive {
                field: "stock".to_string(),
            });
        }
        Ok(())
    }
}

/// Repository for catalog database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
/// let hits = repo.search("pulpen", 20).await?;
/// let scanned = repo.find_by_barcode("8991234567890").await?;
/// ```
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

const PRODUCT_COLUMNS: &str =
    "id, name, barcode, price, stock, category_id, is_active, created_at, updated_at";

impl CatalogRepository {
    /// Creates a new CatalogRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    /// Fetches a product by id, active or not.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Resolves a scanned code to an active product.
    ///
    /// Matches the barcode column first; a code that is not a known
    /// barcode is retried as a product id, so id-labelled shelf stickers
    /// scan too.
    pub async fn find_by_barcode(&self, code: &str) -> DbResult<Option<Product>> {
        debug!(code = %code, "Resolving scanned code");

        let product = sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS} FROM products
            WHERE (barcode = ?1 OR id = ?1) AND is_active = 1
            LIMIT 1
            "#
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Searches active products by name or barcode substring.
    ///
    /// Empty queries return the active list sorted by name.
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<Product>> {
        let query = query.trim();

        debug!(query = %query, limit = %limit, "Searching products");

        if query.is_empty() {
            return self.list_active(limit).await;
        }

        let pattern = format!("%{query}%");

        let products = sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS} FROM products
            WHERE is_active = 1
              AND (name LIKE ?1 OR barcode LIKE ?1)
            ORDER BY name
            LIMIT ?2
            "#
        ))
        .bind(pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = products.len(), "Search returned products");
        Ok(products)
    }

    /// Lists active products sorted by name.
    pub async fn list_active(&self, limit: u32) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS} FROM products
            WHERE is_active = 1
            ORDER BY name
            LIMIT ?1
            "#
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Lists active products at or below the given stock level.
    ///
    /// Backs the dashboard low-stock alert.
    pub async fn list_low_stock(&self, threshold: i64) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS} FROM products
            WHERE is_active = 1 AND stock <= ?1
            ORDER BY stock, name
            "#
        ))
        .bind(threshold)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Creates a product.
    pub async fn insert(&self, new: NewProduct) -> StoreResult<Product> {
        new.validate()?;

        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            name: new.name,
            barcode: new.barcode,
            price: new.price,
            stock: new.stock,
            category_id: new.category_id,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO products (id, name, barcode, price, stock, category_id, is_active, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.barcode)
        .bind(product.price)
        .bind(product.stock)
        .bind(&product.category_id)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        debug!(id = %product.id, name = %product.name, "Product created");
        Ok(product)
    }

    /// Updates a product's editable fields.
    ///
    /// Stock is deliberately absent; it only changes through
    /// [`CatalogRepository::adjust_stock`] so the audit trail stays whole.
    pub async fn update(&self, product: &Product) -> StoreResult<()> {
        validate_name(&product.name)?;
        if let Some(barcode) = &product.barcode {
            validate_barcode(barcode)?;
        }
        validate_price(product.price.amount())?;

        let result = sqlx::query(
            r#"
            UPDATE products
            SET name = ?2, barcode = ?3, price = ?4, category_id = ?5,
                is_active = ?6, updated_at = ?7
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.barcode)
        .bind(product.price)
        .bind(&product.category_id)
        .bind(product.is_active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id).into());
        }
        Ok(())
    }

    /// Soft-deletes a product. Sales referencing it keep their snapshots.
    pub async fn deactivate(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("UPDATE products SET is_active = 0, updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }
        Ok(())
    }

    /// Atomically adjusts a product's stock by `delta`.
    ///
    /// Returns the new stock level, or `None` when the row is missing or
    /// the guard rejected the change (stock would go negative while
    /// `allow_negative` is off). Executor-generic so the checkout
    /// transaction can run it on its own connection.
    pub async fn adjust_stock<'e, E>(
        executor: E,
        product_id: &str,
        delta: i64,
        allow_negative: bool,
    ) -> DbResult<Option<i64>>
    where
        E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
    {
        let new_stock = sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE products
            SET stock = stock + ?2, updated_at = ?3
            WHERE id = ?1 AND (?4 OR stock + ?2 >= 0)
            RETURNING stock
            "#,
        )
        .bind(product_id)
        .bind(delta)
        .bind(Utc::now())
        .bind(allow_negative)
        .fetch_optional(executor)
        .await?;

        Ok(new_stock)
    }

    /// Appends a stock movement audit row.
    pub async fn record_movement<'e, E>(executor: E, movement: &StockMovement) -> DbResult<()>
    where
        E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
    {
        sqlx::query(
            r#"
            INSERT INTO stock_movements
                (id, product_id, movement, quantity, previous_stock, new_stock, reference, user_id, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&movement.id)
        .bind(&movement.product_id)
        .bind(movement.movement)
        .bind(movement.quantity)
        .bind(movement.previous_stock)
        .bind(movement.new_stock)
        .bind(&movement.reference)
        .bind(&movement.user_id)
        .bind(movement.created_at)
        .execute(executor)
        .await?;

        Ok(())
    }

    /// Adds stock for a delivery, with its audit row, in one transaction.
    pub async fn restock(
        &self,
        product_id: &str,
        quantity: i64,
        user_id: &str,
    ) -> StoreResult<StockMovement> {
        validate_quantity(quantity)?;

        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        // Positive delta, so the guard is moot; pass allow to keep the
        // statement shared with the sale path.
        let new_stock = Self::adjust_stock(&mut *tx, product_id, quantity, true)
            .await?
            .ok_or_else(|| DbError::not_found("Product", product_id))?;

        let movement = StockMovement {
            id: Uuid::new_v4().to_string(),
            product_id: product_id.to_string(),
            movement: StockMovementType::In,
            quantity,
            previous_stock: new_stock - quantity,
            new_stock,
            reference: Some("restock".to_string()),
            user_id: user_id.to_string(),
            created_at: Utc::now(),
        };
        Self::record_movement(&mut *tx, &movement).await?;

        tx.commit().await.map_err(DbError::from)?;

        debug!(
            product_id = %product_id,
            quantity = quantity,
            new_stock = new_stock,
            "Product restocked"
        );
        Ok(movement)
    }

    /// Lists recent stock movements for a product, newest first.
    pub async fn movements(&self, product_id: &str, limit: u32) -> DbResult<Vec<StockMovement>> {
        let movements = sqlx::query_as::<_, StockMovement>(
            r#"
            SELECT id, product_id, movement, quantity, previous_stock, new_stock,
                   reference, user_id, created_at
            FROM stock_movements
            WHERE product_id = ?1
            ORDER BY created_at DESC
            LIMIT ?2
            "#,
        )
        .bind(product_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::pool::{Database, DbConfig};
    use kasir_core::CoreError;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn pulpen(stock: i64) -> NewProduct {
        NewProduct {
            name: "Pulpen Pilot G2".to_string(),
            barcode: Some("8991234567890".to_string()),
            price: Money::new(5_500),
            stock,
            category_id: None,
        }
    }

    #[tokio::test]
    async fn insert_and_fetch_round_trip() {
        let db = test_db().await;
        let repo = db.products();

        let created = repo.insert(pulpen(10)).await.unwrap();
        let fetched = repo.get_by_id(&created.id).await.unwrap().unwrap();

        assert_eq!(fetched.name, "Pulpen Pilot G2");
        assert_eq!(fetched.price, Money::new(5_500));
        assert_eq!(fetched.stock, 10);
        assert!(fetched.is_active);
    }

    #[tokio::test]
    async fn duplicate_barcode_rejected() {
        let db = test_db().await;
        let repo = db.products();

        repo.insert(pulpen(10)).await.unwrap();
        let err = repo.insert(pulpen(5)).await.unwrap_err();

        assert!(matches!(
            err,
            StoreError::Db(DbError::UniqueViolation { .. })
        ));
    }

    #[tokio::test]
    async fn invalid_barcode_rejected_before_write() {
        let db = test_db().await;
        let repo = db.products();

        let mut new = pulpen(1);
        new.barcode = Some("abc".to_string());
        let err = repo.insert(new).await.unwrap_err();

        assert!(matches!(err, StoreError::Core(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn barcode_lookup_falls_back_to_id() {
        let db = test_db().await;
        let repo = db.products();

        let created = repo.insert(pulpen(10)).await.unwrap();

        let by_barcode = repo.find_by_barcode("8991234567890").await.unwrap();
        assert_eq!(by_barcode.unwrap().id, created.id);

        let by_id = repo.find_by_barcode(&created.id).await.unwrap();
        assert_eq!(by_id.unwrap().id, created.id);

        assert!(repo.find_by_barcode("0000000000000").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn deactivated_products_hidden_from_lookup_and_search() {
        let db = test_db().await;
        let repo = db.products();

        let created = repo.insert(pulpen(10)).await.unwrap();
        repo.deactivate(&created.id).await.unwrap();

        assert!(repo.find_by_barcode("8991234567890").await.unwrap().is_none());
        assert!(repo.search("Pulpen", 20).await.unwrap().is_empty());
        // still reachable by id for history views
        assert!(repo.get_by_id(&created.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn search_matches_name_substring() {
        let db = test_db().await;
        let repo = db.products();

        repo.insert(pulpen(10)).await.unwrap();
        repo.insert(NewProduct {
            name: "Buku Tulis 38 Lembar".to_string(),
            barcode: None,
            price: Money::new(3_500),
            stock: 50,
            category_id: None,
        })
        .await
        .unwrap();

        let hits = repo.search("tulis", 20).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Buku Tulis 38 Lembar");
    }

    #[tokio::test]
    async fn adjust_stock_guard_blocks_oversell() {
        let db = test_db().await;
        let repo = db.products();
        let created = repo.insert(pulpen(3)).await.unwrap();

        // 3 available, take 2: ok
        let after = CatalogRepository::adjust_stock(db.pool(), &created.id, -2, false)
            .await
            .unwrap();
        assert_eq!(after, Some(1));

        // 1 left, take 2: guard trips, stock untouched
        let denied = CatalogRepository::adjust_stock(db.pool(), &created.id, -2, false)
            .await
            .unwrap();
        assert_eq!(denied, None);
        assert_eq!(repo.get_by_id(&created.id).await.unwrap().unwrap().stock, 1);

        // policy override lets it go negative
        let negative = CatalogRepository::adjust_stock(db.pool(), &created.id, -2, true)
            .await
            .unwrap();
        assert_eq!(negative, Some(-1));
    }

    #[tokio::test]
    async fn restock_writes_audit_row() {
        let db = test_db().await;
        let repo = db.products();
        let created = repo.insert(pulpen(3)).await.unwrap();

        let movement = repo.restock(&created.id, 12, "admin-1").await.unwrap();
        assert_eq!(movement.movement, StockMovementType::In);
        assert_eq!(movement.previous_stock, 3);
        assert_eq!(movement.new_stock, 15);

        assert_eq!(repo.get_by_id(&created.id).await.unwrap().unwrap().stock, 15);

        let trail = repo.movements(&created.id, 10).await.unwrap();
        assert_eq!(trail.len(), 1);
        assert_eq!(trail[0].reference.as_deref(), Some("restock"));
    }

    #[tokio::test]
    async fn low_stock_listing() {
        let db = test_db().await;
        let repo = db.products();

        repo.insert(pulpen(2)).await.unwrap();
        repo.insert(NewProduct {
            name: "Penghapus Joyko".to_string(),
            barcode: None,
            price: Money::new(2_000),
            stock: 80,
            category_id: None,
        })
        .await
        .unwrap();

        let low = repo.list_low_stock(10).await.unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].name, "Pulpen Pilot G2");
    }
}
