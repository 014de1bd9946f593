//! # Category Repository
//!
//! Categories are a thin grouping layer over products. Names are unique
//! case-insensitively, and a category can only be deleted while empty;
//! both rules are also enforced by the schema (NOCASE unique index, FK
//! RESTRICT) so a racing write cannot slip past the pre-checks.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult, StoreResult};
use kasir_core::validation::validate_name;
use kasir_core::{Category, CoreError};

/// Repository for category database operations.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    /// Creates a new CategoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    /// Lists all categories sorted by name.
    pub async fn list(&self) -> DbResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, name, description, created_at FROM categories ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    /// Fetches a category by id.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(
            "SELECT id, name, description, created_at FROM categories WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    /// Creates a category. The name must not collide case-insensitively.
    pub async fn insert(&self, name: &str, description: Option<&str>) -> StoreResult<Category> {
        validate_name(name)?;

        let category = Category {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            description: description.map(str::to_string),
            created_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO categories (id, name, description, created_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&category.id)
        .bind(&category.name)
        .bind(&category.description)
        .bind(category.created_at)
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        debug!(id = %category.id, name = %category.name, "Category created");
        Ok(category)
    }

    /// Renames a category.
    pub async fn rename(&self, id: &str, name: &str) -> StoreResult<()> {
        validate_name(name)?;

        let result = sqlx::query("UPDATE categories SET name = ?2 WHERE id = ?1")
            .bind(id)
            .bind(name.trim())
            .execute(&self.pool)
            .await
            .map_err(DbError::from)?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", id).into());
        }
        Ok(())
    }

    /// Deletes a category, refusing while products still reference it.
    pub async fn delete(&self, id: &str) -> StoreResult<()> {
        let category = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Category", id))?;

        let product_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE category_id = ?1")
                .bind(id)
                .fetch_one(&self.pool)
                .await
                .map_err(DbError::from)?;

        if product_count > 0 {
            return Err(CoreError::CategoryNotEmpty {
                name: category.name,
                product_count,
            }
            .into());
        }

        sqlx::query("DELETE FROM categories WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(DbError::from)?;

        debug!(id = %id, "Category deleted");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
