//! # Favorites Manager
//!
//! The cashier's quick-access grid: an ordered list of product ids, at
//! most `max_favorites` long, stored as a JSON array under one settings
//! key. Order is display order on the till.
//!
//! A corrupt or missing stored list reads as empty; favorites degrade,
//! they never take the till down.

use serde_json::Value as JsonValue;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::debug;

use crate::error::DbError;
use crate::repository::product::CatalogRepository;
use crate::repository::settings::SettingsRepository;
use kasir_core::{Product, SettingValue, FAVORITES_SETTING_KEY};

/// Favorites operation failures.
#[derive(Debug, Error)]
pub enum FavoriteError {
    #[error("Product not found or inactive: {0}")]
    ProductNotFound(String),

    #[error("Product is already a favorite: {0}")]
    AlreadyFavorite(String),

    #[error("Favorites list is full ({max} slots)")]
    LimitReached { max: usize },

    #[error("Product is not a favorite: {0}")]
    NotFavorite(String),

    /// Reorder input is not a permutation of the current list.
    #[error("Reorder must contain exactly the current favorites")]
    InvalidReorder,

    #[error(transparent)]
    Db(#[from] DbError),
}

/// Manages the favorites list on top of the settings store.
#[derive(Debug, Clone)]
pub struct FavoritesManager {
    pool: SqlitePool,
}

impl FavoritesManager {
    /// Creates a new FavoritesManager.
    pub fn new(pool: SqlitePool) -> Self {
        FavoritesManager { pool }
    }

    /// The favorite products in display order.
    ///
    /// Ids whose product has since been deactivated or deleted are
    /// silently skipped; they are pruned on the next write.
    pub async fn list(&self) -> Result<Vec<Product>, FavoriteError> {
        let ids = self.stored_ids().await?;
        let catalog = CatalogRepository::new(self.pool.clone());

        let mut products = Vec::with_capacity(ids.len());
        for id in &ids {
            if let Some(product) = catalog.get_by_id(id).await? {
                if product.is_active {
                    products.push(product);
                }
            }
        }
        Ok(products)
    }

    /// The raw stored id list, in order.
    pub async fn ids(&self) -> Result<Vec<String>, FavoriteError> {
        Ok(self.stored_ids().await?)
    }

    /// Appends a product to the end of the list.
    pub async fn add(&self, product_id: &str) -> Result<(), FavoriteError> {
        let catalog = CatalogRepository::new(self.pool.clone());
        let product = catalog
            .get_by_id(product_id)
            .await?
            .filter(|p| p.is_active)
            .ok_or_else(|| FavoriteError::ProductNotFound(product_id.to_string()))?;

        let max = self.max_favorites().await?;
        let mut ids = self.stored_ids().await?;

        if ids.iter().any(|id| id == product_id) {
            return Err(FavoriteError::AlreadyFavorite(product.name));
        }
        if ids.len() >= max {
            return Err(FavoriteError::LimitReached { max });
        }

        ids.push(product_id.to_string());
        self.store_ids(&ids).await?;

        debug!(product = %product.name, slots = ids.len(), "Favorite added");
        Ok(())
    }

    /// Removes a product; the rest close ranks, keeping their order.
    pub async fn remove(&self, product_id: &str) -> Result<(), FavoriteError> {
        let mut ids = self.stored_ids().await?;
        let before = ids.len();
        ids.retain(|id| id != product_id);

        if ids.len() == before {
            return Err(FavoriteError::NotFavorite(product_id.to_string()));
        }

        self.store_ids(&ids).await?;
        debug!(product_id = %product_id, "Favorite removed");
        Ok(())
    }

    /// Replaces the list with a new ordering of the same ids.
    ///
    /// The input must be a permutation of the current list; membership
    /// changes go through `add`/`remove`.
    pub async fn reorder(&self, ordered_ids: &[String]) -> Result<(), FavoriteError> {
        let current = self.stored_ids().await?;

        let mut expected: Vec<&String> = current.iter().collect();
        let mut proposed: Vec<&String> = ordered_ids.iter().collect();
        expected.sort();
        proposed.sort();
        if expected != proposed || proposed.windows(2).any(|w| w[0] == w[1]) {
            return Err(FavoriteError::InvalidReorder);
        }

        self.store_ids(ordered_ids).await?;
        debug!(slots = ordered_ids.len(), "Favorites reordered");
        Ok(())
    }

    fn settings(&self) -> SettingsRepository {
        SettingsRepository::new(self.pool.clone())
    }

    async fn max_favorites(&self) -> Result<usize, DbError> {
        Ok(self.settings().load().await?.max_favorites)
    }

    /// Reads the stored id list. Missing key, wrong kind or malformed
    /// entries all collapse to "fewer favorites", never an error.
    async fn stored_ids(&self) -> Result<Vec<String>, DbError> {
        let value = self
            .settings()
            .get_value(FAVORITES_SETTING_KEY)
            .await?;

        let ids = match value {
            Some(SettingValue::Json(JsonValue::Array(entries))) => entries
                .into_iter()
                .filter_map(|entry| match entry {
                    JsonValue::String(id) => Some(id),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        };
        Ok(ids)
    }

    async fn store_ids(&self, ids: &[String]) -> Result<(), DbError> {
        let value = SettingValue::Json(JsonValue::Array(
            ids.iter().map(|id| JsonValue::String(id.clone())).collect(),
        ));

        self.settings()
            .set_value(FAVORITES_SETTING_KEY, value)
            .await
            .map_err(|err| match err {
                crate::error::StoreError::Db(db) => db,
                // the favorites key carries no range rule
                crate::error::StoreError::Core(core) => DbError::Internal(core.to_string()),
            })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
