//! # Settings Repository
//!
//! Key/value persistence behind [`StoreSettings`].
//!
//! ## Read Path
//! `load()` folds whatever rows exist over the typed defaults. A fresh
//! database with zero rows yields a fully working configuration, and a
//! corrupt row only costs its own field. Reads never fail on content,
//! only on storage errors.
//!
//! ## Write Path
//! `set_value()` infers the kind tag from the runtime value and
//! range-checks the known numeric keys before touching the table.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult, StoreResult};
use kasir_core::settings::{SettingKind, SettingValue};
use kasir_core::StoreSettings;

/// One stored settings row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SettingRow {
    pub key: String,
    pub value: String,
    pub kind: SettingKind,
}

/// Repository for settings database operations.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    /// Creates a new SettingsRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    /// Loads the typed store settings: defaults overlaid with stored rows.
    pub async fn load(&self) -> DbResult<StoreSettings> {
        let rows = self.rows().await?;

        Ok(StoreSettings::from_rows(
            rows.iter()
                .map(|row| (row.key.as_str(), row.kind, row.value.as_str())),
        ))
    }

    /// All stored rows, decoded. Rows that fail to decode for their kind
    /// tag are skipped; the admin UI edits what it can read.
    pub async fn all_values(&self) -> DbResult<Vec<(String, SettingValue)>> {
        let rows = self.rows().await?;

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                SettingValue::decode(row.kind, &row.value).map(|value| (row.key, value))
            })
            .collect())
    }

    /// Fetches a single stored value, decoded.
    ///
    /// `None` for both a missing key and a corrupt row; either way the
    /// caller falls back to its default.
    pub async fn get_value(&self, key: &str) -> DbResult<Option<SettingValue>> {
        let row = sqlx::query_as::<_, SettingRow>(
            "SELECT key, value, kind FROM settings WHERE key = ?1",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.and_then(|row| SettingValue::decode(row.kind, &row.value)))
    }

    /// Upserts one setting, inferring the kind tag from the value.
    pub async fn set_value(&self, key: &str, value: SettingValue) -> StoreResult<()> {
        StoreSettings::validate_value(key, &value)?;

        sqlx::query(
            r#"
            INSERT INTO settings (key, value, kind) VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, kind = excluded.kind
            "#,
        )
        .bind(key)
        .bind(value.encode())
        .bind(value.kind())
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        debug!(key = %key, "Setting updated");
        Ok(())
    }

    /// Upserts a batch of settings in one transaction.
    ///
    /// All values are validated up front; one bad entry means nothing is
    /// written.
    pub async fn set_many(&self, entries: &[(String, SettingValue)]) -> StoreResult<()> {
        for (key, value) in entries {
            StoreSettings::validate_value(key, value)?;
        }

        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        for (key, value) in entries {
            sqlx::query(
                r#"
                INSERT INTO settings (key, value, kind) VALUES (?1, ?2, ?3)
                ON CONFLICT(key) DO UPDATE SET value = excluded.value, kind = excluded.kind
                "#,
            )
            .bind(key)
            .bind(value.encode())
            .bind(value.kind())
            .execute(&mut *tx)
            .await
            .map_err(DbError::from)?;
        }

        tx.commit().await.map_err(DbError::from)?;

        debug!(count = entries.len(), "Settings batch updated");
        Ok(())
    }

    /// Deletes all stored rows, reverting every key to its default.
    pub async fn reset(&self) -> DbResult<()> {
        sqlx::query("DELETE FROM settings")
            .execute(&self.pool)
            .await?;

        debug!("Settings reset to defaults");
        Ok(())
    }

    async fn rows(&self) -> DbResult<Vec<SettingRow>> {
        let rows = sqlx::query_as::<_, SettingRow>("SELECT key, value, kind FROM settings")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
