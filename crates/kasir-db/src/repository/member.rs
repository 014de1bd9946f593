//! # Member Repository
//!
//! Loyalty member operations. Members are identified at the till by a
//! short code ("MBR001") rather than a UUID; the cashier types or scans
//! the code and the sale gets the member's personal discount rate.
//!
//! Lifetime stats (`total_purchase`, `visit_count`) are only written by
//! [`record_purchase`](MemberRepository::record_purchase), which the
//! checkout transaction runs alongside the sale insert so a crash can
//! never count a visit without its sale.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult, StoreResult};
use kasir_core::validation::{validate_member_code, validate_name};
use kasir_core::{DiscountRate, Member, Money};

/// Input for registering a member.
#[derive(Debug, Clone)]
pub struct NewMember {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    /// Personal loyalty rate; `None` takes the store default.
    pub discount_rate: Option<DiscountRate>,
}

/// Repository for member database operations.
#[derive(Debug, Clone)]
pub struct MemberRepository {
    pool: SqlitePool,
}

const MEMBER_COLUMNS: &str = "id, code, name, email, phone, address, discount_rate, \
                              total_purchase, visit_count, is_active, created_at, updated_at";

impl MemberRepository {
    /// Creates a new MemberRepository.
    pub fn new(pool: SqlitePool) -> Self {
        MemberRepository { pool }
    }

    /// Fetches a member by id, active or not.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Member>> {
        let member = sqlx::query_as::<_, Member>(&format!(
            "SELECT {MEMBER_COLUMNS} FROM members WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(member)
    }

    /// Resolves a till-entered code to an active member.
    ///
    /// Input is normalized to uppercase, so "mbr001" works. A string that
    /// cannot be a member code skips the query entirely.
    pub async fn find_active_by_code(&self, code: &str) -> DbResult<Option<Member>> {
        let code = code.trim().to_uppercase();
        if validate_member_code(&code).is_err() {
            return Ok(None);
        }

        let member = sqlx::query_as::<_, Member>(&format!(
            r#"
            SELECT {MEMBER_COLUMNS} FROM members
            WHERE code = ?1 AND is_active = 1
            "#
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(member)
    }

    /// Lists active members sorted by code.
    pub async fn list_active(&self) -> DbResult<Vec<Member>> {
        let members = sqlx::query_as::<_, Member>(&format!(
            "SELECT {MEMBER_COLUMNS} FROM members WHERE is_active = 1 ORDER BY code"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(members)
    }

    /// Registers a member with the next sequential code.
    ///
    /// `default_rate` is the store's member discount rate, used when the
    /// input carries no personal rate.
    pub async fn insert(&self, new: NewMember, default_rate: DiscountRate) -> StoreResult<Member> {
        validate_name(&new.name)?;

        let code = self.next_code().await?;
        let now = Utc::now();
        let member = Member {
            id: Uuid::new_v4().to_string(),
            code,
            name: new.name,
            email: new.email,
            phone: new.phone,
            address: new.address,
            discount_rate: new.discount_rate.unwrap_or(default_rate),
            total_purchase: Money::zero(),
            visit_count: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO members
                (id, code, name, email, phone, address, discount_rate,
                 total_purchase, visit_count, is_active, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&member.id)
        .bind(&member.code)
        .bind(&member.name)
        .bind(&member.email)
        .bind(&member.phone)
        .bind(&member.address)
        .bind(member.discount_rate)
        .bind(member.total_purchase)
        .bind(member.visit_count)
        .bind(member.is_active)
        .bind(member.created_at)
        .bind(member.updated_at)
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        debug!(code = %member.code, name = %member.name, "Member registered");
        Ok(member)
    }

    /// Updates a member's contact fields and rate.
    pub async fn update(&self, member: &Member) -> StoreResult<()> {
        validate_name(&member.name)?;

        let result = sqlx::query(
            r#"
            UPDATE members
            SET name = ?2, email = ?3, phone = ?4, address = ?5,
                discount_rate = ?6, is_active = ?7, updated_at = ?8
            WHERE id = ?1
            "#,
        )
        .bind(&member.id)
        .bind(&member.name)
        .bind(&member.email)
        .bind(&member.phone)
        .bind(&member.address)
        .bind(member.discount_rate)
        .bind(member.is_active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Member", &member.id).into());
        }
        Ok(())
    }

    /// Soft-deletes a member. Their sales history stays intact.
    pub async fn deactivate(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("UPDATE members SET is_active = 0, updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Member", id));
        }
        Ok(())
    }

    /// Accumulates one completed sale into the member's lifetime stats.
    ///
    /// Executor-generic; the checkout transaction runs this inside its
    /// own connection.
    pub async fn record_purchase<'e, E>(executor: E, member_id: &str, amount: Money) -> DbResult<()>
    where
        E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
    {
        let result = sqlx::query(
            r#"
            UPDATE members
            SET total_purchase = total_purchase + ?2,
                visit_count = visit_count + 1,
                updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(member_id)
        .bind(amount)
        .bind(Utc::now())
        .execute(executor)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Member", member_id));
        }
        Ok(())
    }

    /// Next sequential code: MBR001, MBR002, ...
    async fn next_code(&self) -> DbResult<String> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM members")
            .fetch_one(&self.pool)
            .await?;

        Ok(format!("MBR{:03}", count + 1))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn budi() -> NewMember {
        NewMember {
            name: "Budi Santoso".to_string(),
            email: Some("budi@example.com".to_string()),
            phone: Some("081234567890".to_string()),
            address: None,
            discount_rate: None,
        }
    }

    #[tokio::test]
    async fn codes_are_sequential() {
        let db = test_db().await;
        let repo = db.members();
        let rate = DiscountRate::from_bps(500).unwrap();

        let first = repo.insert(budi(), rate).await.unwrap();
        let second = repo
            .insert(
                NewMember {
                    name: "Siti Aminah".to_string(),
                    ..budi()
                },
                rate,
            )
            .await
            .unwrap();

        assert_eq!(first.code, "MBR001");
        assert_eq!(second.code, "MBR002");
    }

    #[tokio::test]
    async fn code_lookup_is_case_insensitive() {
        let db = test_db().await;
        let repo = db.members();
        let rate = DiscountRate::from_bps(500).unwrap();

        repo.insert(budi(), rate).await.unwrap();

        let found = repo.find_active_by_code("mbr001").await.unwrap();
        assert_eq!(found.unwrap().name, "Budi Santoso");

        // whitespace from a sloppy scan is trimmed
        let found = repo.find_active_by_code(" MBR001 ").await.unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn deactivated_member_not_found_by_code() {
        let db = test_db().await;
        let repo = db.members();
        let rate = DiscountRate::from_bps(500).unwrap();

        let member = repo.insert(budi(), rate).await.unwrap();
        repo.deactivate(&member.id).await.unwrap();

        assert!(repo.find_active_by_code("MBR001").await.unwrap().is_none());
        assert!(repo.get_by_id(&member.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn record_purchase_accumulates() {
        let db = test_db().await;
        let repo = db.members();
        let rate = DiscountRate::from_bps(500).unwrap();
        let member = repo.insert(budi(), rate).await.unwrap();

        MemberRepository::record_purchase(db.pool(), &member.id, Money::new(15_290))
            .await
            .unwrap();
        MemberRepository::record_purchase(db.pool(), &member.id, Money::new(4_710))
            .await
            .unwrap();

        let reloaded = repo.get_by_id(&member.id).await.unwrap().unwrap();
        assert_eq!(reloaded.total_purchase, Money::new(20_000));
        assert_eq!(reloaded.visit_count, 2);
    }

    #[tokio::test]
    async fn personal_rate_overrides_default() {
        let db = test_db().await;
        let repo = db.members();
        let default_rate = DiscountRate::from_bps(500).unwrap();

        let vip = repo
            .insert(
                NewMember {
                    discount_rate: DiscountRate::from_bps(1_000),
                    ..budi()
                },
                default_rate,
            )
            .await
            .unwrap();

        assert_eq!(vip.discount_rate.bps(), 1_000);
    }
}
