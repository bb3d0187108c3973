//! Kilometric rule repository implementation
//!
//! Every write that leaves a rule active also deactivates the other rules in
//! the same transaction, so at most one rule is active at any time.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use navette_core::{
    models::KilometricRule,
    traits::{KilometricRuleRepository, Repository},
    AppError, AppResult,
};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, error, info, instrument};

pub(crate) const RULE_COLUMNS: &str = r#"
    id, name, base_fare, price_per_km, minimum_fare,
    night_multiplier, weekend_multiplier, active,
    created_at, updated_at
"#;

/// PostgreSQL implementation of KilometricRuleRepository
pub struct PgKilometricRuleRepository {
    pool: PgPool,
}

impl PgKilometricRuleRepository {
    /// Create a new kilometric rule repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn begin(&self) -> AppResult<Transaction<'static, Postgres>> {
        self.pool.begin().await.map_err(|e| {
            error!("Failed to start transaction: {}", e);
            AppError::Transaction(format!("Failed to start transaction: {}", e))
        })
    }

    async fn commit(tx: Transaction<'static, Postgres>) -> AppResult<()> {
        tx.commit().await.map_err(|e| {
            error!("Failed to commit transaction: {}", e);
            AppError::Transaction(format!("Failed to commit transaction: {}", e))
        })
    }

    /// Deactivate every rule except `keep` (all rules when `keep` is None)
    async fn deactivate_others(
        tx: &mut Transaction<'static, Postgres>,
        keep: Option<i32>,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE kilometric_rules
            SET active = FALSE, updated_at = NOW()
            WHERE active AND ($1::INTEGER IS NULL OR id <> $1)
            "#,
        )
        .bind(keep)
        .execute(&mut **tx)
        .await
        .map_err(|e| {
            error!("Database error deactivating kilometric rules: {}", e);
            AppError::Database(format!("Failed to deactivate rules: {}", e))
        })?;

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl Repository<KilometricRule, i32> for PgKilometricRuleRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: i32) -> AppResult<Option<KilometricRule>> {
        debug!("Finding kilometric rule by id: {}", id);

        let query = format!("SELECT {} FROM kilometric_rules WHERE id = $1", RULE_COLUMNS);
        let result = sqlx::query_as::<sqlx::Postgres, KilometricRuleRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error finding kilometric rule {}: {}", id, e);
                AppError::Database(format!("Failed to find kilometric rule: {}", e))
            })?;

        Ok(result.map(Into::into))
    }

    #[instrument(skip(self))]
    async fn find_all(&self, limit: i64, offset: i64) -> AppResult<Vec<KilometricRule>> {
        let query = format!(
            "SELECT {} FROM kilometric_rules ORDER BY active DESC, created_at DESC, id DESC LIMIT $1 OFFSET $2",
            RULE_COLUMNS
        );
        let rows = sqlx::query_as::<sqlx::Postgres, KilometricRuleRow>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error listing kilometric rules: {}", e);
                AppError::Database(format!("Failed to fetch kilometric rules: {}", e))
            })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self))]
    async fn count(&self) -> AppResult<i64> {
        let result: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM kilometric_rules")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error counting kilometric rules: {}", e);
                AppError::Database(format!("Failed to count kilometric rules: {}", e))
            })?;

        Ok(result.0)
    }

    #[instrument(skip(self, entity))]
    async fn create(&self, entity: &KilometricRule) -> AppResult<KilometricRule> {
        debug!("Creating kilometric rule: {}", entity.name);

        let mut tx = self.begin().await?;

        if entity.active {
            Self::deactivate_others(&mut tx, None).await?;
        }

        let query = format!(
            r#"
            INSERT INTO kilometric_rules (
                name, base_fare, price_per_km, minimum_fare,
                night_multiplier, weekend_multiplier, active
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            RULE_COLUMNS
        );
        let row = sqlx::query_as::<sqlx::Postgres, KilometricRuleRow>(&query)
            .bind(&entity.name)
            .bind(entity.base_fare)
            .bind(entity.price_per_km)
            .bind(entity.minimum_fare)
            .bind(entity.night_multiplier)
            .bind(entity.weekend_multiplier)
            .bind(entity.active)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                error!("Database error creating kilometric rule: {}", e);
                AppError::Database(format!("Failed to create kilometric rule: {}", e))
            })?;

        Self::commit(tx).await?;
        Ok(row.into())
    }

    #[instrument(skip(self, entity))]
    async fn update(&self, entity: &KilometricRule) -> AppResult<KilometricRule> {
        debug!("Updating kilometric rule: {}", entity.id);

        let mut tx = self.begin().await?;

        if entity.active {
            Self::deactivate_others(&mut tx, Some(entity.id)).await?;
        }

        let query = format!(
            r#"
            UPDATE kilometric_rules
            SET name = $2,
                base_fare = $3,
                price_per_km = $4,
                minimum_fare = $5,
                night_multiplier = $6,
                weekend_multiplier = $7,
                active = $8,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            RULE_COLUMNS
        );
        let row = sqlx::query_as::<sqlx::Postgres, KilometricRuleRow>(&query)
            .bind(entity.id)
            .bind(&entity.name)
            .bind(entity.base_fare)
            .bind(entity.price_per_km)
            .bind(entity.minimum_fare)
            .bind(entity.night_multiplier)
            .bind(entity.weekend_multiplier)
            .bind(entity.active)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| {
                error!("Database error updating kilometric rule {}: {}", entity.id, e);
                AppError::Database(format!("Failed to update kilometric rule: {}", e))
            })?
            .ok_or_else(|| AppError::NotFound(format!("Kilometric rule {} not found", entity.id)))?;

        Self::commit(tx).await?;
        Ok(row.into())
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: i32) -> AppResult<bool> {
        debug!("Deleting kilometric rule: {}", id);

        let result = sqlx::query("DELETE FROM kilometric_rules WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error deleting kilometric rule {}: {}", id, e);
                AppError::Database(format!("Failed to delete kilometric rule: {}", e))
            })?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl KilometricRuleRepository for PgKilometricRuleRepository {
    #[instrument(skip(self))]
    async fn activate_exclusive(&self, id: i32) -> AppResult<Option<KilometricRule>> {
        let mut tx = self.begin().await?;

        let query = format!(
            "UPDATE kilometric_rules SET active = TRUE, updated_at = NOW() WHERE id = $1 RETURNING {}",
            RULE_COLUMNS
        );
        let row = sqlx::query_as::<sqlx::Postgres, KilometricRuleRow>(&query)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| {
                error!("Database error activating kilometric rule {}: {}", id, e);
                AppError::Database(format!("Failed to activate kilometric rule: {}", e))
            })?;

        let Some(row) = row else {
            // dropping the transaction rolls it back
            return Ok(None);
        };

        let deactivated = Self::deactivate_others(&mut tx, Some(id)).await?;
        Self::commit(tx).await?;

        info!(
            "Kilometric rule {} activated, {} other rule(s) deactivated",
            id, deactivated
        );
        Ok(Some(row.into()))
    }

    #[instrument(skip(self))]
    async fn deactivate(&self, id: i32) -> AppResult<Option<KilometricRule>> {
        let query = format!(
            "UPDATE kilometric_rules SET active = FALSE, updated_at = NOW() WHERE id = $1 RETURNING {}",
            RULE_COLUMNS
        );
        let row = sqlx::query_as::<sqlx::Postgres, KilometricRuleRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error deactivating kilometric rule {}: {}", id, e);
                AppError::Database(format!("Failed to deactivate kilometric rule: {}", e))
            })?;

        Ok(row.map(Into::into))
    }
}

/// Helper struct for mapping database rows
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct KilometricRuleRow {
    id: i32,
    name: String,
    base_fare: Decimal,
    price_per_km: Decimal,
    minimum_fare: Decimal,
    night_multiplier: Decimal,
    weekend_multiplier: Decimal,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<KilometricRuleRow> for KilometricRule {
    fn from(row: KilometricRuleRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            base_fare: row.base_fare,
            price_per_km: row.price_per_km,
            minimum_fare: row.minimum_fare,
            night_multiplier: row.night_multiplier,
            weekend_multiplier: row.weekend_multiplier,
            active: row.active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
