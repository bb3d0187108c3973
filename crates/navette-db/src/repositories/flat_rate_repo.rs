//! Flat rate repository implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use navette_core::{
    models::FlatRate,
    traits::{FlatRateRepository, Repository},
    AppError, AppResult,
};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{debug, error, instrument};

pub(crate) const FLAT_RATE_COLUMNS: &str = r#"
    id, origin, destination, price, distance_km,
    bidirectional, active, created_at, updated_at
"#;

/// PostgreSQL implementation of FlatRateRepository
pub struct PgFlatRateRepository {
    pool: PgPool,
}

impl PgFlatRateRepository {
    /// Create a new flat rate repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository<FlatRate, i32> for PgFlatRateRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: i32) -> AppResult<Option<FlatRate>> {
        debug!("Finding flat rate by id: {}", id);

        let query = format!("SELECT {} FROM flat_rates WHERE id = $1", FLAT_RATE_COLUMNS);
        let result = sqlx::query_as::<sqlx::Postgres, FlatRateRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error finding flat rate {}: {}", id, e);
                AppError::Database(format!("Failed to find flat rate: {}", e))
            })?;

        Ok(result.map(Into::into))
    }

    #[instrument(skip(self))]
    async fn find_all(&self, limit: i64, offset: i64) -> AppResult<Vec<FlatRate>> {
        let query = format!(
            "SELECT {} FROM flat_rates ORDER BY origin, destination, id LIMIT $1 OFFSET $2",
            FLAT_RATE_COLUMNS
        );
        let rows = sqlx::query_as::<sqlx::Postgres, FlatRateRow>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error listing flat rates: {}", e);
                AppError::Database(format!("Failed to fetch flat rates: {}", e))
            })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self))]
    async fn count(&self) -> AppResult<i64> {
        let result: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM flat_rates")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error counting flat rates: {}", e);
                AppError::Database(format!("Failed to count flat rates: {}", e))
            })?;

        Ok(result.0)
    }

    #[instrument(skip(self, entity))]
    async fn create(&self, entity: &FlatRate) -> AppResult<FlatRate> {
        debug!(
            "Creating flat rate {} -> {}",
            entity.origin, entity.destination
        );

        let query = format!(
            r#"
            INSERT INTO flat_rates (origin, destination, price, distance_km, bidirectional, active)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            FLAT_RATE_COLUMNS
        );
        let row = sqlx::query_as::<sqlx::Postgres, FlatRateRow>(&query)
            .bind(&entity.origin)
            .bind(&entity.destination)
            .bind(entity.price)
            .bind(entity.distance_km)
            .bind(entity.bidirectional)
            .bind(entity.active)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error creating flat rate: {}", e);
                AppError::Database(format!("Failed to create flat rate: {}", e))
            })?;

        Ok(row.into())
    }

    #[instrument(skip(self, entity))]
    async fn update(&self, entity: &FlatRate) -> AppResult<FlatRate> {
        debug!("Updating flat rate: {}", entity.id);

        let query = format!(
            r#"
            UPDATE flat_rates
            SET origin = $2,
                destination = $3,
                price = $4,
                distance_km = $5,
                bidirectional = $6,
                active = $7,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            FLAT_RATE_COLUMNS
        );
        let row = sqlx::query_as::<sqlx::Postgres, FlatRateRow>(&query)
            .bind(entity.id)
            .bind(&entity.origin)
            .bind(&entity.destination)
            .bind(entity.price)
            .bind(entity.distance_km)
            .bind(entity.bidirectional)
            .bind(entity.active)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error updating flat rate {}: {}", entity.id, e);
                AppError::Database(format!("Failed to update flat rate: {}", e))
            })?
            .ok_or_else(|| AppError::NotFound(format!("Flat rate {} not found", entity.id)))?;

        Ok(row.into())
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: i32) -> AppResult<bool> {
        debug!("Deleting flat rate: {}", id);

        let result = sqlx::query("DELETE FROM flat_rates WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error deleting flat rate {}: {}", id, e);
                AppError::Database(format!("Failed to delete flat rate: {}", e))
            })?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl FlatRateRepository for PgFlatRateRepository {
    #[instrument(skip(self))]
    async fn find_active_between(&self, a: &str, b: &str) -> AppResult<Vec<FlatRate>> {
        let query = format!(
            r#"
            SELECT {}
            FROM flat_rates
            WHERE active
              AND ((origin = $1 AND destination = $2) OR (origin = $2 AND destination = $1))
            ORDER BY created_at DESC, id DESC
            "#,
            FLAT_RATE_COLUMNS
        );
        let rows = sqlx::query_as::<sqlx::Postgres, FlatRateRow>(&query)
            .bind(a)
            .bind(b)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error finding flat rates {} <-> {}: {}", a, b, e);
                AppError::Database(format!("Failed to find flat rates: {}", e))
            })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self))]
    async fn set_active(&self, id: i32, active: bool) -> AppResult<Option<FlatRate>> {
        let query = format!(
            "UPDATE flat_rates SET active = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            FLAT_RATE_COLUMNS
        );
        let row = sqlx::query_as::<sqlx::Postgres, FlatRateRow>(&query)
            .bind(id)
            .bind(active)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error toggling flat rate {}: {}", id, e);
                AppError::Database(format!("Failed to update flat rate: {}", e))
            })?;

        Ok(row.map(Into::into))
    }
}

/// Helper struct for mapping database rows
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct FlatRateRow {
    id: i32,
    origin: String,
    destination: String,
    price: i64,
    distance_km: Decimal,
    bidirectional: bool,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<FlatRateRow> for FlatRate {
    fn from(row: FlatRateRow) -> Self {
        Self {
            id: row.id,
            origin: row.origin,
            destination: row.destination,
            price: row.price,
            distance_km: row.distance_km,
            bidirectional: row.bidirectional,
            active: row.active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
