//! Vehicle repository implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use navette_core::{
    models::Vehicle,
    traits::{Repository, VehicleRepository},
    AppError, AppResult,
};
use sqlx::PgPool;
use tracing::{debug, error, instrument};

const VEHICLE_COLUMNS: &str = r#"
    id, name, category, seats, luggage, description,
    photo_url, available, created_at, updated_at
"#;

/// PostgreSQL implementation of VehicleRepository
pub struct PgVehicleRepository {
    pool: PgPool,
}

impl PgVehicleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository<Vehicle, i32> for PgVehicleRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: i32) -> AppResult<Option<Vehicle>> {
        let query = format!("SELECT {} FROM vehicles WHERE id = $1", VEHICLE_COLUMNS);
        let result = sqlx::query_as::<sqlx::Postgres, VehicleRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error finding vehicle {}: {}", id, e);
                AppError::Database(format!("Failed to find vehicle: {}", e))
            })?;

        Ok(result.map(Into::into))
    }

    #[instrument(skip(self))]
    async fn find_all(&self, limit: i64, offset: i64) -> AppResult<Vec<Vehicle>> {
        let query = format!(
            "SELECT {} FROM vehicles ORDER BY name, id LIMIT $1 OFFSET $2",
            VEHICLE_COLUMNS
        );
        let rows = sqlx::query_as::<sqlx::Postgres, VehicleRow>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error listing vehicles: {}", e);
                AppError::Database(format!("Failed to fetch vehicles: {}", e))
            })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self))]
    async fn count(&self) -> AppResult<i64> {
        let result: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM vehicles")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error counting vehicles: {}", e);
                AppError::Database(format!("Failed to count vehicles: {}", e))
            })?;

        Ok(result.0)
    }

    #[instrument(skip(self, entity))]
    async fn create(&self, entity: &Vehicle) -> AppResult<Vehicle> {
        debug!("Creating vehicle: {}", entity.name);

        let query = format!(
            r#"
            INSERT INTO vehicles (name, category, seats, luggage, description, photo_url, available)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            VEHICLE_COLUMNS
        );
        let row = sqlx::query_as::<sqlx::Postgres, VehicleRow>(&query)
            .bind(&entity.name)
            .bind(&entity.category)
            .bind(entity.seats)
            .bind(entity.luggage)
            .bind(&entity.description)
            .bind(&entity.photo_url)
            .bind(entity.available)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error creating vehicle: {}", e);
                AppError::Database(format!("Failed to create vehicle: {}", e))
            })?;

        Ok(row.into())
    }

    #[instrument(skip(self, entity))]
    async fn update(&self, entity: &Vehicle) -> AppResult<Vehicle> {
        debug!("Updating vehicle: {}", entity.id);

        let query = format!(
            r#"
            UPDATE vehicles
            SET name = $2,
                category = $3,
                seats = $4,
                luggage = $5,
                description = $6,
                photo_url = $7,
                available = $8,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            VEHICLE_COLUMNS
        );
        let row = sqlx::query_as::<sqlx::Postgres, VehicleRow>(&query)
            .bind(entity.id)
            .bind(&entity.name)
            .bind(&entity.category)
            .bind(entity.seats)
            .bind(entity.luggage)
            .bind(&entity.description)
            .bind(&entity.photo_url)
            .bind(entity.available)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error updating vehicle {}: {}", entity.id, e);
                AppError::Database(format!("Failed to update vehicle: {}", e))
            })?
            .ok_or_else(|| AppError::VehicleNotFound(entity.id.to_string()))?;

        Ok(row.into())
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: i32) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM vehicles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error deleting vehicle {}: {}", id, e);
                AppError::Database(format!("Failed to delete vehicle: {}", e))
            })?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl VehicleRepository for PgVehicleRepository {
    #[instrument(skip(self))]
    async fn list_available(&self, limit: i64, offset: i64) -> AppResult<(Vec<Vehicle>, i64)> {
        let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM vehicles WHERE available")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error counting available vehicles: {}", e);
                AppError::Database(format!("Failed to count vehicles: {}", e))
            })?;

        let query = format!(
            "SELECT {} FROM vehicles WHERE available ORDER BY seats, name, id LIMIT $1 OFFSET $2",
            VEHICLE_COLUMNS
        );
        let rows = sqlx::query_as::<sqlx::Postgres, VehicleRow>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error listing available vehicles: {}", e);
                AppError::Database(format!("Failed to fetch vehicles: {}", e))
            })?;

        Ok((rows.into_iter().map(Into::into).collect(), total.0))
    }

    #[instrument(skip(self))]
    async fn set_available(&self, id: i32, available: bool) -> AppResult<Option<Vehicle>> {
        let query = format!(
            "UPDATE vehicles SET available = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            VEHICLE_COLUMNS
        );
        let row = sqlx::query_as::<sqlx::Postgres, VehicleRow>(&query)
            .bind(id)
            .bind(available)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error toggling vehicle {}: {}", id, e);
                AppError::Database(format!("Failed to update vehicle: {}", e))
            })?;

        Ok(row.map(Into::into))
    }
}

#[derive(Debug, sqlx::FromRow)]
struct VehicleRow {
    id: i32,
    name: String,
    category: String,
    seats: i32,
    luggage: i32,
    description: Option<String>,
    photo_url: Option<String>,
    available: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<VehicleRow> for Vehicle {
    fn from(row: VehicleRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            category: row.category,
            seats: row.seats,
            luggage: row.luggage,
            description: row.description,
            photo_url: row.photo_url,
            available: row.available,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
