//! Reservation repository implementation
//!
//! Provides PostgreSQL-backed storage for customer bookings.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use navette_core::{
    models::{Reservation, ReservationStatus},
    traits::{Repository, ReservationRepository},
    AppError, AppResult,
};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{debug, error, instrument, warn};
use uuid::Uuid;

const RESERVATION_COLUMNS: &str = r#"
    id, vehicle_id, customer_name, customer_email, customer_phone,
    origin, destination, pickup_at, passengers, estimated_price,
    notes, status, created_at, updated_at
"#;

/// PostgreSQL implementation of ReservationRepository
pub struct PgReservationRepository {
    pool: PgPool,
}

impl PgReservationRepository {
    /// Create a new reservation repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Parse reservation status from string
    fn parse_status(s: &str) -> ReservationStatus {
        ReservationStatus::from_str(s).unwrap_or_else(|| {
            warn!("Unknown reservation status '{}', treating as pending", s);
            ReservationStatus::Pending
        })
    }
}

#[async_trait]
impl Repository<Reservation, Uuid> for PgReservationRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Reservation>> {
        debug!("Finding reservation by id: {}", id);

        let query = format!("SELECT {} FROM reservations WHERE id = $1", RESERVATION_COLUMNS);
        let result = sqlx::query_as::<sqlx::Postgres, ReservationRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error finding reservation {}: {}", id, e);
                AppError::Database(format!("Failed to find reservation: {}", e))
            })?;

        Ok(result.map(Into::into))
    }

    #[instrument(skip(self))]
    async fn find_all(&self, limit: i64, offset: i64) -> AppResult<Vec<Reservation>> {
        let (rows, _) = self.list_filtered(None, limit, offset).await?;
        Ok(rows)
    }

    #[instrument(skip(self))]
    async fn count(&self) -> AppResult<i64> {
        let result: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM reservations")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error counting reservations: {}", e);
                AppError::Database(format!("Failed to count reservations: {}", e))
            })?;

        Ok(result.0)
    }

    #[instrument(skip(self, entity))]
    async fn create(&self, entity: &Reservation) -> AppResult<Reservation> {
        debug!("Creating reservation {} for {}", entity.id, entity.customer_email);

        let query = format!(
            r#"
            INSERT INTO reservations (
                id, vehicle_id, customer_name, customer_email, customer_phone,
                origin, destination, pickup_at, passengers, estimated_price,
                notes, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {}
            "#,
            RESERVATION_COLUMNS
        );
        let row = sqlx::query_as::<sqlx::Postgres, ReservationRow>(&query)
            .bind(entity.id)
            .bind(entity.vehicle_id)
            .bind(&entity.customer_name)
            .bind(&entity.customer_email)
            .bind(&entity.customer_phone)
            .bind(&entity.origin)
            .bind(&entity.destination)
            .bind(entity.pickup_at)
            .bind(entity.passengers)
            .bind(entity.estimated_price)
            .bind(&entity.notes)
            .bind(entity.status.to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error creating reservation: {}", e);
                AppError::Database(format!("Failed to create reservation: {}", e))
            })?;

        Ok(row.into())
    }

    #[instrument(skip(self, entity))]
    async fn update(&self, entity: &Reservation) -> AppResult<Reservation> {
        debug!("Updating reservation: {}", entity.id);

        let query = format!(
            r#"
            UPDATE reservations
            SET vehicle_id = $2,
                customer_name = $3,
                customer_email = $4,
                customer_phone = $5,
                origin = $6,
                destination = $7,
                pickup_at = $8,
                passengers = $9,
                estimated_price = $10,
                notes = $11,
                status = $12,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            RESERVATION_COLUMNS
        );
        let row = sqlx::query_as::<sqlx::Postgres, ReservationRow>(&query)
            .bind(entity.id)
            .bind(entity.vehicle_id)
            .bind(&entity.customer_name)
            .bind(&entity.customer_email)
            .bind(&entity.customer_phone)
            .bind(&entity.origin)
            .bind(&entity.destination)
            .bind(entity.pickup_at)
            .bind(entity.passengers)
            .bind(entity.estimated_price)
            .bind(&entity.notes)
            .bind(entity.status.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error updating reservation {}: {}", entity.id, e);
                AppError::Database(format!("Failed to update reservation: {}", e))
            })?
            .ok_or_else(|| AppError::ReservationNotFound(entity.id.to_string()))?;

        Ok(row.into())
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        debug!("Deleting reservation: {}", id);

        let result = sqlx::query("DELETE FROM reservations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error deleting reservation {}: {}", id, e);
                AppError::Database(format!("Failed to delete reservation: {}", e))
            })?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl ReservationRepository for PgReservationRepository {
    #[instrument(skip(self))]
    async fn list_filtered(
        &self,
        status: Option<ReservationStatus>,
        limit: i64,
        offset: i64,
    ) -> AppResult<(Vec<Reservation>, i64)> {
        let status = status.map(|s| s.to_string());

        let total: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM reservations WHERE ($1::VARCHAR IS NULL OR status = $1)",
        )
        .bind(&status)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error counting reservations: {}", e);
            AppError::Database(format!("Failed to count reservations: {}", e))
        })?;

        let query = format!(
            r#"
            SELECT {}
            FROM reservations
            WHERE ($1::VARCHAR IS NULL OR status = $1)
            ORDER BY pickup_at DESC, created_at DESC
            LIMIT $2 OFFSET $3
            "#,
            RESERVATION_COLUMNS
        );
        let rows = sqlx::query_as::<sqlx::Postgres, ReservationRow>(&query)
            .bind(&status)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error listing reservations: {}", e);
                AppError::Database(format!("Failed to fetch reservations: {}", e))
            })?;

        Ok((rows.into_iter().map(Into::into).collect(), total.0))
    }

    #[instrument(skip(self))]
    async fn update_status(
        &self,
        id: Uuid,
        status: ReservationStatus,
    ) -> AppResult<Option<Reservation>> {
        let query = format!(
            "UPDATE reservations SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            RESERVATION_COLUMNS
        );
        let row = sqlx::query_as::<sqlx::Postgres, ReservationRow>(&query)
            .bind(id)
            .bind(status.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error updating reservation {} status: {}", id, e);
                AppError::Database(format!("Failed to update reservation status: {}", e))
            })?;

        Ok(row.map(Into::into))
    }
}

/// Helper struct for mapping database rows
#[derive(Debug, sqlx::FromRow)]
struct ReservationRow {
    id: Uuid,
    vehicle_id: Option<i32>,
    customer_name: String,
    customer_email: String,
    customer_phone: String,
    origin: String,
    destination: String,
    pickup_at: DateTime<Utc>,
    passengers: i32,
    estimated_price: Option<Decimal>,
    notes: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ReservationRow> for Reservation {
    fn from(row: ReservationRow) -> Self {
        Self {
            id: row.id,
            vehicle_id: row.vehicle_id,
            customer_name: row.customer_name,
            customer_email: row.customer_email,
            customer_phone: row.customer_phone,
            origin: row.origin,
            destination: row.destination,
            pickup_at: row.pickup_at,
            passengers: row.passengers,
            estimated_price: row.estimated_price,
            notes: row.notes,
            status: PgReservationRepository::parse_status(&row.status),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_status() {
        assert_eq!(
            PgReservationRepository::parse_status("confirmed"),
            ReservationStatus::Confirmed
        );
        assert_eq!(
            PgReservationRepository::parse_status("garbage"),
            ReservationStatus::Pending
        );
    }
}
