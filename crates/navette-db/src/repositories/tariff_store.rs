//! Tariff store used by the fare estimator
//!
//! Read-only view over `flat_rates` and `kilometric_rules`. Duplicate active
//! matches resolve deterministically: direct-direction flat rates before
//! reversed ones, then most recently created.

use super::flat_rate_repo::{FlatRateRow, FLAT_RATE_COLUMNS};
use super::kilometric_rule_repo::{KilometricRuleRow, RULE_COLUMNS};
use async_trait::async_trait;
use navette_core::{
    models::{FlatRate, KilometricRule},
    traits::TariffStore,
    AppError, AppResult,
};
use sqlx::PgPool;
use tracing::{debug, error, instrument};

/// PostgreSQL implementation of TariffStore
#[derive(Clone)]
pub struct PgTariffStore {
    pool: PgPool,
}

impl PgTariffStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TariffStore for PgTariffStore {
    #[instrument(skip(self))]
    async fn find_flat_rate(&self, origin: &str, destination: &str) -> AppResult<Option<FlatRate>> {
        let query = format!(
            r#"
            SELECT {}
            FROM flat_rates
            WHERE active
              AND (
                    (origin = $1 AND destination = $2)
                 OR (bidirectional AND origin = $2 AND destination = $1)
              )
            ORDER BY (origin = $1 AND destination = $2) DESC, created_at DESC, id DESC
            LIMIT 1
            "#,
            FLAT_RATE_COLUMNS
        );

        let result = sqlx::query_as::<sqlx::Postgres, FlatRateRow>(&query)
            .bind(origin)
            .bind(destination)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error looking up flat rate: {}", e);
                AppError::Database(format!("Failed to look up flat rate: {}", e))
            })?;

        if result.is_none() {
            debug!("No flat rate for {} -> {}", origin, destination);
        }

        Ok(result.map(Into::into))
    }

    #[instrument(skip(self))]
    async fn find_active_rule(&self) -> AppResult<Option<KilometricRule>> {
        let query = format!(
            r#"
            SELECT {}
            FROM kilometric_rules
            WHERE active
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
            RULE_COLUMNS
        );

        let result = sqlx::query_as::<sqlx::Postgres, KilometricRuleRow>(&query)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error loading active kilometric rule: {}", e);
                AppError::Database(format!("Failed to load kilometric rule: {}", e))
            })?;

        Ok(result.map(Into::into))
    }
}
