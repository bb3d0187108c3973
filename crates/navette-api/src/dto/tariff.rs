//! Tariff DTOs
//!
//! Request types for flat rate and kilometric rule administration.

use navette_core::models::{FlatRate, KilometricRule};
use rust_decimal::Decimal;
use serde::Deserialize;
use validator::Validate;

fn default_true() -> bool {
    true
}

fn default_multiplier() -> Decimal {
    Decimal::ONE
}

/// Flat rate create/update request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct FlatRateRequest {
    #[validate(length(min = 1, max = 200, message = "Origin is required"))]
    pub origin: String,

    #[validate(length(min = 1, max = 200, message = "Destination is required"))]
    pub destination: String,

    /// Price in F CFA
    #[validate(range(min = 0))]
    pub price: i64,

    pub distance_km: Decimal,

    #[serde(default = "default_true")]
    pub bidirectional: bool,

    #[serde(default = "default_true")]
    pub active: bool,
}

impl FlatRateRequest {
    pub fn into_flat_rate(self, id: i32) -> FlatRate {
        FlatRate {
            id,
            origin: self.origin,
            destination: self.destination,
            price: self.price,
            distance_km: self.distance_km,
            bidirectional: self.bidirectional,
            active: self.active,
            ..Default::default()
        }
    }
}

/// Kilometric rule create/update request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct KilometricRuleRequest {
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,

    pub base_fare: Decimal,

    pub price_per_km: Decimal,

    #[serde(default)]
    pub minimum_fare: Decimal,

    #[serde(default = "default_multiplier")]
    pub night_multiplier: Decimal,

    #[serde(default = "default_multiplier")]
    pub weekend_multiplier: Decimal,

    /// Activating a rule deactivates every other rule
    #[serde(default)]
    pub active: bool,
}

impl KilometricRuleRequest {
    pub fn into_rule(self, id: i32) -> KilometricRule {
        KilometricRule {
            id,
            name: self.name,
            base_fare: self.base_fare,
            price_per_km: self.price_per_km,
            minimum_fare: self.minimum_fare,
            night_multiplier: self.night_multiplier,
            weekend_multiplier: self.weekend_multiplier,
            active: self.active,
            ..Default::default()
        }
    }
}
