//! Tariff models
//!
//! Flat rates for known origin/destination pairs and the kilometric rule used
//! when no flat rate applies.

use chrono::{DateTime, Datelike, TimeZone, Timelike, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Estimated minutes of travel per kilometre for flat-rate trips
pub const FLAT_RATE_MINUTES_PER_KM: Decimal = dec!(1.2);

/// First hour (inclusive) of the night surcharge window
pub const NIGHT_START_HOUR: u32 = 22;

/// Hour (exclusive) at which the night surcharge window ends
pub const NIGHT_END_HOUR: u32 = 6;

/// Flat rate (forfait) entity
///
/// A fixed price for a known origin/destination pair. Matching is strict,
/// case-sensitive string equality on both ends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlatRate {
    /// Unique identifier
    pub id: i32,

    /// Departure label, matched verbatim
    pub origin: String,

    /// Arrival label, matched verbatim
    pub destination: String,

    /// Price in F CFA
    pub price: i64,

    /// Stored trip distance in kilometres
    pub distance_km: Decimal,

    /// Whether the entry also applies from destination to origin
    pub bidirectional: bool,

    /// Only active entries are considered by the estimator
    pub active: bool,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl FlatRate {
    /// Whether the entry applies in the stored direction
    #[inline]
    pub fn matches_directly(&self, origin: &str, destination: &str) -> bool {
        self.origin == origin && self.destination == destination
    }

    /// Whether the entry applies to a request, honouring `bidirectional`
    pub fn matches(&self, origin: &str, destination: &str) -> bool {
        self.matches_directly(origin, destination)
            || (self.bidirectional && self.origin == destination && self.destination == origin)
    }

    /// Whether both entries would answer at least one common request
    pub fn overlaps(&self, other: &FlatRate) -> bool {
        other.matches(&self.origin, &self.destination)
            || (self.bidirectional && other.matches(&self.destination, &self.origin))
    }

    /// Distance and duration derived from the stored distance
    pub fn distance_quote(&self) -> DistanceQuote {
        DistanceQuote {
            distance_km: self.distance_km,
            duration_minutes: self.distance_km * FLAT_RATE_MINUTES_PER_KM,
        }
    }
}

impl Default for FlatRate {
    fn default() -> Self {
        Self {
            id: 0,
            origin: String::new(),
            destination: String::new(),
            price: 0,
            distance_km: Decimal::ZERO,
            bidirectional: false,
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}

/// Kilometric rule (règle) entity
///
/// Formula-based fare: base fare plus a per-kilometre rate, floored at a
/// minimum and scaled by night and weekend multipliers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KilometricRule {
    /// Unique identifier
    pub id: i32,

    /// Label shown in the back-office
    pub name: String,

    /// Fixed part of every fare
    pub base_fare: Decimal,

    /// Price per kilometre
    pub price_per_km: Decimal,

    /// Floor applied before surcharges
    pub minimum_fare: Decimal,

    /// Multiplier applied between 22:00 and 06:00
    pub night_multiplier: Decimal,

    /// Multiplier applied on Saturday and Sunday
    pub weekend_multiplier: Decimal,

    /// At most one rule is active at a time
    pub active: bool,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl KilometricRule {
    /// Price before surcharges: `max(base + per_km * distance, minimum)`
    #[inline]
    pub fn base_price(&self, distance_km: Decimal) -> Decimal {
        let price = self.base_fare + self.price_per_km * distance_km;
        price.max(self.minimum_fare)
    }

    /// Price for a trip requested at `at` (local time of the operator)
    pub fn price_at<Tz: TimeZone>(&self, distance_km: Decimal, at: &DateTime<Tz>) -> Decimal {
        let mut price = self.base_price(distance_km);

        if is_night_hour(at.hour()) {
            price *= self.night_multiplier;
        }

        if is_weekend(at) {
            price *= self.weekend_multiplier;
        }

        price
    }
}

impl Default for KilometricRule {
    fn default() -> Self {
        Self {
            id: 0,
            name: String::new(),
            base_fare: Decimal::ZERO,
            price_per_km: Decimal::ZERO,
            minimum_fare: Decimal::ZERO,
            night_multiplier: Decimal::ONE,
            weekend_multiplier: Decimal::ONE,
            active: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}

/// Night window is [22:00, 24:00) and [00:00, 06:00)
#[inline]
pub fn is_night_hour(hour: u32) -> bool {
    hour >= NIGHT_START_HOUR || hour < NIGHT_END_HOUR
}

/// Saturday or Sunday in the timestamp's own timezone
#[inline]
pub fn is_weekend<Tz: TimeZone>(at: &DateTime<Tz>) -> bool {
    at.weekday().num_days_from_monday() >= 5
}

/// Travel estimate for a trip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistanceQuote {
    /// Distance in kilometres
    pub distance_km: Decimal,

    /// Duration in minutes
    pub duration_minutes: Decimal,
}

impl DistanceQuote {
    /// Build from the provider's metres and seconds
    pub fn from_meters_seconds(meters: i64, seconds: i64) -> Self {
        Self {
            distance_km: Decimal::from(meters) / dec!(1000),
            duration_minutes: Decimal::from(seconds) / dec!(60),
        }
    }

    /// Distance rounded half-to-even to whole kilometres
    pub fn rounded_distance_km(&self) -> i64 {
        round_to_integer(self.distance_km)
    }

    /// Duration rounded half-to-even to whole minutes
    pub fn rounded_duration_minutes(&self) -> i64 {
        round_to_integer(self.duration_minutes)
    }
}

fn round_to_integer(value: Decimal) -> i64 {
    value
        .round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven)
        .to_i64()
        .unwrap_or(i64::MAX)
}
