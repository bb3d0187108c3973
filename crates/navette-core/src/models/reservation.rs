//! Reservation model
//!
//! Customer bookings and their lifecycle.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Reservation status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    /// Submitted by the customer, awaiting confirmation
    #[default]
    Pending,
    /// Accepted by the operator
    Confirmed,
    /// Cancelled by either side
    Cancelled,
    /// Trip done
    Completed,
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReservationStatus::Pending => write!(f, "pending"),
            ReservationStatus::Confirmed => write!(f, "confirmed"),
            ReservationStatus::Cancelled => write!(f, "cancelled"),
            ReservationStatus::Completed => write!(f, "completed"),
        }
    }
}

impl ReservationStatus {
    /// Parse from string (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(ReservationStatus::Pending),
            "confirmed" => Some(ReservationStatus::Confirmed),
            "cancelled" => Some(ReservationStatus::Cancelled),
            "completed" => Some(ReservationStatus::Completed),
            _ => None,
        }
    }

    /// Cancelled and completed reservations are final
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            ReservationStatus::Cancelled | ReservationStatus::Completed
        )
    }

    /// Allowed transitions: pending -> confirmed | cancelled, confirmed -> completed | cancelled
    pub fn can_transition_to(&self, next: ReservationStatus) -> bool {
        matches!(
            (self, next),
            (ReservationStatus::Pending, ReservationStatus::Confirmed)
                | (ReservationStatus::Pending, ReservationStatus::Cancelled)
                | (ReservationStatus::Confirmed, ReservationStatus::Completed)
                | (ReservationStatus::Confirmed, ReservationStatus::Cancelled)
        )
    }
}

/// Reservation entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    /// Unique identifier
    pub id: Uuid,

    /// Requested vehicle, if the customer picked one
    pub vehicle_id: Option<i32>,

    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,

    /// Pickup address as typed by the customer
    pub origin: String,

    /// Drop-off address as typed by the customer
    pub destination: String,

    /// Requested pickup time
    pub pickup_at: DateTime<Utc>,

    pub passengers: i32,

    /// Fare estimate at booking time (absent when the estimate failed)
    pub estimated_price: Option<Decimal>,

    pub notes: Option<String>,

    pub status: ReservationStatus,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for Reservation {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            vehicle_id: None,
            customer_name: String::new(),
            customer_email: String::new(),
            customer_phone: String::new(),
            origin: String::new(),
            destination: String::new(),
            pickup_at: now,
            passengers: 1,
            estimated_price: None,
            notes: None,
            status: ReservationStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}
