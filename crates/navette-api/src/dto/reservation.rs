//! Reservation DTOs

use chrono::{DateTime, Utc};
use navette_core::models::ReservationStatus;
use navette_services::NewReservation;
use serde::Deserialize;
use validator::Validate;

fn default_passengers() -> i32 {
    1
}

/// Public booking request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateReservationRequest {
    pub vehicle_id: Option<i32>,

    #[validate(length(min = 1, max = 200, message = "Name is required"))]
    pub customer_name: String,

    #[validate(email(message = "Invalid email format"))]
    pub customer_email: String,

    #[validate(length(min = 4, max = 50, message = "Phone number is required"))]
    pub customer_phone: String,

    #[validate(length(min = 1, max = 300, message = "Pickup address is required"))]
    pub origin: String,

    #[validate(length(min = 1, max = 300, message = "Drop-off address is required"))]
    pub destination: String,

    pub pickup_at: DateTime<Utc>,

    #[serde(default = "default_passengers")]
    #[validate(range(min = 1, max = 60))]
    pub passengers: i32,

    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

impl From<CreateReservationRequest> for NewReservation {
    fn from(req: CreateReservationRequest) -> Self {
        Self {
            vehicle_id: req.vehicle_id,
            customer_name: req.customer_name,
            customer_email: req.customer_email,
            customer_phone: req.customer_phone,
            origin: req.origin,
            destination: req.destination,
            pickup_at: req.pickup_at,
            passengers: req.passengers,
            notes: req.notes,
        }
    }
}

/// Admin listing filters
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ReservationQueryParams {
    #[serde(default = "default_page")]
    #[validate(range(min = 1))]
    pub page: i64,

    #[serde(default = "default_per_page")]
    #[validate(range(min = 1, max = 200))]
    pub per_page: i64,

    /// `pending`, `confirmed`, `cancelled` or `completed`
    pub status: Option<String>,
}

fn default_page() -> i64 {
    1
}

fn default_per_page() -> i64 {
    50
}

/// Status change request
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: ReservationStatus,
}
