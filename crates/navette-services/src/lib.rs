//! Business logic services for Navette
//!
//! Services own their collaborators behind `Arc<dyn Trait>` handles so they can
//! be shared across Actix workers and exercised with in-memory mocks.
//!
//! # Services
//!
//! - `FareEstimator` - flat-rate lookup, then kilometric pricing with surcharges
//! - `GoogleDistanceMatrix` - distance provider backed by Google Distance Matrix
//! - `TariffAdminService` - flat-rate conflict checks and exclusive rule activation
//! - `BookingService` - reservation intake with best-effort pricing
//! - `NotificationQueue` - bounded background mail delivery

pub mod booking;
pub mod distance;
pub mod fare;
pub mod notifier;
pub mod tariff;

pub use booking::{BookingService, NewReservation};
pub use distance::GoogleDistanceMatrix;
pub use fare::{format_fcfa, FareEstimator, FareQuote, FareSource};
pub use notifier::{
    mailer_from_config, DisabledMailer, NotificationQueue, NotificationStats, SendGridMailer,
};
pub use tariff::TariffAdminService;

/// Business logic constants
pub mod constants {
    /// Currency suffix appended to formatted prices
    pub const CURRENCY_SUFFIX: &str = "F CFA";
}
