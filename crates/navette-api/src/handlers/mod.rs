//! HTTP request handlers

pub mod auth;
pub mod estimate;
pub mod reservation;
pub mod tariff;
pub mod vehicle;

pub use auth::configure as configure_auth;
pub use estimate::configure as configure_estimate;
pub use reservation::configure as configure_reservations;
pub use tariff::configure as configure_tariffs;
pub use vehicle::configure as configure_vehicles;
