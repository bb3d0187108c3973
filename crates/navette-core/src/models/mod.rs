//! Domain models for Navette
//!
//! This module contains all the core domain models used throughout the application.

pub mod reservation;
pub mod tariff;
pub mod user;
pub mod vehicle;

pub use reservation::{Reservation, ReservationStatus};
pub use tariff::{DistanceQuote, FlatRate, KilometricRule};
pub use user::{User, UserInfo};
pub use vehicle::Vehicle;
