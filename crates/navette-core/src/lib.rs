//! Navette Core Library
//!
//! This crate provides the foundational types, traits, and error handling
//! for the Navette transfer booking backend. It includes:
//!
//! - Domain models (FlatRate, KilometricRule, Vehicle, Reservation, User)
//! - Repository and collaborator traits (tariff store, distance provider, mailer)
//! - Unified error handling with HTTP response mapping
//! - Application configuration

pub mod config;
pub mod error;
pub mod models;
pub mod traits;

pub use config::AppConfig;
pub use error::AppError;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;
