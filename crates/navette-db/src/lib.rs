//! Navette Database Layer
//!
//! This crate provides PostgreSQL database access and repository implementations
//! for the Navette backend. It includes:
//!
//! - Connection pool management and embedded migrations
//! - Repository implementations for all domain entities
//! - The tariff store read by the fare estimator
//! - Transactional exclusive activation of kilometric rules

pub mod pool;
pub mod repositories;

pub use pool::{create_pool, run_migrations};
pub use repositories::*;

// Re-export commonly used types
pub use navette_core::{AppError, AppResult};
pub use sqlx::{PgPool, Postgres, Transaction};
