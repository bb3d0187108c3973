//! Repository implementations
//!
//! This module contains concrete implementations of all repository traits
//! defined in navette-core, using sqlx for PostgreSQL access.

pub mod flat_rate_repo;
pub mod kilometric_rule_repo;
pub mod reservation_repo;
pub mod tariff_store;
pub mod user_repo;
pub mod vehicle_repo;

pub use flat_rate_repo::PgFlatRateRepository;
pub use kilometric_rule_repo::PgKilometricRuleRepository;
pub use reservation_repo::PgReservationRepository;
pub use tariff_store::PgTariffStore;
pub use user_repo::PgUserRepository;
pub use vehicle_repo::PgVehicleRepository;
