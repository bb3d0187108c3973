//! Data Transfer Objects (DTOs) for API requests and responses

pub mod auth;
pub mod common;
pub mod estimate;
pub mod reservation;
pub mod tariff;
pub mod vehicle;

pub use auth::*;
pub use common::*;
pub use estimate::*;
pub use reservation::*;
pub use tariff::*;
pub use vehicle::*;
