//! API layer for Navette
//!
//! HTTP handlers for fare estimates, the vehicle catalogue, bookings and the
//! tariff back-office.
//!
//! Application data expected by the handlers:
//! - `web::Data<PgPool>`
//! - `web::Data<Arc<JwtService>>` and `web::Data<Arc<PasswordService>>`
//! - `web::Data<Arc<FareEstimator>>`
//! - `web::Data<Arc<BookingService>>`

#![forbid(unsafe_code)]

pub mod dto;
pub mod handlers;

use actix_web::web;

pub use dto::{ApiResponse, PaginationParams};
pub use handlers::{
    configure_auth, configure_estimate, configure_reservations, configure_tariffs,
    configure_vehicles,
};

/// Register every route: the estimate endpoints at the root, the rest under `/api/v1`
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.configure(configure_estimate).service(
        web::scope("/api/v1")
            .configure(configure_auth)
            .configure(configure_vehicles)
            .configure(configure_reservations)
            .configure(configure_tariffs),
    );
}
