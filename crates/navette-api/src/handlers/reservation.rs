//! Reservation handlers
//!
//! Customers book through `POST /reservations`; the back-office manages
//! bookings under `/admin/reservations`.

use crate::dto::{
    ApiResponse, CreateReservationRequest, PaginationParams, ReservationQueryParams,
    UpdateStatusRequest,
};
use actix_web::{web, HttpResponse};
use navette_auth::AdminUser;
use navette_core::models::ReservationStatus;
use navette_core::AppError;
use navette_services::BookingService;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

/// Create a reservation
///
/// POST /api/v1/reservations
#[instrument(skip(booking, req))]
pub async fn create_reservation(
    booking: web::Data<Arc<BookingService>>,
    req: web::Json<CreateReservationRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate().map_err(|e| {
        warn!("Reservation validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let created = booking.create(req.into_inner().into()).await?;

    Ok(HttpResponse::Created().json(ApiResponse::with_message(
        created,
        "Votre demande de réservation a bien été enregistrée",
    )))
}

/// List reservations
///
/// GET /api/v1/admin/reservations?status=pending&page=1
#[instrument(skip(_admin, booking))]
pub async fn list_reservations(
    _admin: AdminUser,
    booking: web::Data<Arc<BookingService>>,
    query: web::Query<ReservationQueryParams>,
) -> Result<HttpResponse, AppError> {
    query
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let status = match query.status.as_deref() {
        None | Some("") => None,
        Some(raw) => Some(
            ReservationStatus::from_str(raw)
                .ok_or_else(|| AppError::Validation(format!("Unknown status: {}", raw)))?,
        ),
    };

    let pagination = PaginationParams {
        page: query.page,
        per_page: query.per_page,
    }
    .to_pagination();

    let page = booking.list(status, &pagination).await?;
    Ok(HttpResponse::Ok().json(page))
}

/// GET /api/v1/admin/reservations/{id}
#[instrument(skip(_admin, booking))]
pub async fn get_reservation(
    _admin: AdminUser,
    booking: web::Data<Arc<BookingService>>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let reservation = booking.get(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(reservation)))
}

/// Change reservation status
///
/// PUT /api/v1/admin/reservations/{id}/status
#[instrument(skip(admin, booking, req))]
pub async fn update_status(
    admin: AdminUser,
    booking: web::Data<Arc<BookingService>>,
    path: web::Path<Uuid>,
    req: web::Json<UpdateStatusRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let updated = booking.update_status(id, req.status).await?;

    info!(%id, status = %updated.status, admin = %admin.username, "Reservation status changed");
    Ok(HttpResponse::Ok().json(ApiResponse::success(updated)))
}

/// DELETE /api/v1/admin/reservations/{id}
#[instrument(skip(_admin, booking))]
pub async fn delete_reservation(
    _admin: AdminUser,
    booking: web::Data<Arc<BookingService>>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    booking.delete(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/reservations", web::post().to(create_reservation))
        .service(
            web::scope("/admin/reservations")
                .route("", web::get().to(list_reservations))
                .route("/{id}", web::get().to(get_reservation))
                .route("/{id}", web::delete().to(delete_reservation))
                .route("/{id}/status", web::put().to(update_status)),
        );
}
