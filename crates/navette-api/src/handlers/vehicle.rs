//! Vehicle handlers
//!
//! Public catalogue plus admin management under `/admin/vehicles`.

use crate::dto::{ApiResponse, PaginationParams, VehicleRequest};
use actix_web::{web, HttpResponse};
use navette_auth::AdminUser;
use navette_core::traits::{PaginatedResponse, Repository, VehicleRepository};
use navette_core::AppError;
use navette_db::PgVehicleRepository;
use sqlx::PgPool;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

fn repo(pool: &web::Data<PgPool>) -> PgVehicleRepository {
    PgVehicleRepository::new(pool.get_ref().clone())
}

fn validate_params(query: &PaginationParams) -> Result<(), AppError> {
    query
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))
}

/// List available vehicles
///
/// GET /api/v1/vehicles
#[instrument(skip(pool))]
pub async fn list_available(
    pool: web::Data<PgPool>,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse, AppError> {
    validate_params(&query)?;
    let pagination = query.to_pagination();

    let (vehicles, total) = repo(&pool)
        .list_available(pagination.limit(), pagination.offset())
        .await?;

    Ok(HttpResponse::Ok().json(PaginatedResponse::new(vehicles, total, &pagination)))
}

/// Get an available vehicle
///
/// GET /api/v1/vehicles/{id}
#[instrument(skip(pool))]
pub async fn get_available(
    pool: web::Data<PgPool>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();

    let vehicle = repo(&pool)
        .find_by_id(id)
        .await?
        .filter(|v| v.available)
        .ok_or_else(|| AppError::VehicleNotFound(id.to_string()))?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(vehicle)))
}

/// List all vehicles
///
/// GET /api/v1/admin/vehicles
#[instrument(skip(_admin, pool))]
pub async fn list_vehicles(
    _admin: AdminUser,
    pool: web::Data<PgPool>,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse, AppError> {
    validate_params(&query)?;
    let pagination = query.to_pagination();
    let repo = repo(&pool);

    let vehicles = repo.find_all(pagination.limit(), pagination.offset()).await?;
    let total = repo.count().await?;

    Ok(HttpResponse::Ok().json(PaginatedResponse::new(vehicles, total, &pagination)))
}

/// GET /api/v1/admin/vehicles/{id}
#[instrument(skip(_admin, pool))]
pub async fn get_vehicle(
    _admin: AdminUser,
    pool: web::Data<PgPool>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let vehicle = repo(&pool)
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::VehicleNotFound(id.to_string()))?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(vehicle)))
}

/// Create a vehicle
///
/// POST /api/v1/admin/vehicles
#[instrument(skip(admin, pool, req))]
pub async fn create_vehicle(
    admin: AdminUser,
    pool: web::Data<PgPool>,
    req: web::Json<VehicleRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate().map_err(|e| {
        warn!("Vehicle validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let created = repo(&pool).create(&req.into_inner().into_vehicle(0)).await?;
    info!(id = created.id, admin = %admin.username, "Vehicle created");

    Ok(HttpResponse::Created().json(ApiResponse::with_message(created, "Vehicle created")))
}

/// Update a vehicle
///
/// PUT /api/v1/admin/vehicles/{id}
#[instrument(skip(_admin, pool, req))]
pub async fn update_vehicle(
    _admin: AdminUser,
    pool: web::Data<PgPool>,
    path: web::Path<i32>,
    req: web::Json<VehicleRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    req.validate().map_err(|e| {
        warn!("Vehicle validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    debug!(id, "Updating vehicle");
    let updated = repo(&pool).update(&req.into_inner().into_vehicle(id)).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::with_message(updated, "Vehicle updated")))
}

/// Flip catalogue visibility
///
/// POST /api/v1/admin/vehicles/{id}/toggle
#[instrument(skip(_admin, pool))]
pub async fn toggle_vehicle(
    _admin: AdminUser,
    pool: web::Data<PgPool>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let repo = repo(&pool);

    let current = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::VehicleNotFound(id.to_string()))?;

    let toggled = repo
        .set_available(id, !current.available)
        .await?
        .ok_or_else(|| AppError::VehicleNotFound(id.to_string()))?;

    info!(id, available = toggled.available, "Vehicle availability toggled");
    Ok(HttpResponse::Ok().json(ApiResponse::success(toggled)))
}

/// DELETE /api/v1/admin/vehicles/{id}
#[instrument(skip(_admin, pool))]
pub async fn delete_vehicle(
    _admin: AdminUser,
    pool: web::Data<PgPool>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();

    if !repo(&pool).delete(id).await? {
        return Err(AppError::VehicleNotFound(id.to_string()));
    }

    info!(id, "Vehicle deleted");
    Ok(HttpResponse::NoContent().finish())
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/vehicles")
            .route("", web::get().to(list_available))
            .route("/{id}", web::get().to(get_available)),
    )
    .service(
        web::scope("/admin/vehicles")
            .route("", web::get().to(list_vehicles))
            .route("", web::post().to(create_vehicle))
            .route("/{id}", web::get().to(get_vehicle))
            .route("/{id}", web::put().to(update_vehicle))
            .route("/{id}", web::delete().to(delete_vehicle))
            .route("/{id}/toggle", web::post().to(toggle_vehicle)),
    );
}
