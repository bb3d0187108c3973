//! Tariff administration handlers
//!
//! Flat rates under `/admin/flat-rates`, kilometric rules under
//! `/admin/kilometric-rules`. Conflict and exclusivity rules live in
//! [`TariffAdminService`].

use crate::dto::{ApiResponse, FlatRateRequest, KilometricRuleRequest, PaginationParams};
use actix_web::{web, HttpResponse};
use navette_auth::AdminUser;
use navette_core::AppError;
use navette_db::{PgFlatRateRepository, PgKilometricRuleRepository};
use navette_services::TariffAdminService;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use validator::Validate;

fn service(pool: &web::Data<PgPool>) -> TariffAdminService {
    let pool = pool.get_ref().clone();
    TariffAdminService::new(
        Arc::new(PgFlatRateRepository::new(pool.clone())),
        Arc::new(PgKilometricRuleRepository::new(pool)),
    )
}

fn validate<T: Validate>(req: &T, what: &str) -> Result<(), AppError> {
    req.validate().map_err(|e| {
        warn!("{} validation failed: {}", what, e);
        AppError::Validation(e.to_string())
    })
}

// ==================== Flat rates ====================

/// GET /api/v1/admin/flat-rates
#[instrument(skip(_admin, pool))]
pub async fn list_flat_rates(
    _admin: AdminUser,
    pool: web::Data<PgPool>,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse, AppError> {
    validate(&*query, "Pagination")?;
    let page = service(&pool).list_flat_rates(&query.to_pagination()).await?;
    Ok(HttpResponse::Ok().json(page))
}

/// GET /api/v1/admin/flat-rates/{id}
#[instrument(skip(_admin, pool))]
pub async fn get_flat_rate(
    _admin: AdminUser,
    pool: web::Data<PgPool>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let rate = service(&pool).get_flat_rate(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(rate)))
}

/// POST /api/v1/admin/flat-rates
#[instrument(skip(admin, pool, req))]
pub async fn create_flat_rate(
    admin: AdminUser,
    pool: web::Data<PgPool>,
    req: web::Json<FlatRateRequest>,
) -> Result<HttpResponse, AppError> {
    validate(&*req, "Flat rate")?;

    let created = service(&pool)
        .create_flat_rate(req.into_inner().into_flat_rate(0))
        .await?;

    info!(id = created.id, admin = %admin.username, "Flat rate created");
    Ok(HttpResponse::Created().json(ApiResponse::with_message(created, "Flat rate created")))
}

/// PUT /api/v1/admin/flat-rates/{id}
#[instrument(skip(_admin, pool, req))]
pub async fn update_flat_rate(
    _admin: AdminUser,
    pool: web::Data<PgPool>,
    path: web::Path<i32>,
    req: web::Json<FlatRateRequest>,
) -> Result<HttpResponse, AppError> {
    validate(&*req, "Flat rate")?;

    let updated = service(&pool)
        .update_flat_rate(req.into_inner().into_flat_rate(path.into_inner()))
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::with_message(updated, "Flat rate updated")))
}

/// POST /api/v1/admin/flat-rates/{id}/toggle
#[instrument(skip(_admin, pool))]
pub async fn toggle_flat_rate(
    _admin: AdminUser,
    pool: web::Data<PgPool>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let toggled = service(&pool).toggle_flat_rate(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(toggled)))
}

/// DELETE /api/v1/admin/flat-rates/{id}
#[instrument(skip(_admin, pool))]
pub async fn delete_flat_rate(
    _admin: AdminUser,
    pool: web::Data<PgPool>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    service(&pool).delete_flat_rate(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

// ==================== Kilometric rules ====================

/// GET /api/v1/admin/kilometric-rules
#[instrument(skip(_admin, pool))]
pub async fn list_rules(
    _admin: AdminUser,
    pool: web::Data<PgPool>,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse, AppError> {
    validate(&*query, "Pagination")?;
    let page = service(&pool).list_rules(&query.to_pagination()).await?;
    Ok(HttpResponse::Ok().json(page))
}

/// GET /api/v1/admin/kilometric-rules/{id}
#[instrument(skip(_admin, pool))]
pub async fn get_rule(
    _admin: AdminUser,
    pool: web::Data<PgPool>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let rule = service(&pool).get_rule(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(rule)))
}

/// POST /api/v1/admin/kilometric-rules
#[instrument(skip(admin, pool, req))]
pub async fn create_rule(
    admin: AdminUser,
    pool: web::Data<PgPool>,
    req: web::Json<KilometricRuleRequest>,
) -> Result<HttpResponse, AppError> {
    validate(&*req, "Kilometric rule")?;

    let created = service(&pool).create_rule(req.into_inner().into_rule(0)).await?;

    info!(id = created.id, admin = %admin.username, "Kilometric rule created");
    Ok(HttpResponse::Created().json(ApiResponse::with_message(created, "Kilometric rule created")))
}

/// PUT /api/v1/admin/kilometric-rules/{id}
#[instrument(skip(_admin, pool, req))]
pub async fn update_rule(
    _admin: AdminUser,
    pool: web::Data<PgPool>,
    path: web::Path<i32>,
    req: web::Json<KilometricRuleRequest>,
) -> Result<HttpResponse, AppError> {
    validate(&*req, "Kilometric rule")?;

    let updated = service(&pool)
        .update_rule(req.into_inner().into_rule(path.into_inner()))
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::with_message(updated, "Kilometric rule updated")))
}

/// Activate exclusively, or deactivate
///
/// POST /api/v1/admin/kilometric-rules/{id}/toggle
#[instrument(skip(_admin, pool))]
pub async fn toggle_rule(
    _admin: AdminUser,
    pool: web::Data<PgPool>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let toggled = service(&pool).toggle_rule(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(toggled)))
}

/// DELETE /api/v1/admin/kilometric-rules/{id}
#[instrument(skip(_admin, pool))]
pub async fn delete_rule(
    _admin: AdminUser,
    pool: web::Data<PgPool>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    service(&pool).delete_rule(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin/flat-rates")
            .route("", web::get().to(list_flat_rates))
            .route("", web::post().to(create_flat_rate))
            .route("/{id}", web::get().to(get_flat_rate))
            .route("/{id}", web::put().to(update_flat_rate))
            .route("/{id}", web::delete().to(delete_flat_rate))
            .route("/{id}/toggle", web::post().to(toggle_flat_rate)),
    )
    .service(
        web::scope("/admin/kilometric-rules")
            .route("", web::get().to(list_rules))
            .route("", web::post().to(create_rule))
            .route("/{id}", web::get().to(get_rule))
            .route("/{id}", web::put().to(update_rule))
            .route("/{id}", web::delete().to(delete_rule))
            .route("/{id}/toggle", web::post().to(toggle_rule)),
    );
}
