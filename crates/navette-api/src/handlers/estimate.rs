//! Fare estimate handlers
//!
//! Two public entry points over the same estimator:
//! - `POST /estimation`: form submission from the booking page, always 200,
//!   failures are reported through `warning`;
//! - `POST /api/estimate`: JSON, failures as `{error}` with 400 or 500.

use crate::dto::{EstimateError, EstimateRequest, EstimateResponse, EstimationView};
use actix_web::{web, HttpResponse};
use navette_auth::AuthContext;
use navette_core::AppError;
use navette_services::FareEstimator;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

fn log_failure(err: &AppError) {
    match err {
        AppError::InvalidInput(_) => info!(error = %err, "Estimate rejected"),
        AppError::NoActiveTariff | AppError::DistanceLookupFailed(_) => {
            warn!(error = %err, "Estimate failed")
        }
        _ => error!(error = %err, "Estimate failed"),
    }
}

/// Estimate page submission
///
/// POST /estimation
#[instrument(skip(auth, estimator, form))]
pub async fn estimation_form(
    auth: AuthContext,
    estimator: web::Data<Arc<FareEstimator>>,
    form: web::Form<EstimateRequest>,
) -> HttpResponse {
    let request = form.into_inner();

    let view = match estimator.estimate_now(&request.depart, &request.arrivee).await {
        Ok(quote) => EstimationView::from_quote(request, &quote),
        Err(e) => {
            log_failure(&e);
            EstimationView::warning(request, e.user_message())
        }
    };

    HttpResponse::Ok().json(view.for_admin(auth.is_admin))
}

/// JSON estimate
///
/// POST /api/estimate
#[instrument(skip(estimator, body))]
pub async fn estimate_json(
    estimator: web::Data<Arc<FareEstimator>>,
    body: web::Json<EstimateRequest>,
) -> HttpResponse {
    match estimator.estimate_now(&body.depart, &body.arrivee).await {
        Ok(quote) => HttpResponse::Ok().json(EstimateResponse::from(&quote)),
        Err(e) => {
            log_failure(&e);
            HttpResponse::build(e.status_code()).json(EstimateError {
                error: e.user_message(),
            })
        }
    }
}

/// Configure estimate routes (outside `/api/v1`)
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/estimation", web::post().to(estimation_form))
        .route("/api/estimate", web::post().to(estimate_json));
}
