//! Navette backend server
//!
//! Vehicle-transfer booking API: fare estimates, vehicle catalogue, customer
//! bookings and the tariff back-office.

use actix_cors::Cors;
use actix_web::{http::header, middleware, web, App, HttpResponse, HttpServer};
use navette_api::configure_routes;
use navette_auth::{JwtService, PasswordService};
use navette_core::config::AuthConfig;
use navette_core::models::User;
use navette_core::traits::{Repository, UserRepository};
use navette_core::{AppConfig, AppResult};
use navette_db::{
    create_pool, run_migrations, PgPool, PgReservationRepository, PgTariffStore,
    PgUserRepository, PgVehicleRepository,
};
use navette_services::{
    mailer_from_config, BookingService, FareEstimator, GoogleDistanceMatrix, NotificationQueue,
};
use std::env;
use std::fmt::Display;
use std::io;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Health check endpoint
async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "navette",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Initialize tracing/logging
fn init_tracing() {
    let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "navette={lvl},navette_api={lvl},navette_services={lvl},navette_db={lvl},navette_auth={lvl},actix_web=info,sqlx=warn",
            lvl = log_level
        ))
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true),
        )
        .init();
}

fn startup_error(context: &str, err: impl Display) -> io::Error {
    error!("{}: {}", context, err);
    io::Error::new(io::ErrorKind::Other, format!("{}: {}", context, err))
}

/// Create the configured administrator if it does not exist yet
async fn bootstrap_admin(
    pool: &PgPool,
    auth: &AuthConfig,
    password_service: &PasswordService,
) -> AppResult<()> {
    let (Some(username), Some(password)) = (&auth.admin_username, &auth.admin_password) else {
        return Ok(());
    };
    if username.trim().is_empty() || password.is_empty() {
        return Ok(());
    }

    let repo = PgUserRepository::new(pool.clone());
    if repo.find_by_username(username).await?.is_some() {
        return Ok(());
    }

    let admin = User {
        username: username.trim().to_string(),
        password_hash: password_service.hash_password(password)?,
        is_admin: true,
        ..Default::default()
    };
    repo.create(&admin).await?;

    info!(username = %admin.username, "Administrator account created");
    Ok(())
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    init_tracing();

    info!("Starting Navette backend v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load().map_err(|e| startup_error("Invalid configuration", e))?;

    // Auth services
    if config.auth.uses_default_secret() {
        warn!("SECRET_KEY not set, using the development signing key");
    }
    let jwt_expiration = config.auth.jwt_expiration_minutes * 60;
    let jwt_service = Arc::new(JwtService::new(&config.auth.jwt_secret, jwt_expiration));
    let password_service = Arc::new(PasswordService::new());

    info!(
        "JWT service configured with {} second token expiration",
        jwt_expiration
    );

    info!("Connecting to database...");
    let pool = create_pool(&config.database.url, Some(config.database.max_connections))
        .await
        .map_err(|e| startup_error("Failed to create database pool", e))?;

    if config.database.run_migrations {
        run_migrations(&pool)
            .await
            .map_err(|e| startup_error("Failed to run migrations", e))?;
    }

    bootstrap_admin(&pool, &config.auth, &password_service)
        .await
        .map_err(|e| startup_error("Failed to create administrator", e))?;

    // Fare engine
    let timezone = config
        .pricing
        .tz()
        .map_err(|e| startup_error("Invalid pricing timezone", e))?;
    let provider = GoogleDistanceMatrix::from_config(&config.maps)
        .map_err(|e| startup_error("Failed to create distance provider", e))?;
    let estimator = Arc::new(FareEstimator::new(
        Arc::new(PgTariffStore::new(pool.clone())),
        Arc::new(provider),
        timezone,
    ));
    info!(timezone = %timezone, "Fare estimator ready");

    // Booking workflow and mail delivery
    let mailer = mailer_from_config(&config.mail)
        .map_err(|e| startup_error("Failed to create mailer", e))?;
    let notifications = NotificationQueue::start(mailer, config.mail.queue_capacity);
    if config.mail.admin_email.is_none() {
        warn!("ADMIN_EMAIL not set, booking alerts will not be sent");
    }
    let booking = Arc::new(BookingService::new(
        Arc::new(PgReservationRepository::new(pool.clone())),
        Arc::new(PgVehicleRepository::new(pool.clone())),
        estimator.clone(),
        notifications,
        config.mail.admin_email.clone(),
    ));

    let bind_addr = config.server_addr();
    let workers = config.server.workers;
    let cors_origins = config.server.cors_origins.clone();
    info!(
        "Starting HTTP server on {} with {} workers",
        bind_addr, workers
    );

    HttpServer::new(move || {
        let cors_origins_inner = cors_origins.clone();
        let cors = Cors::default()
            .allowed_origin_fn(move |origin, _req_head| {
                let origins: Vec<&str> = cors_origins_inner.split(',').collect();
                if let Ok(origin_str) = origin.to_str() {
                    origins.iter().any(|o| o.trim() == origin_str)
                } else {
                    false
                }
            })
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                header::AUTHORIZATION,
                header::ACCEPT,
                header::CONTENT_TYPE,
                header::COOKIE,
            ])
            .supports_credentials()
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(jwt_service.clone()))
            .app_data(web::Data::new(password_service.clone()))
            .app_data(web::Data::new(estimator.clone()))
            .app_data(web::Data::new(booking.clone()))
            .app_data(web::JsonConfig::default().error_handler(|err, _req| {
                let error_message = err.to_string();
                actix_web::error::InternalError::from_response(
                    err,
                    HttpResponse::BadRequest().json(serde_json::json!({
                        "error": "invalid_body",
                        "message": error_message
                    })),
                )
                .into()
            }))
            .app_data(web::QueryConfig::default().error_handler(|err, _req| {
                let error_message = err.to_string();
                actix_web::error::InternalError::from_response(
                    err,
                    HttpResponse::BadRequest().json(serde_json::json!({
                        "error": "invalid_query",
                        "message": error_message
                    })),
                )
                .into()
            }))
            // Middleware
            .wrap(cors)
            .wrap(middleware::Logger::new("%a \"%r\" %s %b %Dms"))
            .wrap(TracingLogger::default())
            .wrap(middleware::Compress::default())
            .wrap(middleware::NormalizePath::trim())
            .route("/health", web::get().to(health_check))
            .configure(configure_routes)
    })
    .workers(workers)
    .bind(&bind_addr)?
    .run()
    .await
}
