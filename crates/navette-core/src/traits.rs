//! Common traits for repositories and services
//!
//! Defines abstractions for database access and the external collaborators
//! (distance provider, mail delivery) used by the services.

use crate::error::AppError;
use crate::models::{
    DistanceQuote, FlatRate, KilometricRule, Reservation, ReservationStatus, User, Vehicle,
};
use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

/// Generic repository trait for CRUD operations
#[async_trait]
pub trait Repository<T, ID>: Send + Sync {
    /// Find entity by ID
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, AppError>;

    /// Find all entities with pagination
    async fn find_all(&self, limit: i64, offset: i64) -> Result<Vec<T>, AppError>;

    /// Count total entities
    async fn count(&self) -> Result<i64, AppError>;

    /// Create a new entity
    async fn create(&self, entity: &T) -> Result<T, AppError>;

    /// Update an existing entity
    async fn update(&self, entity: &T) -> Result<T, AppError>;

    /// Delete entity by ID
    async fn delete(&self, id: ID) -> Result<bool, AppError>;
}

/// Flat rate repository trait with specialized methods
#[async_trait]
pub trait FlatRateRepository: Repository<FlatRate, i32> {
    /// Active entries stored as (a, b) or (b, a), any direction flag
    async fn find_active_between(&self, a: &str, b: &str) -> Result<Vec<FlatRate>, AppError>;

    /// Set the active flag, returning the updated entry
    async fn set_active(&self, id: i32, active: bool) -> Result<Option<FlatRate>, AppError>;
}

/// Kilometric rule repository trait with specialized methods
#[async_trait]
pub trait KilometricRuleRepository: Repository<KilometricRule, i32> {
    /// Activate one rule and deactivate every other rule atomically
    async fn activate_exclusive(&self, id: i32) -> Result<Option<KilometricRule>, AppError>;

    /// Deactivate a single rule
    async fn deactivate(&self, id: i32) -> Result<Option<KilometricRule>, AppError>;
}

/// Vehicle repository trait with specialized methods
#[async_trait]
pub trait VehicleRepository: Repository<Vehicle, i32> {
    /// Vehicles shown in the public catalogue
    async fn list_available(&self, limit: i64, offset: i64)
        -> Result<(Vec<Vehicle>, i64), AppError>;

    /// Toggle catalogue visibility
    async fn set_available(&self, id: i32, available: bool) -> Result<Option<Vehicle>, AppError>;
}

/// Reservation repository trait with specialized methods
#[async_trait]
pub trait ReservationRepository: Repository<Reservation, Uuid> {
    /// List reservations, newest pickup first, optionally filtered by status
    async fn list_filtered(
        &self,
        status: Option<ReservationStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Reservation>, i64), AppError>;

    /// Update reservation status
    async fn update_status(
        &self,
        id: Uuid,
        status: ReservationStatus,
    ) -> Result<Option<Reservation>, AppError>;
}

/// User repository trait with specialized methods
#[async_trait]
pub trait UserRepository: Repository<User, i32> {
    /// Find user by username
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError>;

    /// Update last login timestamp
    async fn update_last_login(&self, id: i32) -> Result<(), AppError>;
}

/// Read access to pricing data for the fare estimator
#[async_trait]
pub trait TariffStore: Send + Sync {
    /// Active flat rate matching the request, direct direction preferred, newest first
    async fn find_flat_rate(
        &self,
        origin: &str,
        destination: &str,
    ) -> Result<Option<FlatRate>, AppError>;

    /// The active kilometric rule (most recently created wins)
    async fn find_active_rule(&self) -> Result<Option<KilometricRule>, AppError>;
}

/// Driving distance and duration between two free-text addresses
#[async_trait]
pub trait DistanceProvider: Send + Sync {
    async fn quote(&self, origin: &str, destination: &str) -> Result<DistanceQuote, AppError>;
}

/// Outgoing email
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Mail delivery backend
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &Email) -> Result<(), AppError>;
}

/// Pagination parameters
#[derive(Debug, Clone, Default)]
pub struct Pagination {
    pub page: i64,
    pub per_page: i64,
}

impl Pagination {
    pub fn new(page: i64, per_page: i64) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, 200),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.per_page)
    }

    pub fn limit(&self) -> i64 {
        self.per_page
    }
}

/// Paginated response wrapper
#[derive(Debug, Clone, Serialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, total: i64, pagination: &Pagination) -> Self {
        Self {
            data,
            pagination: PaginationMeta::new(total, pagination.page, pagination.per_page),
        }
    }
}

/// Pagination metadata
#[derive(Debug, Clone, Serialize)]
pub struct PaginationMeta {
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

impl PaginationMeta {
    pub fn new(total: i64, page: i64, per_page: i64) -> Self {
        let total_pages = if per_page > 0 {
            (total + per_page - 1) / per_page
        } else {
            0
        };

        Self {
            total,
            page,
            per_page,
            total_pages,
        }
    }
}
