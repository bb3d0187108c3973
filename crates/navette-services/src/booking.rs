//! Booking workflow
//!
//! Customer reservations are validated, priced best-effort, persisted, then
//! announced by email through the [`NotificationQueue`] once committed.

use crate::fare::{format_fcfa, FareEstimator};
use crate::notifier::NotificationQueue;
use chrono::{DateTime, Utc};
use navette_core::{
    models::{Reservation, ReservationStatus},
    traits::{
        Email, PaginatedResponse, Pagination, Repository, ReservationRepository, VehicleRepository,
    },
    AppError, AppResult,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Customer booking request
#[derive(Debug, Clone)]
pub struct NewReservation {
    pub vehicle_id: Option<i32>,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub origin: String,
    pub destination: String,
    pub pickup_at: DateTime<Utc>,
    pub passengers: i32,
    pub notes: Option<String>,
}

impl NewReservation {
    /// Field checks that need no collaborator
    pub fn validate(&self, now: DateTime<Utc>) -> AppResult<()> {
        let required = [
            ("customer_name", &self.customer_name),
            ("customer_email", &self.customer_email),
            ("customer_phone", &self.customer_phone),
            ("origin", &self.origin),
            ("destination", &self.destination),
        ];
        if let Some((field, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(AppError::Validation(format!("{} is required", field)));
        }

        if !self.customer_email.contains('@') {
            return Err(AppError::Validation("customer_email is invalid".to_string()));
        }
        if self.passengers < 1 {
            return Err(AppError::Validation(
                "passengers must be at least 1".to_string(),
            ));
        }
        if self.pickup_at <= now {
            return Err(AppError::Validation(
                "pickup_at must be in the future".to_string(),
            ));
        }
        Ok(())
    }
}

/// Reservation intake and back-office operations
pub struct BookingService {
    reservations: Arc<dyn ReservationRepository>,
    vehicles: Arc<dyn VehicleRepository>,
    estimator: Arc<FareEstimator>,
    notifications: NotificationQueue,
    admin_email: Option<String>,
}

impl BookingService {
    pub fn new(
        reservations: Arc<dyn ReservationRepository>,
        vehicles: Arc<dyn VehicleRepository>,
        estimator: Arc<FareEstimator>,
        notifications: NotificationQueue,
        admin_email: Option<String>,
    ) -> Self {
        Self {
            reservations,
            vehicles,
            estimator,
            notifications,
            admin_email,
        }
    }

    /// Create a reservation from a customer request
    #[instrument(skip(self, request), fields(origin = %request.origin, destination = %request.destination))]
    pub async fn create(&self, request: NewReservation) -> AppResult<Reservation> {
        request.validate(Utc::now())?;

        if let Some(vehicle_id) = request.vehicle_id {
            let vehicle = self
                .vehicles
                .find_by_id(vehicle_id)
                .await?
                .ok_or_else(|| AppError::VehicleNotFound(vehicle_id.to_string()))?;

            if !vehicle.can_carry(request.passengers) {
                return Err(AppError::VehicleUnavailable(format!(
                    "{} cannot take {} passenger(s)",
                    vehicle.name, request.passengers
                )));
            }
        }

        // Priced at the pickup time so surcharges match the actual trip
        let pickup_local = request.pickup_at.with_timezone(&self.estimator.timezone());
        let estimated_price = match self
            .estimator
            .estimate(&request.origin, &request.destination, &pickup_local)
            .await
        {
            Ok(quote) => Some(quote.price),
            Err(e) => {
                warn!(error = %e, "Fare estimate unavailable for reservation");
                None
            }
        };

        let reservation = Reservation {
            id: Uuid::new_v4(),
            vehicle_id: request.vehicle_id,
            customer_name: request.customer_name.trim().to_string(),
            customer_email: request.customer_email.trim().to_string(),
            customer_phone: request.customer_phone.trim().to_string(),
            origin: request.origin,
            destination: request.destination,
            pickup_at: request.pickup_at,
            passengers: request.passengers,
            estimated_price,
            notes: request.notes.filter(|n| !n.trim().is_empty()),
            status: ReservationStatus::Pending,
            ..Default::default()
        };

        let created = self.reservations.create(&reservation).await?;
        info!(id = %created.id, "Reservation created");

        self.notify_created(&created);
        Ok(created)
    }

    fn notify_created(&self, reservation: &Reservation) {
        let price = reservation
            .estimated_price
            .map(format_fcfa)
            .unwrap_or_else(|| "à confirmer".to_string());
        let pickup = reservation.pickup_at.format("%d/%m/%Y %H:%M UTC");

        if let Some(admin) = &self.admin_email {
            self.notifications.submit(Email {
                to: admin.clone(),
                subject: format!("Nouvelle réservation - {}", reservation.customer_name),
                body: format!(
                    "Client : {}\nEmail : {}\nTéléphone : {}\nTrajet : {} -> {}\nPrise en charge : {}\nPassagers : {}\nTarif estimé : {}\nNotes : {}\nRéférence : {}",
                    reservation.customer_name,
                    reservation.customer_email,
                    reservation.customer_phone,
                    reservation.origin,
                    reservation.destination,
                    pickup,
                    reservation.passengers,
                    price,
                    reservation.notes.as_deref().unwrap_or("-"),
                    reservation.id,
                ),
            });
        }

        self.notifications.submit(Email {
            to: reservation.customer_email.clone(),
            subject: "Confirmation de votre demande de réservation".to_string(),
            body: format!(
                "Bonjour {},\n\nNous avons bien reçu votre demande de transfert {} -> {} le {}.\nTarif estimé : {}\n\nNous revenons vers vous rapidement pour la confirmer.\nRéférence : {}",
                reservation.customer_name,
                reservation.origin,
                reservation.destination,
                pickup,
                price,
                reservation.id,
            ),
        });
    }

    pub async fn list(
        &self,
        status: Option<ReservationStatus>,
        pagination: &Pagination,
    ) -> AppResult<PaginatedResponse<Reservation>> {
        let (data, total) = self
            .reservations
            .list_filtered(status, pagination.limit(), pagination.offset())
            .await?;
        Ok(PaginatedResponse::new(data, total, pagination))
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Reservation> {
        self.reservations
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::ReservationNotFound(id.to_string()))
    }

    /// Move a reservation along its lifecycle
    #[instrument(skip(self))]
    pub async fn update_status(&self, id: Uuid, status: ReservationStatus) -> AppResult<Reservation> {
        let current = self.get(id).await?;
        if current.status == status {
            return Ok(current);
        }
        if !current.status.can_transition_to(status) {
            return Err(AppError::Conflict(format!(
                "Cannot move reservation from {} to {}",
                current.status, status
            )));
        }

        let updated = self
            .reservations
            .update_status(id, status)
            .await?
            .ok_or_else(|| AppError::ReservationNotFound(id.to_string()))?;

        info!(status = %updated.status, "Reservation status updated");
        Ok(updated)
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        if self.reservations.delete(id).await? {
            info!(%id, "Reservation deleted");
            Ok(())
        } else {
            Err(AppError::ReservationNotFound(id.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Duration;
    use navette_core::{
        models::{DistanceQuote, FlatRate, KilometricRule, Vehicle},
        traits::{DistanceProvider, Mailer, TariffStore},
    };
    use rust_decimal_macros::dec;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockReservations {
        rows: Mutex<Vec<Reservation>>,
    }

    #[async_trait]
    impl Repository<Reservation, Uuid> for MockReservations {
        async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Reservation>> {
            Ok(self.rows.lock().unwrap().iter().find(|r| r.id == id).cloned())
        }

        async fn find_all(&self, _limit: i64, _offset: i64) -> AppResult<Vec<Reservation>> {
            Ok(self.rows.lock().unwrap().clone())
        }

        async fn count(&self) -> AppResult<i64> {
            Ok(self.rows.lock().unwrap().len() as i64)
        }

        async fn create(&self, entity: &Reservation) -> AppResult<Reservation> {
            self.rows.lock().unwrap().push(entity.clone());
            Ok(entity.clone())
        }

        async fn update(&self, entity: &Reservation) -> AppResult<Reservation> {
            Ok(entity.clone())
        }

        async fn delete(&self, id: Uuid) -> AppResult<bool> {
            let mut rows = self.rows.lock().unwrap();
            let before = rows.len();
            rows.retain(|r| r.id != id);
            Ok(rows.len() != before)
        }
    }

    #[async_trait]
    impl ReservationRepository for MockReservations {
        async fn list_filtered(
            &self,
            status: Option<ReservationStatus>,
            _limit: i64,
            _offset: i64,
        ) -> AppResult<(Vec<Reservation>, i64)> {
            let rows: Vec<_> = self
                .rows
                .lock()
                .unwrap()
                .iter()
                .filter(|r| status.map_or(true, |s| r.status == s))
                .cloned()
                .collect();
            let total = rows.len() as i64;
            Ok((rows, total))
        }

        async fn update_status(
            &self,
            id: Uuid,
            status: ReservationStatus,
        ) -> AppResult<Option<Reservation>> {
            let mut rows = self.rows.lock().unwrap();
            Ok(rows.iter_mut().find(|r| r.id == id).map(|r| {
                r.status = status;
                r.clone()
            }))
        }
    }

    struct MockVehicles {
        rows: Vec<Vehicle>,
    }

    #[async_trait]
    impl Repository<Vehicle, i32> for MockVehicles {
        async fn find_by_id(&self, id: i32) -> AppResult<Option<Vehicle>> {
            Ok(self.rows.iter().find(|v| v.id == id).cloned())
        }

        async fn find_all(&self, _limit: i64, _offset: i64) -> AppResult<Vec<Vehicle>> {
            Ok(self.rows.clone())
        }

        async fn count(&self) -> AppResult<i64> {
            Ok(self.rows.len() as i64)
        }

        async fn create(&self, entity: &Vehicle) -> AppResult<Vehicle> {
            Ok(entity.clone())
        }

        async fn update(&self, entity: &Vehicle) -> AppResult<Vehicle> {
            Ok(entity.clone())
        }

        async fn delete(&self, _id: i32) -> AppResult<bool> {
            Ok(false)
        }
    }

    #[async_trait]
    impl VehicleRepository for MockVehicles {
        async fn list_available(&self, _limit: i64, _offset: i64) -> AppResult<(Vec<Vehicle>, i64)> {
            let rows: Vec<_> = self.rows.iter().filter(|v| v.available).cloned().collect();
            let total = rows.len() as i64;
            Ok((rows, total))
        }

        async fn set_available(&self, _id: i32, _available: bool) -> AppResult<Option<Vehicle>> {
            Ok(None)
        }
    }

    struct FixedTariffs {
        rule: Option<KilometricRule>,
    }

    #[async_trait]
    impl TariffStore for FixedTariffs {
        async fn find_flat_rate(&self, _o: &str, _d: &str) -> AppResult<Option<FlatRate>> {
            Ok(None)
        }

        async fn find_active_rule(&self) -> AppResult<Option<KilometricRule>> {
            Ok(self.rule.clone())
        }
    }

    struct FixedDistance;

    #[async_trait]
    impl DistanceProvider for FixedDistance {
        async fn quote(&self, _o: &str, _d: &str) -> AppResult<DistanceQuote> {
            Ok(DistanceQuote::from_meters_seconds(10_000, 1200))
        }
    }

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<Email>>,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, email: &Email) -> AppResult<()> {
            self.sent.lock().unwrap().push(email.clone());
            Ok(())
        }
    }

    struct Fixture {
        service: BookingService,
        reservations: Arc<MockReservations>,
        mailer: Arc<RecordingMailer>,
        queue: NotificationQueue,
    }

    fn fixture(rule: Option<KilometricRule>) -> Fixture {
        let reservations = Arc::new(MockReservations::default());
        let vehicles = Arc::new(MockVehicles {
            rows: vec![
                Vehicle {
                    id: 1,
                    name: "Berline".to_string(),
                    seats: 4,
                    ..Default::default()
                },
                Vehicle {
                    id: 2,
                    name: "Van".to_string(),
                    seats: 8,
                    available: false,
                    ..Default::default()
                },
            ],
        });
        let estimator = Arc::new(FareEstimator::new(
            Arc::new(FixedTariffs { rule }),
            Arc::new(FixedDistance),
            chrono_tz::Africa::Abidjan,
        ));
        let mailer = Arc::new(RecordingMailer::default());
        let queue = NotificationQueue::start(mailer.clone(), 10);

        Fixture {
            service: BookingService::new(
                reservations.clone(),
                vehicles,
                estimator,
                queue.clone(),
                Some("admin@navette.ci".to_string()),
            ),
            reservations,
            mailer,
            queue,
        }
    }

    fn standard_rule() -> KilometricRule {
        KilometricRule {
            id: 1,
            name: "Standard".to_string(),
            base_fare: dec!(1000),
            price_per_km: dec!(500),
            minimum_fare: dec!(2000),
            active: true,
            ..Default::default()
        }
    }

    fn request() -> NewReservation {
        NewReservation {
            vehicle_id: Some(1),
            customer_name: "Awa Koné".to_string(),
            customer_email: "awa@example.com".to_string(),
            customer_phone: "+225 07 00 00 00".to_string(),
            origin: "Aéroport FHB".to_string(),
            destination: "Plateau".to_string(),
            pickup_at: Utc::now() + Duration::days(2),
            passengers: 2,
            notes: Some("  ".to_string()),
        }
    }

    async fn wait_for_sent(queue: &NotificationQueue, expected: u64) {
        for _ in 0..100 {
            if queue.stats().sent() >= expected {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        panic!("expected {} emails", expected);
    }

    #[tokio::test]
    async fn test_create_prices_and_notifies() {
        let f = fixture(Some(standard_rule()));

        let created = f.service.create(request()).await.unwrap();
        assert_eq!(created.status, ReservationStatus::Pending);
        assert!(created.notes.is_none());
        // 1000 + 500 * 10 km, multipliers default to 1
        assert_eq!(created.estimated_price, Some(dec!(6000)));
        assert_eq!(f.reservations.count().await.unwrap(), 1);

        wait_for_sent(&f.queue, 2).await;
        let sent = f.mailer.sent.lock().unwrap();
        assert_eq!(sent[0].to, "admin@navette.ci");
        assert!(sent[0].body.contains("6,000 F CFA"));
        assert_eq!(sent[1].to, "awa@example.com");
    }

    #[tokio::test]
    async fn test_estimator_failure_does_not_block_booking() {
        let f = fixture(None);

        let created = f.service.create(request()).await.unwrap();
        assert!(created.estimated_price.is_none());

        wait_for_sent(&f.queue, 2).await;
        assert!(f.mailer.sent.lock().unwrap()[1].body.contains("à confirmer"));
    }

    #[tokio::test]
    async fn test_vehicle_checks() {
        let f = fixture(Some(standard_rule()));

        let mut missing = request();
        missing.vehicle_id = Some(99);
        assert!(matches!(
            f.service.create(missing).await,
            Err(AppError::VehicleNotFound(_))
        ));

        let mut unavailable = request();
        unavailable.vehicle_id = Some(2);
        assert!(matches!(
            f.service.create(unavailable).await,
            Err(AppError::VehicleUnavailable(_))
        ));

        let mut too_many = request();
        too_many.passengers = 5;
        assert!(matches!(
            f.service.create(too_many).await,
            Err(AppError::VehicleUnavailable(_))
        ));

        assert_eq!(f.reservations.count().await.unwrap(), 0);
    }

    #[test]
    fn test_request_validation() {
        let now = Utc::now();
        assert!(request().validate(now).is_ok());

        let mut past = request();
        past.pickup_at = now - Duration::hours(1);
        assert!(matches!(past.validate(now), Err(AppError::Validation(_))));

        let mut bad_email = request();
        bad_email.customer_email = "awa.example.com".to_string();
        assert!(bad_email.validate(now).is_err());

        let mut nobody = request();
        nobody.passengers = 0;
        assert!(nobody.validate(now).is_err());

        let mut no_phone = request();
        no_phone.customer_phone = " ".to_string();
        assert!(no_phone.validate(now).is_err());
    }

    #[tokio::test]
    async fn test_status_transitions() {
        let f = fixture(Some(standard_rule()));
        let created = f.service.create(request()).await.unwrap();

        let confirmed = f
            .service
            .update_status(created.id, ReservationStatus::Confirmed)
            .await
            .unwrap();
        assert_eq!(confirmed.status, ReservationStatus::Confirmed);

        let back = f
            .service
            .update_status(created.id, ReservationStatus::Pending)
            .await;
        assert!(matches!(back, Err(AppError::Conflict(_))));

        let listed = f
            .service
            .list(Some(ReservationStatus::Confirmed), &Pagination::new(1, 20))
            .await
            .unwrap();
        assert_eq!(listed.data.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_missing_reservation() {
        let f = fixture(None);
        assert!(matches!(
            f.service.delete(Uuid::new_v4()).await,
            Err(AppError::ReservationNotFound(_))
        ));
    }
}
