//! Tariff administration
//!
//! Enforces the write-time pricing invariants:
//! - no two active flat rates answer the same (origin, destination) request;
//! - at most one kilometric rule is active (delegated to the repository,
//!   which activates inside a transaction).

use navette_core::{
    models::{FlatRate, KilometricRule},
    traits::{
        FlatRateRepository, KilometricRuleRepository, PaginatedResponse, Pagination, Repository,
    },
    AppError, AppResult,
};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Check flat rate fields before persisting
pub fn validate_flat_rate(rate: &FlatRate) -> AppResult<()> {
    if rate.origin.trim().is_empty() || rate.destination.trim().is_empty() {
        return Err(AppError::Validation(
            "origin and destination are required".to_string(),
        ));
    }
    if rate.origin == rate.destination {
        return Err(AppError::Validation(
            "origin and destination must differ".to_string(),
        ));
    }
    if rate.price < 0 {
        return Err(AppError::Validation("price must not be negative".to_string()));
    }
    if rate.distance_km < Decimal::ZERO {
        return Err(AppError::Validation(
            "distance_km must not be negative".to_string(),
        ));
    }
    Ok(())
}

/// Check kilometric rule fields before persisting
pub fn validate_rule(rule: &KilometricRule) -> AppResult<()> {
    if rule.name.trim().is_empty() {
        return Err(AppError::Validation("name is required".to_string()));
    }
    for (field, value) in [
        ("base_fare", rule.base_fare),
        ("price_per_km", rule.price_per_km),
        ("minimum_fare", rule.minimum_fare),
    ] {
        if value < Decimal::ZERO {
            return Err(AppError::Validation(format!("{} must not be negative", field)));
        }
    }
    for (field, value) in [
        ("night_multiplier", rule.night_multiplier),
        ("weekend_multiplier", rule.weekend_multiplier),
    ] {
        if value <= Decimal::ZERO {
            return Err(AppError::Validation(format!("{} must be positive", field)));
        }
    }
    Ok(())
}

/// Admin operations on flat rates and kilometric rules
pub struct TariffAdminService {
    flat_rates: Arc<dyn FlatRateRepository>,
    rules: Arc<dyn KilometricRuleRepository>,
}

impl TariffAdminService {
    pub fn new(
        flat_rates: Arc<dyn FlatRateRepository>,
        rules: Arc<dyn KilometricRuleRepository>,
    ) -> Self {
        Self { flat_rates, rules }
    }

    // ==================== Flat rates ====================

    pub async fn list_flat_rates(
        &self,
        pagination: &Pagination,
    ) -> AppResult<PaginatedResponse<FlatRate>> {
        let data = self
            .flat_rates
            .find_all(pagination.limit(), pagination.offset())
            .await?;
        let total = self.flat_rates.count().await?;
        Ok(PaginatedResponse::new(data, total, pagination))
    }

    pub async fn get_flat_rate(&self, id: i32) -> AppResult<FlatRate> {
        self.flat_rates
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Flat rate {} not found", id)))
    }

    /// Fail with `Conflict` if `rate` would share a request with another active entry
    async fn ensure_no_conflict(&self, rate: &FlatRate) -> AppResult<()> {
        if !rate.active {
            return Ok(());
        }

        let candidates = self
            .flat_rates
            .find_active_between(&rate.origin, &rate.destination)
            .await?;

        if let Some(existing) = candidates
            .iter()
            .find(|other| other.id != rate.id && rate.overlaps(other))
        {
            warn!(
                existing_id = existing.id,
                "Flat rate {} -> {} conflicts with an active entry", rate.origin, rate.destination
            );
            return Err(AppError::Conflict(format!(
                "An active flat rate (#{}) already covers {} -> {}",
                existing.id, existing.origin, existing.destination
            )));
        }

        Ok(())
    }

    #[instrument(skip(self, rate), fields(origin = %rate.origin, destination = %rate.destination))]
    pub async fn create_flat_rate(&self, rate: FlatRate) -> AppResult<FlatRate> {
        validate_flat_rate(&rate)?;
        self.ensure_no_conflict(&rate).await?;

        let created = self.flat_rates.create(&rate).await?;
        info!(id = created.id, "Flat rate created");
        Ok(created)
    }

    #[instrument(skip(self, rate), fields(id = rate.id))]
    pub async fn update_flat_rate(&self, rate: FlatRate) -> AppResult<FlatRate> {
        validate_flat_rate(&rate)?;
        self.get_flat_rate(rate.id).await?;
        self.ensure_no_conflict(&rate).await?;

        self.flat_rates.update(&rate).await
    }

    /// Flip the `active` flag, checking conflicts on activation
    #[instrument(skip(self))]
    pub async fn toggle_flat_rate(&self, id: i32) -> AppResult<FlatRate> {
        let mut rate = self.get_flat_rate(id).await?;
        rate.active = !rate.active;
        self.ensure_no_conflict(&rate).await?;

        let updated = self
            .flat_rates
            .set_active(id, rate.active)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Flat rate {} not found", id)))?;

        info!(active = updated.active, "Flat rate toggled");
        Ok(updated)
    }

    pub async fn delete_flat_rate(&self, id: i32) -> AppResult<()> {
        if self.flat_rates.delete(id).await? {
            info!(id, "Flat rate deleted");
            Ok(())
        } else {
            Err(AppError::NotFound(format!("Flat rate {} not found", id)))
        }
    }

    // ==================== Kilometric rules ====================

    pub async fn list_rules(
        &self,
        pagination: &Pagination,
    ) -> AppResult<PaginatedResponse<KilometricRule>> {
        let data = self
            .rules
            .find_all(pagination.limit(), pagination.offset())
            .await?;
        let total = self.rules.count().await?;
        Ok(PaginatedResponse::new(data, total, pagination))
    }

    pub async fn get_rule(&self, id: i32) -> AppResult<KilometricRule> {
        self.rules
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Kilometric rule {} not found", id)))
    }

    /// Create a rule; an active rule deactivates all others
    #[instrument(skip(self, rule), fields(name = %rule.name))]
    pub async fn create_rule(&self, rule: KilometricRule) -> AppResult<KilometricRule> {
        validate_rule(&rule)?;
        let created = self.rules.create(&rule).await?;
        info!(id = created.id, active = created.active, "Kilometric rule created");
        Ok(created)
    }

    #[instrument(skip(self, rule), fields(id = rule.id))]
    pub async fn update_rule(&self, rule: KilometricRule) -> AppResult<KilometricRule> {
        validate_rule(&rule)?;
        self.get_rule(rule.id).await?;
        self.rules.update(&rule).await
    }

    /// Activate exclusively, or deactivate if already active
    #[instrument(skip(self))]
    pub async fn toggle_rule(&self, id: i32) -> AppResult<KilometricRule> {
        let rule = self.get_rule(id).await?;

        let toggled = if rule.active {
            self.rules.deactivate(id).await?
        } else {
            self.rules.activate_exclusive(id).await?
        };

        let toggled = toggled
            .ok_or_else(|| AppError::NotFound(format!("Kilometric rule {} not found", id)))?;
        info!(active = toggled.active, "Kilometric rule toggled");
        Ok(toggled)
    }

    pub async fn delete_rule(&self, id: i32) -> AppResult<()> {
        if self.rules.delete(id).await? {
            info!(id, "Kilometric rule deleted");
            Ok(())
        } else {
            Err(AppError::NotFound(format!("Kilometric rule {} not found", id)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockFlatRates {
        rows: Mutex<Vec<FlatRate>>,
    }

    impl MockFlatRates {
        fn with(rows: Vec<FlatRate>) -> Arc<Self> {
            Arc::new(Self {
                rows: Mutex::new(rows),
            })
        }
    }

    #[async_trait]
    impl Repository<FlatRate, i32> for MockFlatRates {
        async fn find_by_id(&self, id: i32) -> AppResult<Option<FlatRate>> {
            Ok(self.rows.lock().unwrap().iter().find(|r| r.id == id).cloned())
        }

        async fn find_all(&self, limit: i64, offset: i64) -> AppResult<Vec<FlatRate>> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .skip(offset as usize)
                .take(limit as usize)
                .cloned()
                .collect())
        }

        async fn count(&self) -> AppResult<i64> {
            Ok(self.rows.lock().unwrap().len() as i64)
        }

        async fn create(&self, entity: &FlatRate) -> AppResult<FlatRate> {
            let mut rows = self.rows.lock().unwrap();
            let mut created = entity.clone();
            created.id = rows.iter().map(|r| r.id).max().unwrap_or(0) + 1;
            rows.push(created.clone());
            Ok(created)
        }

        async fn update(&self, entity: &FlatRate) -> AppResult<FlatRate> {
            let mut rows = self.rows.lock().unwrap();
            let row = rows.iter_mut().find(|r| r.id == entity.id).unwrap();
            *row = entity.clone();
            Ok(entity.clone())
        }

        async fn delete(&self, id: i32) -> AppResult<bool> {
            let mut rows = self.rows.lock().unwrap();
            let before = rows.len();
            rows.retain(|r| r.id != id);
            Ok(rows.len() != before)
        }
    }

    #[async_trait]
    impl FlatRateRepository for MockFlatRates {
        async fn find_active_between(&self, a: &str, b: &str) -> AppResult<Vec<FlatRate>> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .filter(|r| {
                    r.active
                        && ((r.origin == a && r.destination == b)
                            || (r.origin == b && r.destination == a))
                })
                .cloned()
                .collect())
        }

        async fn set_active(&self, id: i32, active: bool) -> AppResult<Option<FlatRate>> {
            let mut rows = self.rows.lock().unwrap();
            Ok(rows.iter_mut().find(|r| r.id == id).map(|r| {
                r.active = active;
                r.clone()
            }))
        }
    }

    #[derive(Default)]
    struct MockRules {
        rows: Mutex<Vec<KilometricRule>>,
    }

    #[async_trait]
    impl Repository<KilometricRule, i32> for MockRules {
        async fn find_by_id(&self, id: i32) -> AppResult<Option<KilometricRule>> {
            Ok(self.rows.lock().unwrap().iter().find(|r| r.id == id).cloned())
        }

        async fn find_all(&self, _limit: i64, _offset: i64) -> AppResult<Vec<KilometricRule>> {
            Ok(self.rows.lock().unwrap().clone())
        }

        async fn count(&self) -> AppResult<i64> {
            Ok(self.rows.lock().unwrap().len() as i64)
        }

        async fn create(&self, entity: &KilometricRule) -> AppResult<KilometricRule> {
            let mut rows = self.rows.lock().unwrap();
            let mut created = entity.clone();
            created.id = rows.len() as i32 + 1;
            if created.active {
                rows.iter_mut().for_each(|r| r.active = false);
            }
            rows.push(created.clone());
            Ok(created)
        }

        async fn update(&self, entity: &KilometricRule) -> AppResult<KilometricRule> {
            Ok(entity.clone())
        }

        async fn delete(&self, _id: i32) -> AppResult<bool> {
            Ok(false)
        }
    }

    #[async_trait]
    impl KilometricRuleRepository for MockRules {
        async fn activate_exclusive(&self, id: i32) -> AppResult<Option<KilometricRule>> {
            let mut rows = self.rows.lock().unwrap();
            rows.iter_mut().for_each(|r| r.active = r.id == id);
            Ok(rows.iter().find(|r| r.id == id).cloned())
        }

        async fn deactivate(&self, id: i32) -> AppResult<Option<KilometricRule>> {
            let mut rows = self.rows.lock().unwrap();
            Ok(rows.iter_mut().find(|r| r.id == id).map(|r| {
                r.active = false;
                r.clone()
            }))
        }
    }

    fn flat(id: i32, origin: &str, destination: &str, bidirectional: bool, active: bool) -> FlatRate {
        FlatRate {
            id,
            origin: origin.to_string(),
            destination: destination.to_string(),
            price: 15000,
            distance_km: dec!(20),
            bidirectional,
            active,
            ..Default::default()
        }
    }

    fn rule(name: &str) -> KilometricRule {
        KilometricRule {
            name: name.to_string(),
            base_fare: dec!(1000),
            price_per_km: dec!(300),
            minimum_fare: dec!(3000),
            ..Default::default()
        }
    }

    fn service(flat_rates: Arc<MockFlatRates>, rules: Arc<MockRules>) -> TariffAdminService {
        TariffAdminService::new(flat_rates, rules)
    }

    #[tokio::test]
    async fn test_conflicting_flat_rate_rejected() {
        let repo = MockFlatRates::with(vec![flat(1, "Aéroport", "Plateau", true, true)]);
        let svc = service(repo.clone(), Arc::new(MockRules::default()));

        // Reverse direction of a bidirectional entry answers the same request
        let result = svc
            .create_flat_rate(flat(0, "Plateau", "Aéroport", false, true))
            .await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_one_way_entries_in_opposite_directions_coexist() {
        let repo = MockFlatRates::with(vec![flat(1, "Aéroport", "Plateau", false, true)]);
        let svc = service(repo.clone(), Arc::new(MockRules::default()));

        let created = svc
            .create_flat_rate(flat(0, "Plateau", "Aéroport", false, true))
            .await
            .unwrap();
        assert_eq!(created.id, 2);
    }

    #[tokio::test]
    async fn test_inactive_duplicate_allowed_but_activation_conflicts() {
        let repo = MockFlatRates::with(vec![flat(1, "Aéroport", "Plateau", false, true)]);
        let svc = service(repo.clone(), Arc::new(MockRules::default()));

        let draft = svc
            .create_flat_rate(flat(0, "Aéroport", "Plateau", false, false))
            .await
            .unwrap();

        let result = svc.toggle_flat_rate(draft.id).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));

        // Deactivating the original frees the pair
        svc.toggle_flat_rate(1).await.unwrap();
        let activated = svc.toggle_flat_rate(draft.id).await.unwrap();
        assert!(activated.active);
    }

    #[tokio::test]
    async fn test_update_does_not_conflict_with_itself() {
        let repo = MockFlatRates::with(vec![flat(1, "Aéroport", "Plateau", true, true)]);
        let svc = service(repo, Arc::new(MockRules::default()));

        let mut edited = flat(1, "Aéroport", "Plateau", true, true);
        edited.price = 18000;
        let updated = svc.update_flat_rate(edited).await.unwrap();
        assert_eq!(updated.price, 18000);
    }

    #[tokio::test]
    async fn test_update_missing_flat_rate() {
        let svc = service(MockFlatRates::with(vec![]), Arc::new(MockRules::default()));
        let result = svc.update_flat_rate(flat(9, "A", "B", false, true)).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_flat_rate_validation() {
        assert!(validate_flat_rate(&flat(0, "A", "A", false, true)).is_err());
        assert!(validate_flat_rate(&flat(0, " ", "B", false, true)).is_err());

        let mut negative = flat(0, "A", "B", false, true);
        negative.price = -1;
        assert!(validate_flat_rate(&negative).is_err());

        assert!(validate_flat_rate(&flat(0, "A", "B", false, true)).is_ok());
    }

    #[test]
    fn test_rule_validation() {
        assert!(validate_rule(&rule("Standard")).is_ok());

        let mut zero_multiplier = rule("Standard");
        zero_multiplier.night_multiplier = Decimal::ZERO;
        assert!(validate_rule(&zero_multiplier).is_err());

        let mut negative_fare = rule("Standard");
        negative_fare.base_fare = dec!(-1);
        assert!(validate_rule(&negative_fare).is_err());

        assert!(validate_rule(&rule("")).is_err());
    }

    #[tokio::test]
    async fn test_toggle_rule_activates_exclusively() {
        let rules = Arc::new(MockRules::default());
        let svc = service(MockFlatRates::with(vec![]), rules.clone());

        let mut first = rule("Jour");
        first.active = true;
        svc.create_rule(first).await.unwrap();
        let second = svc.create_rule(rule("Nuit")).await.unwrap();
        assert!(!second.active);

        let activated = svc.toggle_rule(second.id).await.unwrap();
        assert!(activated.active);

        let active: Vec<_> = rules
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.active)
            .map(|r| r.id)
            .collect();
        assert_eq!(active, vec![second.id]);

        let deactivated = svc.toggle_rule(second.id).await.unwrap();
        assert!(!deactivated.active);
    }

    #[tokio::test]
    async fn test_toggle_missing_rule() {
        let svc = service(MockFlatRates::with(vec![]), Arc::new(MockRules::default()));
        assert!(matches!(
            svc.toggle_rule(42).await,
            Err(AppError::NotFound(_))
        ));
    }
}
