//! Fare estimation
//!
//! Pricing order:
//! 1. an active flat rate for the (origin, destination) pair, honouring
//!    `bidirectional`: fixed price, duration derived from the stored distance;
//! 2. otherwise the active kilometric rule applied to the provider's driving
//!    distance, with night and weekend multipliers in the operator's timezone.
//!
//! Distance and duration are rounded half-to-even to whole units in both
//! branches.

use crate::constants::CURRENCY_SUFFIX;
use chrono::{DateTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use navette_core::{
    models::tariff::{is_night_hour, is_weekend},
    traits::{DistanceProvider, TariffStore},
    AppError, AppResult,
};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Which pricing strategy produced a quote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FareSource {
    FlatRate,
    Kilometric,
}

/// Result of a fare estimate
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FareQuote {
    pub distance_km: i64,
    pub duration_minutes: i64,
    /// Whole F CFA
    pub price: Decimal,
    /// e.g. `12,500 F CFA`
    pub price_formatted: String,
    pub source: FareSource,
    pub night_surcharge: bool,
    pub weekend_surcharge: bool,
}

/// Fare estimator
pub struct FareEstimator {
    store: Arc<dyn TariffStore>,
    provider: Arc<dyn DistanceProvider>,
    timezone: Tz,
}

impl FareEstimator {
    pub fn new(store: Arc<dyn TariffStore>, provider: Arc<dyn DistanceProvider>, timezone: Tz) -> Self {
        Self {
            store,
            provider,
            timezone,
        }
    }

    /// Timezone used for surcharges by [`FareEstimator::estimate_now`]
    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Estimate a trip requested right now
    pub async fn estimate_now(&self, origin: &str, destination: &str) -> AppResult<FareQuote> {
        let now = Utc::now().with_timezone(&self.timezone);
        self.estimate(origin, destination, &now).await
    }

    /// Estimate a trip requested at `now`
    ///
    /// `now` must already be expressed in the timezone whose wall clock drives
    /// the night and weekend surcharges.
    #[instrument(skip(self, now))]
    pub async fn estimate<Z: TimeZone>(
        &self,
        origin: &str,
        destination: &str,
        now: &DateTime<Z>,
    ) -> AppResult<FareQuote> {
        if origin.trim().is_empty() || destination.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "origin and destination are required".to_string(),
            ));
        }

        if let Some(entry) = self.store.find_flat_rate(origin, destination).await? {
            let quote = entry.distance_quote();
            let price = Decimal::from(entry.price);

            info!(
                flat_rate_id = entry.id,
                price = %price,
                "Flat rate applied"
            );

            return Ok(FareQuote {
                distance_km: quote.rounded_distance_km(),
                duration_minutes: quote.rounded_duration_minutes(),
                price,
                price_formatted: format_fcfa(price),
                source: FareSource::FlatRate,
                night_surcharge: false,
                weekend_surcharge: false,
            });
        }

        let rule = self.store.find_active_rule().await?.ok_or_else(|| {
            warn!("No flat rate matched and no kilometric rule is active");
            AppError::NoActiveTariff
        })?;

        let quote = self.provider.quote(origin, destination).await?;
        debug!(
            distance_km = %quote.distance_km,
            duration_minutes = %quote.duration_minutes,
            "Distance provider answered"
        );

        let night = is_night_hour(now.hour());
        let weekend = is_weekend(now);
        let price = rule
            .price_at(quote.distance_km, now)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven);

        info!(
            rule_id = rule.id,
            price = %price,
            night,
            weekend,
            "Kilometric rule applied"
        );

        Ok(FareQuote {
            distance_km: quote.rounded_distance_km(),
            duration_minutes: quote.rounded_duration_minutes(),
            price,
            price_formatted: format_fcfa(price),
            source: FareSource::Kilometric,
            night_surcharge: night,
            weekend_surcharge: weekend,
        })
    }
}

/// Format a price with comma thousands separators, no decimals and the F CFA suffix
///
/// ```
/// use navette_services::format_fcfa;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(format_fcfa(dec!(12500)), "12,500 F CFA");
/// ```
pub fn format_fcfa(price: Decimal) -> String {
    let rounded = price.round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven);
    let digits = rounded.abs().trunc().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };

    format!("{}{} {}", sign, grouped, CURRENCY_SUFFIX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono_tz::Africa::Abidjan;
    use chrono_tz::Europe::Paris;
    use navette_core::models::{DistanceQuote, FlatRate, KilometricRule};
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockTariffStore {
        flat_rates: Vec<FlatRate>,
        rule: Option<KilometricRule>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TariffStore for MockTariffStore {
        async fn find_flat_rate(
            &self,
            origin: &str,
            destination: &str,
        ) -> AppResult<Option<FlatRate>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut candidates: Vec<&FlatRate> = self
                .flat_rates
                .iter()
                .filter(|f| f.active && f.matches(origin, destination))
                .collect();
            candidates.sort_by_key(|f| {
                (
                    !f.matches_directly(origin, destination),
                    std::cmp::Reverse(f.created_at),
                )
            });
            Ok(candidates.first().map(|f| (*f).clone()))
        }

        async fn find_active_rule(&self) -> AppResult<Option<KilometricRule>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.rule.clone())
        }
    }

    struct MockProvider {
        result: Mutex<Option<AppResult<DistanceQuote>>>,
        calls: AtomicUsize,
    }

    impl MockProvider {
        fn returning(meters: i64, seconds: i64) -> Self {
            Self {
                result: Mutex::new(Some(Ok(DistanceQuote::from_meters_seconds(meters, seconds)))),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing(status: &str) -> Self {
            Self {
                result: Mutex::new(Some(Err(AppError::DistanceLookupFailed(status.to_string())))),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl DistanceProvider for MockProvider {
        async fn quote(&self, _origin: &str, _destination: &str) -> AppResult<DistanceQuote> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| Err(AppError::Internal("provider called twice".to_string())))
        }
    }

    fn standard_rule() -> KilometricRule {
        KilometricRule {
            id: 1,
            name: "Standard".to_string(),
            base_fare: dec!(1000),
            price_per_km: dec!(500),
            minimum_fare: dec!(2000),
            night_multiplier: dec!(1.5),
            weekend_multiplier: dec!(1.2),
            active: true,
            ..Default::default()
        }
    }

    fn airport_plateau(bidirectional: bool) -> FlatRate {
        FlatRate {
            id: 10,
            origin: "Aéroport FHB".to_string(),
            destination: "Plateau".to_string(),
            price: 15000,
            distance_km: dec!(17.5),
            bidirectional,
            active: true,
            ..Default::default()
        }
    }

    fn estimator(store: &Arc<MockTariffStore>, provider: &Arc<MockProvider>) -> FareEstimator {
        FareEstimator::new(store.clone(), provider.clone(), Abidjan)
    }

    /// Wednesday 2024-06-12 at the given local hour in Abidjan
    fn weekday_at(hour: u32, minute: u32) -> DateTime<Tz> {
        Abidjan.with_ymd_and_hms(2024, 6, 12, hour, minute, 0).unwrap()
    }

    #[tokio::test]
    async fn test_bidirectional_flat_rate_is_symmetric() {
        let store = Arc::new(MockTariffStore {
            flat_rates: vec![airport_plateau(true)],
            ..Default::default()
        });
        let provider = Arc::new(MockProvider::returning(0, 0));
        let estimator = estimator(&store, &provider);
        let now = weekday_at(12, 0);

        let forward = estimator.estimate("Aéroport FHB", "Plateau", &now).await.unwrap();
        let backward = estimator.estimate("Plateau", "Aéroport FHB", &now).await.unwrap();

        assert_eq!(forward, backward);
        assert_eq!(forward.source, FareSource::FlatRate);
        assert_eq!(forward.price, dec!(15000));
        assert_eq!(forward.price_formatted, "15,000 F CFA");
        // 17.5 km rounds to even, 21 minutes exactly
        assert_eq!(forward.distance_km, 18);
        assert_eq!(forward.duration_minutes, 21);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_one_way_flat_rate_not_matched_backwards() {
        let store = Arc::new(MockTariffStore {
            flat_rates: vec![airport_plateau(false)],
            rule: None,
            ..Default::default()
        });
        let provider = Arc::new(MockProvider::returning(10_000, 900));
        let estimator = estimator(&store, &provider);

        let result = estimator
            .estimate("Plateau", "Aéroport FHB", &weekday_at(12, 0))
            .await;

        assert!(matches!(result, Err(AppError::NoActiveTariff)));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_one_way_flat_rate_falls_through_to_rule() {
        let store = Arc::new(MockTariffStore {
            flat_rates: vec![airport_plateau(false)],
            rule: Some(standard_rule()),
            ..Default::default()
        });
        let provider = Arc::new(MockProvider::returning(10_000, 900));
        let estimator = estimator(&store, &provider);

        let quote = estimator
            .estimate("Plateau", "Aéroport FHB", &weekday_at(12, 0))
            .await
            .unwrap();

        assert_eq!(quote.source, FareSource::Kilometric);
        assert_eq!(quote.price, dec!(6000));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_inactive_flat_rate_ignored() {
        let mut entry = airport_plateau(true);
        entry.active = false;
        let store = Arc::new(MockTariffStore {
            flat_rates: vec![entry],
            rule: Some(standard_rule()),
            ..Default::default()
        });
        let provider = Arc::new(MockProvider::returning(1_000, 120));

        let quote = estimator(&store, &provider)
            .estimate("Aéroport FHB", "Plateau", &weekday_at(12, 0))
            .await
            .unwrap();
        assert_eq!(quote.source, FareSource::Kilometric);
    }

    #[tokio::test]
    async fn test_minimum_fare_applies_for_short_trip() {
        let store = Arc::new(MockTariffStore {
            rule: Some(standard_rule()),
            ..Default::default()
        });
        let provider = Arc::new(MockProvider::returning(1_000, 180));

        let quote = estimator(&store, &provider)
            .estimate("Cocody", "Riviera", &weekday_at(12, 0))
            .await
            .unwrap();

        assert_eq!(quote.price, dec!(2000));
        assert_eq!(quote.distance_km, 1);
        assert_eq!(quote.duration_minutes, 3);
        assert_eq!(quote.price_formatted, "2,000 F CFA");
    }

    #[tokio::test]
    async fn test_ten_km_daytime_price() {
        let store = Arc::new(MockTariffStore {
            rule: Some(standard_rule()),
            ..Default::default()
        });
        let provider = Arc::new(MockProvider::returning(10_000, 1_200));

        let quote = estimator(&store, &provider)
            .estimate("Cocody", "Yopougon", &weekday_at(10, 30))
            .await
            .unwrap();

        assert_eq!(quote.price, dec!(6000));
        assert!(!quote.night_surcharge);
        assert!(!quote.weekend_surcharge);
    }

    #[tokio::test]
    async fn test_night_surcharge_boundary() {
        let make = || {
            (
                Arc::new(MockTariffStore {
                    rule: Some(standard_rule()),
                    ..Default::default()
                }),
                Arc::new(MockProvider::returning(10_000, 1_200)),
            )
        };

        let (store, provider) = make();
        let before_six = estimator(&store, &provider)
            .estimate("A", "B", &weekday_at(5, 59))
            .await
            .unwrap();
        assert_eq!(before_six.price, dec!(9000));
        assert!(before_six.night_surcharge);

        let (store, provider) = make();
        let at_six = estimator(&store, &provider)
            .estimate("A", "B", &weekday_at(6, 0))
            .await
            .unwrap();
        assert_eq!(at_six.price, dec!(6000));

        let (store, provider) = make();
        let at_ten_pm = estimator(&store, &provider)
            .estimate("A", "B", &weekday_at(22, 0))
            .await
            .unwrap();
        assert_eq!(at_ten_pm.price, dec!(9000));
    }

    #[tokio::test]
    async fn test_weekend_surcharge_stacks_with_night() {
        let store = Arc::new(MockTariffStore {
            rule: Some(standard_rule()),
            ..Default::default()
        });
        let provider = Arc::new(MockProvider::returning(10_000, 1_200));

        // Saturday 23:00
        let saturday_night = Abidjan.with_ymd_and_hms(2024, 6, 15, 23, 0, 0).unwrap();
        let quote = estimator(&store, &provider)
            .estimate("A", "B", &saturday_night)
            .await
            .unwrap();

        assert_eq!(quote.price, dec!(10800));
        assert!(quote.night_surcharge && quote.weekend_surcharge);
    }

    #[tokio::test]
    async fn test_surcharges_follow_local_wall_clock() {
        let store = Arc::new(MockTariffStore {
            rule: Some(standard_rule()),
            ..Default::default()
        });
        let provider = Arc::new(MockProvider::returning(10_000, 1_200));

        // Friday 21:30 UTC is Friday 23:30 in Paris (CEST)
        let utc = Utc.with_ymd_and_hms(2024, 6, 14, 21, 30, 0).unwrap();
        let local = utc.with_timezone(&Paris);

        let quote = FareEstimator::new(store, provider, Paris)
            .estimate("A", "B", &local)
            .await
            .unwrap();

        assert!(quote.night_surcharge);
        assert!(!quote.weekend_surcharge);
        assert_eq!(quote.price, dec!(9000));
    }

    #[tokio::test]
    async fn test_empty_input_rejected_before_any_lookup() {
        let store = Arc::new(MockTariffStore {
            rule: Some(standard_rule()),
            ..Default::default()
        });
        let provider = Arc::new(MockProvider::returning(10_000, 1_200));
        let estimator = estimator(&store, &provider);

        for (origin, destination) in [("", "X"), ("X", ""), ("   ", "X")] {
            let result = estimator.estimate(origin, destination, &weekday_at(12, 0)).await;
            assert!(matches!(result, Err(AppError::InvalidInput(_))));
        }

        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_no_active_rule_skips_provider() {
        let store = Arc::new(MockTariffStore::default());
        let provider = Arc::new(MockProvider::returning(10_000, 1_200));

        let result = estimator(&store, &provider)
            .estimate("A", "B", &weekday_at(12, 0))
            .await;

        assert!(matches!(result, Err(AppError::NoActiveTariff)));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_provider_failure_yields_no_price() {
        let store = Arc::new(MockTariffStore {
            rule: Some(standard_rule()),
            ..Default::default()
        });
        let provider = Arc::new(MockProvider::failing("NOT_FOUND"));

        let result = estimator(&store, &provider)
            .estimate("Nowhere", "B", &weekday_at(12, 0))
            .await;

        match result {
            Err(AppError::DistanceLookupFailed(detail)) => assert!(detail.contains("NOT_FOUND")),
            other => panic!("expected DistanceLookupFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_direct_flat_rate_preferred_over_reverse() {
        let reverse = FlatRate {
            id: 1,
            origin: "B".to_string(),
            destination: "A".to_string(),
            price: 9000,
            bidirectional: true,
            ..Default::default()
        };
        let direct = FlatRate {
            id: 2,
            origin: "A".to_string(),
            destination: "B".to_string(),
            price: 7000,
            bidirectional: false,
            created_at: reverse.created_at - chrono::Duration::days(30),
            ..Default::default()
        };
        let store = Arc::new(MockTariffStore {
            flat_rates: vec![reverse, direct],
            ..Default::default()
        });
        let provider = Arc::new(MockProvider::returning(0, 0));

        let quote = estimator(&store, &provider)
            .estimate("A", "B", &weekday_at(12, 0))
            .await
            .unwrap();
        assert_eq!(quote.price, dec!(7000));
    }

    #[tokio::test]
    async fn test_kilometric_price_rounded_half_even() {
        let rule = KilometricRule {
            base_fare: dec!(0),
            price_per_km: dec!(1),
            minimum_fare: dec!(0),
            ..standard_rule()
        };
        let store = Arc::new(MockTariffStore {
            rule: Some(rule),
            ..Default::default()
        });
        // 2.5 km at 1 F/km
        let provider = Arc::new(MockProvider::returning(2_500, 150));

        let quote = estimator(&store, &provider)
            .estimate("A", "B", &weekday_at(12, 0))
            .await
            .unwrap();
        assert_eq!(quote.price, dec!(2));
        assert_eq!(quote.distance_km, 2);
    }

    #[test]
    fn test_format_fcfa() {
        assert_eq!(format_fcfa(dec!(0)), "0 F CFA");
        assert_eq!(format_fcfa(dec!(950)), "950 F CFA");
        assert_eq!(format_fcfa(dec!(1000)), "1,000 F CFA");
        assert_eq!(format_fcfa(dec!(12500)), "12,500 F CFA");
        assert_eq!(format_fcfa(dec!(1234567)), "1,234,567 F CFA");
        assert_eq!(format_fcfa(dec!(10800.50)), "10,800 F CFA");
        assert_eq!(format_fcfa(dec!(10801.50)), "10,802 F CFA");
    }
}
