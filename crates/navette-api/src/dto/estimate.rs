//! Fare estimate DTOs
//!
//! Field names (`depart`, `arrivee`, `temps_min`, `tarif`) are the public
//! contract of the booking site's estimate form and its JSON endpoint.

use navette_services::FareQuote;
use serde::{Deserialize, Serialize};

/// Estimate request, as form fields or JSON
///
/// Missing fields deserialize as empty so the estimator reports them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EstimateRequest {
    #[serde(default)]
    pub depart: String,
    #[serde(default)]
    pub arrivee: String,
}

/// Rendering context for the estimate page
#[derive(Debug, Clone, Serialize)]
pub struct EstimationView {
    pub depart: String,
    pub arrivee: String,
    pub distance_km: Option<i64>,
    pub temps_min: Option<i64>,
    /// Formatted price, e.g. `12,500 F CFA`
    pub tarif: Option<String>,
    /// User-facing message when the estimate failed
    pub warning: Option<String>,
    /// Signed-in administrator, the page links to the back-office
    pub is_admin: bool,
}

impl EstimationView {
    pub fn from_quote(request: EstimateRequest, quote: &FareQuote) -> Self {
        Self {
            depart: request.depart,
            arrivee: request.arrivee,
            distance_km: Some(quote.distance_km),
            temps_min: Some(quote.duration_minutes),
            tarif: Some(quote.price_formatted.clone()),
            warning: None,
            is_admin: false,
        }
    }

    pub fn warning(request: EstimateRequest, message: String) -> Self {
        Self {
            depart: request.depart,
            arrivee: request.arrivee,
            distance_km: None,
            temps_min: None,
            tarif: None,
            warning: Some(message),
            is_admin: false,
        }
    }

    pub fn for_admin(mut self, is_admin: bool) -> Self {
        self.is_admin = is_admin;
        self
    }
}

/// JSON estimate response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EstimateResponse {
    pub distance_km: i64,
    pub temps_min: i64,
    /// Formatted price, e.g. `12,500 F CFA`
    pub tarif: String,
}

impl From<&FareQuote> for EstimateResponse {
    fn from(quote: &FareQuote) -> Self {
        Self {
            distance_km: quote.distance_km,
            temps_min: quote.duration_minutes,
            tarif: quote.price_formatted.clone(),
        }
    }
}

/// JSON estimate error
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimateError {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use navette_services::FareSource;
    use rust_decimal_macros::dec;

    fn quote() -> FareQuote {
        FareQuote {
            distance_km: 13,
            duration_minutes: 25,
            price: dec!(12500),
            price_formatted: "12,500 F CFA".to_string(),
            source: FareSource::Kilometric,
            night_surcharge: false,
            weekend_surcharge: false,
        }
    }

    #[test]
    fn test_json_response_carries_formatted_price() {
        let response = EstimateResponse::from(&quote());
        assert_eq!(
            response,
            EstimateResponse {
                distance_km: 13,
                temps_min: 25,
                tarif: "12,500 F CFA".to_string()
            }
        );
    }

    #[test]
    fn test_view_from_quote() {
        let request = EstimateRequest {
            depart: "Cocody".to_string(),
            arrivee: "Plateau".to_string(),
        };
        let view = EstimationView::from_quote(request, &quote());
        assert_eq!(view.tarif.as_deref(), Some("12,500 F CFA"));
        assert!(view.warning.is_none());
        assert!(!view.is_admin);
        assert!(view.for_admin(true).is_admin);
    }

    #[test]
    fn test_missing_fields_default_to_empty() {
        let request: EstimateRequest = serde_json::from_str(r#"{"depart": "Cocody"}"#).unwrap();
        assert_eq!(request.arrivee, "");
    }
}
