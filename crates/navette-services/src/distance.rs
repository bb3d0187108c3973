//! Google Distance Matrix client
//!
//! One driving request per estimate, no retries and no caching. Any failure
//! (transport, timeout, non-OK status at top or element level, missing rows)
//! surfaces as `AppError::DistanceLookupFailed`.

use async_trait::async_trait;
use navette_core::{
    config::MapsConfig, models::DistanceQuote, traits::DistanceProvider, AppError, AppResult,
};
use reqwest::{Client, ClientBuilder};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error, instrument, warn};

/// Distance Matrix top-level response
#[derive(Debug, Deserialize)]
pub struct DistanceMatrixResponse {
    pub status: String,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub rows: Vec<DistanceMatrixRow>,
}

#[derive(Debug, Deserialize)]
pub struct DistanceMatrixRow {
    #[serde(default)]
    pub elements: Vec<DistanceMatrixElement>,
}

#[derive(Debug, Deserialize)]
pub struct DistanceMatrixElement {
    pub status: String,
    pub distance: Option<ValueField>,
    pub duration: Option<ValueField>,
}

/// `{ "text": "12.5 km", "value": 12500 }`
#[derive(Debug, Deserialize)]
pub struct ValueField {
    pub value: i64,
}

impl DistanceMatrixResponse {
    /// Extract the first element's distance and duration
    pub fn into_quote(self) -> AppResult<DistanceQuote> {
        if self.status != "OK" {
            let detail = match self.error_message {
                Some(msg) if !msg.is_empty() => format!("{} ({})", self.status, msg),
                _ => self.status,
            };
            return Err(AppError::DistanceLookupFailed(detail));
        }

        let element = self
            .rows
            .into_iter()
            .next()
            .and_then(|row| row.elements.into_iter().next())
            .ok_or_else(|| {
                AppError::DistanceLookupFailed("empty response from provider".to_string())
            })?;

        if element.status != "OK" {
            return Err(AppError::DistanceLookupFailed(element.status));
        }

        match (element.distance, element.duration) {
            (Some(distance), Some(duration)) => Ok(DistanceQuote::from_meters_seconds(
                distance.value,
                duration.value,
            )),
            _ => Err(AppError::DistanceLookupFailed(
                "missing distance or duration".to_string(),
            )),
        }
    }
}

/// Distance provider backed by the Google Distance Matrix API
pub struct GoogleDistanceMatrix {
    http_client: Client,
    base_url: String,
    api_key: String,
}

impl GoogleDistanceMatrix {
    pub fn new(base_url: &str, api_key: &str, timeout_secs: u64) -> AppResult<Self> {
        let http_client = ClientBuilder::new()
            .timeout(Duration::from_secs(timeout_secs))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        if api_key.is_empty() {
            warn!("Maps API key is empty, distance lookups will be rejected by the provider");
        }

        Ok(Self {
            http_client,
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
        })
    }

    pub fn from_config(config: &MapsConfig) -> AppResult<Self> {
        Self::new(&config.base_url, &config.api_key, config.timeout_secs)
    }
}

#[async_trait]
impl DistanceProvider for GoogleDistanceMatrix {
    #[instrument(skip(self))]
    async fn quote(&self, origin: &str, destination: &str) -> AppResult<DistanceQuote> {
        let response = self
            .http_client
            .get(&self.base_url)
            .query(&[
                ("origins", origin),
                ("destinations", destination),
                ("mode", "driving"),
                ("units", "metric"),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                // The request URL carries the API key
                let e = e.without_url();
                if e.is_timeout() {
                    warn!("Distance provider timed out");
                    AppError::DistanceLookupFailed("provider timeout".to_string())
                } else {
                    error!("Distance provider unreachable: {}", e);
                    AppError::DistanceLookupFailed("provider unreachable".to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            error!("Distance provider HTTP error: status={}", status);
            return Err(AppError::DistanceLookupFailed(format!("HTTP {}", status.as_u16())));
        }

        let body: DistanceMatrixResponse = response.json().await.map_err(|e| {
            error!("Failed to parse distance provider response: {}", e.without_url());
            AppError::DistanceLookupFailed("invalid provider response".to_string())
        })?;

        debug!(status = %body.status, "Distance provider response");

        body.into_quote().map_err(|e| {
            warn!("Distance lookup failed: {}", e);
            e
        })
    }
}
