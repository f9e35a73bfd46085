//! Best-effort operator location lookup
//!
//! Used only to pre-expand the region tree. Every failure collapses into a
//! location with `found == false`; nothing here is allowed to delay or block
//! startup beyond the per-provider timeout.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use crate::constants::location;
use crate::errors::LocationError;

/// Detected operator location
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    /// Country name or code as reported by the provider
    pub country: String,
    /// State, province or similar
    pub region: String,
    /// City
    pub city: String,
    /// Whether any provider answered
    pub found: bool,
}

impl Location {
    /// A location that was not detected
    pub fn not_found() -> Self {
        Self::default()
    }

    /// Build a detected location
    pub fn new(
        country: impl Into<String>,
        region: impl Into<String>,
        city: impl Into<String>,
    ) -> Self {
        Self {
            country: country.into(),
            region: region.into(),
            city: city.into(),
            found: true,
        }
    }

    /// "City, Region, Country" with empty parts left out
    pub fn describe(&self) -> String {
        [&self.city, &self.region, &self.country]
            .iter()
            .filter(|part| !part.is_empty())
            .map(|part| part.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Union of the provider schemas we understand
///
/// ipapi.co reports `country_name` and `region`; ip-api.com reports
/// `country` and `regionName`.
#[derive(Debug, Deserialize)]
struct ProviderResponse {
    country: Option<String>,
    country_name: Option<String>,
    #[serde(alias = "regionName")]
    region_name: Option<String>,
    region: Option<String>,
    city: Option<String>,
}

impl ProviderResponse {
    fn into_location(self) -> Result<Location, LocationError> {
        let country = non_empty(self.country_name)
            .or_else(|| non_empty(self.country))
            .ok_or(LocationError::EmptyCountry)?;
        let region = non_empty(self.region_name)
            .or_else(|| non_empty(self.region))
            .unwrap_or_default();
        let city = non_empty(self.city).unwrap_or_default();
        Ok(Location::new(country, region, city))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Runtime location lookup configuration
#[derive(Debug, Clone)]
pub struct LocationConfig {
    /// Whether lookup is attempted at all
    pub enabled: bool,
    /// Providers tried in order
    pub providers: Vec<String>,
    /// Bound on each provider attempt
    pub timeout: Duration,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            providers: location::PROVIDERS.iter().map(|p| p.to_string()).collect(),
            timeout: location::PROVIDER_TIMEOUT,
        }
    }
}

/// Multi-provider location resolver
#[derive(Debug, Clone)]
pub struct LocationResolver {
    client: Client,
    config: LocationConfig,
}

impl LocationResolver {
    /// Create a resolver over the shared HTTP client
    pub fn new(client: Client, config: LocationConfig) -> Self {
        Self { client, config }
    }

    /// A resolver that never touches the network
    pub fn disabled(client: Client) -> Self {
        Self::new(
            client,
            LocationConfig {
                enabled: false,
                ..Default::default()
            },
        )
    }

    /// Try each provider in order; never fails
    pub async fn detect(&self) -> Location {
        if !self.config.enabled {
            debug!("Location lookup disabled");
            return Location::not_found();
        }

        for provider in &self.config.providers {
            match self.query(provider).await {
                Ok(location) => {
                    debug!("Location from {}: {}", provider, location.describe());
                    return location;
                }
                Err(e) => debug!("Location provider {} failed: {}", provider, e),
            }
        }

        Location::not_found()
    }

    async fn query(&self, provider: &str) -> Result<Location, LocationError> {
        let response = self
            .client
            .get(provider)
            .timeout(self.config.timeout)
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            return Err(LocationError::Status {
                status: response.status().as_u16(),
            });
        }

        let body: ProviderResponse = response.json().await?;
        body.into_location()
    }
}
