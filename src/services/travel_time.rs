//! Travel-time service for driving duration/distance matrices
//!
//! Uses the Google Distance Matrix API in production, a Haversine-based
//! mock when no API key is configured.
//!
//! Matrix layout convention: row 0 is the route's start location, rows
//! 1..=N are the day's jobs as origins, columns are the day's jobs as
//! destinations. Travel from job `i` to job `j` therefore lives at
//! `rows[i + 1].elements[j]`.

use async_trait::async_trait;
use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::services::geo::haversine_distance;
use crate::types::Coordinates;

/// A duration or distance with the provider's display text
#[derive(Debug, Clone, Deserialize)]
pub struct TextValue {
    /// Seconds for durations, meters for distances
    pub value: i64,
    pub text: String,
}

/// One origin/destination pair
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MatrixElement {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub duration: Option<TextValue>,
    #[serde(default)]
    pub distance: Option<TextValue>,
}

impl MatrixElement {
    fn is_ok(&self) -> bool {
        match self.status.as_deref() {
            Some(status) => status == "OK",
            None => true,
        }
    }
}

/// One origin's row of destination elements
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MatrixRow {
    #[serde(default)]
    pub elements: Vec<MatrixElement>,
}

/// Pairwise driving durations/distances for one day's route
#[derive(Debug, Clone, Default)]
pub struct TravelMatrix {
    pub rows: Vec<MatrixRow>,
}

impl TravelMatrix {
    pub fn empty() -> Self {
        Self { rows: vec![] }
    }

    fn element(&self, from_job: usize, to_job: usize) -> Option<&MatrixElement> {
        self.rows
            .get(from_job + 1)?
            .elements
            .get(to_job)
            .filter(|element| element.is_ok())
    }

    /// Driving seconds from job `from_job` to job `to_job`, if known
    pub fn duration_seconds(&self, from_job: usize, to_job: usize) -> Option<i64> {
        self.element(from_job, to_job)?
            .duration
            .as_ref()
            .map(|d| d.value)
    }

    /// Provider's display text for the same leg ("12 mins")
    pub fn duration_text(&self, from_job: usize, to_job: usize) -> Option<&str> {
        self.element(from_job, to_job)?
            .duration
            .as_ref()
            .map(|d| d.text.as_str())
    }
}

/// Travel-time service trait (Google Distance Matrix, mock, etc.)
#[async_trait]
pub trait TravelTimeService: Send + Sync {
    /// Pairwise matrix for [origin] + destinations against destinations
    async fn distance_matrix(
        &self,
        origin: &Coordinates,
        destinations: &[Coordinates],
    ) -> Result<TravelMatrix>;

    /// Service name for logging
    fn name(&self) -> &str;
}

/// Google Distance Matrix client configuration
#[derive(Debug, Clone)]
pub struct GoogleMapsConfig {
    pub base_url: String,
    pub api_key: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl GoogleMapsConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            timeout_seconds: 30,
        }
    }
}

/// Google Distance Matrix client
pub struct GoogleMapsClient {
    client: Client,
    config: GoogleMapsConfig,
}

#[derive(Debug, Deserialize)]
struct DistanceMatrixResponse {
    status: String,
    #[serde(default)]
    rows: Vec<MatrixRow>,
    #[serde(default)]
    error_message: Option<String>,
}

impl GoogleMapsClient {
    pub fn new(config: GoogleMapsConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .build()
            .expect("Failed to create HTTP client");

        Self { client, config }
    }

    fn format_locations(locations: &[Coordinates]) -> String {
        locations
            .iter()
            .map(|c| format!("{},{}", c.lat, c.lng))
            .collect::<Vec<_>>()
            .join("|")
    }

    fn build_url(&self, origin: &Coordinates, destinations: &[Coordinates]) -> String {
        // Rows 1..=N need each destination as an origin too.
        let mut origins = Vec::with_capacity(destinations.len() + 1);
        origins.push(*origin);
        origins.extend_from_slice(destinations);

        format!(
            "{}?origins={}&destinations={}&mode=driving&key={}",
            self.config.base_url,
            urlencoding::encode(&Self::format_locations(&origins)),
            urlencoding::encode(&Self::format_locations(destinations)),
            self.config.api_key,
        )
    }
}

#[async_trait]
impl TravelTimeService for GoogleMapsClient {
    async fn distance_matrix(
        &self,
        origin: &Coordinates,
        destinations: &[Coordinates],
    ) -> Result<TravelMatrix> {
        if destinations.is_empty() {
            return Ok(TravelMatrix::empty());
        }

        let url = self.build_url(origin, destinations);
        debug!(
            "Requesting distance matrix for {} destinations",
            destinations.len()
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to send distance matrix request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Distance matrix API returned error {}: {}", status, body);
        }

        let matrix_response: DistanceMatrixResponse = response
            .json()
            .await
            .context("Failed to parse distance matrix response")?;

        if matrix_response.status != "OK" {
            anyhow::bail!(
                "Distance matrix API status {}: {}",
                matrix_response.status,
                matrix_response.error_message.unwrap_or_default()
            );
        }

        debug!(
            "Received distance matrix: {} rows x {} destinations",
            matrix_response.rows.len(),
            destinations.len()
        );

        Ok(TravelMatrix { rows: matrix_response.rows })
    }

    fn name(&self) -> &str {
        "GoogleDistanceMatrix"
    }
}

/// Mock travel-time service for tests and keyless deployments.
/// Uses Haversine distance × coefficient for estimation.
pub struct MockTravelTimeService {
    /// Straight line to road distance coefficient
    road_coefficient: f64,
    /// Average speed in km/h for time estimation
    average_speed_kmh: f64,
}

impl Default for MockTravelTimeService {
    fn default() -> Self {
        Self {
            road_coefficient: 1.3,
            average_speed_kmh: 40.0,
        }
    }
}

impl MockTravelTimeService {
    pub fn new() -> Self {
        Self::default()
    }

    fn estimate(&self, from: &Coordinates, to: &Coordinates) -> MatrixElement {
        let straight_line_km = haversine_distance(from, to);
        let road_km = straight_line_km * self.road_coefficient;
        let seconds = (road_km / self.average_speed_kmh * 3600.0) as i64;
        let minutes = (seconds as f64 / 60.0).ceil() as i64;

        MatrixElement {
            status: Some("OK".to_string()),
            duration: Some(TextValue {
                value: seconds,
                text: format!("{} mins", minutes),
            }),
            distance: Some(TextValue {
                value: (road_km * 1000.0) as i64,
                text: format!("{:.1} km", road_km),
            }),
        }
    }
}

#[async_trait]
impl TravelTimeService for MockTravelTimeService {
    async fn distance_matrix(
        &self,
        origin: &Coordinates,
        destinations: &[Coordinates],
    ) -> Result<TravelMatrix> {
        if destinations.is_empty() {
            return Ok(TravelMatrix::empty());
        }

        let mut origins = Vec::with_capacity(destinations.len() + 1);
        origins.push(*origin);
        origins.extend_from_slice(destinations);

        let rows = origins
            .iter()
            .map(|from| MatrixRow {
                elements: destinations
                    .iter()
                    .map(|to| self.estimate(from, to))
                    .collect(),
            })
            .collect();

        Ok(TravelMatrix { rows })
    }

    fn name(&self) -> &str {
        "MockTravelTime"
    }
}

/// Create the travel-time service from configuration.
///
/// Falls back to the Haversine mock when no API key is configured, so the
/// worker stays usable in development.
pub fn create_travel_time_service(
    api_key: Option<String>,
    base_url: &str,
) -> Box<dyn TravelTimeService> {
    match api_key {
        Some(key) if !key.is_empty() => {
            info!("Using Google Distance Matrix for travel times");
            Box::new(GoogleMapsClient::new(GoogleMapsConfig::new(base_url, key)))
        }
        _ => {
            warn!("GOOGLE_MAPS_API_KEY not set, using Haversine travel-time estimates");
            Box::new(MockTravelTimeService::new())
        }
    }
}
