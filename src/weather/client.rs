//! Open-Meteo geocoding and forecast client

use crate::weather::location::LocationQuery;
use crate::weather::summary::WeatherSummary;
use crate::{NimbusError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Label used when the query already carries coordinates
pub const COORDINATES_LABEL: &str = "your location";

/// Configuration for the weather client
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// Geocoding search endpoint
    pub geocoding_url: String,

    /// Forecast endpoint
    pub forecast_url: String,

    /// Language for geocoded place names
    pub language: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// User agent sent with every request
    pub user_agent: String,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            geocoding_url: "https://geocoding-api.open-meteo.com/v1/search".to_string(),
            forecast_url: "https://api.open-meteo.com/v1/forecast".to_string(),
            language: "en".to_string(),
            timeout_secs: 10,
            user_agent: concat!("Nimbus/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl WeatherConfig {
    /// Point both endpoints at another host (e.g. a local mirror)
    pub fn with_base_urls(
        mut self,
        geocoding_url: impl Into<String>,
        forecast_url: impl Into<String>,
    ) -> Self {
        self.geocoding_url = geocoding_url.into();
        self.forecast_url = forecast_url.into();
        self
    }

    /// Set the language for place names
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

/// Geocoding endpoint response
#[derive(Debug, Clone, Deserialize)]
pub struct GeocodingResponse {
    #[serde(default)]
    pub results: Option<Vec<GeocodedPlace>>,
}

/// A single geocoding match
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeocodedPlace {
    pub latitude: f64,
    pub longitude: f64,
    pub name: String,
    #[serde(default)]
    pub country: Option<String>,
}

impl GeocodedPlace {
    /// "Paris, France", or just the name when the country is unknown
    pub fn label(&self) -> String {
        match &self.country {
            Some(country) if !country.is_empty() => format!("{}, {}", self.name, country),
            _ => self.name.clone(),
        }
    }
}

/// Forecast endpoint response
#[derive(Debug, Clone, Deserialize)]
pub struct ForecastResponse {
    pub current: CurrentWeather,
    #[serde(default)]
    pub hourly: HourlySeries,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CurrentWeather {
    pub temperature_2m: f64,
    pub relative_humidity_2m: f64,
    pub wind_speed_10m: f64,
    pub weather_code: i64,
}

/// Hourly values as parallel arrays indexed by timestamp
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HourlySeries {
    #[serde(default)]
    pub time: Vec<String>,
    #[serde(default)]
    pub temperature_2m: Vec<Option<f64>>,
    #[serde(default)]
    pub weather_code: Vec<Option<i64>>,
}

/// Parse a geocoding body, returning the first match if any
pub fn parse_geocoding(body: &str) -> Result<Option<GeocodedPlace>> {
    let response: GeocodingResponse = serde_json::from_str(body)
        .map_err(|e| NimbusError::WeatherError(format!("Malformed geocoding response: {}", e)))?;
    Ok(response.results.and_then(|results| results.into_iter().next()))
}

/// Parse a forecast body
pub fn parse_forecast(body: &str) -> Result<ForecastResponse> {
    serde_json::from_str(body)
        .map_err(|e| NimbusError::WeatherError(format!("Malformed forecast response: {}", e)))
}

/// Source of weather summaries for the orchestrator
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Resolve a location to a summary. `None` means no context is available.
    async fn resolve(&self, query: &LocationQuery) -> Option<WeatherSummary>;
}

/// HTTP client for the Open-Meteo APIs
pub struct OpenMeteoClient {
    http: reqwest::Client,
    config: WeatherConfig,
}

impl OpenMeteoClient {
    pub fn new(config: WeatherConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| NimbusError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    pub fn config(&self) -> &WeatherConfig {
        &self.config
    }

    async fn get_text(&self, url: &str, query: &[(&str, String)]) -> Result<String> {
        let response = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| NimbusError::WeatherError(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NimbusError::WeatherError(format!(
                "{} returned HTTP {}",
                url, status
            )));
        }

        response
            .text()
            .await
            .map_err(|e| NimbusError::WeatherError(format!("Failed to read response: {}", e)))
    }

    /// Look up a city by name
    pub async fn geocode(&self, name: &str) -> Result<Option<GeocodedPlace>> {
        let body = self
            .get_text(
                &self.config.geocoding_url,
                &[
                    ("name", name.to_string()),
                    ("count", "1".to_string()),
                    ("language", self.config.language.clone()),
                    ("format", "json".to_string()),
                ],
            )
            .await?;

        parse_geocoding(&body)
    }

    /// Fetch current conditions and today's hourly series
    pub async fn forecast(&self, latitude: f64, longitude: f64) -> Result<ForecastResponse> {
        let body = self
            .get_text(
                &self.config.forecast_url,
                &[
                    ("latitude", latitude.to_string()),
                    ("longitude", longitude.to_string()),
                    (
                        "current",
                        "temperature_2m,relative_humidity_2m,weather_code,wind_speed_10m"
                            .to_string(),
                    ),
                    ("hourly", "temperature_2m,weather_code".to_string()),
                    ("timezone", "auto".to_string()),
                    ("forecast_days", "1".to_string()),
                ],
            )
            .await?;

        parse_forecast(&body)
    }

    async fn try_resolve(&self, query: &LocationQuery) -> Result<Option<WeatherSummary>> {
        let (label, latitude, longitude) = match query {
            LocationQuery::Coordinates(coords) => (
                COORDINATES_LABEL.to_string(),
                coords.latitude,
                coords.longitude,
            ),
            LocationQuery::CityName(name) => match self.geocode(name).await? {
                Some(place) => (place.label(), place.latitude, place.longitude),
                None => return Ok(None),
            },
        };

        debug!("Fetching forecast for {} ({}, {})", label, latitude, longitude);
        let forecast = self.forecast(latitude, longitude).await?;
        Ok(Some(WeatherSummary::from_forecast(label, &forecast)))
    }
}

#[async_trait]
impl WeatherProvider for OpenMeteoClient {
    async fn resolve(&self, query: &LocationQuery) -> Option<WeatherSummary> {
        match self.try_resolve(query).await {
            Ok(Some(summary)) => {
                info!("Resolved weather for {}", summary.location);
                Some(summary)
            }
            Ok(None) => {
                warn!("No geocoding match for {}", query);
                None
            }
            Err(e) => {
                warn!("Weather lookup for {} failed: {}", query, e);
                None
            }
        }
    }
}
