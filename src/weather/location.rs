//! Location queries and device geolocation

use crate::{NimbusError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

/// A geographic position in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// What the weather lookup should resolve
#[derive(Debug, Clone, PartialEq)]
pub enum LocationQuery {
    CityName(String),
    Coordinates(Coordinates),
}

impl fmt::Display for LocationQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationQuery::CityName(name) => write!(f, "\"{}\"", name),
            LocationQuery::Coordinates(c) => write!(f, "({:.2}, {:.2})", c.latitude, c.longitude),
        }
    }
}

/// How the device position is obtained
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum LocationConfig {
    /// Location access is not granted
    Disabled,
    /// A position set by the user
    Fixed { latitude: f64, longitude: f64 },
    /// Approximate position from the public IP address
    #[default]
    IpLookup,
}

/// One-shot source of the device position
#[async_trait]
pub trait Geolocator: Send + Sync {
    async fn locate(&self) -> Result<Coordinates>;
}

/// Always answers with the same position, or refuses when disabled
pub struct FixedGeolocator {
    coordinates: Option<Coordinates>,
}

impl FixedGeolocator {
    pub fn new(coordinates: Coordinates) -> Self {
        Self {
            coordinates: Some(coordinates),
        }
    }

    pub fn denied() -> Self {
        Self { coordinates: None }
    }
}

#[async_trait]
impl Geolocator for FixedGeolocator {
    async fn locate(&self) -> Result<Coordinates> {
        self.coordinates.ok_or_else(|| {
            NimbusError::GeolocationError("Location access is disabled".to_string())
        })
    }
}

#[derive(Debug, Deserialize)]
struct IpLocationResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lon: Option<f64>,
}

/// Approximates the device position from the public IP address
pub struct IpGeolocator {
    http: reqwest::Client,
    url: String,
}

impl IpGeolocator {
    pub const DEFAULT_URL: &'static str = "http://ip-api.com/json/?fields=status,message,lat,lon";

    pub fn new(url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| NimbusError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            url: url.into(),
        })
    }
}

fn parse_ip_location(body: &str) -> Result<Coordinates> {
    let response: IpLocationResponse = serde_json::from_str(body).map_err(|e| {
        NimbusError::GeolocationError(format!("Malformed location response: {}", e))
    })?;

    if response.status != "success" {
        return Err(NimbusError::GeolocationError(format!(
            "Location unavailable: {}",
            response.message.unwrap_or_else(|| response.status.clone())
        )));
    }

    match (response.lat, response.lon) {
        (Some(lat), Some(lon)) => Ok(Coordinates::new(lat, lon)),
        _ => Err(NimbusError::GeolocationError(
            "Location unavailable: response has no coordinates".to_string(),
        )),
    }
}

#[async_trait]
impl Geolocator for IpGeolocator {
    async fn locate(&self) -> Result<Coordinates> {
        debug!("Requesting IP geolocation from {}", self.url);

        let body = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(|e| {
                warn!("IP geolocation request failed: {}", e);
                NimbusError::GeolocationError(format!("Location unavailable: {}", e))
            })?
            .text()
            .await
            .map_err(|e| NimbusError::GeolocationError(format!("Location unavailable: {}", e)))?;

        parse_ip_location(&body)
    }
}

/// Build the geolocator selected by configuration
pub fn geolocator_from_config(config: &LocationConfig) -> Result<Box<dyn Geolocator>> {
    Ok(match config {
        LocationConfig::Disabled => Box::new(FixedGeolocator::denied()),
        LocationConfig::Fixed {
            latitude,
            longitude,
        } => Box::new(FixedGeolocator::new(Coordinates::new(*latitude, *longitude))),
        LocationConfig::IpLookup => Box::new(IpGeolocator::new(IpGeolocator::DEFAULT_URL)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fixed_geolocator() {
        let located = FixedGeolocator::new(Coordinates::new(1.5, 2.5))
            .locate()
            .await
            .unwrap();
        assert_eq!(located, Coordinates::new(1.5, 2.5));

        let denied = FixedGeolocator::denied().locate().await;
        assert!(matches!(denied, Err(NimbusError::GeolocationError(_))));
    }

    #[test]
    fn test_parse_ip_location() {
        let coords = parse_ip_location(r#"{"status":"success","lat":48.85,"lon":2.35}"#).unwrap();
        assert_eq!(coords, Coordinates::new(48.85, 2.35));

        let failed = parse_ip_location(r#"{"status":"fail","message":"private range"}"#);
        assert!(failed.unwrap_err().to_string().contains("private range"));

        assert!(parse_ip_location("not json").is_err());
        assert!(parse_ip_location(r#"{"status":"success"}"#).is_err());
    }

    #[test]
    fn test_location_config_from_toml() {
        let config: LocationConfig =
            toml::from_str("mode = \"fixed\"\nlatitude = 10.0\nlongitude = 20.0").unwrap();
        assert_eq!(
            config,
            LocationConfig::Fixed {
                latitude: 10.0,
                longitude: 20.0
            }
        );
        assert_eq!(LocationConfig::default(), LocationConfig::IpLookup);
    }

    #[test]
    fn test_query_display() {
        assert_eq!(LocationQuery::CityName("Oslo".into()).to_string(), "\"Oslo\"");
        assert_eq!(
            LocationQuery::Coordinates(Coordinates::new(1.0, 2.0)).to_string(),
            "(1.00, 2.00)"
        );
    }
}
