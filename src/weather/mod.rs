//! Live weather lookup
//!
//! Resolves a city name or coordinates to a short summary of current
//! conditions and three samples of today's forecast, using Open-Meteo.

pub mod client;
pub mod codes;
pub mod location;
pub mod summary;

pub use client::{OpenMeteoClient, WeatherConfig, WeatherProvider};
pub use codes::{weather_description, UNKNOWN_CONDITION};
pub use location::{
    geolocator_from_config, Coordinates, FixedGeolocator, Geolocator, IpGeolocator,
    LocationConfig, LocationQuery,
};
pub use summary::{DayPart, ForecastSample, WeatherSummary, NOT_AVAILABLE};
