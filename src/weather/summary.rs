//! Compact natural-language weather summaries
//!
//! Built fresh for every query from a forecast response and never stored.

use crate::weather::client::{CurrentWeather, ForecastResponse, HourlySeries};
use crate::weather::codes::weather_description;
use std::fmt;

/// Placeholder rendered for a missing forecast sample
pub const NOT_AVAILABLE: &str = "N/A";

/// Parts of the day sampled from the hourly series
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayPart {
    Morning,
    Afternoon,
    Night,
}

impl DayPart {
    pub const ALL: [DayPart; 3] = [DayPart::Morning, DayPart::Afternoon, DayPart::Night];

    pub fn label(&self) -> &'static str {
        match self {
            DayPart::Morning => "Morning",
            DayPart::Afternoon => "Afternoon",
            DayPart::Night => "Night",
        }
    }

    /// Local clock time of the sample
    pub fn clock(&self) -> &'static str {
        match self {
            DayPart::Morning => "09:00",
            DayPart::Afternoon => "15:00",
            DayPart::Night => "21:00",
        }
    }

    /// Suffix an hourly timestamp must end with to be this sample.
    ///
    /// Exact minute-granularity match: an API response without a `T09:00`
    /// entry yields no morning sample.
    pub fn time_suffix(&self) -> String {
        format!("T{}", self.clock())
    }
}

/// Temperature and condition at one point in time
#[derive(Debug, Clone, PartialEq)]
pub struct SampleReading {
    pub temperature_celsius: f64,
    pub condition_label: String,
}

/// One forecast sample, possibly missing from the hourly series
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastSample {
    pub part: DayPart,
    pub reading: Option<SampleReading>,
}

impl ForecastSample {
    /// Pick the sample for `part` from parallel hourly arrays
    pub fn from_hourly(part: DayPart, hourly: &HourlySeries) -> Self {
        let suffix = part.time_suffix();
        let reading = hourly
            .time
            .iter()
            .position(|t| t.ends_with(&suffix))
            .and_then(|idx| {
                let temperature = (*hourly.temperature_2m.get(idx)?)?;
                let code = (*hourly.weather_code.get(idx)?)?;
                Some(SampleReading {
                    temperature_celsius: temperature,
                    condition_label: weather_description(code).to_string(),
                })
            });

        Self { part, reading }
    }
}

impl fmt::Display for ForecastSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): ", self.part.label(), self.part.clock())?;
        match &self.reading {
            Some(reading) => write!(
                f,
                "{}, {}",
                format_celsius(reading.temperature_celsius),
                reading.condition_label
            ),
            None => f.write_str(NOT_AVAILABLE),
        }
    }
}

/// Current conditions at the resolved location
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentConditions {
    pub temperature_celsius: f64,
    pub relative_humidity: f64,
    pub wind_speed_kmh: f64,
    pub condition_label: String,
}

impl From<&CurrentWeather> for CurrentConditions {
    fn from(current: &CurrentWeather) -> Self {
        Self {
            temperature_celsius: current.temperature_2m,
            relative_humidity: current.relative_humidity_2m,
            wind_speed_kmh: current.wind_speed_10m,
            condition_label: weather_description(current.weather_code).to_string(),
        }
    }
}

/// Weather for one location: now plus three samples of today
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherSummary {
    pub location: String,
    pub current: CurrentConditions,
    pub forecast: Vec<ForecastSample>,
}

impl WeatherSummary {
    pub fn from_forecast(location: impl Into<String>, response: &ForecastResponse) -> Self {
        Self {
            location: location.into(),
            current: CurrentConditions::from(&response.current),
            forecast: DayPart::ALL
                .iter()
                .map(|part| ForecastSample::from_hourly(*part, &response.hourly))
                .collect(),
        }
    }

    /// Text spliced into the prompt after the real-time data marker
    pub fn to_context_block(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for WeatherSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Location: {}", self.location)?;
        writeln!(
            f,
            "Current: {}, {}, humidity {}%, wind {} km/h",
            format_celsius(self.current.temperature_celsius),
            self.current.condition_label,
            round_tenth(self.current.relative_humidity),
            round_tenth(self.current.wind_speed_kmh)
        )?;
        for sample in &self.forecast {
            writeln!(f, "{}", sample)?;
        }
        Ok(())
    }
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// `18.0` renders as `18°C`, `18.44` as `18.4°C`
pub fn format_celsius(value: f64) -> String {
    format!("{}°C", round_tenth(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hourly(entries: &[(&str, Option<f64>, Option<i64>)]) -> HourlySeries {
        HourlySeries {
            time: entries.iter().map(|e| e.0.to_string()).collect(),
            temperature_2m: entries.iter().map(|e| e.1).collect(),
            weather_code: entries.iter().map(|e| e.2).collect(),
        }
    }

    fn current() -> CurrentWeather {
        CurrentWeather {
            temperature_2m: 18.0,
            relative_humidity_2m: 60.0,
            wind_speed_10m: 12.3,
            weather_code: 2,
        }
    }

    #[test]
    fn test_format_celsius() {
        assert_eq!(format_celsius(18.0), "18°C");
        assert_eq!(format_celsius(18.44), "18.4°C");
        assert_eq!(format_celsius(-3.0), "-3°C");
    }

    #[test]
    fn test_samples_picked_by_suffix() {
        let series = hourly(&[
            ("2024-06-01T08:00", Some(14.0), Some(0)),
            ("2024-06-01T09:00", Some(15.0), Some(1)),
            ("2024-06-01T15:00", Some(21.5), Some(3)),
            ("2024-06-01T21:00", Some(16.0), Some(61)),
        ]);
        let response = ForecastResponse {
            current: current(),
            hourly: series,
        };

        let summary = WeatherSummary::from_forecast("Paris, France", &response);
        let text = summary.to_context_block();

        assert!(text.contains("Location: Paris, France"));
        assert!(text.contains("Current: 18°C, Partly cloudy, humidity 60%, wind 12.3 km/h"));
        assert!(text.contains("Morning (09:00): 15°C, Mainly clear"));
        assert!(text.contains("Afternoon (15:00): 21.5°C, Overcast"));
        assert!(text.contains("Night (21:00): 16°C, Slight rain"));
    }

    #[test]
    fn test_missing_hours_render_not_available() {
        let response = ForecastResponse {
            current: current(),
            hourly: hourly(&[("2024-06-01T10:00", Some(15.0), Some(0))]),
        };

        let summary = WeatherSummary::from_forecast("Somewhere", &response);
        let text = summary.to_string();

        assert!(summary.forecast.iter().all(|s| s.reading.is_none()));
        assert!(text.contains("Morning (09:00): N/A"));
        assert!(text.contains("Afternoon (15:00): N/A"));
        assert!(text.contains("Night (21:00): N/A"));
    }

    #[test]
    fn test_short_parallel_arrays_render_not_available() {
        let series = HourlySeries {
            time: vec!["2024-06-01T09:00".into(), "2024-06-01T15:00".into()],
            temperature_2m: vec![Some(15.0)],
            weather_code: vec![Some(0), Some(0)],
        };

        let morning = ForecastSample::from_hourly(DayPart::Morning, &series);
        let afternoon = ForecastSample::from_hourly(DayPart::Afternoon, &series);

        assert!(morning.reading.is_some());
        assert!(afternoon.reading.is_none());
    }

    #[test]
    fn test_null_values_render_not_available() {
        let series = hourly(&[("2024-06-01T21:00", None, Some(0))]);
        let night = ForecastSample::from_hourly(DayPart::Night, &series);
        assert_eq!(night.to_string(), "Night (21:00): N/A");
    }

    #[test]
    fn test_suffix_match_is_minute_exact() {
        let series = hourly(&[("2024-06-01T09:00:00", Some(15.0), Some(0))]);
        let morning = ForecastSample::from_hourly(DayPart::Morning, &series);
        assert!(morning.reading.is_none());
    }
}
