//! WMO weather interpretation codes

/// Label used for codes missing from the table
pub const UNKNOWN_CONDITION: &str = "Unknown";

/// Human-readable label for a WMO weather code
pub fn weather_description(code: i64) -> &'static str {
    match code {
        0 => "Clear sky",
        1 => "Mainly clear",
        2 => "Partly cloudy",
        3 => "Overcast",
        45 => "Fog",
        48 => "Depositing rime fog",
        51 => "Light drizzle",
        53 => "Moderate drizzle",
        55 => "Dense drizzle",
        56 => "Light freezing drizzle",
        57 => "Dense freezing drizzle",
        61 => "Slight rain",
        63 => "Moderate rain",
        65 => "Heavy rain",
        66 => "Light freezing rain",
        67 => "Heavy freezing rain",
        71 => "Slight snowfall",
        73 => "Moderate snowfall",
        75 => "Heavy snowfall",
        77 => "Snow grains",
        80 => "Slight rain showers",
        81 => "Moderate rain showers",
        82 => "Violent rain showers",
        85 => "Slight snow showers",
        86 => "Heavy snow showers",
        95 => "Thunderstorm",
        96 => "Thunderstorm with slight hail",
        99 => "Thunderstorm with heavy hail",
        _ => UNKNOWN_CONDITION,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes() {
        assert_eq!(weather_description(0), "Clear sky");
        assert_eq!(weather_description(63), "Moderate rain");
        assert_eq!(weather_description(95), "Thunderstorm");
    }

    #[test]
    fn test_unmapped_codes_fall_back_to_unknown() {
        for code in [-1, 4, 50, 100, 999, i64::MAX, i64::MIN] {
            assert_eq!(weather_description(code), UNKNOWN_CONDITION);
        }
    }
}
