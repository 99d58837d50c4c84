//! Deciding whether a question needs live weather, and for which city

use crate::llm::prompts::{city_extraction_query, CITY_EXTRACTION_PROMPT, UNKNOWN_CITY};
use crate::messages::ChatMessage;

/// Terms that mark a question as weather related
pub const DEFAULT_WEATHER_KEYWORDS: &[&str] = &[
    "weather",
    "forecast",
    "temperature",
    "rain",
    "snow",
    "sunny",
    "sun",
    "wind",
    "humid",
    "cloud",
    "storm",
    "thunder",
    "fog",
    "hot",
    "cold",
    "warm",
    "umbrella",
    "degrees",
    "climate",
    "météo",
    "clima",
];

/// Leading phrase small models like to put before the city
const CITY_PREFIX: &str = "the city is";

/// Keyword heuristic run before the classification call
#[derive(Debug, Clone)]
pub struct IntentDetector {
    keywords: Vec<String>,
}

impl Default for IntentDetector {
    fn default() -> Self {
        Self::new(DEFAULT_WEATHER_KEYWORDS.iter().map(|k| k.to_string()))
    }
}

impl IntentDetector {
    pub fn new(keywords: impl IntoIterator<Item = String>) -> Self {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    /// True when any word of `input` starts with a weather keyword
    pub fn needs_weather(&self, input: &str) -> bool {
        let input = input.to_lowercase();
        input
            .split(|c: char| !c.is_alphanumeric())
            .filter(|word| !word.is_empty())
            .any(|word| self.keywords.iter().any(|k| word.starts_with(k.as_str())))
    }
}

/// Messages for the deterministic city extraction call
pub fn classification_messages(user_input: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(CITY_EXTRACTION_PROMPT),
        ChatMessage::user(city_extraction_query(user_input)),
    ]
}

/// Turn the extractor's reply into a city name, or `None` for no city
pub fn parse_city_reply(reply: &str) -> Option<String> {
    let mut city = reply.trim().lines().next().unwrap_or_default().trim();

    if city
        .get(..CITY_PREFIX.len())
        .is_some_and(|p| p.eq_ignore_ascii_case(CITY_PREFIX))
    {
        city = city[CITY_PREFIX.len()..].trim_start();
    }
    if city
        .get(..5)
        .is_some_and(|p| p.eq_ignore_ascii_case("city:"))
    {
        city = city[5..].trim_start();
    }

    let city = city
        .trim_matches(|c: char| c.is_whitespace() || "\"'`.,!?:;*".contains(c))
        .to_string();

    if city.is_empty() || city.eq_ignore_ascii_case(UNKNOWN_CITY) {
        None
    } else {
        Some(city)
    }
}
