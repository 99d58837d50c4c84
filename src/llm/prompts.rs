//! System prompts and prompt templates for the weather assistant

/// Marker that opens the live weather block inside a user message
pub const REAL_TIME_DATA_MARKER: &str = "[REAL-TIME DATA]";

/// Sentinel the city extractor answers with when no city is mentioned
pub const UNKNOWN_CITY: &str = "UNKNOWN";

/// Default system prompt for answers
pub const SYSTEM_PROMPT: &str = r#"You are Nimbus, a friendly weather assistant. Your answers are read aloud, so keep them short, clear and conversational.

When the user's message contains a [REAL-TIME DATA] block, base your answer on it: mention the place, the current temperature and conditions, and how the day develops. Never invent numbers that are not in the block.

When there is no [REAL-TIME DATA] block and the user asks about current weather, say that live data for that place is not available right now. Answer other questions normally.

Avoid markdown, tables, lists and URLs."#;

/// Few-shot prompt for the city extraction call
pub const CITY_EXTRACTION_PROMPT: &str = r#"Extract the city name from the user's message. Reply with the city name only. If no city is mentioned, reply with UNKNOWN.

Message: What's the weather in Paris?
City: Paris

Message: Will it rain in New York tomorrow?
City: New York

Message: How hot is it in São Paulo right now?
City: São Paulo

Message: Should I bring an umbrella today?
City: UNKNOWN

Message: Is it cold outside?
City: UNKNOWN"#;

/// Build the user turn for the city extraction call
pub fn city_extraction_query(user_input: &str) -> String {
    format!("Message: {}\nCity:", user_input.trim())
}

/// Build the user content, appending the live data block when present
pub fn build_user_content(question: &str, real_time_data: Option<&str>) -> String {
    match real_time_data {
        Some(data) if !data.trim().is_empty() => {
            format!(
                "{}\n\n{}\n{}",
                question.trim(),
                REAL_TIME_DATA_MARKER,
                data.trim_end()
            )
        }
        _ => question.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_content_without_data() {
        assert_eq!(build_user_content("  Hello? ", None), "Hello?");
        assert_eq!(build_user_content("Hello?", Some("   ")), "Hello?");
    }

    #[test]
    fn test_user_content_with_data() {
        let content = build_user_content("Weather?", Some("Location: Paris, France\n"));
        assert_eq!(
            content,
            "Weather?\n\n[REAL-TIME DATA]\nLocation: Paris, France"
        );
    }

    #[test]
    fn test_extraction_prompt_mentions_sentinel() {
        assert!(CITY_EXTRACTION_PROMPT.contains(UNKNOWN_CITY));
        assert!(city_extraction_query(" Paris? ").ends_with("City:"));
    }
}
