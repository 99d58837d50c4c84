//! Text cleanup before synthesis

/// Rewrite weather answers into something a TTS voice reads naturally
pub fn normalize_text_for_tts(text: &str) -> String {
    let mut result = text.to_string();

    let units = [
        ("°C", " degrees Celsius"),
        ("°F", " degrees Fahrenheit"),
        ("°", " degrees"),
        ("km/h", " kilometers per hour"),
        ("mm/h", " millimeters per hour"),
        ("%", " percent"),
        ("N/A", "not available"),
    ];

    for (unit, expansion) in units {
        result = result.replace(unit, expansion);
    }

    // Handle common symbols
    result = result.replace('&', " and ");
    result = result.replace('+', " plus ");

    // Drop markdown emphasis, headings and bullets
    result = result
        .lines()
        .map(|line| {
            let line = line.trim_start().trim_start_matches(['#', '>']).trim_start();
            line.strip_prefix("- ")
                .or_else(|| line.strip_prefix("• "))
                .unwrap_or(line)
                .to_string()
        })
        .collect::<Vec<_>>()
        .join(" ");
    result = result.replace(['*', '_', '`'], "");

    // Clean up whitespace
    result.split_whitespace().collect::<Vec<_>>().join(" ")
}
