//! Configuration for the integration layer
//!
//! Provides centralized configuration for all components, loaded from a TOML
//! file when one exists.

use crate::integration::intent::DEFAULT_WEATHER_KEYWORDS;
use crate::llm::config::LLMConfig;
use crate::llm::prompts::SYSTEM_PROMPT;
use crate::speech::synth::SpeechConfig;
use crate::weather::client::WeatherConfig;
use crate::weather::location::LocationConfig;
use crate::{NimbusError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Behaviour of the assistant itself
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    /// System instruction sent with every answer
    pub system_prompt: String,

    /// Question asked on behalf of the user by the location shortcut
    pub location_question: String,

    /// Terms that send a question through city extraction
    pub weather_keywords: Vec<String>,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            system_prompt: SYSTEM_PROMPT.to_string(),
            location_question: "What's the weather like at my location right now?".to_string(),
            weather_keywords: DEFAULT_WEATHER_KEYWORDS
                .iter()
                .map(|k| k.to_string())
                .collect(),
        }
    }
}

/// Configuration for the complete application
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub assistant: AssistantConfig,

    /// LLM configuration
    pub llm: LLMConfig,

    /// Open-Meteo client configuration
    pub weather: WeatherConfig,

    /// Spoken output configuration
    pub speech: SpeechConfig,

    /// Where "my location" comes from
    pub location: LocationConfig,
}

impl AppConfig {
    /// `<config dir>/nimbus/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("nimbus").join("config.toml"))
    }

    /// Parse a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| NimbusError::ConfigError(format!("Invalid configuration: {}", e)))
    }

    /// Load from an explicit file. A missing file is an error.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            NimbusError::ConfigError(format!("Cannot read {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml_str(&content)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load from the default location, or use defaults when no file exists
    pub fn load_default() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => {
                debug!("No configuration file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Set the LLM configuration
    pub fn with_llm(mut self, llm: LLMConfig) -> Self {
        self.llm = llm;
        self
    }

    /// Set the weather client configuration
    pub fn with_weather(mut self, weather: WeatherConfig) -> Self {
        self.weather = weather;
        self
    }

    /// Set where the device location comes from
    pub fn with_location(mut self, location: LocationConfig) -> Self {
        self.location = location;
        self
    }

    /// Disable audio output (text-only mode)
    pub fn without_audio_output(mut self) -> Self {
        self.speech.enabled = false;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.llm.model_id.trim().is_empty() {
            return Err(NimbusError::ConfigError("LLM model id is required".into()));
        }

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(NimbusError::ConfigError(format!(
                "Temperature must be between 0 and 2, got {}",
                self.llm.temperature
            )));
        }

        if self.llm.classification_max_tokens == 0 {
            return Err(NimbusError::ConfigError(
                "classification_max_tokens must be at least 1".into(),
            ));
        }

        if self.weather.timeout_secs == 0 {
            return Err(NimbusError::ConfigError(
                "Weather timeout must be at least one second".into(),
            ));
        }

        if !(0.0..=1.0).contains(&self.speech.volume) {
            return Err(NimbusError::ConfigError(format!(
                "Speech volume must be between 0 and 1, got {}",
                self.speech.volume
            )));
        }

        if self.speech.rate <= 0.0 {
            return Err(NimbusError::ConfigError(format!(
                "Speech rate must be positive, got {}",
                self.speech.rate
            )));
        }

        for voice in &self.speech.voices {
            if voice.model_path.is_empty() || voice.tokens_path.is_empty() {
                return Err(NimbusError::ConfigError(format!(
                    "Voice {} needs both model_path and tokens_path",
                    voice.name
                )));
            }
        }

        if let LocationConfig::Fixed {
            latitude,
            longitude,
        } = self.location
        {
            if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
                return Err(NimbusError::ConfigError(format!(
                    "Fixed location out of range: {}, {}",
                    latitude, longitude
                )));
            }
        }

        Ok(())
    }
}
