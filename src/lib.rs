pub mod integration;
pub mod llm;
pub mod messages;
pub mod speech;
pub mod ui;
pub mod weather;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum NimbusError {
    #[error("Model load error: {0}")]
    ModelLoadError(String),

    #[error("Inference error: {0}")]
    InferenceError(String),

    #[error("Weather error: {0}")]
    WeatherError(String),

    #[error("Geolocation error: {0}")]
    GeolocationError(String),

    #[error("TTS error: {0}")]
    TTSError(String),

    #[error("Audio device error: {0}")]
    AudioDeviceError(String),

    #[error("IO error: {0}")]
    IOError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Channel error: {0}")]
    ChannelError(String),

    #[error("Orchestrator error: {0}")]
    OrchestratorError(String),
}

impl From<std::io::Error> for NimbusError {
    fn from(e: std::io::Error) -> Self {
        NimbusError::IOError(e.to_string())
    }
}

impl NimbusError {
    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            // Loading can be retried from the UI
            NimbusError::ModelLoadError(_) => true,
            NimbusError::InferenceError(_) => true,
            // Weather is optional context
            NimbusError::WeatherError(_) => true,
            // The user has to grant access or configure a location
            NimbusError::GeolocationError(_) => false,
            NimbusError::TTSError(_) => true,
            NimbusError::AudioDeviceError(_) => false,
            NimbusError::IOError(_) => false,
            NimbusError::ConfigError(_) => false,
            NimbusError::ChannelError(_) => false,
            NimbusError::OrchestratorError(_) => true,
        }
    }

    /// Get a user-friendly description
    pub fn user_message(&self) -> String {
        match self {
            NimbusError::ModelLoadError(_) => {
                "Failed to load AI model. Please try loading it again.".to_string()
            }
            NimbusError::InferenceError(_) => {
                "AI response generation failed. Please try again.".to_string()
            }
            NimbusError::WeatherError(_) => {
                "Live weather data is unavailable right now.".to_string()
            }
            NimbusError::GeolocationError(_) => {
                "Unable to determine your location. Check location permissions or settings."
                    .to_string()
            }
            NimbusError::TTSError(_) => {
                "Text-to-speech failed. Response will be shown as text.".to_string()
            }
            NimbusError::AudioDeviceError(_) => {
                "Audio device error. Please check your speakers.".to_string()
            }
            NimbusError::IOError(_) => "File system error occurred.".to_string(),
            NimbusError::ConfigError(_) => {
                "Configuration error. Please check settings.".to_string()
            }
            NimbusError::ChannelError(_) => {
                "Internal communication error. Please restart the application.".to_string()
            }
            NimbusError::OrchestratorError(_) => {
                "System error occurred. Please try again.".to_string()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, NimbusError>;
