//! LLM configuration for mistral.rs integration

use serde::Deserialize;

/// Quantization type for model weights
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuantizationType {
    /// No quantization (full precision)
    None,
    /// 4-bit quantization (Q4K)
    #[default]
    Q4K,
    /// 8-bit quantization (Q8_0)
    Q8_0,
    /// 4-bit quantization (Q4_0)
    Q4_0,
}

/// Configuration for the LLM engine and the completions it serves
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct LLMConfig {
    /// Model identifier (HuggingFace model ID or local path)
    pub model_id: String,

    /// Models offered by the model picker
    pub available_models: Vec<String>,

    /// Quantization type for model weights
    pub quantization: QuantizationType,

    /// Sampling temperature for answers
    pub temperature: f32,

    /// Maximum tokens to generate per answer (None = engine default)
    pub max_tokens: Option<usize>,

    /// Maximum tokens for the city extraction call
    pub classification_max_tokens: usize,

    /// Enable logging of inference details
    pub enable_logging: bool,
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            model_id: "meta-llama/Llama-3.2-1B-Instruct".to_string(),
            available_models: vec![
                "meta-llama/Llama-3.2-1B-Instruct".to_string(),
                "meta-llama/Llama-3.2-3B-Instruct".to_string(),
                "microsoft/Phi-3.5-mini-instruct".to_string(),
            ],
            quantization: QuantizationType::Q4K,
            temperature: 0.5,
            max_tokens: Some(512),
            classification_max_tokens: 16,
            enable_logging: false,
        }
    }
}

impl LLMConfig {
    /// Create a new LLM configuration with the specified model
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            ..Default::default()
        }
    }

    /// Set the quantization type
    pub fn with_quantization(mut self, quantization: QuantizationType) -> Self {
        self.quantization = quantization;
        self
    }

    /// Set the temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set maximum tokens
    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Replace the list of selectable models
    pub fn with_available_models(mut self, models: Vec<String>) -> Self {
        self.available_models = models;
        self
    }

    /// Enable inference logging
    pub fn with_logging(mut self, enable: bool) -> Self {
        self.enable_logging = enable;
        self
    }
}
