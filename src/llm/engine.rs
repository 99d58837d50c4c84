//! LLM inference engine using mistral.rs

use crate::llm::config::{LLMConfig, QuantizationType};
use crate::llm::inference::{ChatEngine, CompletionOptions, ProgressSender};
use crate::messages::{ChatMessage, Role};
use crate::{NimbusError, Result};
use async_trait::async_trait;
use futures::StreamExt;
use mistralrs::{IsqType, RequestBuilder, Response, TextMessageRole, TextModelBuilder};
use tokio::sync::mpsc;
use tracing::{debug, info};

/// LLM inference engine wrapping mistral.rs
pub struct LLMEngine {
    model_id: String,
    model: mistralrs::Model,
}

impl LLMEngine {
    /// Download (if needed) and load the model
    pub async fn load(config: LLMConfig, progress: ProgressSender) -> Result<Self> {
        info!("Initializing LLM engine with model: {}", config.model_id);

        let isq_type = match config.quantization {
            QuantizationType::None => None,
            QuantizationType::Q4K => Some(IsqType::Q4K),
            QuantizationType::Q8_0 => Some(IsqType::Q8_0),
            QuantizationType::Q4_0 => Some(IsqType::Q4_0),
        };

        let mut builder = TextModelBuilder::new(&config.model_id);

        if let Some(isq) = isq_type {
            builder = builder.with_isq(isq);
        }

        if config.enable_logging {
            builder = builder.with_logging();
        }

        let _ = progress.send(format!("Fetching and loading {}...", config.model_id));

        let model = builder
            .build()
            .await
            .map_err(|e| NimbusError::ModelLoadError(format!("Failed to load LLM model: {}", e)))?;

        info!("LLM engine initialized successfully");

        Ok(Self {
            model_id: config.model_id,
            model,
        })
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    fn build_request(messages: &[ChatMessage], options: &CompletionOptions) -> RequestBuilder {
        let mut request =
            RequestBuilder::new().set_sampler_temperature(f64::from(options.temperature));

        if let Some(max_tokens) = options.max_tokens {
            request = request.set_sampler_max_len(max_tokens);
        }

        for msg in messages {
            let role = match msg.role() {
                Role::System => TextMessageRole::System,
                Role::User => TextMessageRole::User,
                Role::Assistant => TextMessageRole::Assistant,
            };
            request = request.add_message(role, msg.content());
        }

        request
    }
}

#[async_trait]
impl ChatEngine for LLMEngine {
    async fn generate(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<String> {
        let request = Self::build_request(messages, options);

        let response = self
            .model
            .send_chat_request(request)
            .await
            .map_err(|e| NimbusError::InferenceError(format!("Chat request failed: {}", e)))?;

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default();

        debug!(
            "Generated response: {} tokens @ {:.1} tok/s",
            response.usage.completion_tokens, response.usage.avg_compl_tok_per_sec
        );

        Ok(content)
    }

    async fn generate_stream(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
        token_tx: mpsc::Sender<Result<String>>,
    ) -> Result<()> {
        let request = Self::build_request(messages, options);

        let mut stream = self
            .model
            .stream_chat_request(request)
            .await
            .map_err(|e| NimbusError::InferenceError(format!("Streaming request failed: {}", e)))?;

        while let Some(response) = stream.next().await {
            match response {
                Response::Chunk(chunk) => {
                    let Some(choice) = chunk.choices.first() else {
                        continue;
                    };
                    if let Some(content) = &choice.delta.content {
                        if content.is_empty() {
                            continue;
                        }
                        if token_tx.send(Ok(content.clone())).await.is_err() {
                            debug!("Token receiver dropped, stopping stream");
                            break;
                        }
                    }
                }
                Response::Done(_) => break,
                Response::ModelError(message, _) => {
                    return Err(NimbusError::InferenceError(message));
                }
                Response::InternalError(e) => {
                    return Err(NimbusError::InferenceError(e.to_string()));
                }
                Response::ValidationError(e) => {
                    return Err(NimbusError::InferenceError(e.to_string()));
                }
                _ => {}
            }
        }

        Ok(())
    }
}
