//! Inference session interface consumed by the orchestrator
//!
//! A session is a handle to a loaded model. Completions are requested either
//! as a single final string or as an ordered stream of text fragments.

use crate::messages::ChatMessage;
use crate::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;
use tokio::sync::mpsc;

/// Ordered stream of incremental text fragments
pub type TokenStream = BoxStream<'static, Result<String>>;

/// Channel carrying human-readable load progress
pub type ProgressSender = mpsc::UnboundedSender<String>;

/// Sampling options for a single completion request
#[derive(Clone, Debug, PartialEq)]
pub struct CompletionOptions {
    pub temperature: f32,
    pub max_tokens: Option<usize>,
}

impl CompletionOptions {
    pub fn new(temperature: f32) -> Self {
        Self {
            temperature,
            max_tokens: None,
        }
    }

    /// Temperature pinned to zero
    pub fn deterministic() -> Self {
        Self::new(0.0)
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<usize>) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// A running model able to serve chat completions
#[async_trait]
pub trait InferenceSession: Send + Sync {
    /// Identifier of the model this session serves
    fn model_id(&self) -> &str;

    /// Run a completion and return the final text
    async fn complete_once(
        &self,
        messages: Vec<ChatMessage>,
        options: CompletionOptions,
    ) -> Result<String>;

    /// Run a completion and yield fragments in generation order
    async fn complete_streaming(
        &self,
        messages: Vec<ChatMessage>,
        options: CompletionOptions,
    ) -> Result<TokenStream>;

    /// Release the background execution context. Idempotent.
    async fn dispose(&self);
}

/// Creates sessions for a model id
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn create_session(
        &self,
        model_id: &str,
        progress: ProgressSender,
    ) -> Result<Box<dyn InferenceSession>>;
}

/// The component that actually computes tokens, owned by a worker thread
#[async_trait]
pub trait ChatEngine: Send + Sync {
    async fn generate(&self, messages: &[ChatMessage], options: &CompletionOptions)
        -> Result<String>;

    /// Send each fragment through `token_tx` as it is produced.
    ///
    /// Returns once generation has finished or the receiver is gone.
    async fn generate_stream(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
        token_tx: mpsc::Sender<Result<String>>,
    ) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic_options() {
        let options = CompletionOptions::deterministic().with_max_tokens(Some(16));
        assert_eq!(options.temperature, 0.0);
        assert_eq!(options.max_tokens, Some(16));
    }
}
