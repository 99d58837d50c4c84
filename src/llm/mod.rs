//! LLM integration with mistral.rs
//!
//! # Architecture
//!
//! - **config**: model selection and sampling defaults
//! - **inference**: the session interface the orchestrator talks to
//! - **engine**: the mistral.rs engine (feature `local-llm`)
//! - **worker**: background thread hosting an engine behind a session
//! - **session**: ownership of the single live session
//! - **prompts**: system prompt, city extraction prompt, user content

pub mod config;
#[cfg(feature = "local-llm")]
pub mod engine;
pub mod inference;
pub mod prompts;
pub mod session;
pub mod worker;

// Re-export commonly used types
pub use config::{LLMConfig, QuantizationType};
#[cfg(feature = "local-llm")]
pub use engine::LLMEngine;
pub use inference::{
    ChatEngine, CompletionOptions, InferenceSession, ProgressSender, SessionFactory, TokenStream,
};
pub use session::{ModelSelection, SessionManager};
pub use worker::{EngineLoader, WorkerSession, WorkerSessionFactory};
