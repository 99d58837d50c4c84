//! End-to-end integration module
//!
//! This module provides the orchestration layer that connects all components
//! of the Nimbus assistant: question -> city extraction -> weather -> LLM -> speech

pub mod config;
pub mod intent;
pub mod orchestrator;
pub mod state;

pub use config::{AppConfig, AssistantConfig};
pub use intent::{parse_city_reply, IntentDetector};
pub use orchestrator::{
    IgnoreReason, Orchestrator, OrchestratorBuilder, OrchestratorEvent, SendOutcome, SendRequest,
    EVENT_CAPACITY, GENERATION_ERROR_MARKER, STATUS_UNLOADING,
};
pub use state::{shared_state, InteractionState, Phase, SharedState, STATUS_READY, STATUS_WAITING};
