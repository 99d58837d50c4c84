//! Application state management
//!
//! This module provides the frame-side state for the Nimbus UI. Actions are
//! spawned on the tokio runtime; results come back as orchestrator events
//! that `poll_events` folds in once per frame.

use crate::integration::{
    InteractionState, Orchestrator, OrchestratorEvent, SendOutcome, SendRequest,
};
use crate::llm::ModelSelection;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{debug, warn};

/// Debug information displayed in the debug panel
#[derive(Debug, Clone, Default)]
pub struct DebugInfo {
    /// LLM generation stats (time to first token, total time)
    pub llm_stats: String,
    /// Current frame rate
    pub fps: f32,
    /// Recent log messages
    pub log_messages: VecDeque<String>,
}

impl DebugInfo {
    pub fn new() -> Self {
        Self {
            log_messages: VecDeque::with_capacity(100),
            ..Default::default()
        }
    }

    pub fn add_log(&mut self, message: String) {
        if self.log_messages.len() >= 100 {
            self.log_messages.pop_front();
        }
        self.log_messages.push_back(message);
    }
}

/// Streaming response from the LLM
#[derive(Debug, Clone, Default)]
pub struct StreamingResponse {
    /// The accumulated response text
    pub text: String,
    /// Whether generation is in progress
    pub is_generating: bool,
    /// Whether the engine failed part way
    pub was_interrupted: bool,
    /// Time to first token in milliseconds
    pub first_token_ms: Option<u64>,
    /// Total generation time in milliseconds
    pub total_ms: Option<u64>,
}

/// Central application state
pub struct AppState {
    orchestrator: Arc<Orchestrator>,
    runtime: Handle,

    /// Current text input
    pub input_text: String,

    /// Snapshot of the orchestrator's flags and status line
    pub interaction: InteractionState,

    /// Current streaming response from LLM
    pub streaming_response: StreamingResponse,

    /// Model picker contents
    pub selection: ModelSelection,

    /// Whether a session is live
    pub model_loaded: bool,

    /// Alert waiting to be acknowledged
    pub alert: Option<String>,

    /// Debug information
    pub debug_info: DebugInfo,

    /// Whether to show the debug panel
    pub show_debug_panel: bool,

    /// Frame time tracking for FPS
    frame_times: VecDeque<f64>,
}

impl AppState {
    pub fn new(orchestrator: Arc<Orchestrator>, runtime: Handle) -> Self {
        Self {
            interaction: orchestrator.state(),
            selection: orchestrator.selection(),
            orchestrator,
            runtime,
            input_text: String::new(),
            streaming_response: StreamingResponse::default(),
            model_loaded: false,
            alert: None,
            debug_info: DebugInfo::new(),
            show_debug_panel: false,
            frame_times: VecDeque::with_capacity(60),
        }
    }

    /// Update FPS calculation
    pub fn update_fps(&mut self, delta_time: f64) {
        self.frame_times.push_back(delta_time);
        if self.frame_times.len() > 60 {
            self.frame_times.pop_front();
        }

        if !self.frame_times.is_empty() {
            let avg_time: f64 =
                self.frame_times.iter().sum::<f64>() / self.frame_times.len() as f64;
            self.debug_info.fps = if avg_time > 0.0 {
                1.0 / avg_time as f32
            } else {
                0.0
            };
        }
    }

    pub fn can_send(&self) -> bool {
        self.model_loaded && self.interaction.can_send()
    }

    /// Send the typed question
    pub fn send_message(&mut self) {
        let text = self.input_text.trim().to_string();
        if text.is_empty() || !self.can_send() {
            return;
        }

        self.input_text.clear();
        self.spawn_send(SendRequest::Text(text));
    }

    /// Ask about the weather at the device location
    pub fn use_my_location(&mut self) {
        if !self.can_send() {
            return;
        }

        self.input_text.clear();
        self.spawn_send(SendRequest::MyLocation);
    }

    fn spawn_send(&mut self, request: SendRequest) {
        // Show the claim immediately; the next snapshot confirms it
        self.interaction.is_thinking = true;

        let orchestrator = Arc::clone(&self.orchestrator);
        self.runtime.spawn(async move {
            match orchestrator.send(request).await {
                SendOutcome::Ignored(reason) => debug!("Send ignored: {:?}", reason),
                SendOutcome::Aborted { reason } => debug!("Turn aborted: {}", reason),
                SendOutcome::Completed { interrupted, .. } => {
                    debug!("Turn completed (interrupted: {})", interrupted)
                }
            }
        });
    }

    /// Load the model chosen in the picker
    pub fn load_selected_model(&mut self) {
        if self.interaction.is_busy() {
            return;
        }

        let model_id = self.selection.selected().to_string();
        self.interaction.is_loading_model = true;
        self.debug_info.add_log(format!("Loading {}", model_id));

        let orchestrator = Arc::clone(&self.orchestrator);
        self.runtime.spawn(async move {
            if let Err(e) = orchestrator.load_model(&model_id).await {
                warn!("Model load failed: {}", e);
            }
        });
    }

    pub fn select_model(&mut self, model_id: &str) {
        match self.orchestrator.select_model(model_id) {
            Ok(_) => self.selection = self.orchestrator.selection(),
            Err(e) => warn!("{}", e),
        }
    }

    pub fn unload_model(&mut self) {
        let orchestrator = Arc::clone(&self.orchestrator);
        self.runtime.spawn(async move {
            if let Err(e) = orchestrator.unload_model().await {
                warn!("Model unload failed: {}", e);
            }
        });
    }

    pub fn stop_speaking(&mut self) {
        self.orchestrator.stop_speaking();
        self.interaction.is_speaking = false;
    }

    pub fn dismiss_alert(&mut self) {
        self.alert = None;
    }

    /// Apply pending orchestrator events. Returns true when anything changed.
    pub fn poll_events(&mut self) -> bool {
        let mut changed = false;

        while let Some(event) = self.orchestrator.try_recv_event() {
            changed = true;
            match event {
                OrchestratorEvent::StatusChanged(_) => {}
                OrchestratorEvent::TurnStarted => {
                    self.streaming_response = StreamingResponse {
                        is_generating: true,
                        ..Default::default()
                    };
                }
                OrchestratorEvent::Token(token) => {
                    self.streaming_response.text.push_str(&token);
                }
                OrchestratorEvent::GenerationComplete {
                    response,
                    first_token_ms,
                    total_ms,
                    interrupted,
                } => {
                    self.streaming_response.text = response;
                    self.streaming_response.is_generating = false;
                    self.streaming_response.was_interrupted = interrupted;
                    self.streaming_response.first_token_ms = first_token_ms;
                    self.streaming_response.total_ms = Some(total_ms);

                    self.debug_info.llm_stats = match first_token_ms {
                        Some(first) => format!("First token: {}ms, Total: {}ms", first, total_ms),
                        None => format!("No tokens, Total: {}ms", total_ms),
                    };
                }
                OrchestratorEvent::ModelLoaded(model_id) => {
                    self.model_loaded = true;
                    self.debug_info.add_log(format!("Loaded {}", model_id));
                }
                OrchestratorEvent::ModelLoadFailed(error) => {
                    self.model_loaded = false;
                    self.debug_info.add_log(format!("Load failed: {}", error));
                }
                OrchestratorEvent::ModelUnloaded => {
                    self.model_loaded = false;
                    self.streaming_response = StreamingResponse::default();
                }
                OrchestratorEvent::Alert(message) => {
                    self.streaming_response.is_generating = false;
                    self.debug_info.add_log(format!("Alert: {}", message));
                    self.alert = Some(message);
                }
            }
        }

        let snapshot = self.orchestrator.state();
        if snapshot != self.interaction {
            self.interaction = snapshot;
            changed = true;
        }

        changed
    }
}
