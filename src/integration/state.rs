//! Interaction state shown by the UI
//!
//! Only the orchestrator and the speech output it owns write these flags.
//! The UI reads snapshots.

use parking_lot::Mutex;
use std::sync::Arc;

/// Status shown before any model is loaded
pub const STATUS_WAITING: &str = "Waiting";

/// Status shown once a model is loaded and idle
pub const STATUS_READY: &str = "Model ready! 🚀";

/// Coarse phase derived from the flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    LoadingModel,
    Thinking,
    Generating,
    Speaking,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InteractionState {
    pub status_text: String,
    pub is_loading_model: bool,
    pub is_thinking: bool,
    pub is_generating: bool,
    pub is_speaking: bool,
}

impl Default for InteractionState {
    fn default() -> Self {
        Self {
            status_text: STATUS_WAITING.to_string(),
            is_loading_model: false,
            is_thinking: false,
            is_generating: false,
            is_speaking: false,
        }
    }
}

impl InteractionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        if self.is_loading_model {
            Phase::LoadingModel
        } else if self.is_thinking {
            Phase::Thinking
        } else if self.is_generating {
            Phase::Generating
        } else if self.is_speaking {
            Phase::Speaking
        } else {
            Phase::Idle
        }
    }

    /// A turn or a model load is in flight
    pub fn is_busy(&self) -> bool {
        self.is_loading_model || self.is_thinking || self.is_generating
    }

    /// Whether the send action is enabled
    pub fn can_send(&self) -> bool {
        !self.is_busy()
    }

    /// Claim the state for a new turn. Returns false when busy.
    pub fn try_begin_turn(&mut self, status: impl Into<String>) -> bool {
        if self.is_busy() {
            return false;
        }
        self.is_thinking = true;
        self.status_text = status.into();
        true
    }

    /// Move from thinking to generating
    pub fn begin_generating(&mut self, status: impl Into<String>) {
        self.is_thinking = false;
        self.is_generating = true;
        self.status_text = status.into();
    }

    /// End the current turn, keeping the speaking flag as is
    pub fn end_turn(&mut self, status: impl Into<String>) {
        self.is_thinking = false;
        self.is_generating = false;
        self.status_text = status.into();
    }

    /// Claim the state for a model load. Returns false when busy.
    pub fn try_begin_load(&mut self, status: impl Into<String>) -> bool {
        if self.is_busy() {
            return false;
        }
        self.is_loading_model = true;
        self.status_text = status.into();
        true
    }

    pub fn end_load(&mut self, status: impl Into<String>) {
        self.is_loading_model = false;
        self.status_text = status.into();
    }

    /// Back to idle after a model change
    pub fn reset(&mut self, status: impl Into<String>) {
        *self = Self {
            status_text: status.into(),
            ..Self::default()
        };
    }
}

/// Handle shared between the orchestrator, speech output and UI
pub type SharedState = Arc<Mutex<InteractionState>>;

pub fn shared_state() -> SharedState {
    Arc::new(Mutex::new(InteractionState::new()))
}
