//! Ownership of the single live inference session
//!
//! The manager holds at most one session. Loading a model always disposes
//! the previous session before the new worker is created.

use crate::llm::inference::{InferenceSession, ProgressSender, SessionFactory};
use crate::{NimbusError, Result};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

/// The model the user picked and the models they can pick from
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelSelection {
    selected: String,
    available: Vec<String>,
}

impl ModelSelection {
    pub fn new(selected: impl Into<String>, available: Vec<String>) -> Self {
        let selected = selected.into();
        let mut available = available;
        if !available.contains(&selected) {
            available.insert(0, selected.clone());
        }
        Self {
            selected,
            available,
        }
    }

    pub fn selected(&self) -> &str {
        &self.selected
    }

    pub fn available(&self) -> &[String] {
        &self.available
    }

    /// Select a model, returning true when the selection changed
    pub fn select(&mut self, model_id: &str) -> Result<bool> {
        if !self.available.iter().any(|m| m == model_id) {
            return Err(NimbusError::ConfigError(format!(
                "Unknown model: {}",
                model_id
            )));
        }
        let changed = self.selected != model_id;
        self.selected = model_id.to_string();
        Ok(changed)
    }
}

/// Holds the live session and creates replacements through a factory
pub struct SessionManager {
    factory: Arc<dyn SessionFactory>,
    current: Mutex<Option<Arc<dyn InferenceSession>>>,
}

impl SessionManager {
    pub fn new(factory: Arc<dyn SessionFactory>) -> Self {
        Self {
            factory,
            current: Mutex::new(None),
        }
    }

    /// Replace the live session with one serving `model_id`
    ///
    /// The slot stays locked for the whole swap, so two loads never overlap.
    pub async fn load(&self, model_id: &str, progress: ProgressSender) -> Result<()> {
        let mut current = self.current.lock().await;

        if let Some(previous) = current.take() {
            info!("Tearing down session for {}", previous.model_id());
            previous.dispose().await;
        }

        let session = self.factory.create_session(model_id, progress).await?;
        info!("Session ready for {}", session.model_id());
        *current = Some(Arc::from(session));
        Ok(())
    }

    /// Dispose the live session, if any
    pub async fn unload(&self) {
        if let Some(previous) = self.current.lock().await.take() {
            previous.dispose().await;
        }
    }

    /// Handle to the live session
    pub async fn current(&self) -> Option<Arc<dyn InferenceSession>> {
        self.current.lock().await.clone()
    }

    pub async fn is_loaded(&self) -> bool {
        self.current.lock().await.is_some()
    }
}
