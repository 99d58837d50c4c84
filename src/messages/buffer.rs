use parking_lot::RwLock;
use std::sync::Arc;

/// Growing response text shared between the orchestrator and the UI.
///
/// Cloning yields another handle to the same buffer.
#[derive(Debug, Clone, Default)]
pub struct ResponseBuffer {
    text: Arc<RwLock<String>>,
}

impl ResponseBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fragment and return the new length in bytes
    pub fn push(&self, fragment: &str) -> usize {
        let mut text = self.text.write();
        text.push_str(fragment);
        text.len()
    }

    pub fn snapshot(&self) -> String {
        self.text.read().clone()
    }

    pub fn clear(&self) {
        self.text.write().clear();
    }

    pub fn len(&self) -> usize {
        self.text.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.read().is_empty()
    }
}
