//! Spoken output of assistant answers
//!
//! This module provides:
//! - the synthesizer boundary and its lifecycle events
//! - `SpeechOutput`, which enforces one active utterance at a time
//! - a sherpa-rs VITS synthesizer played through rodio (feature `audio-io`)

pub mod normalize;
pub mod output;
pub mod synth;
#[cfg(feature = "audio-io")]
pub mod vits;

use std::sync::Arc;
use tracing::warn;

// Re-export commonly used types
pub use normalize::normalize_text_for_tts;
pub use output::SpeechOutput;
pub use synth::{
    SilentSynthesizer, SpeechConfig, SpeechEvent, SpeechSynthesizer, Utterance, Voice,
    VoiceModelConfig,
};
#[cfg(feature = "audio-io")]
pub use vits::VitsSynthesizer;

/// Build the synthesizer described by `config`.
///
/// Falls back to the silent synthesizer when speech is disabled, no voices
/// are installed, or the audio backend cannot start.
pub fn synthesizer_from_config(config: &SpeechConfig) -> Arc<dyn SpeechSynthesizer> {
    if !config.enabled || config.voices.is_empty() {
        return Arc::new(SilentSynthesizer);
    }

    #[cfg(feature = "audio-io")]
    {
        match VitsSynthesizer::new(config.voices.clone()) {
            Ok(synth) => return Arc::new(synth),
            Err(e) => warn!("Speech output disabled: {}", e),
        }
    }

    #[cfg(not(feature = "audio-io"))]
    warn!("Speech output disabled: built without the audio-io feature");

    Arc::new(SilentSynthesizer)
}
