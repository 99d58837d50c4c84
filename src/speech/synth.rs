//! Speech engine boundary
//!
//! A synthesizer speaks one utterance at a time and reports its lifecycle as
//! explicit events: one `Started`, then one `Finished` or `Failed`.

use crate::Result;
use crossbeam_channel::Sender;
use serde::Deserialize;
use uuid::Uuid;

/// A voice offered by the speech engine
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Voice {
    pub id: String,
    pub name: String,
    /// BCP 47 language tag such as `en-US`
    pub language: String,
}

impl Voice {
    /// Whether this voice speaks the given two-letter language
    pub fn matches_language(&self, preference: &str) -> bool {
        let preference = preference.trim().to_ascii_lowercase();
        !preference.is_empty() && self.language.to_ascii_lowercase().starts_with(&preference)
    }
}

/// Text plus the delivery parameters for one playback
#[derive(Clone, Debug)]
pub struct Utterance {
    pub id: Uuid,
    pub text: String,
    /// `None` lets the engine use its default voice
    pub voice: Option<Voice>,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

/// Lifecycle of an utterance
#[derive(Clone, Debug, PartialEq)]
pub enum SpeechEvent {
    Started(Uuid),
    Finished(Uuid),
    Failed { id: Uuid, error: String },
}

impl SpeechEvent {
    pub fn utterance_id(&self) -> Uuid {
        match self {
            SpeechEvent::Started(id) | SpeechEvent::Finished(id) => *id,
            SpeechEvent::Failed { id, .. } => *id,
        }
    }

    /// Finished or failed
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SpeechEvent::Started(_))
    }
}

/// Text-to-speech capability
pub trait SpeechSynthesizer: Send + Sync {
    /// Voices available for selection
    fn voices(&self) -> Vec<Voice>;

    /// Begin speaking; lifecycle events go to `events`
    fn speak(&self, utterance: Utterance, events: Sender<SpeechEvent>) -> Result<()>;

    /// Cancel whatever is playing. No-op when idle.
    fn cancel(&self);
}

/// A VITS voice model on disk
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct VoiceModelConfig {
    pub name: String,
    pub language: String,
    pub model_path: String,
    pub tokens_path: String,
    pub lexicon_path: Option<String>,
    pub data_dir: Option<String>,
    pub speaker_id: i32,
}

/// Configuration for spoken output
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Read answers aloud
    pub enabled: bool,

    /// Two-letter language preference used for voice selection
    pub language: String,

    pub rate: f32,

    pub pitch: f32,

    /// Playback volume (0.0 to 1.0)
    pub volume: f32,

    /// Installed voice models, first one is the default
    pub voices: Vec<VoiceModelConfig>,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            language: "en".to_string(),
            rate: 1.0,
            pitch: 1.0,
            volume: 1.0,
            voices: Vec::new(),
        }
    }
}

impl SpeechConfig {
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_voice(mut self, voice: VoiceModelConfig) -> Self {
        self.voices.push(voice);
        self
    }

    /// Disable spoken output (text-only mode)
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// Synthesizer that produces no audio but honors the event contract
#[derive(Debug, Default)]
pub struct SilentSynthesizer;

impl SpeechSynthesizer for SilentSynthesizer {
    fn voices(&self) -> Vec<Voice> {
        Vec::new()
    }

    fn speak(&self, utterance: Utterance, events: Sender<SpeechEvent>) -> Result<()> {
        let _ = events.send(SpeechEvent::Started(utterance.id));
        let _ = events.send(SpeechEvent::Finished(utterance.id));
        Ok(())
    }

    fn cancel(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voice(language: &str) -> Voice {
        Voice {
            id: language.into(),
            name: language.into(),
            language: language.into(),
        }
    }

    #[test]
    fn test_language_prefix_match() {
        assert!(voice("en-US").matches_language("en"));
        assert!(voice("EN-gb").matches_language("En"));
        assert!(!voice("fr-FR").matches_language("en"));
        assert!(!voice("en-US").matches_language(""));
    }

    #[test]
    fn test_silent_synthesizer_reports_lifecycle() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let id = Uuid::new_v4();
        SilentSynthesizer
            .speak(
                Utterance {
                    id,
                    text: "hi".into(),
                    voice: None,
                    rate: 1.0,
                    pitch: 1.0,
                    volume: 1.0,
                },
                tx,
            )
            .unwrap();

        let events: Vec<SpeechEvent> = rx.try_iter().collect();
        assert_eq!(events, vec![SpeechEvent::Started(id), SpeechEvent::Finished(id)]);
        assert!(events[1].is_terminal());
    }
}
