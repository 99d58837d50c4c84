//! Spoken output of assistant answers
//!
//! At most one utterance is active. Starting a new one cancels the previous
//! one, and only events of the active utterance touch the speaking flag.

use crate::integration::state::SharedState;
use crate::speech::normalize::normalize_text_for_tts;
use crate::speech::synth::{SpeechConfig, SpeechEvent, SpeechSynthesizer, Utterance, Voice};
use crate::Result;
use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

struct ActiveUtterance {
    id: Uuid,
    started: bool,
}

/// Applies synthesizer events to the shared state
struct Tracker {
    state: SharedState,
    active: Mutex<Option<ActiveUtterance>>,
    subscribers: Mutex<Vec<Sender<SpeechEvent>>>,
}

impl Tracker {
    fn apply(&self, event: SpeechEvent) {
        let applied = {
            let mut active = self.active.lock();
            let is_current = active.as_ref().map(|a| a.id) == Some(event.utterance_id());

            if !is_current {
                false
            } else if event.is_terminal() {
                *active = None;
                self.state.lock().is_speaking = false;
                true
            } else if let Some(current) = active.as_mut().filter(|a| !a.started) {
                current.started = true;
                self.state.lock().is_speaking = true;
                true
            } else {
                false
            }
        };

        if !applied {
            debug!("Ignoring stale speech event {:?}", event);
            return;
        }

        if let SpeechEvent::Failed { error, .. } = &event {
            warn!("Speech playback failed: {}", error);
        }

        self.subscribers
            .lock()
            .retain(|subscriber| subscriber.send(event.clone()).is_ok());
    }

    fn clear(&self) {
        *self.active.lock() = None;
        self.state.lock().is_speaking = false;
    }
}

pub struct SpeechOutput {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    config: SpeechConfig,
    voices: Vec<Voice>,
    tracker: Arc<Tracker>,
    events_tx: Sender<SpeechEvent>,
}

impl SpeechOutput {
    pub fn new(
        synthesizer: Arc<dyn SpeechSynthesizer>,
        config: SpeechConfig,
        state: SharedState,
    ) -> Self {
        let voices = synthesizer.voices();
        info!("Speech output ready with {} voice(s)", voices.len());

        let tracker = Arc::new(Tracker {
            state,
            active: Mutex::new(None),
            subscribers: Mutex::new(Vec::new()),
        });

        let (events_tx, events_rx) = unbounded::<SpeechEvent>();
        let listener = Arc::clone(&tracker);
        let spawned = std::thread::Builder::new()
            .name("nimbus-speech-events".to_string())
            .spawn(move || {
                for event in events_rx.iter() {
                    listener.apply(event);
                }
                debug!("Speech event listener stopped");
            });
        if let Err(e) = spawned {
            warn!("Failed to start speech event listener: {}", e);
        }

        Self {
            synthesizer,
            config,
            voices,
            tracker,
            events_tx,
        }
    }

    /// Speak `text`, cancelling anything already playing.
    ///
    /// Returns the utterance id, or `None` when nothing was spoken.
    pub fn speak(&self, text: &str) -> Result<Option<Uuid>> {
        self.stop();

        if !self.config.enabled {
            return Ok(None);
        }

        let text = normalize_text_for_tts(text);
        if text.is_empty() {
            return Ok(None);
        }

        let utterance = Utterance {
            id: Uuid::new_v4(),
            text,
            voice: self.select_voice(),
            rate: self.config.rate,
            pitch: self.config.pitch,
            volume: self.config.volume,
        };
        let id = utterance.id;

        *self.tracker.active.lock() = Some(ActiveUtterance { id, started: false });

        debug!(
            "Speaking utterance {} with voice {:?}",
            id,
            utterance.voice.as_ref().map(|v| v.name.as_str())
        );

        if let Err(e) = self.synthesizer.speak(utterance, self.events_tx.clone()) {
            self.tracker.clear();
            return Err(e);
        }

        Ok(Some(id))
    }

    /// Cancel the active utterance. Safe to call when idle.
    pub fn stop(&self) {
        self.synthesizer.cancel();
        self.tracker.clear();
    }

    /// First voice matching the language preference, else the engine default
    pub fn select_voice(&self) -> Option<Voice> {
        self.voices
            .iter()
            .find(|voice| voice.matches_language(&self.config.language))
            .cloned()
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    pub fn is_speaking(&self) -> bool {
        self.tracker.state.lock().is_speaking
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Receive every event that changed the speaking state
    pub fn subscribe(&self) -> Receiver<SpeechEvent> {
        let (tx, rx) = unbounded();
        self.tracker.subscribers.lock().push(tx);
        rx
    }
}
