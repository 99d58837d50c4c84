//! VITS speech synthesis with sherpa-rs, played through rodio
//!
//! One worker thread owns the audio output and the loaded voice models.
//! Models load lazily the first time a voice is used.

use crate::speech::synth::{SpeechEvent, SpeechSynthesizer, Utterance, Voice, VoiceModelConfig};
use crate::{NimbusError, Result};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, Sink};
use sherpa_rs::tts::{VitsTts, VitsTtsConfig};
use std::collections::HashMap;
use std::path::Path;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// How often the worker checks whether playback has drained
const PLAYBACK_POLL: Duration = Duration::from_millis(50);

enum SynthCommand {
    Speak {
        utterance: Utterance,
        events: Sender<SpeechEvent>,
    },
    Cancel,
    Shutdown,
}

struct Playback {
    id: Uuid,
    sink: Sink,
    events: Sender<SpeechEvent>,
}

impl Playback {
    fn stop(self) {
        self.sink.stop();
        let _ = self.events.send(SpeechEvent::Finished(self.id));
    }
}

/// Synthesizer backed by sherpa-rs VITS models
pub struct VitsSynthesizer {
    voices: Vec<Voice>,
    command_tx: Sender<SynthCommand>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl VitsSynthesizer {
    /// Check the model files and start the playback worker
    pub fn new(models: Vec<VoiceModelConfig>) -> Result<Self> {
        if models.is_empty() {
            return Err(NimbusError::ConfigError("No voice models configured".into()));
        }

        for model in &models {
            for path in [&model.model_path, &model.tokens_path] {
                if !Path::new(path).exists() {
                    return Err(NimbusError::ConfigError(format!(
                        "Voice file not found for {}: {}",
                        model.name, path
                    )));
                }
            }
        }

        let voices = models
            .iter()
            .map(|m| Voice {
                id: m.model_path.clone(),
                name: m.name.clone(),
                language: m.language.clone(),
            })
            .collect();

        let (command_tx, command_rx) = bounded(16);
        let worker = thread::Builder::new()
            .name("nimbus-tts".to_string())
            .spawn(move || run_worker(models, command_rx))
            .map_err(|e| NimbusError::TTSError(format!("Failed to spawn TTS worker: {}", e)))?;

        Ok(Self {
            voices,
            command_tx,
            worker: Mutex::new(Some(worker)),
        })
    }
}

impl SpeechSynthesizer for VitsSynthesizer {
    fn voices(&self) -> Vec<Voice> {
        self.voices.clone()
    }

    fn speak(&self, utterance: Utterance, events: Sender<SpeechEvent>) -> Result<()> {
        self.command_tx
            .send(SynthCommand::Speak { utterance, events })
            .map_err(|_| NimbusError::ChannelError("TTS worker is not running".into()))
    }

    fn cancel(&self) {
        let _ = self.command_tx.send(SynthCommand::Cancel);
    }
}

impl Drop for VitsSynthesizer {
    fn drop(&mut self) {
        let _ = self.command_tx.send(SynthCommand::Shutdown);
        if let Some(worker) = self.worker.lock().take() {
            let _ = worker.join();
        }
    }
}

fn load_voice(model: &VoiceModelConfig) -> VitsTts {
    info!("Loading VITS voice {} from {}", model.name, model.model_path);
    VitsTts::new(VitsTtsConfig {
        model: model.model_path.clone(),
        tokens: model.tokens_path.clone(),
        lexicon: model.lexicon_path.clone().unwrap_or_default(),
        data_dir: model.data_dir.clone().unwrap_or_default(),
        ..Default::default()
    })
}

fn run_worker(models: Vec<VoiceModelConfig>, command_rx: Receiver<SynthCommand>) {
    info!("TTS worker starting");

    // The output stream must stay alive for as long as sinks play
    let (_stream, handle) = match OutputStream::try_default() {
        Ok(output) => output,
        Err(e) => {
            error!("Failed to open audio output: {}", e);
            // Keep answering commands so every utterance still gets an end event
            for command in command_rx.iter() {
                match command {
                    SynthCommand::Speak { utterance, events } => {
                        let _ = events.send(SpeechEvent::Failed {
                            id: utterance.id,
                            error: format!("Audio output unavailable: {}", e),
                        });
                    }
                    SynthCommand::Cancel => {}
                    SynthCommand::Shutdown => break,
                }
            }
            return;
        }
    };

    let mut loaded: HashMap<String, VitsTts> = HashMap::new();
    let mut playing: Option<Playback> = None;

    loop {
        match command_rx.recv_timeout(PLAYBACK_POLL) {
            Ok(SynthCommand::Speak { utterance, events }) => {
                if let Some(previous) = playing.take() {
                    previous.stop();
                }

                let id = utterance.id;
                let model = utterance
                    .voice
                    .as_ref()
                    .and_then(|voice| models.iter().find(|m| m.model_path == voice.id))
                    .unwrap_or(&models[0]);

                if (utterance.pitch - 1.0).abs() > f32::EPSILON {
                    debug!("VITS voices ignore pitch {}", utterance.pitch);
                }

                let tts = loaded
                    .entry(model.model_path.clone())
                    .or_insert_with(|| load_voice(model));

                let audio = match tts.create(&utterance.text, model.speaker_id, utterance.rate) {
                    Ok(audio) => audio,
                    Err(e) => {
                        warn!("TTS synthesis failed: {}", e);
                        let _ = events.send(SpeechEvent::Failed {
                            id,
                            error: format!("Synthesis failed: {}", e),
                        });
                        continue;
                    }
                };

                let sink = match Sink::try_new(&handle) {
                    Ok(sink) => sink,
                    Err(e) => {
                        let _ = events.send(SpeechEvent::Failed {
                            id,
                            error: format!("Playback failed: {}", e),
                        });
                        continue;
                    }
                };

                debug!(
                    "Playing {} samples at {} Hz",
                    audio.samples.len(),
                    audio.sample_rate
                );
                sink.set_volume(utterance.volume.clamp(0.0, 1.0));
                sink.append(SamplesBuffer::new(1, audio.sample_rate as u32, audio.samples));

                let _ = events.send(SpeechEvent::Started(id));
                playing = Some(Playback { id, sink, events });
            }
            Ok(SynthCommand::Cancel) => {
                if let Some(previous) = playing.take() {
                    debug!("Cancelling utterance {}", previous.id);
                    previous.stop();
                }
            }
            Ok(SynthCommand::Shutdown) | Err(RecvTimeoutError::Disconnected) => {
                if let Some(previous) = playing.take() {
                    previous.stop();
                }
                break;
            }
            Err(RecvTimeoutError::Timeout) => {}
        }

        if playing.as_ref().is_some_and(|p| p.sink.empty()) {
            if let Some(done) = playing.take() {
                let _ = done.events.send(SpeechEvent::Finished(done.id));
            }
        }
    }

    info!("TTS worker stopped");
}
