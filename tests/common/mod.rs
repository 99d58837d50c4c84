//! Fakes for the orchestrator seams

#![allow(dead_code)]

use async_trait::async_trait;
use crossbeam_channel::Sender;
use nimbus::integration::{Orchestrator, OrchestratorBuilder};
use nimbus::llm::inference::{
    CompletionOptions, InferenceSession, ProgressSender, SessionFactory, TokenStream,
};
use nimbus::messages::{ChatMessage, ResponseBuffer};
use nimbus::speech::{SpeechEvent, SpeechSynthesizer, Utterance, Voice};
use nimbus::weather::client::parse_forecast;
use nimbus::weather::{FixedGeolocator, Geolocator, LocationQuery, WeatherProvider, WeatherSummary};
use nimbus::{NimbusError, Result};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::Notify;

pub const MODEL_A: &str = "meta-llama/Llama-3.2-1B-Instruct";
pub const MODEL_B: &str = "meta-llama/Llama-3.2-3B-Instruct";

/// What the scripted model answers, plus a record of what it was asked
#[derive(Default)]
pub struct Script {
    /// Reply to the city extraction call
    pub city_reply: Mutex<String>,
    /// Fail the city extraction call instead
    pub fail_classification: Mutex<bool>,
    /// Fragments of the streamed answer; `Err` interrupts the stream
    pub fragments: Mutex<Vec<std::result::Result<String, String>>>,
    /// Fail to open the stream with this message
    pub open_error: Mutex<Option<String>>,
    /// Hold the stream until notified
    pub gate: Mutex<Option<Arc<Notify>>>,
    /// Buffer snapshots taken before each fragment and at the end
    pub watch: Mutex<Option<ResponseBuffer>>,
    pub observed: Arc<Mutex<Vec<String>>>,

    pub once_calls: Mutex<Vec<(Vec<ChatMessage>, CompletionOptions)>>,
    pub stream_calls: Mutex<Vec<(Vec<ChatMessage>, CompletionOptions)>>,
    /// "create:<model>" and "dispose:<model>" in order
    pub lifecycle: Mutex<Vec<String>>,
    pub fail_load: Mutex<bool>,
    /// Hold session disposal until notified
    pub dispose_gate: Mutex<Option<Arc<Notify>>>,
}

impl Script {
    pub fn new(city_reply: &str, fragments: &[&str]) -> Arc<Self> {
        let script = Self::default();
        *script.city_reply.lock() = city_reply.to_string();
        *script.fragments.lock() = fragments.iter().map(|f| Ok(f.to_string())).collect();
        Arc::new(script)
    }
}

pub struct ScriptedSession {
    model_id: String,
    script: Arc<Script>,
}

#[async_trait]
impl InferenceSession for ScriptedSession {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn complete_once(
        &self,
        messages: Vec<ChatMessage>,
        options: CompletionOptions,
    ) -> Result<String> {
        self.script.once_calls.lock().push((messages, options));
        if *self.script.fail_classification.lock() {
            return Err(NimbusError::InferenceError("classifier crashed".into()));
        }
        Ok(self.script.city_reply.lock().clone())
    }

    async fn complete_streaming(
        &self,
        messages: Vec<ChatMessage>,
        options: CompletionOptions,
    ) -> Result<TokenStream> {
        self.script.stream_calls.lock().push((messages, options));

        if let Some(error) = self.script.open_error.lock().clone() {
            return Err(NimbusError::InferenceError(error));
        }

        let fragments = self.script.fragments.lock().clone();
        let gate = self.script.gate.lock().clone();
        let watch = self.script.watch.lock().clone();
        let observed = Arc::clone(&self.script.observed);

        Ok(Box::pin(async_stream::stream! {
            if let Some(gate) = gate {
                gate.notified().await;
            }
            for fragment in fragments {
                if let Some(buffer) = &watch {
                    observed.lock().push(buffer.snapshot());
                }
                yield fragment.map_err(NimbusError::InferenceError);
            }
            if let Some(buffer) = &watch {
                observed.lock().push(buffer.snapshot());
            }
        }))
    }

    async fn dispose(&self) {
        let gate = self.script.dispose_gate.lock().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.script
            .lifecycle
            .lock()
            .push(format!("dispose:{}", self.model_id));
    }
}

pub struct ScriptedFactory {
    pub script: Arc<Script>,
}

#[async_trait]
impl SessionFactory for ScriptedFactory {
    async fn create_session(
        &self,
        model_id: &str,
        progress: ProgressSender,
    ) -> Result<Box<dyn InferenceSession>> {
        let _ = progress.send("Initializing worker...".to_string());
        self.script
            .lifecycle
            .lock()
            .push(format!("create:{}", model_id));

        if *self.script.fail_load.lock() {
            return Err(NimbusError::ModelLoadError("out of memory".into()));
        }

        Ok(Box::new(ScriptedSession {
            model_id: model_id.to_string(),
            script: Arc::clone(&self.script),
        }))
    }
}

/// Answers "Paris" with a fixed forecast and records every query
#[derive(Default)]
pub struct FakeWeather {
    pub queries: Mutex<Vec<LocationQuery>>,
}

pub const PARIS_FORECAST: &str = r#"{
    "current": {"temperature_2m": 18.0, "relative_humidity_2m": 60,
                "weather_code": 2, "wind_speed_10m": 12.3},
    "hourly": {
        "time": ["2024-06-01T09:00", "2024-06-01T15:00", "2024-06-01T21:00"],
        "temperature_2m": [15.0, 21.5, 16.0],
        "weather_code": [1, 3, 61]
    }
}"#;

#[async_trait]
impl WeatherProvider for FakeWeather {
    async fn resolve(&self, query: &LocationQuery) -> Option<WeatherSummary> {
        self.queries.lock().push(query.clone());
        let forecast = parse_forecast(PARIS_FORECAST).ok()?;
        match query {
            LocationQuery::CityName(name) if name.eq_ignore_ascii_case("paris") => {
                Some(WeatherSummary::from_forecast("Paris, France", &forecast))
            }
            LocationQuery::CityName(_) => None,
            LocationQuery::Coordinates(_) => {
                Some(WeatherSummary::from_forecast("your location", &forecast))
            }
        }
    }
}

/// Records utterances; the test decides when playback ends
#[derive(Default)]
pub struct RecordingSynthesizer {
    pub spoken: Mutex<Vec<(Utterance, Sender<SpeechEvent>)>>,
    pub cancels: Mutex<usize>,
}

impl SpeechSynthesizer for RecordingSynthesizer {
    fn voices(&self) -> Vec<Voice> {
        vec![Voice {
            id: "en-us".into(),
            name: "Amy".into(),
            language: "en-US".into(),
        }]
    }

    fn speak(&self, utterance: Utterance, events: Sender<SpeechEvent>) -> Result<()> {
        let _ = events.send(SpeechEvent::Started(utterance.id));
        self.spoken.lock().push((utterance, events));
        Ok(())
    }

    fn cancel(&self) {
        *self.cancels.lock() += 1;
    }
}

pub struct Harness {
    pub orchestrator: Arc<Orchestrator>,
    pub script: Arc<Script>,
    pub weather: Arc<FakeWeather>,
    pub speech: Arc<RecordingSynthesizer>,
}

pub fn harness_with(script: Arc<Script>, geolocator: Arc<dyn Geolocator>) -> Harness {
    let weather = Arc::new(FakeWeather::default());
    let speech = Arc::new(RecordingSynthesizer::default());

    let orchestrator = OrchestratorBuilder::new()
        .with_session_factory(Arc::new(ScriptedFactory {
            script: Arc::clone(&script),
        }))
        .with_weather_provider(weather.clone())
        .with_geolocator(geolocator)
        .with_synthesizer(speech.clone())
        .build()
        .expect("orchestrator");

    Harness {
        orchestrator: Arc::new(orchestrator),
        script,
        weather,
        speech,
    }
}

pub fn harness(script: Arc<Script>) -> Harness {
    harness_with(script, Arc::new(FixedGeolocator::denied()))
}
