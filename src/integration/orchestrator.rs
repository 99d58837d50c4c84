//! Orchestrator for a single question-and-answer turn
//!
//! Connects all components: intent -> weather lookup -> LLM stream -> speech.
//! The orchestrator is the only writer of the busy flags, and every turn or
//! model load claims them under one lock before doing any work.

use crate::integration::config::{AppConfig, AssistantConfig};
use crate::integration::intent::{classification_messages, parse_city_reply, IntentDetector};
use crate::integration::state::{
    shared_state, InteractionState, SharedState, STATUS_READY, STATUS_WAITING,
};
use crate::llm::config::LLMConfig;
use crate::llm::inference::{CompletionOptions, InferenceSession, SessionFactory};
use crate::llm::prompts::build_user_content;
use crate::llm::session::{ModelSelection, SessionManager};
use crate::llm::worker::WorkerSessionFactory;
use crate::messages::{ChatMessage, ResponseBuffer};
use crate::speech::output::SpeechOutput;
use crate::speech::synth::SpeechSynthesizer;
use crate::speech::synthesizer_from_config;
use crate::weather::client::{OpenMeteoClient, WeatherProvider};
use crate::weather::location::{geolocator_from_config, Geolocator, LocationQuery};
use crate::weather::summary::WeatherSummary;
use crate::{NimbusError, Result};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use futures::StreamExt;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Appended to the response when the stream fails part way
pub const GENERATION_ERROR_MARKER: &str = "\n[Error interrupting generation]";

pub const STATUS_THINKING: &str = "Thinking...";
pub const STATUS_LOCATING: &str = "Getting your location...";
pub const STATUS_GENERATING: &str = "Generating...";
pub const STATUS_UNLOADING: &str = "Unloading...";

/// Events kept for the consumer before the oldest are dropped
pub const EVENT_CAPACITY: usize = 1024;

/// What starts a turn
#[derive(Debug, Clone, PartialEq)]
pub enum SendRequest {
    /// A typed question
    Text(String),

    /// The "use my location" shortcut
    MyLocation,
}

/// Why a send did nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    EmptyInput,
    NoSession,
    Busy,
}

/// Result of a send
#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    /// The answer was generated, possibly cut short by an engine error
    Completed {
        response: String,
        weather: Option<WeatherSummary>,
        interrupted: bool,
    },

    /// Nothing was started
    Ignored(IgnoreReason),

    /// The turn stopped before generation and the user was alerted
    Aborted { reason: String },
}

/// Events emitted by the orchestrator
#[derive(Debug, Clone, PartialEq)]
pub enum OrchestratorEvent {
    /// New status line text
    StatusChanged(String),

    /// A turn claimed the state and cleared the response
    TurnStarted,

    /// Token received from LLM
    Token(String),

    /// LLM finished generating response
    GenerationComplete {
        response: String,
        first_token_ms: Option<u64>,
        total_ms: u64,
        interrupted: bool,
    },

    /// A session is ready for this model
    ModelLoaded(String),

    /// Loading failed; the load action can be retried
    ModelLoadFailed(String),

    /// The session was released
    ModelUnloaded,

    /// Message the user has to acknowledge
    Alert(String),
}

fn busy_error(action: &str) -> NimbusError {
    NimbusError::OrchestratorError(format!("Cannot {} while busy", action))
}

/// Runs turns against the live session
pub struct Orchestrator {
    assistant: AssistantConfig,
    llm: LLMConfig,
    intent: IntentDetector,
    state: SharedState,
    buffer: ResponseBuffer,
    sessions: SessionManager,
    selection: Mutex<ModelSelection>,
    weather: Arc<dyn WeatherProvider>,
    geolocator: Arc<dyn Geolocator>,
    speech: SpeechOutput,
    event_tx: Sender<OrchestratorEvent>,
    event_rx: Receiver<OrchestratorEvent>,
}

impl Orchestrator {
    /// Create an orchestrator with the production components for `config`
    pub fn new(config: AppConfig) -> Result<Self> {
        OrchestratorBuilder::new().with_config(config).build()
    }

    /// Answer one question. Never fails; problems show up in the outcome,
    /// the status line and the response text.
    pub async fn send(&self, request: SendRequest) -> SendOutcome {
        let (question, from_location) = match request {
            SendRequest::Text(text) => (text.trim().to_string(), false),
            SendRequest::MyLocation => (self.assistant.location_question.clone(), true),
        };

        if question.is_empty() {
            debug!("Ignoring empty input");
            return SendOutcome::Ignored(IgnoreReason::EmptyInput);
        }

        let previous_status = {
            let mut state = self.state.lock();
            let previous = state.status_text.clone();
            if !state.try_begin_turn(STATUS_THINKING) {
                debug!("Ignoring send while busy ({:?})", state.phase());
                return SendOutcome::Ignored(IgnoreReason::Busy);
            }
            previous
        };

        let Some(session) = self.sessions.current().await else {
            debug!("Ignoring send without a loaded model");
            self.state.lock().end_turn(previous_status);
            return SendOutcome::Ignored(IgnoreReason::NoSession);
        };

        self.publish_status();
        self.speech.stop();
        self.buffer.clear();
        self.emit(OrchestratorEvent::TurnStarted);
        info!("New turn (location shortcut: {})", from_location);

        let query = if from_location {
            self.set_status(STATUS_LOCATING);
            match self.geolocator.locate().await {
                Ok(coordinates) => Some(LocationQuery::Coordinates(coordinates)),
                Err(e) => {
                    warn!("Geolocation failed: {}", e);
                    let reason = e.user_message();
                    self.state.lock().end_turn(STATUS_READY);
                    self.publish_status();
                    self.emit(OrchestratorEvent::Alert(reason.clone()));
                    return SendOutcome::Aborted { reason };
                }
            }
        } else if self.intent.needs_weather(&question) {
            self.extract_city(session.as_ref(), &question)
                .await
                .map(LocationQuery::CityName)
        } else {
            None
        };

        let weather = match query {
            Some(query) => {
                self.set_status(format!("Fetching weather for {}...", query));
                self.weather.resolve(&query).await
            }
            None => None,
        };

        let context = weather.as_ref().map(WeatherSummary::to_context_block);
        let messages = vec![
            ChatMessage::system(self.assistant.system_prompt.as_str()),
            ChatMessage::user(build_user_content(&question, context.as_deref())),
        ];

        self.state.lock().begin_generating(STATUS_GENERATING);
        self.publish_status();

        let started = Instant::now();
        let (first_token_ms, interrupted) = self.stream_answer(session.as_ref(), messages).await;
        let total_ms = started.elapsed().as_millis() as u64;
        let response = self.buffer.snapshot();

        self.state.lock().end_turn(STATUS_READY);
        self.publish_status();
        info!(
            "Generation finished in {} ms ({} chars, interrupted: {})",
            total_ms,
            response.len(),
            interrupted
        );
        self.emit(OrchestratorEvent::GenerationComplete {
            response: response.clone(),
            first_token_ms,
            total_ms,
            interrupted,
        });

        if !interrupted {
            if let Err(e) = self.speech.speak(&response) {
                warn!("Could not speak the answer: {}", e);
            }
        }

        SendOutcome::Completed {
            response,
            weather,
            interrupted,
        }
    }

    /// Ask the model which city the question is about
    async fn extract_city(&self, session: &dyn InferenceSession, question: &str) -> Option<String> {
        let options = CompletionOptions::deterministic()
            .with_max_tokens(Some(self.llm.classification_max_tokens));

        match session
            .complete_once(classification_messages(question), options)
            .await
        {
            Ok(reply) => {
                let city = parse_city_reply(&reply);
                debug!("City extraction replied {:?} -> {:?}", reply, city);
                city
            }
            Err(e) => {
                warn!("City extraction failed: {}", e);
                None
            }
        }
    }

    /// Stream the answer into the response buffer.
    ///
    /// Returns the time to the first fragment and whether the stream failed.
    async fn stream_answer(
        &self,
        session: &dyn InferenceSession,
        messages: Vec<ChatMessage>,
    ) -> (Option<u64>, bool) {
        let options =
            CompletionOptions::new(self.llm.temperature).with_max_tokens(self.llm.max_tokens);
        let started = Instant::now();
        let mut first_token_ms = None;

        let mut stream = match session.complete_streaming(messages, options).await {
            Ok(stream) => stream,
            Err(e) => {
                error!("Failed to start generation: {}", e);
                self.append(GENERATION_ERROR_MARKER);
                return (None, true);
            }
        };

        while let Some(fragment) = stream.next().await {
            match fragment {
                Ok(fragment) => {
                    if first_token_ms.is_none() {
                        first_token_ms = Some(started.elapsed().as_millis() as u64);
                    }
                    self.append(&fragment);
                }
                Err(e) => {
                    error!("Generation interrupted: {}", e);
                    self.append(GENERATION_ERROR_MARKER);
                    return (first_token_ms, true);
                }
            }
        }

        (first_token_ms, false)
    }

    fn append(&self, fragment: &str) {
        self.buffer.push(fragment);
        self.emit(OrchestratorEvent::Token(fragment.to_string()));
    }

    /// Replace the live session with one serving `model_id`.
    ///
    /// Progress text goes to the status line. Failure leaves no session and
    /// an `"Error: ..."` status; calling again retries.
    pub async fn load_model(&self, model_id: &str) -> Result<()> {
        let previous_status = {
            let mut state = self.state.lock();
            let previous = state.status_text.clone();
            if !state.try_begin_load(format!("Loading {}...", model_id)) {
                warn!("Ignoring load of {} while busy", model_id);
                return Err(busy_error("load a model"));
            }
            previous
        };

        let selected = self.selection.lock().select(model_id);
        if let Err(e) = selected {
            self.state.lock().end_load(previous_status);
            self.publish_status();
            return Err(e);
        }

        self.speech.stop();
        self.publish_status();
        info!("Loading model {}", model_id);

        let (progress_tx, mut progress_rx) = mpsc::unbounded_channel();
        let load = self.sessions.load(model_id, progress_tx);
        tokio::pin!(load);

        let result = loop {
            tokio::select! {
                result = &mut load => break result,
                Some(progress) = progress_rx.recv() => self.set_status(progress),
            }
        };
        while let Ok(progress) = progress_rx.try_recv() {
            self.set_status(progress);
        }

        match result {
            Ok(()) => {
                self.state.lock().reset(STATUS_READY);
                self.publish_status();
                self.emit(OrchestratorEvent::ModelLoaded(model_id.to_string()));
                Ok(())
            }
            Err(e) => {
                error!("Failed to load {}: {}", model_id, e);
                self.state.lock().end_load(format!("Error: {}", e));
                self.publish_status();
                self.emit(OrchestratorEvent::ModelLoadFailed(e.to_string()));
                Err(e)
            }
        }
    }

    /// Release the live session. Holds the busy claim until disposal ends.
    pub async fn unload_model(&self) -> Result<()> {
        if !self.state.lock().try_begin_load(STATUS_UNLOADING) {
            warn!("Ignoring unload while busy");
            return Err(busy_error("unload the model"));
        }

        self.speech.stop();
        self.publish_status();
        self.sessions.unload().await;
        self.state.lock().reset(STATUS_WAITING);
        self.publish_status();
        self.emit(OrchestratorEvent::ModelUnloaded);
        info!("Model unloaded");
        Ok(())
    }

    /// Change the picked model without loading it
    pub fn select_model(&self, model_id: &str) -> Result<bool> {
        self.selection.lock().select(model_id)
    }

    pub fn selection(&self) -> ModelSelection {
        self.selection.lock().clone()
    }

    pub fn stop_speaking(&self) {
        self.speech.stop();
    }

    pub async fn is_model_loaded(&self) -> bool {
        self.sessions.is_loaded().await
    }

    /// Snapshot of the interaction state
    pub fn state(&self) -> InteractionState {
        self.state.lock().clone()
    }

    pub fn shared_state(&self) -> SharedState {
        Arc::clone(&self.state)
    }

    /// Text generated so far in the current turn
    pub fn response(&self) -> String {
        self.buffer.snapshot()
    }

    pub fn response_buffer(&self) -> ResponseBuffer {
        self.buffer.clone()
    }

    pub fn speech(&self) -> &SpeechOutput {
        &self.speech
    }

    /// Receiver for orchestrator events.
    ///
    /// There is one queue with a single intended consumer: clones share it,
    /// so each event reaches only one of them. When nobody drains the queue
    /// it holds the newest `EVENT_CAPACITY` events.
    pub fn events(&self) -> Receiver<OrchestratorEvent> {
        self.event_rx.clone()
    }

    /// Receive the next event without blocking
    pub fn try_recv_event(&self) -> Option<OrchestratorEvent> {
        self.event_rx.try_recv().ok()
    }

    fn set_status(&self, status: impl Into<String>) {
        self.state.lock().status_text = status.into();
        self.publish_status();
    }

    fn publish_status(&self) {
        let status = self.state.lock().status_text.clone();
        self.emit(OrchestratorEvent::StatusChanged(status));
    }

    fn emit(&self, event: OrchestratorEvent) {
        let mut event = event;
        loop {
            match self.event_tx.try_send(event) {
                Ok(()) => return,
                Err(TrySendError::Full(rejected)) => {
                    // Nobody is polling; make room by dropping the oldest
                    let _ = self.event_rx.try_recv();
                    event = rejected;
                }
                Err(TrySendError::Disconnected(_)) => return,
            }
        }
    }
}

/// Builder for creating an orchestrator with custom components
pub struct OrchestratorBuilder {
    config: AppConfig,
    session_factory: Option<Arc<dyn SessionFactory>>,
    weather: Option<Arc<dyn WeatherProvider>>,
    geolocator: Option<Arc<dyn Geolocator>>,
    synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
    state: Option<SharedState>,
}

impl OrchestratorBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
            session_factory: None,
            weather: None,
            geolocator: None,
            synthesizer: None,
            state: None,
        }
    }

    /// Set the full configuration
    pub fn with_config(mut self, config: AppConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the LLM model to load by default
    pub fn with_llm_model(mut self, model_id: impl Into<String>) -> Self {
        self.config.llm.model_id = model_id.into();
        self
    }

    /// Disable audio output (text-only mode)
    pub fn without_audio_output(mut self) -> Self {
        self.config = self.config.without_audio_output();
        self
    }

    pub fn with_session_factory(mut self, factory: Arc<dyn SessionFactory>) -> Self {
        self.session_factory = Some(factory);
        self
    }

    pub fn with_weather_provider(mut self, weather: Arc<dyn WeatherProvider>) -> Self {
        self.weather = Some(weather);
        self
    }

    pub fn with_geolocator(mut self, geolocator: Arc<dyn Geolocator>) -> Self {
        self.geolocator = Some(geolocator);
        self
    }

    pub fn with_synthesizer(mut self, synthesizer: Arc<dyn SpeechSynthesizer>) -> Self {
        self.synthesizer = Some(synthesizer);
        self
    }

    /// Share an existing state handle instead of creating one
    pub fn with_state(mut self, state: SharedState) -> Self {
        self.state = Some(state);
        self
    }

    /// Build the orchestrator, creating production components for any
    /// seam that was not overridden
    pub fn build(self) -> Result<Orchestrator> {
        let config = self.config;
        config.validate()?;

        let session_factory = match self.session_factory {
            Some(factory) => factory,
            None => Arc::new(WorkerSessionFactory::mistral(config.llm.clone())),
        };
        let weather = match self.weather {
            Some(weather) => weather,
            None => Arc::new(OpenMeteoClient::new(config.weather.clone())?),
        };
        let geolocator = match self.geolocator {
            Some(geolocator) => geolocator,
            None => Arc::from(geolocator_from_config(&config.location)?),
        };
        let synthesizer = self
            .synthesizer
            .unwrap_or_else(|| synthesizer_from_config(&config.speech));
        let state = self.state.unwrap_or_else(shared_state);

        let selection = ModelSelection::new(
            config.llm.model_id.clone(),
            config.llm.available_models.clone(),
        );
        let speech = SpeechOutput::new(synthesizer, config.speech.clone(), Arc::clone(&state));
        let (event_tx, event_rx) = bounded(EVENT_CAPACITY);

        Ok(Orchestrator {
            intent: IntentDetector::new(config.assistant.weather_keywords.clone()),
            assistant: config.assistant,
            llm: config.llm,
            state,
            buffer: ResponseBuffer::new(),
            sessions: SessionManager::new(session_factory),
            selection: Mutex::new(selection),
            weather,
            geolocator,
            speech,
            event_tx,
            event_rx,
        })
    }
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::inference::{ProgressSender, TokenStream};
    use crate::speech::synth::SilentSynthesizer;
    use crate::weather::location::{Coordinates, FixedGeolocator};
    use async_trait::async_trait;

    /// Replies with fixed text to both completion styles
    struct CannedSession {
        city_reply: String,
        fragments: Vec<String>,
        once_calls: Arc<Mutex<Vec<CompletionOptions>>>,
    }

    #[async_trait]
    impl InferenceSession for CannedSession {
        fn model_id(&self) -> &str {
            "canned"
        }

        async fn complete_once(
            &self,
            _messages: Vec<ChatMessage>,
            options: CompletionOptions,
        ) -> Result<String> {
            self.once_calls.lock().push(options);
            Ok(self.city_reply.clone())
        }

        async fn complete_streaming(
            &self,
            _messages: Vec<ChatMessage>,
            _options: CompletionOptions,
        ) -> Result<TokenStream> {
            let fragments: Vec<Result<String>> =
                self.fragments.iter().cloned().map(Ok).collect();
            Ok(futures::stream::iter(fragments).boxed())
        }

        async fn dispose(&self) {}
    }

    struct CannedFactory {
        city_reply: String,
        once_calls: Arc<Mutex<Vec<CompletionOptions>>>,
        fail: bool,
    }

    #[async_trait]
    impl SessionFactory for CannedFactory {
        async fn create_session(
            &self,
            model_id: &str,
            progress: ProgressSender,
        ) -> Result<Box<dyn InferenceSession>> {
            let _ = progress.send(format!("Downloading {}...", model_id));
            if self.fail {
                return Err(NimbusError::ModelLoadError("weights missing".into()));
            }
            Ok(Box::new(CannedSession {
                city_reply: self.city_reply.clone(),
                fragments: vec!["It is ".into(), "mild.".into()],
                once_calls: Arc::clone(&self.once_calls),
            }))
        }
    }

    /// Records queries and never finds anything
    #[derive(Default)]
    struct RecordingWeather {
        queries: Mutex<Vec<LocationQuery>>,
    }

    #[async_trait]
    impl WeatherProvider for RecordingWeather {
        async fn resolve(&self, query: &LocationQuery) -> Option<WeatherSummary> {
            self.queries.lock().push(query.clone());
            None
        }
    }

    struct Fixture {
        orchestrator: Orchestrator,
        weather: Arc<RecordingWeather>,
        once_calls: Arc<Mutex<Vec<CompletionOptions>>>,
    }

    fn fixture(city_reply: &str, fail_load: bool, geolocator: FixedGeolocator) -> Fixture {
        let once_calls = Arc::new(Mutex::new(Vec::new()));
        let weather = Arc::new(RecordingWeather::default());
        let orchestrator = OrchestratorBuilder::new()
            .with_session_factory(Arc::new(CannedFactory {
                city_reply: city_reply.to_string(),
                once_calls: Arc::clone(&once_calls),
                fail: fail_load,
            }))
            .with_weather_provider(weather.clone())
            .with_geolocator(Arc::new(geolocator))
            .with_synthesizer(Arc::new(SilentSynthesizer))
            .build()
            .unwrap();

        Fixture {
            orchestrator,
            weather,
            once_calls,
        }
    }

    #[tokio::test]
    async fn test_send_without_session_is_ignored() {
        let f = fixture("UNKNOWN", false, FixedGeolocator::denied());

        let outcome = f.orchestrator.send(SendRequest::Text("hello".into())).await;
        assert_eq!(outcome, SendOutcome::Ignored(IgnoreReason::NoSession));

        let state = f.orchestrator.state();
        assert_eq!(state.status_text, STATUS_WAITING);
        assert!(state.can_send());
    }

    #[tokio::test]
    async fn test_empty_input_is_ignored() {
        let f = fixture("UNKNOWN", false, FixedGeolocator::denied());
        f.orchestrator.load_model("meta-llama/Llama-3.2-1B-Instruct").await.unwrap();

        let outcome = f.orchestrator.send(SendRequest::Text("   \n".into())).await;
        assert_eq!(outcome, SendOutcome::Ignored(IgnoreReason::EmptyInput));
    }

    #[tokio::test]
    async fn test_load_reports_progress_and_ready() {
        let f = fixture("UNKNOWN", false, FixedGeolocator::denied());
        let events = f.orchestrator.events();

        f.orchestrator
            .load_model("meta-llama/Llama-3.2-1B-Instruct")
            .await
            .unwrap();

        let events: Vec<_> = events.try_iter().collect();
        assert!(events.contains(&OrchestratorEvent::StatusChanged(
            "Downloading meta-llama/Llama-3.2-1B-Instruct...".into()
        )));
        assert!(events.contains(&OrchestratorEvent::ModelLoaded(
            "meta-llama/Llama-3.2-1B-Instruct".into()
        )));
        assert_eq!(f.orchestrator.state().status_text, STATUS_READY);
        assert!(f.orchestrator.is_model_loaded().await);
    }

    #[tokio::test]
    async fn test_failed_load_sets_error_status_and_can_retry() {
        let f = fixture("UNKNOWN", true, FixedGeolocator::denied());

        let result = f.orchestrator.load_model("microsoft/Phi-3.5-mini-instruct").await;
        assert!(result.is_err());

        let state = f.orchestrator.state();
        assert!(state.status_text.starts_with("Error: "));
        assert!(state.status_text.contains("weights missing"));
        assert!(!state.is_loading_model);
        assert!(!f.orchestrator.is_model_loaded().await);

        // Still retryable
        assert!(f.orchestrator.load_model("microsoft/Phi-3.5-mini-instruct").await.is_err());
    }

    #[tokio::test]
    async fn test_unknown_model_is_rejected_without_changing_status() {
        let f = fixture("UNKNOWN", false, FixedGeolocator::denied());
        let result = f.orchestrator.load_model("nobody/nothing").await;
        assert!(matches!(result, Err(NimbusError::ConfigError(_))));
        assert_eq!(f.orchestrator.state().status_text, STATUS_WAITING);
        assert!(!f.orchestrator.state().is_loading_model);
    }

    #[tokio::test]
    async fn test_weather_question_extracts_city() {
        let f = fixture("The city is Oslo.", false, FixedGeolocator::denied());
        f.orchestrator.load_model("meta-llama/Llama-3.2-1B-Instruct").await.unwrap();

        let outcome = f
            .orchestrator
            .send(SendRequest::Text("Will it rain in Oslo?".into()))
            .await;

        assert!(matches!(outcome, SendOutcome::Completed { interrupted: false, .. }));
        assert_eq!(
            *f.weather.queries.lock(),
            vec![LocationQuery::CityName("Oslo".into())]
        );

        let calls = f.once_calls.lock();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].temperature, 0.0);
        assert_eq!(calls[0].max_tokens, Some(16));
    }

    #[tokio::test]
    async fn test_unknown_city_skips_lookup() {
        let f = fixture("unknown", false, FixedGeolocator::denied());
        f.orchestrator.load_model("meta-llama/Llama-3.2-1B-Instruct").await.unwrap();

        f.orchestrator
            .send(SendRequest::Text("Is it cold today?".into()))
            .await;

        assert!(f.weather.queries.lock().is_empty());
        assert_eq!(f.once_calls.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_small_talk_skips_classification() {
        let f = fixture("Paris", false, FixedGeolocator::denied());
        f.orchestrator.load_model("meta-llama/Llama-3.2-1B-Instruct").await.unwrap();

        let outcome = f
            .orchestrator
            .send(SendRequest::Text("Tell me a joke".into()))
            .await;

        assert_eq!(
            outcome,
            SendOutcome::Completed {
                response: "It is mild.".into(),
                weather: None,
                interrupted: false,
            }
        );
        assert!(f.once_calls.lock().is_empty());
        assert!(f.weather.queries.lock().is_empty());
    }

    #[tokio::test]
    async fn test_location_shortcut_uses_coordinates() {
        let f = fixture(
            "Paris",
            false,
            FixedGeolocator::new(Coordinates::new(59.91, 10.75)),
        );
        f.orchestrator.load_model("meta-llama/Llama-3.2-1B-Instruct").await.unwrap();

        f.orchestrator.send(SendRequest::MyLocation).await;

        assert!(f.once_calls.lock().is_empty());
        assert_eq!(
            *f.weather.queries.lock(),
            vec![LocationQuery::Coordinates(Coordinates::new(59.91, 10.75))]
        );
    }

    #[tokio::test]
    async fn test_denied_location_aborts_with_alert() {
        let f = fixture("Paris", false, FixedGeolocator::denied());
        f.orchestrator.load_model("meta-llama/Llama-3.2-1B-Instruct").await.unwrap();
        let events = f.orchestrator.events();
        while events.try_recv().is_ok() {}

        let outcome = f.orchestrator.send(SendRequest::MyLocation).await;

        assert!(matches!(outcome, SendOutcome::Aborted { .. }));
        assert!(events
            .try_iter()
            .any(|e| matches!(e, OrchestratorEvent::Alert(_))));
        assert!(f.weather.queries.lock().is_empty());

        let state = f.orchestrator.state();
        assert!(state.can_send());
        assert_eq!(state.status_text, STATUS_READY);
    }

    #[tokio::test]
    async fn test_unload_returns_to_waiting() {
        let f = fixture("Paris", false, FixedGeolocator::denied());
        f.orchestrator.load_model("meta-llama/Llama-3.2-1B-Instruct").await.unwrap();

        f.orchestrator.unload_model().await.unwrap();

        assert_eq!(f.orchestrator.state().status_text, STATUS_WAITING);
        assert!(!f.orchestrator.is_model_loaded().await);
    }

    #[test]
    fn test_undrained_events_keep_the_newest() {
        let f = fixture("Paris", false, FixedGeolocator::denied());
        let events = f.orchestrator.events();

        for i in 0..EVENT_CAPACITY + 10 {
            f.orchestrator.emit(OrchestratorEvent::Token(i.to_string()));
        }

        assert_eq!(events.len(), EVENT_CAPACITY);
        assert_eq!(
            events.try_recv().ok(),
            Some(OrchestratorEvent::Token("10".into()))
        );
        let last = events.try_iter().last();
        assert_eq!(
            last,
            Some(OrchestratorEvent::Token((EVENT_CAPACITY + 9).to_string()))
        );
    }
}
