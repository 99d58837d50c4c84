//! Background worker hosting a chat engine
//!
//! Each session owns one dedicated thread with its own tokio runtime. The
//! engine never leaves that thread; callers talk to it by message passing.
//! Requests are served one at a time in arrival order.

use crate::llm::config::LLMConfig;
use crate::llm::inference::{
    ChatEngine, CompletionOptions, InferenceSession, ProgressSender, SessionFactory, TokenStream,
};
use crate::messages::ChatMessage;
use crate::{NimbusError, Result};
use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};
use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use std::thread::JoinHandle;
use tokio::runtime::Runtime;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

/// Capacity of the per-request token channel
const TOKEN_CHANNEL_SIZE: usize = 100;

/// Builds the engine inside the worker thread
pub type EngineLoader = Arc<
    dyn Fn(String, ProgressSender) -> BoxFuture<'static, Result<Box<dyn ChatEngine>>>
        + Send
        + Sync,
>;

/// Requests that can be sent to the worker
enum WorkerRequest {
    Complete {
        messages: Vec<ChatMessage>,
        options: CompletionOptions,
        reply: oneshot::Sender<Result<String>>,
    },
    Stream {
        messages: Vec<ChatMessage>,
        options: CompletionOptions,
        token_tx: mpsc::Sender<Result<String>>,
    },
    Shutdown,
}

/// Session backed by a worker thread
pub struct WorkerSession {
    model_id: String,
    request_tx: mpsc::UnboundedSender<WorkerRequest>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl WorkerSession {
    /// Spawn the worker and wait until the engine is loaded
    pub async fn spawn(
        model_id: &str,
        loader: EngineLoader,
        progress: ProgressSender,
    ) -> Result<Self> {
        let (request_tx, request_rx) = mpsc::unbounded_channel();
        let (ready_tx, ready_rx) = oneshot::channel();

        let _ = progress.send("Initializing worker...".to_string());

        let worker_model_id = model_id.to_string();
        let thread = std::thread::Builder::new()
            .name("nimbus-llm-worker".to_string())
            .spawn(move || run_worker(worker_model_id, loader, progress, ready_tx, request_rx))
            .map_err(|e| NimbusError::ModelLoadError(format!("Failed to spawn worker: {}", e)))?;

        let loaded = ready_rx.await.unwrap_or_else(|_| {
            Err(NimbusError::ModelLoadError(
                "Worker exited before the model was ready".to_string(),
            ))
        });

        if let Err(e) = loaded {
            join_worker(thread).await;
            return Err(e);
        }

        Ok(Self {
            model_id: model_id.to_string(),
            request_tx,
            thread: Mutex::new(Some(thread)),
        })
    }

    fn send(&self, request: WorkerRequest) -> Result<()> {
        self.request_tx
            .send(request)
            .map_err(|_| NimbusError::ChannelError("LLM worker is not running".to_string()))
    }
}

#[async_trait]
impl InferenceSession for WorkerSession {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn complete_once(
        &self,
        messages: Vec<ChatMessage>,
        options: CompletionOptions,
    ) -> Result<String> {
        let (reply, reply_rx) = oneshot::channel();
        self.send(WorkerRequest::Complete {
            messages,
            options,
            reply,
        })?;

        reply_rx.await.map_err(|_| {
            NimbusError::ChannelError("LLM worker dropped the request".to_string())
        })?
    }

    async fn complete_streaming(
        &self,
        messages: Vec<ChatMessage>,
        options: CompletionOptions,
    ) -> Result<TokenStream> {
        let (token_tx, mut token_rx) = mpsc::channel(TOKEN_CHANNEL_SIZE);
        self.send(WorkerRequest::Stream {
            messages,
            options,
            token_tx,
        })?;

        let stream = async_stream::stream! {
            while let Some(item) = token_rx.recv().await {
                yield item;
            }
        };

        Ok(Box::pin(stream))
    }

    async fn dispose(&self) {
        let Some(thread) = self.thread.lock().take() else {
            return;
        };

        info!("Disposing LLM worker for {}", self.model_id);
        let _ = self.request_tx.send(WorkerRequest::Shutdown);
        join_worker(thread).await;
    }
}

impl Drop for WorkerSession {
    fn drop(&mut self) {
        if self.thread.lock().is_some() {
            // Let the worker wind down on its own; joining here could block a runtime thread
            let _ = self.request_tx.send(WorkerRequest::Shutdown);
        }
    }
}

async fn join_worker(thread: JoinHandle<()>) {
    match tokio::task::spawn_blocking(move || thread.join()).await {
        Ok(Ok(())) => debug!("LLM worker joined"),
        Ok(Err(_)) => error!("LLM worker panicked"),
        Err(e) => warn!("Failed to join LLM worker: {}", e),
    }
}

fn run_worker(
    model_id: String,
    loader: EngineLoader,
    progress: ProgressSender,
    ready_tx: oneshot::Sender<Result<()>>,
    mut request_rx: mpsc::UnboundedReceiver<WorkerRequest>,
) {
    info!("LLM worker starting for {}", model_id);

    let runtime = match Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            let _ = ready_tx.send(Err(NimbusError::ModelLoadError(format!(
                "Runtime creation failed: {}",
                e
            ))));
            return;
        }
    };

    let engine = match runtime.block_on(loader(model_id.clone(), progress)) {
        Ok(engine) => engine,
        Err(e) => {
            error!("Failed to initialize LLM engine: {}", e);
            let _ = ready_tx.send(Err(e));
            return;
        }
    };

    if ready_tx.send(Ok(())).is_err() {
        warn!("Session creator went away before the model was ready");
        return;
    }

    info!("LLM worker ready");

    while let Some(request) = runtime.block_on(request_rx.recv()) {
        match request {
            WorkerRequest::Complete {
                messages,
                options,
                reply,
            } => {
                debug!("Processing completion request ({} messages)", messages.len());
                let result = runtime.block_on(engine.generate(&messages, &options));
                let _ = reply.send(result);
            }
            WorkerRequest::Stream {
                messages,
                options,
                token_tx,
            } => {
                debug!("Processing streaming request ({} messages)", messages.len());
                let result = runtime.block_on(engine.generate_stream(
                    &messages,
                    &options,
                    token_tx.clone(),
                ));
                if let Err(e) = result {
                    warn!("Streaming generation failed: {}", e);
                    let _ = runtime.block_on(token_tx.send(Err(e)));
                }
            }
            WorkerRequest::Shutdown => {
                info!("LLM worker shutting down");
                break;
            }
        }
    }

    info!("LLM worker stopped");
}

/// Creates worker-backed sessions using an engine loader
pub struct WorkerSessionFactory {
    loader: EngineLoader,
}

impl WorkerSessionFactory {
    pub fn new(loader: EngineLoader) -> Self {
        Self { loader }
    }

    /// Build a factory from an async loader function
    pub fn from_fn<F, Fut>(load: F) -> Self
    where
        F: Fn(String, ProgressSender) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Box<dyn ChatEngine>>> + Send + 'static,
    {
        Self::new(Arc::new(move |model_id, progress| load(model_id, progress).boxed()))
    }

    /// Factory loading mistral.rs models with the given settings
    #[cfg(feature = "local-llm")]
    pub fn mistral(config: LLMConfig) -> Self {
        use crate::llm::engine::LLMEngine;

        Self::from_fn(move |model_id, progress| {
            let mut config = config.clone();
            config.model_id = model_id;
            async move {
                let engine = LLMEngine::load(config, progress).await?;
                Ok(Box::new(engine) as Box<dyn ChatEngine>)
            }
        })
    }

    /// Factory used when the crate is built without a local engine
    #[cfg(not(feature = "local-llm"))]
    pub fn mistral(_config: LLMConfig) -> Self {
        Self::from_fn(|model_id, _progress| async move {
            Err::<Box<dyn ChatEngine>, _>(NimbusError::ModelLoadError(format!(
                "Cannot load {}: built without the local-llm feature",
                model_id
            )))
        })
    }
}

#[async_trait]
impl SessionFactory for WorkerSessionFactory {
    async fn create_session(
        &self,
        model_id: &str,
        progress: ProgressSender,
    ) -> Result<Box<dyn InferenceSession>> {
        let session = WorkerSession::spawn(model_id, self.loader.clone(), progress).await?;
        Ok(Box::new(session))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    /// Engine that echoes the last message back word by word
    struct EchoEngine;

    #[async_trait]
    impl ChatEngine for EchoEngine {
        async fn generate(
            &self,
            messages: &[ChatMessage],
            _options: &CompletionOptions,
        ) -> Result<String> {
            Ok(messages.last().map(|m| m.content().to_string()).unwrap_or_default())
        }

        async fn generate_stream(
            &self,
            messages: &[ChatMessage],
            _options: &CompletionOptions,
            token_tx: mpsc::Sender<Result<String>>,
        ) -> Result<()> {
            let text = messages.last().map(|m| m.content().to_string()).unwrap_or_default();
            for word in text.split_inclusive(' ') {
                if token_tx.send(Ok(word.to_string())).await.is_err() {
                    break;
                }
            }
            if text.contains("fail") {
                return Err(NimbusError::InferenceError("engine failure".into()));
            }
            Ok(())
        }
    }

    fn echo_factory() -> WorkerSessionFactory {
        WorkerSessionFactory::from_fn(|_model_id, progress| async move {
            let _ = progress.send("Loading echo engine".to_string());
            Ok(Box::new(EchoEngine) as Box<dyn ChatEngine>)
        })
    }

    #[tokio::test]
    async fn test_complete_once_round_trips_through_worker() {
        let (progress_tx, mut progress_rx) = mpsc::unbounded_channel();
        let session = echo_factory()
            .create_session("echo", progress_tx)
            .await
            .unwrap();

        let reply = session
            .complete_once(vec![ChatMessage::user("ping")], CompletionOptions::deterministic())
            .await
            .unwrap();
        assert_eq!(reply, "ping");
        assert_eq!(session.model_id(), "echo");

        let mut progress = Vec::new();
        while let Ok(text) = progress_rx.try_recv() {
            progress.push(text);
        }
        assert_eq!(progress, vec!["Initializing worker...", "Loading echo engine"]);

        session.dispose().await;
    }

    #[tokio::test]
    async fn test_stream_preserves_order() {
        let (progress_tx, _progress_rx) = mpsc::unbounded_channel();
        let session = echo_factory()
            .create_session("echo", progress_tx)
            .await
            .unwrap();

        let stream = session
            .complete_streaming(
                vec![ChatMessage::user("one two three")],
                CompletionOptions::new(0.5),
            )
            .await
            .unwrap();
        let fragments: Vec<String> = stream.map(|r| r.unwrap()).collect().await;

        assert_eq!(fragments, vec!["one ", "two ", "three"]);
        session.dispose().await;
    }

    #[tokio::test]
    async fn test_stream_failure_is_delivered_after_partial_output() {
        let (progress_tx, _progress_rx) = mpsc::unbounded_channel();
        let session = echo_factory()
            .create_session("echo", progress_tx)
            .await
            .unwrap();

        let stream = session
            .complete_streaming(vec![ChatMessage::user("will fail")], CompletionOptions::new(0.5))
            .await
            .unwrap();
        let items: Vec<Result<String>> = stream.collect().await;

        assert_eq!(items.len(), 3);
        assert!(items[0].is_ok());
        assert!(items[1].is_ok());
        assert!(items[2].is_err());
        session.dispose().await;
    }

    #[tokio::test]
    async fn test_load_failure_is_reported() {
        let factory = WorkerSessionFactory::from_fn(|model_id, _progress| async move {
            Err::<Box<dyn ChatEngine>, _>(NimbusError::ModelLoadError(format!(
                "no such model {}",
                model_id
            )))
        });
        let (progress_tx, _progress_rx) = mpsc::unbounded_channel();

        let result = factory.create_session("missing", progress_tx).await;
        assert!(matches!(result, Err(NimbusError::ModelLoadError(_))));
    }

    #[tokio::test]
    async fn test_requests_after_dispose_fail() {
        let (progress_tx, _progress_rx) = mpsc::unbounded_channel();
        let session = echo_factory()
            .create_session("echo", progress_tx)
            .await
            .unwrap();

        session.dispose().await;
        session.dispose().await;

        let result = session
            .complete_once(vec![ChatMessage::user("ping")], CompletionOptions::deterministic())
            .await;
        assert!(matches!(result, Err(NimbusError::ChannelError(_))));
    }
}
