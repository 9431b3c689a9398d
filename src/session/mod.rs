//! Inference session manager
//!
//! A [`Session`] owns one engine handle for its whole lifetime and serves one
//! generation at a time. Each request resets the session's counters, sends the
//! decorated prompt to the engine, and relays engine events to subscribers as
//! [`PartialResult`]s from a background task.
//!
//! Subscribers share a single-slot latest-value cell. A subscriber that does
//! not consume between two emissions only observes the newer one, so slow
//! consumers may skip intermediate fragments but always see the most recent
//! result, including every request's terminal event unless a newer event
//! replaced it.

mod cell;

pub use cell::SessionCell;

use futures::StreamExt;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tokio_stream::Stream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::{Error, Result};
use crate::metrics::{GenerationCounters, MetricsSnapshot, SessionClock};
use crate::runtime::{EngineEvent, EngineEventStream, EngineLoader, EngineOptions, InferenceEngine};

/// Identifier of an accepted generation request, starting at 1.
pub type RequestId = u64;

/// One incremental unit of output for a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialResult {
    pub request_id: RequestId,
    pub text: String,
    /// Exactly one result per request has this set, and it is the last one.
    pub is_done: bool,
}

/// How the metrics report reaches callers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryMode {
    /// Only through [`Session::get_metrics`]
    #[default]
    OnDemand,
    /// Also appended to the text of each request's terminal result
    Emit,
}

/// Session settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    pub model_path: PathBuf,
    pub max_tokens: usize,
    /// Appended to every prompt before it reaches the engine
    pub prompt_suffix: String,
    pub summary: SummaryMode,
}

impl SessionOptions {
    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            model_path: self.model_path.clone(),
            max_tokens: self.max_tokens,
        }
    }
}

#[derive(Debug, Default)]
struct RequestState {
    counters: GenerationCounters,
    in_flight: Option<RequestId>,
    last_request: RequestId,
}

/// State shared between the session and its relay tasks.
struct Shared {
    clock: SessionClock,
    summary: SummaryMode,
    state: Mutex<RequestState>,
    results: watch::Sender<Option<PartialResult>>,
}

impl Shared {
    fn publish(&self, request_id: RequestId, text: String, is_done: bool) {
        self.results.send_replace(Some(PartialResult {
            request_id,
            text,
            is_done,
        }));
    }

    fn record(&self, request_id: RequestId, event: EngineEvent) {
        let mut state = self.state.lock();
        state.counters.record_event(self.clock.ms_at(event.emitted_at));
        self.publish(request_id, event.text, false);
    }

    fn release(&self, request_id: RequestId) {
        let mut state = self.state.lock();
        if state.in_flight == Some(request_id) {
            state.in_flight = None;
        }
    }

    /// Close out a request. `final_event` is the engine's terminal event,
    /// `None` when the request ended without one.
    ///
    /// The in-flight slot is released before the terminal result goes out,
    /// under the same lock, so an observer reacting to `is_done` can start
    /// the next request immediately.
    fn complete(&self, request_id: RequestId, final_event: Option<EngineEvent>) {
        let mut state = self.state.lock();
        if let Some(event) = &final_event {
            state.counters.record_event(self.clock.ms_at(event.emitted_at));
        }
        if state.in_flight == Some(request_id) {
            state.in_flight = None;
        }
        let snapshot = state.counters.snapshot();

        let text = final_event.map(|event| event.text).unwrap_or_default();
        let text = match self.summary {
            SummaryMode::OnDemand => text,
            SummaryMode::Emit => format!("{}{}", text, snapshot),
        };
        self.publish(request_id, text, true);

        info!(
            request_id,
            tokens = snapshot.token_count,
            ttft_ms = snapshot.ttft_ms,
            tpot_ms = snapshot.tpot_ms,
            latency_ms = snapshot.latency_ms,
            "Generation complete"
        );
    }
}

/// Consume one request's engine events and republish them.
async fn relay(
    shared: Arc<Shared>,
    request_id: RequestId,
    mut events: EngineEventStream,
    shutdown: CancellationToken,
) {
    loop {
        let next = tokio::select! {
            _ = shutdown.cancelled() => {
                debug!(request_id, "session shut down during generation");
                shared.complete(request_id, None);
                return;
            }
            next = events.next() => next,
        };

        match next {
            Some(Ok(event)) if event.done => {
                shared.complete(request_id, Some(event));
                return;
            }
            Some(Ok(event)) => shared.record(request_id, event),
            Some(Err(err)) => {
                error!(request_id, "Engine failed during generation: {}", err);
                shared.complete(request_id, None);
                return;
            }
            None => {
                warn!(request_id, "Engine stream ended without a terminal result");
                shared.complete(request_id, None);
                return;
            }
        }
    }
}

/// Releases a claimed in-flight slot unless defused, so a `generate` future
/// dropped while the engine is starting does not leave the session busy.
struct SlotGuard<'a> {
    shared: &'a Shared,
    request_id: RequestId,
    armed: bool,
}

impl SlotGuard<'_> {
    fn defuse(mut self) {
        self.armed = false;
    }
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            debug!(request_id = self.request_id, "Releasing unstarted request");
            self.shared.release(self.request_id);
        }
    }
}

/// Long-lived handle to an inference engine.
pub struct Session {
    engine: Arc<dyn InferenceEngine>,
    options: SessionOptions,
    shared: Arc<Shared>,
    shutdown: CancellationToken,
}

impl Session {
    /// Verify the model artifact and load the engine.
    ///
    /// Fails with [`Error::Config`] when no file exists at the model path.
    pub async fn open(options: SessionOptions, loader: &dyn EngineLoader) -> Result<Self> {
        let exists = match tokio::fs::try_exists(&options.model_path).await {
            Ok(exists) => exists,
            Err(err) => {
                debug!(path = %options.model_path.display(), "Model artifact lookup failed: {}", err);
                false
            }
        };
        debug!(path = %options.model_path.display(), exists, "Checked model artifact");
        if !exists {
            return Err(Error::model_not_found(&options.model_path));
        }

        let engine = loader.load(options.engine_options()).await?;
        info!(
            model = %options.model_path.display(),
            max_tokens = options.max_tokens,
            summary = ?options.summary,
            "Inference session ready"
        );

        let (results, _) = watch::channel(None);
        let shared = Arc::new(Shared {
            clock: SessionClock::new(),
            summary: options.summary,
            state: Mutex::new(RequestState::default()),
            results,
        });

        Ok(Self {
            engine,
            options,
            shared,
            shutdown: CancellationToken::new(),
        })
    }

    /// Start a generation and return without waiting for it.
    ///
    /// Results arrive through [`Session::subscribe`]. Only one request may
    /// stream at a time; a call made before the previous request's terminal
    /// result fails with [`Error::Busy`] and leaves that request untouched.
    pub async fn generate(&self, prompt: &str) -> Result<RequestId> {
        if self.shutdown.is_cancelled() {
            return Err(Error::Engine("session has been shut down".into()));
        }

        let request_id = {
            let mut state = self.shared.state.lock();
            if let Some(request_id) = state.in_flight {
                return Err(Error::Busy { request_id });
            }
            state.last_request += 1;
            let request_id = state.last_request;
            state.in_flight = Some(request_id);
            state.counters.reset(self.shared.clock.now_ms());
            request_id
        };
        let slot = SlotGuard {
            shared: &self.shared,
            request_id,
            armed: true,
        };

        let prompt = format!("{}{}", prompt, self.options.prompt_suffix);
        debug!(request_id, prompt_len = prompt.len(), "Starting generation");

        let events = match self.engine.generate_stream(&prompt).await {
            Ok(events) => events,
            Err(err) => {
                warn!(request_id, "Engine refused generation: {}", err);
                return Err(err);
            }
        };

        tokio::spawn(relay(
            self.shared.clone(),
            request_id,
            events,
            self.shutdown.child_token(),
        ));
        slot.defuse();

        Ok(request_id)
    }

    /// Observe results of in-flight and future requests.
    pub fn subscribe(&self) -> Subscription {
        Subscription {
            receiver: self.shared.results.subscribe(),
        }
    }

    /// Metrics for the current or most recent request.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.shared.state.lock().counters.snapshot()
    }

    /// Human-readable metrics report for the current or most recent request.
    pub fn get_metrics(&self) -> String {
        self.metrics().to_string()
    }

    pub fn is_generating(&self) -> bool {
        self.shared.state.lock().in_flight.is_some()
    }

    /// Most recently accepted request, if any.
    pub fn last_request_id(&self) -> Option<RequestId> {
        match self.shared.state.lock().last_request {
            0 => None,
            id => Some(id),
        }
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Stop relaying the in-flight request, if any, and refuse new ones.
    ///
    /// The in-flight request still receives a terminal result.
    pub fn shutdown(&self) {
        if !self.shutdown.is_cancelled() {
            info!("Shutting down inference session");
            self.shutdown.cancel();
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("Session")
            .field("options", &self.options)
            .field("in_flight", &state.in_flight)
            .field("last_request", &state.last_request)
            .finish()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Subscriber handle returned by [`Session::subscribe`].
///
/// Sees only results published after it was created.
#[derive(Debug, Clone)]
pub struct Subscription {
    receiver: watch::Receiver<Option<PartialResult>>,
}

impl Subscription {
    /// Wait for the next unseen result. Returns `None` once the session and
    /// all of its relay tasks are gone.
    pub async fn next(&mut self) -> Option<PartialResult> {
        loop {
            if self.receiver.changed().await.is_err() {
                return None;
            }
            if let Some(result) = self.receiver.borrow_and_update().clone() {
                return Some(result);
            }
        }
    }

    /// Most recently published result, seen or not.
    pub fn latest(&self) -> Option<PartialResult> {
        self.receiver.borrow().clone()
    }

    /// Collect one request's text, ending at its terminal result.
    ///
    /// Skipped intermediate fragments are missing from the returned text.
    pub async fn collect_request(&mut self, request_id: RequestId) -> Option<String> {
        let mut text = String::new();
        while let Some(result) = self.next().await {
            if result.request_id != request_id {
                continue;
            }
            text.push_str(&result.text);
            if result.is_done {
                return Some(text);
            }
        }
        None
    }

    pub fn into_stream(self) -> impl Stream<Item = PartialResult> + Send + Unpin {
        tokio_stream::StreamExt::filter_map(WatchStream::from_changes(self.receiver), |r| r)
    }
}
