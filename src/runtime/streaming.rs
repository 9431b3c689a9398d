//! Streaming support for callback-driven engines
//!
//! Many engines report results through a listener invoked from their own
//! worker thread. [`result_listener`] pairs such a listener with an
//! [`EngineEventStream`] so the session only ever consumes streams.

use tokio::sync::mpsc;
use tracing::trace;

use super::{EngineEvent, EngineEventStream};
use crate::error::{Error, Result};

/// Callback handle given to an engine.
///
/// Cheap to clone and safe to call from any thread, including threads outside
/// the tokio runtime.
#[derive(Debug, Clone)]
pub struct ResultListener {
    sender: mpsc::UnboundedSender<Result<EngineEvent>>,
}

impl ResultListener {
    /// Deliver one partial result. Returns `false` once nobody is listening,
    /// so the engine can stop early.
    pub fn on_result(&self, text: impl Into<String>, done: bool) -> bool {
        self.sender.send(Ok(EngineEvent::new(text, done))).is_ok()
    }

    /// Report an engine failure; the stream ends after it.
    pub fn on_error(&self, error: Error) {
        let _ = self.sender.send(Err(error));
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// Create a listener and the stream it feeds.
///
/// The stream ends after the first `done` event or error. Anything the
/// listener delivers afterwards is discarded.
pub fn result_listener() -> (ResultListener, EngineEventStream) {
    let (sender, mut receiver) = mpsc::unbounded_channel::<Result<EngineEvent>>();

    let stream = async_stream::stream! {
        while let Some(item) = receiver.recv().await {
            let last = match &item {
                Ok(event) => event.done,
                Err(_) => true,
            };
            yield item;
            if last {
                trace!("engine stream terminated");
                break;
            }
        }
    };
    let stream: EngineEventStream = Box::pin(stream);

    (ResultListener { sender }, stream)
}
