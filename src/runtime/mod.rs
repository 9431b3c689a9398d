//! Runtime abstraction layer over external inference engines
//!
//! The session manager never sees how an engine loads weights or decodes
//! tokens. It asks an [`EngineLoader`] for an engine once, then consumes the
//! finite [`EngineEventStream`] each generation produces.

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::time::Instant;

use crate::error::Result;

pub mod echo_engine;
pub mod streaming;

pub use echo_engine::{EchoEngine, EchoEngineLoader};
pub use streaming::{result_listener, ResultListener};

/// One streamed fragment from an engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineEvent {
    pub text: String,
    /// Set on the last event of a generation
    pub done: bool,
    /// When the engine produced the fragment; metrics are measured against it
    pub emitted_at: Instant,
}

impl EngineEvent {
    /// Event stamped with the current time.
    pub fn new(text: impl Into<String>, done: bool) -> Self {
        Self {
            text: text.into(),
            done,
            emitted_at: Instant::now(),
        }
    }
}

/// Lazy, finite sequence of engine events terminated by a `done` event.
pub type EngineEventStream = BoxStream<'static, Result<EngineEvent>>;

/// Configuration handed to the engine once, at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineOptions {
    /// Model weights on disk. Engines may cache weights keyed by file name.
    pub model_path: PathBuf,
    /// Maximum number of output tokens per generation
    pub max_tokens: usize,
}

/// Abstract inference engine
#[async_trait]
pub trait InferenceEngine: Send + Sync {
    /// Start generating a response to an already decorated prompt.
    ///
    /// Returns as soon as generation is under way; events arrive on the
    /// returned stream from whatever execution context the engine uses.
    async fn generate_stream(&self, prompt: &str) -> Result<EngineEventStream>;

    /// Options the engine was created with
    fn options(&self) -> &EngineOptions;
}

/// Creates engines. Loading may be slow (weights, accelerator memory).
#[async_trait]
pub trait EngineLoader: Send + Sync {
    async fn load(&self, options: EngineOptions) -> Result<Arc<dyn InferenceEngine>>;
}
