//! On-device LLM inference session manager.
//!
//! Wraps an external inference engine behind a [`Session`] that validates the
//! model artifact, streams partial results to subscribers, and tracks
//! time-to-first-token, time-per-output-token, latency, and throughput for
//! every request.

pub mod cli;
pub mod config;
pub mod error;
pub mod metrics;
pub mod runtime;
pub mod session;

// Re-export commonly used types
pub use error::{Error, Result};
pub use metrics::MetricsSnapshot;
pub use runtime::{EngineEvent, EngineLoader, EngineOptions, InferenceEngine};
pub use session::{PartialResult, RequestId, Session, SessionCell, SessionOptions, Subscription, SummaryMode};
