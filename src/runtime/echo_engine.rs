//! Echo engine for development and tests
//!
//! Streams the user turn of the prompt back word by word, one event per
//! word, with a fixed delay between events. It reads the model file's
//! metadata at load time but performs no inference.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use super::{result_listener, EngineEventStream, EngineLoader, EngineOptions, InferenceEngine};
use crate::error::Result;

/// Chat-turn marker that starts the model turn in decorated prompts
const TURN_MARKER: &str = "<start_of_turn>";

/// Echo engine implementation
pub struct EchoEngine {
    options: EngineOptions,
    token_delay: Duration,
}

impl EchoEngine {
    pub fn new(options: EngineOptions, token_delay: Duration) -> Self {
        Self {
            options,
            token_delay,
        }
    }

    /// Split the user turn into word tokens, keeping trailing whitespace on
    /// each word so the fragments concatenate back to the original text.
    fn tokenize(&self, prompt: &str) -> Vec<String> {
        let user_turn = prompt.split(TURN_MARKER).next().unwrap_or_default();
        user_turn
            .split_inclusive(char::is_whitespace)
            .filter(|word| !word.trim().is_empty())
            .take(self.options.max_tokens)
            .map(str::to_string)
            .collect()
    }
}

#[async_trait]
impl InferenceEngine for EchoEngine {
    async fn generate_stream(&self, prompt: &str) -> Result<EngineEventStream> {
        let tokens = self.tokenize(prompt);
        let delay = self.token_delay;
        let (listener, stream) = result_listener();

        debug!(tokens = tokens.len(), "echo generation started");

        tokio::spawn(async move {
            if tokens.is_empty() {
                listener.on_result("", true);
                return;
            }

            let last = tokens.len() - 1;
            for (i, token) in tokens.into_iter().enumerate() {
                tokio::time::sleep(delay).await;
                if !listener.on_result(token, i == last) {
                    debug!("echo generation abandoned by consumer");
                    return;
                }
            }
        });

        Ok(stream)
    }

    fn options(&self) -> &EngineOptions {
        &self.options
    }
}

/// Loader for [`EchoEngine`]
#[derive(Debug, Clone)]
pub struct EchoEngineLoader {
    token_delay: Duration,
}

impl EchoEngineLoader {
    pub fn new(token_delay: Duration) -> Self {
        Self { token_delay }
    }
}

#[async_trait]
impl EngineLoader for EchoEngineLoader {
    async fn load(&self, options: EngineOptions) -> Result<Arc<dyn InferenceEngine>> {
        let metadata = tokio::fs::metadata(&options.model_path).await?;
        info!(
            model = %options.model_path.display(),
            bytes = metadata.len(),
            max_tokens = options.max_tokens,
            "Loaded echo engine"
        );
        Ok(Arc::new(EchoEngine::new(options, self.token_delay)))
    }
}
