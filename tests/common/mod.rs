//! Common test utilities: a scripted engine driven step by step from tests

#![allow(dead_code)]

use async_trait::async_trait;
use llm_inference_core::{
    runtime::{result_listener, EngineEventStream, ResultListener},
    EngineLoader, EngineOptions, Error, InferenceEngine, Result, SessionOptions, SummaryMode,
};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// Engine whose events are produced by the test through the captured
/// [`ResultListener`] of each generation.
struct ScriptedEngine {
    options: EngineOptions,
    listeners: mpsc::UnboundedSender<ResultListener>,
    prompts: Arc<Mutex<Vec<String>>>,
    refuse: bool,
    stalls: Arc<AtomicUsize>,
}

#[async_trait]
impl InferenceEngine for ScriptedEngine {
    async fn generate_stream(&self, prompt: &str) -> Result<EngineEventStream> {
        if self.refuse {
            return Err(Error::Engine("engine refused prompt".into()));
        }
        let stall = self
            .stalls
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if stall {
            futures::future::pending::<()>().await;
        }
        self.prompts.lock().unwrap().push(prompt.to_string());
        let (listener, stream) = result_listener();
        self.listeners.send(listener).expect("test dropped engine control");
        Ok(stream)
    }

    fn options(&self) -> &EngineOptions {
        &self.options
    }
}

#[derive(Clone)]
pub struct ScriptedLoader {
    listeners: mpsc::UnboundedSender<ResultListener>,
    prompts: Arc<Mutex<Vec<String>>>,
    loads: Arc<AtomicUsize>,
    refuse: bool,
    stalls: Arc<AtomicUsize>,
}

impl ScriptedLoader {
    /// Loader whose engines fail every generation at start
    pub fn refusing(mut self) -> Self {
        self.refuse = true;
        self
    }

    /// Loader whose engines never finish starting the next `count` generations
    pub fn stalling(self, count: usize) -> Self {
        self.stalls.store(count, Ordering::SeqCst);
        self
    }
}

#[async_trait]
impl EngineLoader for ScriptedLoader {
    async fn load(&self, options: EngineOptions) -> Result<Arc<dyn InferenceEngine>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(ScriptedEngine {
            options,
            listeners: self.listeners.clone(),
            prompts: self.prompts.clone(),
            refuse: self.refuse,
            stalls: self.stalls.clone(),
        }))
    }
}

/// Test-side handle to the scripted engines
pub struct EngineControl {
    listeners: mpsc::UnboundedReceiver<ResultListener>,
    prompts: Arc<Mutex<Vec<String>>>,
    loads: Arc<AtomicUsize>,
}

impl EngineControl {
    /// Listener of the most recently started generation
    pub fn take_listener(&mut self) -> ResultListener {
        self.listeners
            .try_recv()
            .expect("no generation was started")
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

pub fn scripted() -> (ScriptedLoader, EngineControl) {
    let (tx, rx) = mpsc::unbounded_channel();
    let prompts = Arc::new(Mutex::new(Vec::new()));
    let loads = Arc::new(AtomicUsize::new(0));

    let loader = ScriptedLoader {
        listeners: tx,
        prompts: prompts.clone(),
        loads: loads.clone(),
        refuse: false,
        stalls: Arc::new(AtomicUsize::new(0)),
    };
    let control = EngineControl {
        listeners: rx,
        prompts,
        loads,
    };
    (loader, control)
}

/// Placeholder model artifact; only its existence matters
pub fn model_file() -> tempfile::NamedTempFile {
    tempfile::Builder::new()
        .prefix("gemma-test-")
        .suffix(".bin")
        .tempfile()
        .expect("create model file")
}

pub fn session_options(model_path: &Path, summary: SummaryMode) -> SessionOptions {
    SessionOptions {
        model_path: model_path.to_path_buf(),
        max_tokens: 1024,
        prompt_suffix: "<start_of_turn>model\n".to_string(),
        summary,
    }
}
