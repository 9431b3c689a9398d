//! Configuration management for the inference session.
//!
//! This module provides configuration handling through multiple sources:
//! 1. Default configuration (embedded in binary)
//! 2. System-wide configuration file (`/etc/llm-inference/config.toml`)
//! 3. User-specified configuration file
//! 4. Environment variables (prefixed with `LLM_INFERENCE__`)
//! 5. Command-line arguments
//!
//! Configuration options are loaded in order of precedence, with later sources
//! overriding earlier ones.
//!
//! # Environment Variables
//!
//! Nested keys are separated by a double underscore:
//! - `LLM_INFERENCE__MODEL__PATH` - Model artifact path
//! - `LLM_INFERENCE__MODEL__MAX_TOKENS` - Output token budget
//! - `LLM_INFERENCE__SESSION__SUMMARY` - `on_demand` or `emit`

use clap::Args;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::Result;
use crate::session::{SessionOptions, SummaryMode};

/// Configuration arguments shared by all commands
#[derive(Debug, Default, Clone, Args)]
pub struct ConfigArgs {
    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Model artifact path
    #[arg(long, global = true)]
    pub model: Option<PathBuf>,

    /// Maximum number of output tokens per request
    #[arg(long, global = true)]
    pub max_tokens: Option<usize>,

    /// Append the metrics report to the stream as the final result
    #[arg(long, global = true)]
    pub emit_summary: bool,

    /// Delay between echo engine tokens in milliseconds
    #[arg(long, global = true)]
    pub token_delay_ms: Option<u64>,
}

/// Service configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Model artifact settings
    pub model: ModelConfig,
    /// Session behaviour
    #[serde(default)]
    pub session: SessionConfig,
    /// Echo engine settings
    #[serde(default)]
    pub echo: EchoConfig,
}

/// Model artifact configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Path to the model weights. Use a file name unique per model; engines
    /// may cache weights keyed by file name alone.
    pub path: PathBuf,
    /// Maximum output tokens per request
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Chat-turn marker appended to every prompt
    #[serde(default = "default_prompt_suffix")]
    pub prompt_suffix: String,
    #[serde(default)]
    pub summary: SummaryMode,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            prompt_suffix: default_prompt_suffix(),
            summary: SummaryMode::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EchoConfig {
    #[serde(default = "default_token_delay_ms")]
    pub token_delay_ms: u64,
}

impl Default for EchoConfig {
    fn default() -> Self {
        Self {
            token_delay_ms: default_token_delay_ms(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from all sources
    pub fn load(args: &ConfigArgs) -> Result<Self> {
        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            .add_source(config::File::with_name("/etc/llm-inference/config.toml").required(false));

        // Load user config if specified
        if let Some(path) = &args.config {
            builder = builder.add_source(config::File::from(path.as_path()));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("LLM_INFERENCE")
                .separator("__")
                .try_parsing(true),
        );

        let mut config: ServiceConfig = builder.build()?.try_deserialize()?;

        // Override with command line args
        if let Some(path) = &args.model {
            config.model.path = path.clone();
        }
        if let Some(max_tokens) = args.max_tokens {
            config.model.max_tokens = max_tokens;
        }
        if args.emit_summary {
            config.session.summary = SummaryMode::Emit;
        }
        if let Some(delay) = args.token_delay_ms {
            config.echo.token_delay_ms = delay;
        }

        Ok(config)
    }

    /// Convert to session settings
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            model_path: self.model.path.clone(),
            max_tokens: self.model.max_tokens,
            prompt_suffix: self.session.prompt_suffix.clone(),
            summary: self.session.summary,
        }
    }

    pub fn token_delay(&self) -> Duration {
        Duration::from_millis(self.echo.token_delay_ms)
    }
}

fn default_max_tokens() -> usize {
    1024
}

fn default_prompt_suffix() -> String {
    "<start_of_turn>model\n".to_string()
}

fn default_token_delay_ms() -> u64 {
    40
}
