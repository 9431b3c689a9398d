use clap::{ArgAction, Args, Parser};

use crate::cli::commands::Commands;
use crate::config::ConfigArgs;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub config: ConfigArgs,

    #[command(flatten)]
    pub logging: LoggingConfig,
}

/// Logging options
#[derive(Debug, Clone, Args)]
pub struct LoggingConfig {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log level when no -v flag is given
    #[arg(long, env = "LLM_INFERENCE_LOG_LEVEL", default_value = "warn", global = true)]
    pub log_level: String,

    /// Additional tracing filter directives, e.g. "llm_inference_core=debug"
    #[arg(long, env = "LLM_INFERENCE_LOG_FILTER", global = true)]
    pub log_filter: Option<String>,
}

impl LoggingConfig {
    pub fn get_effective_level(&self) -> String {
        match self.verbose {
            0 => self.log_level.clone(),
            1 => "debug".to_string(),
            _ => "trace".to_string(),
        }
    }
}
