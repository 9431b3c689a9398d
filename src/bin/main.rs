//! llm-inference binary.
//!
//! Command-line front end for the inference session manager: one-shot
//! generation and an interactive chat loop over stdin.

use anyhow::Context;
use clap::Parser;
use llm_inference_core::{
    cli::{commands::Commands, handle_chat, handle_generate, open_session, Cli},
    config::ServiceConfig,
    session::SessionCell,
};
use tracing::info;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level: LevelFilter = cli
        .logging
        .get_effective_level()
        .parse()
        .unwrap_or(LevelFilter::WARN);

    // Logs go to stderr; stdout carries generated text only
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(level.into())
                .parse_lossy(cli.logging.log_filter.as_deref().unwrap_or("")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!("llm-inference starting up");

    let config = ServiceConfig::load(&cli.config).context("Failed to load configuration")?;
    let sessions = SessionCell::new();
    let session = open_session(&sessions, &config).await?;

    match cli.command {
        Commands::Generate(cmd) => handle_generate(session, cmd).await?,
        Commands::Chat(cmd) => handle_chat(session, cmd).await?,
    }

    Ok(())
}
