use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info};

use crate::{
    cli::commands::{ChatCommand, GenerateCommand},
    config::ServiceConfig,
    runtime::EchoEngineLoader,
    session::{RequestId, Session, SessionCell, Subscription, SummaryMode},
};

/// Construct the session for a command run.
pub async fn open_session(cell: &SessionCell, config: &ServiceConfig) -> Result<Arc<Session>> {
    let loader = EchoEngineLoader::new(config.token_delay());
    cell.get_instance(&config.session_options(), &loader)
        .await
        .context("Failed to open inference session")
}

/// Write one request's fragments to `out` as they arrive.
///
/// Fragments replaced before this consumer woke up are not printed.
async fn stream_response<W: AsyncWrite + Unpin>(
    out: &mut W,
    subscription: &mut Subscription,
    request_id: RequestId,
) -> Result<()> {
    while let Some(result) = subscription.next().await {
        if result.request_id != request_id {
            continue;
        }
        out.write_all(result.text.as_bytes()).await?;
        out.flush().await?;
        if result.is_done {
            return Ok(());
        }
    }
    anyhow::bail!("Session closed before request {} finished", request_id)
}

pub async fn handle_generate(session: Arc<Session>, cmd: GenerateCommand) -> Result<()> {
    let mut subscription = session.subscribe();
    let request_id = session
        .generate(&cmd.prompt)
        .await
        .context("Failed to start generation")?;
    debug!(request_id, "Streaming response");

    let emitted = session.options().summary == SummaryMode::Emit;
    let mut stdout = tokio::io::stdout();
    stream_response(&mut stdout, &mut subscription, request_id).await?;

    if cmd.json {
        let metrics = session
            .metrics()
            .to_json()
            .context("Failed to encode metrics")?;
        stdout.write_all(format!("\n{}\n", metrics).as_bytes()).await?;
    } else {
        // Emit mode already appended the report to the terminal result
        if !emitted {
            stdout.write_all(session.get_metrics().as_bytes()).await?;
        }
        stdout.write_all(b"\n").await?;
    }
    stdout.flush().await?;

    Ok(())
}

pub async fn handle_chat(session: Arc<Session>, cmd: ChatCommand) -> Result<()> {
    let mut subscription = session.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    let emitted = session.options().summary == SummaryMode::Emit;

    info!("Chat started");
    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else { break };
        let prompt = line.trim();
        if prompt.is_empty() {
            continue;
        }
        if prompt == "exit" || prompt == "quit" {
            break;
        }

        let request_id = session.generate(prompt).await?;
        tokio::select! {
            streamed = stream_response(&mut stdout, &mut subscription, request_id) => streamed?,
            _ = tokio::signal::ctrl_c() => {
                session.shutdown();
                break;
            }
        }

        if cmd.metrics && !emitted {
            stdout.write_all(session.get_metrics().as_bytes()).await?;
        }
        stdout.write_all(b"\n").await?;
    }

    session.shutdown();
    info!("Chat finished");
    Ok(())
}
