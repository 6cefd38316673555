//! Interactive console for parley.
//!
//! Reads utterances from stdin and feeds them to the orchestrator's serve
//! loop. `exit`, `quit` or EOF ends the session; Ctrl+C cancels the turn in
//! flight and stops.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use parley::orchestrator::{SynthesisOutcome, submit};
use parley::{Orchestrator, ParleyConfig, SpeechError, TurnOutcome, TurnRequest};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Parley: voice-assistant orchestration console.
#[derive(Parser)]
#[command(name = "parley", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// User id the conversation is recorded under.
    #[arg(short, long, default_value = "local-user")]
    user: String,
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<ParleyConfig> {
    let mut config = match path {
        Some(path) => ParleyConfig::from_file(path)?,
        None => {
            let default_path = ParleyConfig::default_config_path();
            if default_path.exists() {
                ParleyConfig::from_file(&default_path)?
            } else {
                ParleyConfig::default()
            }
        }
    };
    config.apply_env_overrides();
    config.validate()?;
    Ok(config)
}

fn prompt() -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    write!(stdout, "User > ")?;
    stdout.flush()
}

fn print_outcome(outcome: &TurnOutcome) {
    println!("Assistant > {}", outcome.reply_text());
    match &outcome.synthesis {
        SynthesisOutcome::Completed(audio) => println!(
            "  [audio: {} chunks, {} bytes, {}]",
            audio.chunks,
            audio.byte_len,
            audio.format.mime_type()
        ),
        SynthesisOutcome::Failed(e) => println!("  [speech unavailable: {e}]"),
        SynthesisOutcome::Cancelled => println!("  [speech cancelled]"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;
    let _log_guard = parley::logging::init(&config.logging)?;

    let orchestrator = Arc::new(Orchestrator::from_config(&config)?);
    let cancel = CancellationToken::new();
    let (tx, rx) = mpsc::channel(8);
    let server = tokio::spawn(Arc::clone(&orchestrator).serve(rx, cancel.clone()));

    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, shutting down");
            ctrl_c.cancel();
        }
    });

    info!(user = %cli.user, "parley ready");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt()?;
        let line = tokio::select! {
            () = cancel.cancelled() => break,
            line = lines.next_line() => line?,
        };
        let Some(line) = line else {
            break;
        };

        let text = line.trim();
        if text.eq_ignore_ascii_case("exit") || text.eq_ignore_ascii_case("quit") {
            break;
        }
        if text.is_empty() {
            continue;
        }

        match submit(&tx, TurnRequest::new(&cli.user, text)).await {
            Ok(Some(outcome)) => print_outcome(&outcome),
            Ok(None) => {}
            Err(SpeechError::Channel(reason)) => {
                warn!(%reason, "serve loop unavailable");
                eprintln!("error: {reason}");
                if tx.is_closed() {
                    break;
                }
            }
            Err(e) => eprintln!("error: {e}"),
        }
    }

    drop(tx);
    server.await?;
    info!("parley stopped");
    Ok(())
}
