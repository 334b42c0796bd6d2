mod commands;
mod printer;

use anyhow::Result;
use clap::Parser;
use heartlyzer_flow::{
    ChatRunner, HttpConnector, InMemoryBackend, InMemorySessionStorage, MarkupStyle,
    OrchestratorConfig, ServiceConnector, SubmitOutcome,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use crate::commands::{HELP, Input};
use crate::printer::{TranscriptPrinter, render_history};

#[derive(Parser, Debug)]
#[command(name = "heartlyzer")]
#[command(about = "Heart disease risk questionnaire in the terminal")]
#[command(version)]
struct Args {
    /// Base URL of the prediction service (in-memory backend when omitted)
    #[arg(long, env = "PREDICTION_SERVICE_URL")]
    service_url: Option<String>,

    /// Identity the prediction history is kept under
    #[arg(long, env = "HEARTLYZER_PRINCIPAL", default_value = "anonymous")]
    principal: String,

    /// Delay between progress messages while an analysis runs
    #[arg(long, env = "HEARTLYZER_PROGRESS_INTERVAL_MS", default_value_t = 2000)]
    progress_interval_ms: u64,

    /// Minimum time an analysis is shown as running
    #[arg(long, env = "HEARTLYZER_MIN_ANALYSIS_MS", default_value_t = 0)]
    min_analysis_ms: u64,

    /// Disable bold styling
    #[arg(long)]
    plain: bool,
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn connector(args: &Args) -> Arc<dyn ServiceConnector> {
    match &args.service_url {
        Some(url) => Arc::new(HttpConnector::new(url.clone())),
        None => {
            tracing::warn!("no prediction service configured, using in-memory backend");
            Arc::new(InMemoryBackend::development())
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing();

    let config = OrchestratorConfig::default()
        .with_progress_interval(Duration::from_millis(args.progress_interval_ms))
        .with_min_analysis_time(Duration::from_millis(args.min_analysis_ms));
    let runner = ChatRunner::with_config(
        Arc::new(InMemorySessionStorage::new()),
        connector(&args),
        config,
    );

    let session = runner.open_session(&args.principal).await?;
    let style = if args.plain {
        MarkupStyle::Plain
    } else {
        MarkupStyle::Ansi
    };
    let mut printer = TranscriptPrinter::new(style);
    let mut changes = session.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("(ketik :help untuk daftar perintah)\n");
    print_updates(&runner, &session.id, &mut printer).await?;

    loop {
        tokio::select! {
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
                print_updates(&runner, &session.id, &mut printer).await?;
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                match commands::parse(&line) {
                    Input::Quit => break,
                    Input::Help => println!("{HELP}\n"),
                    Input::Invalid(message) => println!("{message}\n"),
                    Input::Message(text) => {
                        let outcome = runner.submit(&session.id, &text).await?;
                        if outcome == SubmitOutcome::Ignored && !text.is_empty() {
                            println!("(analisis sedang berjalan, mohon tunggu)\n");
                        }
                    }
                    Input::NewChat => runner.new_chat(&session.id).await?,
                    Input::History => {
                        let view = runner.snapshot(&session.id).await?;
                        println!("{}\n", render_history(&view.history));
                    }
                    Input::Select(index) => {
                        if let Err(e) = runner.select_history(&session.id, index).await {
                            println!("Riwayat tidak dapat ditampilkan: {e}\n");
                        }
                    }
                    Input::Delete(index) => {
                        if let Err(e) = runner.delete_history(&session.id, index).await {
                            println!("Riwayat tidak dapat dihapus: {e}\n");
                        }
                    }
                    Input::Clear => {
                        if let Err(e) = runner.clear_history(&session.id).await {
                            println!("Riwayat tidak dapat dihapus: {e}\n");
                        }
                    }
                }
            }
        }
    }

    runner.close_session(&session.id).await?;
    Ok(())
}

async fn print_updates(
    runner: &ChatRunner,
    session_id: &str,
    printer: &mut TranscriptPrinter,
) -> Result<()> {
    let view = runner.snapshot(session_id).await?;
    for block in printer.render_updates(&view) {
        println!("{block}\n");
    }
    Ok(())
}
