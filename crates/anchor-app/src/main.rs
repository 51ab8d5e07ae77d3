//! Anchor application binary - composition root.
//!
//! 1. Load configuration from TOML, apply env and flag overrides, start tracing
//! 2. Build the retrieval and generation clients
//! 3. Run the chosen front end: HTTP API, one-shot question, or terminal chat

mod cli;
mod render;

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

use anchor_api::{start_server, AppState};
use anchor_chat::{AnthropicGenerator, ChatOrchestrator, HttpRetriever, SubmitOutcome};
use anchor_core::{AnchorConfig, AnchorError};

use cli::{CliArgs, Command};

/// How often the terminal front end polls for phase changes.
const PHASE_POLL: Duration = Duration::from_millis(100);

fn build_orchestrator(config: &AnchorConfig) -> Result<ChatOrchestrator, AnchorError> {
    let api_key = config.generation.api_key.clone().unwrap_or_default();
    let retriever = HttpRetriever::new(&config.retrieval)?;
    let generator = AnthropicGenerator::new(&config.generation, api_key, &config.general.subject)?;

    tracing::info!(
        retrieval = %config.retrieval.base_url,
        model = %config.generation.model,
        "Chat clients ready"
    );

    Ok(ChatOrchestrator::new(
        config,
        Arc::new(retriever),
        Arc::new(generator),
    ))
}

/// Submit `question`, printing each phase label to stderr as it appears.
async fn submit_with_progress(orchestrator: &ChatOrchestrator, question: &str) -> SubmitOutcome {
    let turn = orchestrator.submit(question);
    tokio::pin!(turn);

    let mut ticker = tokio::time::interval(PHASE_POLL);
    let mut shown: Option<String> = None;

    loop {
        tokio::select! {
            outcome = &mut turn => return outcome,
            _ = ticker.tick() => {
                let label = orchestrator.phase_label();
                if let Some(ref text) = label {
                    if label != shown {
                        eprintln!("{}", text);
                    }
                }
                shown = label;
            }
        }
    }
}

/// Print a refusal or the settled turn. Returns whether it was an error.
fn print_outcome(outcome: &SubmitOutcome) -> bool {
    match outcome {
        SubmitOutcome::Settled(turn) => {
            println!("{}", render::render_turn(turn));
            turn.is_error
        }
        SubmitOutcome::Ignored => false,
        SubmitOutcome::Busy => {
            eprintln!("A question is already being answered.");
            true
        }
        SubmitOutcome::TooLong { limit } => {
            eprintln!("Message exceeds maximum length of {} characters.", limit);
            true
        }
    }
}

async fn run_ask(orchestrator: &ChatOrchestrator, question: &str) -> ExitCode {
    let outcome = submit_with_progress(orchestrator, question).await;
    if print_outcome(&outcome) {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

async fn run_chat(
    orchestrator: &ChatOrchestrator,
    starter_questions: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", render::render_help(orchestrator.subject(), starter_questions));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        eprint!("\n> ");
        let Some(line) = lines.next_line().await? else {
            break;
        };

        match line.trim() {
            "/quit" | "/exit" => break,
            "/help" => println!("{}", render::render_help(orchestrator.subject(), starter_questions)),
            "/stats" => {
                let stats = orchestrator.knowledge_base_stats().await;
                println!("{}", render::render_stats(stats.as_ref(), orchestrator.model()));
            }
            "/sources" => {
                let sources = orchestrator.session_sources();
                if sources.is_empty() {
                    println!("No sources cited yet.");
                } else {
                    println!("{}", render::render_sources(&sources));
                }
            }
            _ => {
                let outcome = submit_with_progress(orchestrator, &line).await;
                print_outcome(&outcome);
            }
        }
    }

    tracing::info!(turns = orchestrator.history().len(), "Chat session ended");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    let loaded = args.load_config();
    let config = loaded.config;

    // RUST_LOG wins over the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.general.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Some(ref e) = loaded.load_error {
        tracing::warn!(
            config = %loaded.path.display(),
            error = %e,
            "Failed to load config; using defaults"
        );
    }
    tracing::info!(config = %loaded.path.display(), subject = %config.general.subject, "Anchor starting");

    config.validate()?;
    let orchestrator = build_orchestrator(&config)?;

    match args.command {
        Command::Serve { .. } => {
            let state = AppState::new(
                orchestrator,
                config.chat.starter_questions.clone(),
                config.general.port,
            );
            start_server(&config.general, state).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Ask { .. } => {
            let question = args.question().unwrap_or_default();
            Ok(run_ask(&orchestrator, &question).await)
        }
        Command::Chat => {
            run_chat(&orchestrator, &config.chat.starter_questions).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
