//! Tandem - a research assistant that delegates email drafting
//!
//! Main entry point for the Tandem CLI.

mod cli;
mod render;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use futures::StreamExt;
use tracing::{info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tandem_agent_research::ResearchSystem;
use tandem_config::{Config, ConfigLoader, ConfigValidator};
use tandem_protocols::agent::Agent;
use tandem_protocols::usage::UsageLedger;
use tandem_provider_scripted::{Script, ScriptedProvider};
use tandem_runtime::{retry_with, RunOutcome, RunReport};

use cli::{Cli, Commands};

fn init_tracing(log_dir: Option<&Path>) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Console output goes to stderr so stdout carries only the answer.
    let console = fmt::layer().with_target(true).with_writer(std::io::stderr);

    let file = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            let file_appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix("tandem")
                .filename_suffix("log")
                .max_log_files(30)
                .build(dir)
                .context("Failed to create log file appender")?;
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            // Keeps the background writer alive until exit.
            static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
                std::sync::OnceLock::new();
            let _ = GUARD.set(guard);

            Some(fmt::layer().with_writer(non_blocking).with_ansi(false))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console)
        .with(file)
        .init();

    Ok(())
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(path) => ConfigLoader::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => {
            info!("No config file given, using defaults");
            Ok(Config::default())
        }
    }
}

/// Stream one attempt to the terminal; Ctrl-C cancels the whole call tree.
async fn stream_attempt(
    system: &ResearchSystem,
    prompt: &str,
    ledger: Arc<UsageLedger>,
    quiet: bool,
) -> Result<RunReport<String>> {
    let mut handle = system.run_stream_on(prompt, ledger);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut cancelled = false;

    loop {
        tokio::select! {
            event = handle.events().next() => {
                let Some(event) = event else { break };
                if !quiet {
                    if let Some(line) = render::format_event(&event) {
                        eprintln!("{}", line);
                    }
                }
            }
            _ = &mut ctrl_c, if !cancelled => {
                warn!("Interrupted, cancelling run");
                handle.cancel();
                cancelled = true;
            }
        }
    }

    handle.join().await.context("Run task panicked")
}

async fn run_prompt(config: Config, script: &Path, prompt: &str, json: bool) -> Result<ExitCode> {
    let script = Script::load(script)
        .with_context(|| format!("Failed to load script from {}", script.display()))?;
    let system = ResearchSystem::builder(config)
        .provider(Arc::new(ScriptedProvider::from_script(script)))
        .build()
        .context("Failed to assemble the research system")?;

    // Every attempt charges the same ledger.
    let ledger = Arc::new(UsageLedger::new());
    let (system_ref, ledger_ref) = (&system, &ledger);
    let report = retry_with(system.retry(), system.research().id(), move || {
        stream_attempt(system_ref, prompt, Arc::clone(ledger_ref), json)
    })
    .await?;

    if let Some(overflow) = report.overflow() {
        warn!("{}", overflow);
    }
    if json {
        println!("{}", serde_json::to_string_pretty(&render::report_json(&report))?);
    } else {
        println!("{}", render::format_report(&report));
    }

    Ok(match report.kind() {
        RunOutcome::Completed => ExitCode::SUCCESS,
        RunOutcome::Degraded => ExitCode::from(2),
        RunOutcome::Failed => ExitCode::FAILURE,
    })
}

fn check_config(config: &Config) -> ExitCode {
    let result = ConfigValidator::validate(config);
    for warning in &result.warnings {
        println!("warning: {}: {}", warning.path, warning.message);
    }
    for error in &result.errors {
        println!("error: {}: {}", error.path, error.message);
    }
    if result.is_valid() {
        println!(
            "Configuration OK: '{}' delegates to '{}' via '{}' (max depth {})",
            config.orchestrator.agent.id,
            config.delegate.agent.id,
            config.delegation.tool_name,
            config.runtime.max_depth
        );
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.log_dir.as_deref())?;

    let config = load_config(cli.config.as_ref())?;
    match cli.command {
        Commands::Run { script, json, prompt } => run_prompt(config, &script, &prompt, json).await,
        Commands::CheckConfig => Ok(check_config(&config)),
    }
}
