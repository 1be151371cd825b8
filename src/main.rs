//! devrack: a local development process supervisor.
//!
//! This is the entry point of the application. It parses command-line
//! arguments, loads configuration, and dispatches a single operation — or
//! an interactive loop that re-prompts after each operation when no
//! subcommand is given.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Select;
use tracing_subscriber::EnvFilter;

use devrack::cli::{Cli, Command, UpdateMode};
use devrack::config;
use devrack::controller::ServiceController;
use devrack::prompt::{SelectionPrompt, TerminalPrompt};

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from("devrack.toml"));
    let config = config::load_config(&config_path)?;
    let prompt = TerminalPrompt;
    let controller = ServiceController::new(&config, &prompt);

    match cli.command {
        Some(command) => dispatch(&controller, &prompt, command, cli.update).await,
        None => interactive_loop(&controller, &prompt, cli.update).await,
    }
}

async fn dispatch(
    controller: &ServiceController<'_>,
    prompt: &dyn SelectionPrompt,
    command: Command,
    update_mode: UpdateMode,
) -> Result<()> {
    match command {
        Command::Start => {
            let update = resolve_update(update_mode, prompt)?;
            controller.start_all(update).await?;
        }
        Command::StartOne => {
            let update = resolve_update(update_mode, prompt)?;
            controller.start_selected(update).await?;
        }
        Command::Stop => {
            controller.stop_all()?;
        }
        Command::StopOne => {
            controller.stop_selected()?;
        }
        Command::Status => {
            controller.status()?;
        }
        Command::Restart => {
            let update = resolve_update(update_mode, prompt)?;
            controller.restart_all(update).await?;
        }
    }
    Ok(())
}

/// Maps the tri-state `--update` flag to a per-operation decision,
/// prompting in the default `ask` mode.
fn resolve_update(mode: UpdateMode, prompt: &dyn SelectionPrompt) -> devrack::Result<bool> {
    match mode {
        UpdateMode::On => Ok(true),
        UpdateMode::Off => Ok(false),
        UpdateMode::Ask => prompt.confirm("Pull latest sources before building?"),
    }
}

/// Re-prompts for an operation until the user quits. Operation failures
/// (including a corrupt process table) abort only the current operation;
/// the menu comes back.
async fn interactive_loop(
    controller: &ServiceController<'_>,
    prompt: &dyn SelectionPrompt,
    update_mode: UpdateMode,
) -> Result<()> {
    let items = [
        "start", "start-one", "stop", "stop-one", "status", "restart", "quit",
    ];
    loop {
        let choice = Select::with_theme(&ColorfulTheme::default())
            .with_prompt("Operation")
            .items(&items)
            .default(0)
            .interact_opt()?;
        let command = match choice {
            Some(0) => Command::Start,
            Some(1) => Command::StartOne,
            Some(2) => Command::Stop,
            Some(3) => Command::StopOne,
            Some(4) => Command::Status,
            Some(5) => Command::Restart,
            _ => break,
        };
        if let Err(err) = dispatch(controller, prompt, command, update_mode).await {
            eprintln!("Error: {:#}", err);
        }
        println!();
    }
    Ok(())
}
