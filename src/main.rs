use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

mod cli;
mod config;

use cli::Cli;
use config::Config;
use paperboy::agent::{DigestInvoker, HttpAgentClient};
use paperboy::gateway::HttpScheduleGateway;
use paperboy::store::PreferenceStore;
use paperboy::sync::Synchronizer;
use paperboy::tui::{App, TuiRunner, init_terminal, restore_terminal};

fn setup_logging(config: &Config, verbose: bool) -> Result<PathBuf> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("paperboy")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("paperboy.log");

    // stdout belongs to the TUI, so logs go to a file
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    let level = if verbose {
        "debug"
    } else {
        config.log_level.as_deref().unwrap_or("info")
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(log_file)
}

fn build_synchronizer(config: &Config, data_dir: &Path) -> paperboy::Result<Synchronizer> {
    let store = PreferenceStore::open(data_dir)?;
    let gateway = HttpScheduleGateway::new(config.scheduler.gateway_config())?;
    let agent = HttpAgentClient::new(config.agent.client_config())?;
    let invoker = Arc::new(DigestInvoker::new(Arc::new(agent)));

    Ok(Synchronizer::new(
        store,
        Arc::new(gateway),
        invoker,
        &config.scheduler.schedule_id,
        &config.agent.agent_id,
    ))
}

async fn run_tui(app: App, tick_rate_ms: u64) -> Result<()> {
    info!("Launching TUI mode");
    let terminal = init_terminal().context("Failed to initialize terminal")?;

    let mut runner = TuiRunner::new(terminal, app, tick_rate_ms);
    let outcome = runner.run().await;

    restore_terminal().context("Failed to restore terminal")?;
    outcome
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    let log_file = setup_logging(&config, cli.is_verbose()).context("Failed to setup logging")?;
    if cli.is_verbose() {
        println!("{} {}", "Logging to".yellow(), log_file.display());
    }

    let data_dir = cli.data_dir.clone().unwrap_or_else(|| config.storage.data_dir.clone());
    info!("Using data directory {}", data_dir.display());

    let sync = build_synchronizer(&config, &data_dir)
        .context(format!("Failed to start with data directory {}", data_dir.display()))?;

    run_tui(App::new(sync), config.tui.tick_rate_ms)
        .await
        .context("Application failed")?;

    println!("{}", "Bye.".cyan());
    Ok(())
}
