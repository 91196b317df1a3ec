// ABOUTME: Entry point for the capstan CLI application.
// ABOUTME: Parses arguments and dispatches to appropriate command handlers.

mod cli;
mod commands;

use capstan::config::{self, Config};
use capstan::error::Result;
use capstan::output::{Output, OutputMode};
use clap::Parser;
use cli::{Cli, Commands};
use std::env;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber based on verbose flag
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let mode = if cli.json {
        OutputMode::Json
    } else if cli.quiet {
        OutputMode::Quiet
    } else {
        OutputMode::Normal
    };
    let output = Output::new(mode);

    if let Err(e) = run(cli, output).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, output: Output) -> Result<()> {
    let cwd = env::current_dir()?;

    match cli.command {
        Commands::Init { app, force } => {
            config::init_config(&cwd, app.as_deref(), force)?;
            output.success(&format!("Wrote {}", config::CONFIG_FILENAME));
            Ok(())
        }
        Commands::Deploy => {
            let config = Config::discover(&cwd)?;
            commands::deploy(config, output).await
        }
        Commands::Rollback { release } => {
            let config = Config::discover(&cwd)?;
            commands::rollback(config, release, output).await
        }
        Commands::Releases => {
            let config = Config::discover(&cwd)?;
            commands::releases(config, output).await
        }
        Commands::Status => {
            let config = Config::discover(&cwd)?;
            commands::status(config, output).await
        }
    }
}
