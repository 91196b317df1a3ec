// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "capstan")]
#[command(about = "Zero-downtime Git deployments for remote hosts")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Minimal output (CI mode)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Emit JSON lines instead of human output
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new capstan.yml configuration file
    Init {
        /// Application name to seed the template with
        #[arg(short, long)]
        app: Option<String>,

        /// Overwrite an existing configuration file
        #[arg(short, long)]
        force: bool,
    },

    /// Deploy the application to its configured server
    Deploy,

    /// Roll back to a prior release
    Rollback {
        /// Target release id (defaults to the newest inactive release)
        #[arg(short, long)]
        release: Option<String>,
    },

    /// List releases present on the server
    Releases,

    /// Show the application's current deployment state
    Status,
}
