//! Operator CLI for the pharmtrace ledger
//!
//! `init` creates an operator key and config, `serve` answers JSON requests on
//! stdin/stdout, `sign` produces a relayable signed registration and
//! `address` prints the identity behind a key.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod config;

use commands::{address, init, serve, sign};

#[derive(Parser)]
#[command(name = "pharmtrace")]
#[command(about = "Pharmtrace - Drug Batch Provenance Ledger", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file path
    #[arg(short, long, global = true, default_value = ".pharmtrace/config.toml")]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate an operator key and write a default config next to it
    Init {
        /// Overwrite an existing config and key
        #[arg(long)]
        force: bool,
    },

    /// Answer one JSON request per stdin line with one JSON response per stdout line
    Serve,

    /// Sign a batch registration for relaying via `registerWithSig`
    Sign(sign::SignArgs),

    /// Print the address of a private key
    Address(commands::KeySource),
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays a clean response stream
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Init { force } => {
            init::run(&cli.config, force)?;
        }

        Commands::Serve => {
            serve::run(&cli.config).await?;
        }

        Commands::Sign(args) => {
            sign::run(args)?;
        }

        Commands::Address(source) => {
            address::run(&source)?;
        }
    }

    Ok(())
}
