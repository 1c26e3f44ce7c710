//! zkLogin CLI - command line interface for OAuth-backed on-chain accounts

#![allow(dead_code)] // Public API items may not be used internally

use clap::{Parser, Subcommand};
use anyhow::Result;
use std::path::PathBuf;

mod commands;
mod config;
mod password;
mod rpc;


use commands::*;

#[derive(Parser)]
#[command(name = "zklogin")]
#[command(version = "0.1.0")]
#[command(about = "zkLogin - authenticate with an OAuth login, transact on-chain")]
#[command(long_about = r#"
zkLogin lets you authorize on-chain transactions with nothing but an
identity-provider login. A fresh ephemeral key is generated per session and
bound into the OAuth request; a zero-knowledge proof ties the provider's
token to that key, and your address stays stable across sessions.

Quick Start:
  1. zklogin login                 Start a session, open the printed URL
  2. zklogin complete <url>        Paste the redirect URL the provider sent you to
  3. zklogin sign --data <base64>  Authorize a transaction
  4. zklogin logout                End the session and wipe local state
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Chain RPC URL (overrides the config file)
    #[arg(long, global = true)]
    rpc_url: Option<String>,

    /// Proving service URL (overrides the config file)
    #[arg(long, global = true)]
    prover_url: Option<String>,

    /// Session store path (default: ~/.zklogin/session.enc)
    #[arg(long, global = true)]
    store: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a login session and print the provider authorization URL
    Login {
        /// Overwrite an existing session
        #[arg(short, long)]
        force: bool,

        /// Use this epoch instead of querying the chain RPC
        #[arg(long)]
        epoch: Option<u64>,
    },

    /// Finish a login with the redirect URL the provider returned
    Complete {
        /// The full redirect URL, exactly as it appears in the browser
        redirect_url: String,

        /// Salt issued by a trusted salt service (default: derive locally)
        #[arg(long)]
        salt: Option<String>,
    },

    /// Show the current session state
    Status,

    /// Authorize a transaction with the current session
    Sign {
        /// Transaction bytes, base64 encoded
        #[arg(long, conflicts_with = "file")]
        data: Option<String>,

        /// Read transaction bytes from a file instead
        #[arg(long)]
        file: Option<PathBuf>,

        /// Use this epoch instead of querying the chain RPC
        #[arg(long)]
        epoch: Option<u64>,
    },

    /// End the session and wipe all persisted state
    Logout,

    /// Show configuration and storage paths
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let cfg = config::load(cli.rpc_url.as_deref(), cli.prover_url.as_deref())?;
    let store_path = cli
        .store
        .unwrap_or_else(zklogin::SessionStore::default_path);

    match cli.command {
        Commands::Login { force, epoch } => {
            login::run(&cfg, &store_path, force, epoch).await?;
        }
        Commands::Complete { redirect_url, salt } => {
            complete::run(&cfg, &store_path, &redirect_url, salt.as_deref())?;
        }
        Commands::Status => {
            status::run(&store_path)?;
        }
        Commands::Sign { data, file, epoch } => {
            sign::run(&cfg, &store_path, data.as_deref(), file.as_deref(), epoch).await?;
        }
        Commands::Logout => {
            logout::run(&store_path)?;
        }
        Commands::Info => {
            info::run(&cfg, &store_path)?;
        }
    }

    Ok(())
}
