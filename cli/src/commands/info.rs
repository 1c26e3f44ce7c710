//! Show configuration and storage paths

use std::path::Path;

use anyhow::Result;
use colored::Colorize;

use crate::config::{self, CliConfig};

pub fn run(cfg: &CliConfig, store_path: &Path) -> Result<()> {
    println!();
    println!("{}", "zkLogin Configuration".yellow().bold());
    println!();

    println!("{}:", "Endpoints".cyan());
    println!("  Chain RPC: {}", cfg.rpc_url);
    println!("  Prover:    {}", cfg.prover_url);
    println!("  Authorize: {}", cfg.authorize_endpoint);
    println!();

    println!("{}:", "OAuth".cyan());
    if cfg.client_id.is_empty() {
        println!("  Client id: {}", "NOT CONFIGURED".red());
        println!(
            "  Set `client_id` in {}",
            config::config_file().display()
        );
    } else {
        println!("  Client id:    {}", cfg.client_id);
    }
    println!("  Redirect URI: {}", cfg.redirect_uri);
    println!();

    println!("{}:", "Session".cyan());
    println!("  Validity margin: {} epochs", cfg.epoch_validity);
    println!("  Store: {}", store_path.display());
    if store_path.exists() {
        println!("  State: {}", "PRESENT".green());
    } else {
        println!("  State: {}", "NONE".dimmed());
    }
    println!();

    println!("{}:", "File Locations".cyan());
    println!("  Config: {}", config::config_file().display());

    Ok(())
}
