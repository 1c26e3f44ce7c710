//! Authorize a transaction with the current session

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use colored::Colorize;
use zklogin::{ProofClient, SessionStore};

use crate::config::CliConfig;
use crate::password::prompt_password;
use crate::rpc;

pub async fn run(
    cfg: &CliConfig,
    store_path: &Path,
    data: Option<&str>,
    file: Option<&Path>,
    epoch_override: Option<u64>,
) -> Result<()> {
    let tx_bytes = read_tx_bytes(data, file)?;

    let store = SessionStore::new(store_path.to_path_buf());
    if !store.exists() {
        bail!("No session. Run 'zklogin login' first.");
    }

    let password = prompt_password("Session password: ")?;
    let mut session = match store.restore_full(&password) {
        Ok(Some(session)) => session,
        Ok(None) => bail!("No session. Run 'zklogin login' first."),
        Err(err) if err.is_fatal() => {
            bail!("{err}\nThe session was cleared; run 'zklogin login' again.")
        }
        Err(err) => return Err(err.into()),
    };

    let current_epoch = match epoch_override {
        Some(epoch) => epoch,
        None => rpc::fetch_current_epoch(&cfg.rpc_url)
            .await
            .context("Could not determine the current epoch (use --epoch to supply one)")?,
    };

    println!("{}", "Requesting a proof from the proving service...".cyan());

    let prover = ProofClient::new(cfg.prover_url.clone())?;
    let authorization = match session.authorize(&prover, &tx_bytes, current_epoch).await {
        Ok(authorization) => authorization,
        Err(err) if err.is_fatal() => {
            store.clear()?;
            bail!("{err}\nThe session was cleared; run 'zklogin login' again.");
        }
        Err(err) => return Err(err.into()),
    };

    let address = session
        .address()
        .context("Session carries no address")?;

    println!();
    println!("{}", "Transaction authorized.".green().bold());
    println!();
    println!("{}:", "Address".yellow());
    println!("  {address}");
    println!();
    println!("{}:", "Composite authorization (base64)".yellow());
    println!("  {}", authorization.to_base64()?);
    println!();
    println!(
        "{}",
        "Submit it together with the transaction bytes to your chain RPC.".dimmed()
    );

    Ok(())
}

/// Transaction bytes arrive base64-encoded on the command line or raw in a
/// file; exactly one source must be given.
fn read_tx_bytes(data: Option<&str>, file: Option<&Path>) -> Result<Vec<u8>> {
    match (data, file) {
        (Some(encoded), None) => STANDARD
            .decode(encoded.trim())
            .context("Transaction bytes are not valid base64"),
        (None, Some(path)) => fs::read(path)
            .with_context(|| format!("Failed to read transaction bytes from {}", path.display())),
        (None, None) => bail!("Provide transaction bytes with --data or --file"),
        (Some(_), Some(_)) => bail!("--data and --file are mutually exclusive"),
    }
}
