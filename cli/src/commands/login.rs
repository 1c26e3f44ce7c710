//! Start a login session: generate keys, bind the nonce, checkpoint,
//! and hand the user the provider authorization URL.

use std::path::Path;

use anyhow::{bail, Context, Result};
use colored::Colorize;
use url::Url;
use zklogin::{Session, SessionStore};

use crate::config::CliConfig;
use crate::password::prompt_new_password;
use crate::rpc;

pub async fn run(
    cfg: &CliConfig,
    store_path: &Path,
    force: bool,
    epoch_override: Option<u64>,
) -> Result<()> {
    let store = SessionStore::new(store_path.to_path_buf());

    if store.exists() && !force {
        bail!(
            "A session already exists. Use --force to replace it.\n\
             Replacing a session discards its ephemeral key; any pending login becomes unrecoverable."
        );
    }

    println!("{}", "Starting a zkLogin session...".cyan());

    let current_epoch = match epoch_override {
        Some(epoch) => epoch,
        None => rpc::fetch_current_epoch(&cfg.rpc_url)
            .await
            .context("Could not determine the current epoch (use --epoch to supply one)")?,
    };

    let mut session = Session::new();
    session.begin()?;
    let nonce = session.bind(current_epoch, cfg.epoch_validity)?.clone();
    let max_epoch = session
        .max_epoch()
        .context("bound session carries a max epoch")?;

    println!(
        "Validity window: epoch {} through {}",
        current_epoch, max_epoch
    );

    // The checkpoint must land on disk before the user leaves for the
    // provider; the redirect wipes this process.
    println!();
    println!("{}", "Choose a password for the local session store.".cyan());
    println!("{}", "Requirements: 8+ chars, uppercase, lowercase, and numbers".dimmed());
    let password = prompt_new_password("Enter password: ")?;

    let keypair = session
        .keypair()
        .context("bound session carries a keypair")?;
    let randomness = session
        .randomness()
        .context("bound session carries randomness")?;
    store.save_partial(keypair, max_epoch, randomness, &password)?;

    let auth_url = build_authorize_url(cfg, nonce.as_str())?;

    println!();
    println!("{}", "Session checkpointed.".green().bold());
    println!();
    println!("{}", "Open this URL in a browser and sign in:".yellow());
    println!();
    println!("  {auth_url}");
    println!();
    println!(
        "{}",
        "Then finish with: zklogin complete '<redirect url from the browser>'".dimmed()
    );

    Ok(())
}

/// Build the provider authorization URL around the session nonce.
fn build_authorize_url(cfg: &CliConfig, nonce: &str) -> Result<Url> {
    if cfg.client_id.is_empty() {
        bail!(
            "No OAuth client id configured. Set `client_id` in {}",
            crate::config::config_file().display()
        );
    }

    let mut url = Url::parse(&cfg.authorize_endpoint).context("Invalid authorize endpoint")?;
    url.query_pairs_mut()
        .append_pair("client_id", &cfg.client_id)
        .append_pair("redirect_uri", &cfg.redirect_uri)
        .append_pair("response_type", "id_token")
        .append_pair("scope", "openid")
        .append_pair("nonce", nonce);
    Ok(url)
}
