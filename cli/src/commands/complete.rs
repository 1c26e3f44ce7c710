//! Finish a login with the provider's redirect URL

use std::path::Path;

use anyhow::{bail, Context, Result};
use colored::Colorize;
use zklogin::{Session, SessionStore};

use crate::config::CliConfig;
use crate::password::prompt_password;

pub fn run(
    _cfg: &CliConfig,
    store_path: &Path,
    redirect_url: &str,
    salt_override: Option<&str>,
) -> Result<()> {
    let store = SessionStore::new(store_path.to_path_buf());

    if !store.exists() {
        bail!("No pending session. Run 'zklogin login' first.");
    }

    let password = prompt_password("Session password: ")?;

    // The redirect page may be processed once only: re-running complete
    // against a finished login must not rebuild the session.
    if store.login_completed(&password)? == Some(true) {
        bail!("This session already completed its login. Run 'zklogin logout' to start over.");
    }

    let checkpoint = store
        .restore_partial(&password)?
        .context("The session checkpoint disappeared. Run 'zklogin login' again.")?;

    let mut session = Session::resume_partial(
        checkpoint.keypair,
        checkpoint.max_epoch,
        checkpoint.randomness,
    );

    println!("{}", "Verifying the identity token...".cyan());

    if let Err(err) = session.receive_token(redirect_url) {
        if err.is_fatal() {
            store.clear()?;
            bail!("{err}\nThe session was cleared; run 'zklogin login' again.");
        }
        return Err(err.into());
    }

    session.resolve_salt(salt_override)?;
    let address = session.resolve_address()?;
    session.activate()?;

    store.save_full(&session, &password)?;

    println!();
    println!("{}", "Login complete!".green().bold());
    println!();
    println!("{}:", "On-chain address".yellow());
    println!("  {address}");
    println!();
    println!(
        "{}",
        "Authorize transactions with: zklogin sign --data <base64>".dimmed()
    );

    Ok(())
}
