//! Show the current session state

use std::path::Path;

use anyhow::Result;
use colored::Colorize;
use zklogin::SessionStore;

use crate::password::prompt_password;

pub fn run(store_path: &Path) -> Result<()> {
    let store = SessionStore::new(store_path.to_path_buf());

    println!();
    println!("{}", "zkLogin Session".yellow().bold());
    println!();

    if !store.exists() {
        println!("{}", "Session: NONE".red());
        println!("  Run 'zklogin login' to start one");
        return Ok(());
    }

    let password = prompt_password("Session password: ")?;

    match store.login_completed(&password)? {
        None => {
            println!("{}", "Session: NONE".red());
            println!("  Run 'zklogin login' to start one");
        }
        Some(false) => {
            // Mid-redirect: the checkpoint is intact and waiting.
            let checkpoint = store.restore_partial(&password)?;
            println!("{}", "Session: LOGIN PENDING".yellow());
            if let Some(checkpoint) = checkpoint {
                println!("  Max epoch: {}", checkpoint.max_epoch);
            }
            println!("  Finish with 'zklogin complete <redirect url>'");
        }
        Some(true) => match store.restore_full(&password) {
            Ok(Some(session)) => {
                println!("{}", "Session: ACTIVE".green());
                println!("  Phase:     {:?}", session.phase());
                if let Some(address) = session.address() {
                    println!("  Address:   {address}");
                }
                if let Some(max_epoch) = session.max_epoch() {
                    println!("  Max epoch: {max_epoch}");
                }
            }
            Ok(None) => {
                println!("{}", "Session: NONE".red());
            }
            Err(err) if err.is_fatal() => {
                println!("{}", "Session: CORRUPT".red());
                println!("  {err}");
                println!("  The record was cleared; run 'zklogin login' to start over");
            }
            Err(err) => return Err(err.into()),
        },
    }

    Ok(())
}
