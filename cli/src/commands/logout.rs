//! End the session and wipe persisted state

use std::path::Path;

use anyhow::Result;
use colored::Colorize;
use zklogin::SessionStore;

pub fn run(store_path: &Path) -> Result<()> {
    let store = SessionStore::new(store_path.to_path_buf());

    if !store.exists() {
        println!("{}", "No session to clear.".dimmed());
        return Ok(());
    }

    store.clear()?;
    println!("{}", "Session cleared.".green());
    println!(
        "{}",
        "The ephemeral key is gone; the next login starts fresh.".dimmed()
    );

    Ok(())
}
