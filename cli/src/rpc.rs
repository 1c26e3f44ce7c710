//! Minimal chain RPC access
//!
//! The CLI needs exactly one thing from the chain: the current epoch, used
//! to fix the session validity window at login and to check staleness
//! before signing. Everything else about the chain is out of scope here.

use anyhow::{anyhow, Context, Result};
use serde_json::{json, Value};

/// Fetch the current epoch over JSON-RPC.
pub async fn fetch_current_epoch(rpc_url: &str) -> Result<u64> {
    let request = json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "suix_getLatestSuiSystemState",
        "params": [],
    });

    let response: Value = reqwest::Client::new()
        .post(rpc_url)
        .json(&request)
        .send()
        .await
        .context("Failed to reach the chain RPC")?
        .error_for_status()
        .context("Chain RPC returned an error status")?
        .json()
        .await
        .context("Chain RPC returned invalid JSON")?;

    if let Some(error) = response.get("error") {
        return Err(anyhow!("Chain RPC error: {error}"));
    }

    // The epoch rides as a decimal string.
    response["result"]["epoch"]
        .as_str()
        .ok_or_else(|| anyhow!("Chain RPC response carries no epoch"))?
        .parse()
        .context("Chain RPC epoch is not an integer")
}
