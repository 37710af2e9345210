//! CLI Status Command
//!
//! Asks a running server for `/health` and prints which services it has.

use std::path::Path;

use anyhow::Result;
use serde_json::Value;

use framewise_config::{apply_env_overrides, load_config};

pub async fn run(config_path: &Path, port: Option<u16>) -> Result<()> {
    // Only the port matters here; skip validation so a keyless shell works.
    let config = apply_env_overrides(load_config(config_path).await?);
    let port = port.unwrap_or_else(|| config.port());
    let url = format!("http://127.0.0.1:{port}/health");

    println!("framewise status: checking {url}");
    match reqwest::get(&url).await {
        Ok(resp) => {
            let body: Value = resp.json().await?;
            println!("{}", serde_json::to_string_pretty(&body)?);
            println!("  OpenAI:     {}", flag(&body, "hasOpenAI"));
            println!("  AssemblyAI: {}", flag(&body, "hasAssemblyAI"));
        }
        Err(_) => println!("framewise is not running on port {port}"),
    }
    Ok(())
}

fn flag(body: &Value, key: &str) -> &'static str {
    if body[key].as_bool().unwrap_or(false) {
        "configured"
    } else {
        "missing"
    }
}
