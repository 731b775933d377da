mod backup;
mod calc;
mod config;
mod error;
mod ipc;
mod notify;
mod record;
mod store;
mod table;
mod upload;
mod validate;

use anyhow::Context;
use std::io::{self, BufRead, Write};

fn init_tracing() -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_env("ATTENDANCE_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    // stdout carries the protocol; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}

fn main() -> anyhow::Result<()> {
    init_tracing()?;
    let config = config::AppConfig::load().context("failed to load configuration")?;

    let store = match store::open_store(&config.storage) {
        Ok(s) => Some(s),
        Err(e) => {
            // The client can still pick a workspace explicitly.
            tracing::warn!(error = %format!("{e:#}"), "could not open configured data directory");
            None
        }
    };
    let mut state = ipc::AppState {
        workspace: store.as_ref().map(|_| config.storage.data_dir.clone()),
        store,
        config,
    };
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "attendanced ready");

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // Can't reply without id.
                let resp = ipc::err("", "bad_json", e.to_string(), None);
                let _ = writeln!(stdout, "{}", resp);
                let _ = stdout.flush();
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }

    tracing::info!("stdin closed, exiting");
    Ok(())
}
