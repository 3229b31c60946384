mod auth;
mod calc;
mod config;
mod db;
mod ipc;
mod record;
mod report;
mod store;
mod trend;

use std::io::{self, BufRead, Write};

use crate::auth::Sha256Hasher;
use crate::config::AppConfig;
use crate::store::SqliteRecordStore;

fn init_tracing() {
    // stdout carries the protocol; logs go to stderr.
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "studentd=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(io::stderr)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(io::stderr)
            .init();
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::from_env()?;
    let mut state = ipc::AppState {
        workspace: None,
        store: None,
        hasher: Box::new(Sha256Hasher),
        config,
    };
    if let Some(path) = state.config.workspace.clone() {
        let store = SqliteRecordStore::open(&path, state.config.subjects.clone())?;
        tracing::info!(workspace = %path.display(), "workspace opened from environment");
        state.workspace = Some(path);
        state.store = Some(Box::new(store));
    }
    tracing::info!(subjects = state.config.subjects.len(), "studentd ready");

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
                tracing::warn!(error = %e, "unparseable request line");
                let resp = serde_json::json!({
                    "ok": false,
                    "error": { "code": "bad_json", "message": e.to_string() }
                });
                let _ = writeln!(stdout, "{}", resp);
                let _ = stdout.flush();
                continue;
            }
        };

        tracing::debug!(request_id = %req.id, method = %req.method, "request");
        let resp = ipc::handle_request(&mut state, req);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }
    Ok(())
}
