//! The `quizforge serve` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tokio::net::TcpListener;

use quizforge_providers::config::load_config_from;
use quizforge_server::AppState;

use super::build_engine;

pub async fn execute(bind: Option<String>, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let engine = build_engine(&config)?;
    let addr = bind.unwrap_or_else(|| config.bind.clone());

    match engine.generator_name() {
        Some(name) => tracing::info!(generator = name, "external question generator enabled"),
        None => tracing::info!("no generator key configured, using local question synthesis"),
    }

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    eprintln!("quizforge listening on http://{}", listener.local_addr()?);

    quizforge_server::serve(listener, AppState::new(engine)).await
}
