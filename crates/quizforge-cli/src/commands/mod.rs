//! Subcommand implementations.

pub mod generate;
pub mod init;
pub mod serve;
pub mod take;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use quizforge_core::engine::{QuizEngine, UploadOutcome, UploadRequest};
use quizforge_core::store::InMemoryTestStore;
use quizforge_providers::{create_generator, QuizforgeConfig};

/// An engine over a fresh in-memory store, with the configured generator if
/// one has a key.
pub fn build_engine(config: &QuizforgeConfig) -> Result<QuizEngine> {
    let mut engine = QuizEngine::new(Arc::new(InMemoryTestStore::new()), config.engine_config());
    if let Some(generator) = config.active_generator() {
        let generator = create_generator(generator, config.generator_timeout_secs)
            .context("failed to set up question generator")?;
        engine = engine.with_generator(generator);
    }
    Ok(engine)
}

/// Read a PDF from disk and upload it into `engine`.
pub async fn upload_file(
    engine: &QuizEngine,
    path: &Path,
    title: Option<&str>,
    description: Option<&str>,
    question_count: Option<usize>,
) -> Result<UploadOutcome> {
    let document = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let title = match title {
        Some(t) => t.to_string(),
        None => path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default(),
    };

    let outcome = engine
        .upload(UploadRequest {
            document: Some(document),
            filename,
            title,
            description: description.unwrap_or_default().to_string(),
            question_count,
        })
        .await
        .with_context(|| format!("failed to generate a test from {}", path.display()))?;
    Ok(outcome)
}
