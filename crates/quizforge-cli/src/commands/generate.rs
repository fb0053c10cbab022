//! The `quizforge generate` command.

use std::path::PathBuf;

use anyhow::Result;
use serde::Serialize;

use quizforge_core::engine::Diagnostics;
use quizforge_core::model::Test;
use quizforge_providers::config::load_config_from;

use super::{build_engine, upload_file};

#[derive(Serialize)]
struct GeneratedTest<'a> {
    test: &'a Test,
    diagnostics: &'a Diagnostics,
}

pub async fn execute(
    pdfs: Vec<PathBuf>,
    title: Option<String>,
    description: Option<String>,
    questions: Option<usize>,
    json: bool,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let engine = build_engine(&config)?;

    let mut outcomes = Vec::with_capacity(pdfs.len());
    for path in &pdfs {
        let outcome = upload_file(
            &engine,
            path,
            title.as_deref(),
            description.as_deref(),
            questions,
        )
        .await?;
        if let Some(reason) = &outcome.diagnostics.collaborator_error {
            eprintln!("  {}: generator not used ({reason})", path.display());
        }
        outcomes.push(outcome);
    }

    if json {
        let report: Vec<GeneratedTest<'_>> = outcomes
            .iter()
            .map(|o| GeneratedTest {
                test: &o.test,
                diagnostics: &o.diagnostics,
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec![
        "ID",
        "Title",
        "Subject",
        "Difficulty",
        "Duration",
        "Questions",
        "Source",
    ]);
    for outcome in &outcomes {
        let test = &outcome.test;
        table.add_row(vec![
            Cell::new(test.id),
            Cell::new(&test.title),
            Cell::new(test.subject),
            Cell::new(test.difficulty),
            Cell::new(format!("{} min", test.duration_minutes())),
            Cell::new(test.question_count()),
            Cell::new(format!("{:?}", outcome.diagnostics.source).to_lowercase()),
        ]);
    }
    println!("{table}");

    for outcome in &outcomes {
        println!("{}: {}", outcome.test.source_filename, outcome.diagnostics.message);
    }

    Ok(())
}
