//! The `quizforge init` command.

use std::path::Path;

use anyhow::Result;

use quizforge_providers::config::{CONFIG_FILE_NAME, STARTER_CONFIG};

pub fn execute() -> Result<()> {
    if Path::new(CONFIG_FILE_NAME).exists() {
        println!("{CONFIG_FILE_NAME} already exists, skipping.");
        return Ok(());
    }
    std::fs::write(CONFIG_FILE_NAME, STARTER_CONFIG)?;
    println!("Created {CONFIG_FILE_NAME}");

    println!("\nNext steps:");
    println!("  1. Optionally set OPENAI_API_KEY to generate questions with a model");
    println!("  2. Run: quizforge generate --pdf notes.pdf");
    println!("  3. Run: quizforge serve");

    Ok(())
}
