//! quizforge-providers: external question generators.
//!
//! Implements the `QuestionGenerator` trait for OpenAI-compatible chat
//! completion APIs, plus a mock generator for tests, and loads the
//! `quizforge.toml` configuration that decides which one is used.

pub mod config;
pub mod error;
pub mod mock;
pub mod openai;

pub use config::{
    create_generator, load_config, load_config_from, GeneratorConfig, QuizforgeConfig,
};
pub use error::ProviderError;
pub use mock::MockGenerator;
pub use openai::OpenAiGenerator;
