//! quizforge-core: PDF-to-quiz pipeline and test sessions.
//!
//! This crate defines the data model, the content pipeline
//! (extract → classify → mine → synthesize), the test-taking state machine
//! and the upload engine that ties them to a test repository.

pub mod classify;
pub mod engine;
pub mod error;
pub mod extract;
pub mod mine;
pub mod model;
pub mod session;
pub mod store;
pub mod synthesize;
pub mod traits;

/// Extracted text shorter than this many characters is treated as unreadable.
pub const MIN_USABLE_TEXT_CHARS: usize = 50;

/// Whether extracted text is long enough to mine terms and sentences from.
pub fn is_usable_text(text: &str) -> bool {
    text.chars().count() >= MIN_USABLE_TEXT_CHARS
}
