//! Error types for the quiz pipeline.
//!
//! Expected degradations (unreadable PDFs, no subject match, a failing
//! collaborator) are absorbed by the pipeline and never show up here. What
//! remains is either the caller's fault ([`InputError`], an unknown test id,
//! a bad answer sheet) or an unexpected fault ([`QuizError::Internal`]).

use thiserror::Error;

/// Errors returned by the upload engine.
#[derive(Debug, Error)]
pub enum QuizError {
    /// The request was rejected before any work was done.
    #[error(transparent)]
    Input(#[from] InputError),

    /// No test with this id exists.
    #[error("test {0} not found")]
    NotFound(u64),

    /// An answer sheet did not fit the test it was submitted against.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Something unexpected broke while generating or storing a test.
    #[error("internal fault: {0:#}")]
    Internal(#[from] anyhow::Error),
}

impl QuizError {
    /// Returns `true` if the caller is at fault.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, QuizError::Internal(_))
    }
}

/// Problems with the upload request itself.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    /// No document was attached to the request.
    #[error("No file provided")]
    MissingFile,

    /// The test title was empty or whitespace.
    #[error("Title is required")]
    EmptyTitle,

    /// The document exceeds the configured upload limit.
    #[error("file is {size} bytes, limit is {limit} bytes")]
    FileTooLarge { size: usize, limit: usize },

    /// The requested question count could not be parsed.
    #[error("invalid question count: {0}")]
    InvalidQuestionCount(String),
}

/// A question failed shape validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QuestionError {
    #[error("question prompt is empty")]
    EmptyPrompt,

    #[error("option {0} is empty")]
    EmptyOption(usize),

    #[error("correct option index {0} is outside 0..=3")]
    CorrectIndexOutOfRange(usize),
}

/// An operation was attempted that the session's current state forbids.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("cannot {operation} while the session is {state}")]
    NotInProgress {
        operation: &'static str,
        state: &'static str,
    },

    #[error("option {0} is outside 0..=3")]
    OptionOutOfRange(usize),

    #[error("question {index} does not exist (test has {len} questions)")]
    QuestionOutOfRange { index: usize, len: usize },

    #[error("session was opened for test {expected}, got test {actual}")]
    TestMismatch { expected: u64, actual: u64 },
}
