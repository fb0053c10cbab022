//! Core data model types for quizforge.
//!
//! A [`Test`] is created once from an uploaded document and never changes
//! afterwards; attempts at it live in [`crate::session`].

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::QuestionError;

/// Number of answer options every question carries.
pub const OPTION_COUNT: usize = 4;

/// A multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// The question text shown to the student.
    pub prompt: String,
    /// Exactly four answer choices, in display order.
    pub options: [String; OPTION_COUNT],
    /// Index into `options` of the correct choice.
    pub correct_option_index: usize,
    /// Shown after submission.
    pub explanation: String,
}

impl Question {
    /// Build a question and check its shape.
    pub fn new(
        prompt: impl Into<String>,
        options: [String; OPTION_COUNT],
        correct_option_index: usize,
        explanation: impl Into<String>,
    ) -> Result<Self, QuestionError> {
        let question = Self {
            prompt: prompt.into(),
            options,
            correct_option_index,
            explanation: explanation.into(),
        };
        question.validate()?;
        Ok(question)
    }

    /// Check the invariants that serde alone cannot enforce.
    pub fn validate(&self) -> Result<(), QuestionError> {
        if self.prompt.trim().is_empty() {
            return Err(QuestionError::EmptyPrompt);
        }
        if let Some(index) = self.options.iter().position(|o| o.trim().is_empty()) {
            return Err(QuestionError::EmptyOption(index));
        }
        if self.correct_option_index >= OPTION_COUNT {
            return Err(QuestionError::CorrectIndexOutOfRange(
                self.correct_option_index,
            ));
        }
        Ok(())
    }

    /// The text of the correct option.
    pub fn correct_option(&self) -> &str {
        &self.options[self.correct_option_index.min(OPTION_COUNT - 1)]
    }
}

/// Subjects the classifier can detect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Subject {
    Mathematics,
    Biology,
    Chemistry,
    Physics,
    History,
    Literature,
    Geography,
    /// No subject keyword was found.
    General,
}

impl Subject {
    pub fn as_str(self) -> &'static str {
        match self {
            Subject::Mathematics => "Mathematics",
            Subject::Biology => "Biology",
            Subject::Chemistry => "Chemistry",
            Subject::Physics => "Physics",
            Subject::History => "History",
            Subject::Literature => "Literature",
            Subject::Geography => "Geography",
            Subject::General => "General",
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Subject {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mathematics" | "math" | "maths" => Ok(Subject::Mathematics),
            "biology" => Ok(Subject::Biology),
            "chemistry" => Ok(Subject::Chemistry),
            "physics" => Ok(Subject::Physics),
            "history" => Ok(Subject::History),
            "literature" => Ok(Subject::Literature),
            "geography" => Ok(Subject::Geography),
            "general" => Ok(Subject::General),
            other => Err(format!("unknown subject: {other}")),
        }
    }
}

/// Difficulty, derived from the number of questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Up to 10 questions is easy, up to 20 medium, anything longer hard.
    pub fn for_question_count(count: usize) -> Self {
        match count {
            0..=10 => Difficulty::Easy,
            11..=20 => Difficulty::Medium,
            _ => Difficulty::Hard,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "Easy"),
            Difficulty::Medium => write!(f, "Medium"),
            Difficulty::Hard => write!(f, "Hard"),
        }
    }
}

/// Time allowed for a test: two minutes per question, never under 15 minutes.
pub fn duration_seconds_for(question_count: usize) -> u64 {
    let minutes = (question_count as u64 * 2).max(15);
    minutes * 60
}

/// A generated test, as stored in the repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Test {
    /// Repository-assigned id, strictly increasing.
    pub id: u64,
    pub title: String,
    pub description: String,
    /// Name of the uploaded file the questions came from.
    pub source_filename: String,
    pub questions: Vec<Question>,
    pub subject: Subject,
    pub difficulty: Difficulty,
    pub duration_seconds: u64,
    pub created_at: DateTime<Utc>,
}

impl Test {
    /// Materialize a draft under the id the repository allocated for it.
    pub fn from_draft(id: u64, draft: NewTest) -> Self {
        let count = draft.questions.len();
        let description = if draft.description.trim().is_empty() {
            format!("Test based on {}", draft.source_filename)
        } else {
            draft.description
        };
        Self {
            id,
            title: draft.title,
            description,
            source_filename: draft.source_filename,
            questions: draft.questions,
            subject: draft.subject,
            difficulty: Difficulty::for_question_count(count),
            duration_seconds: duration_seconds_for(count),
            created_at: draft.created_at,
        }
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    pub fn duration_minutes(&self) -> u64 {
        self.duration_seconds / 60
    }

    /// The listing view of this test.
    pub fn summary(&self) -> TestSummary {
        TestSummary {
            id: self.id,
            title: self.title.clone(),
            description: self.description.clone(),
            subject: self.subject,
            difficulty: self.difficulty,
            duration_seconds: self.duration_seconds,
            question_count: self.questions.len(),
        }
    }
}

/// Everything needed to store a test except its id and derived fields.
#[derive(Debug, Clone)]
pub struct NewTest {
    pub title: String,
    pub description: String,
    pub source_filename: String,
    pub questions: Vec<Question>,
    pub subject: Subject,
    pub created_at: DateTime<Utc>,
}

/// A test without its questions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestSummary {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub subject: Subject,
    pub difficulty: Difficulty,
    pub duration_seconds: u64,
    pub question_count: usize,
}
