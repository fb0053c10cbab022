//! The external question-generation seam.
//!
//! A [`QuestionGenerator`] turns raw document bytes into questions without
//! going through the local heuristic pipeline. Implementations live in
//! `quizforge-providers`; the engine treats every one of them as fallible.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::model::{Question, OPTION_COUNT};

// ---------------------------------------------------------------------------
// Generator trait
// ---------------------------------------------------------------------------

/// A collaborator that writes questions for a whole document.
#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    /// Short name for logs and diagnostics (e.g. "openai").
    fn name(&self) -> &str;

    /// Generate questions for the document.
    ///
    /// Returning fewer than `request.question_count` questions is allowed;
    /// the caller decides whether that is good enough.
    async fn generate(&self, request: &GenerateRequest) -> anyhow::Result<Vec<Question>>;
}

/// What the collaborator gets to work with.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    /// The uploaded document, untouched.
    pub document: Vec<u8>,
    pub filename: String,
    pub question_count: usize,
}

/// Instruction sent along with the document.
pub fn generation_prompt(question_count: usize) -> String {
    format!(
        "Analyze this PDF document and generate {question_count} multiple choice questions \
         based ONLY on the content found in this specific PDF. The questions should test \
         understanding of the concepts, facts, and information presented in this document. \
         Each question must be answerable from the PDF content. Include explanations that \
         reference specific information from the PDF."
    )
}

/// System prompt pinning the reply to the JSON shape [`parse_question_set`] reads.
pub const GENERATOR_SYSTEM_PROMPT: &str = "You write multiple choice quiz questions. \
Reply with a single JSON object of the form \
{\"questions\":[{\"question\":string,\"options\":[string,string,string,string],\"correct\":integer 0-3,\"explanation\":string}]} \
and nothing else.";

// ---------------------------------------------------------------------------
// Reply parsing
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Serialize)]
struct QuestionSet {
    questions: Vec<GeneratedQuestion>,
}

#[derive(Debug, Deserialize, Serialize)]
struct GeneratedQuestion {
    question: String,
    options: Vec<String>,
    correct: usize,
    #[serde(default)]
    explanation: String,
}

/// Parse a collaborator reply into validated questions.
///
/// The reply may be bare JSON or JSON inside a markdown fence. Entries with
/// the wrong number of options, an out-of-range answer or empty text are
/// dropped rather than failing the whole set.
pub fn parse_question_set(reply: &str) -> anyhow::Result<Vec<Question>> {
    let payload = extract_json_payload(reply);
    let set: QuestionSet = serde_json::from_str(&payload)
        .map_err(|e| anyhow::anyhow!("collaborator reply is not a question set: {e}"))?;

    let total = set.questions.len();
    let questions: Vec<Question> = set
        .questions
        .into_iter()
        .filter_map(|q| {
            let options: [String; OPTION_COUNT] = q.options.try_into().ok()?;
            Question::new(q.question, options, q.correct, q.explanation).ok()
        })
        .collect();

    if questions.len() < total {
        tracing::debug!(
            kept = questions.len(),
            dropped = total - questions.len(),
            "discarded malformed generated questions"
        );
    }
    Ok(questions)
}

/// Pull the JSON body out of a markdown-formatted reply.
///
/// Prefers a ```json block, then an unlabelled block, then the raw reply.
/// An unclosed fence still yields what was inside it.
pub fn extract_json_payload(reply: &str) -> String {
    let mut json_blocks = Vec::new();
    let mut generic_blocks = Vec::new();
    let mut in_block = false;
    let mut is_json_block = false;
    let mut is_generic_block = false;
    let mut current = String::new();

    for line in reply.lines() {
        let trimmed = line.trim();

        if !in_block && trimmed.starts_with("```") {
            in_block = true;
            let lang = trimmed.trim_start_matches('`').trim().to_lowercase();
            is_json_block = lang == "json";
            is_generic_block = lang.is_empty();
            current.clear();
            continue;
        }

        if in_block && trimmed == "```" {
            in_block = false;
            if is_json_block {
                json_blocks.push(std::mem::take(&mut current));
            } else if is_generic_block {
                generic_blocks.push(std::mem::take(&mut current));
            } else {
                current.clear();
            }
            continue;
        }

        if in_block {
            if !current.is_empty() {
                current.push('\n');
            }
            current.push_str(line);
        }
    }

    if in_block && !current.is_empty() {
        if is_json_block {
            json_blocks.push(current);
        } else if is_generic_block {
            generic_blocks.push(current);
        }
    }

    json_blocks
        .into_iter()
        .next()
        .or_else(|| generic_blocks.into_iter().next())
        .unwrap_or_else(|| reply.trim().to_string())
}
