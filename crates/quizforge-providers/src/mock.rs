//! Mock generator for testing.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use quizforge_core::model::{Question, OPTION_COUNT};
use quizforge_core::traits::{parse_question_set, GenerateRequest, QuestionGenerator};

enum Behavior {
    /// Return these questions, truncated to the requested count.
    Fixed(Vec<Question>),
    /// Return `n` numbered questions, whatever was requested.
    Numbered(usize),
    /// Parse this raw reply as if it came over the wire.
    Raw(String),
    Fail(String),
}

/// A question generator that never leaves the process.
pub struct MockGenerator {
    behavior: Behavior,
    delay: Option<Duration>,
    call_count: AtomicU32,
    last_request: Mutex<Option<GenerateRequest>>,
}

impl MockGenerator {
    fn with_behavior(behavior: Behavior) -> Self {
        Self {
            behavior,
            delay: None,
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Always answer with these questions.
    pub fn with_questions(questions: Vec<Question>) -> Self {
        Self::with_behavior(Behavior::Fixed(questions))
    }

    /// Always answer with `count` numbered questions, correct answer rotating
    /// through the options.
    pub fn numbered(count: usize) -> Self {
        Self::with_behavior(Behavior::Numbered(count))
    }

    /// Answer with a raw reply body, parsed like a real collaborator reply.
    pub fn with_reply(reply: &str) -> Self {
        Self::with_behavior(Behavior::Raw(reply.to_string()))
    }

    /// Always fail with this message.
    pub fn failing(message: &str) -> Self {
        Self::with_behavior(Behavior::Fail(message.to_string()))
    }

    /// Sleep before answering.
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Get the number of calls made to this generator.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Get the last request made to this generator.
    pub fn last_request(&self) -> Option<GenerateRequest> {
        self.last_request
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// The `n`th mock question.
pub fn numbered_question(n: usize) -> Question {
    Question {
        prompt: format!("Mock question {}?", n + 1),
        options: [
            "Option A".into(),
            "Option B".into(),
            "Option C".into(),
            "Option D".into(),
        ],
        correct_option_index: n % OPTION_COUNT,
        explanation: format!("Mock explanation {}", n + 1),
    }
}

#[async_trait]
impl QuestionGenerator for MockGenerator {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, request: &GenerateRequest) -> anyhow::Result<Vec<Question>> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        *self
            .last_request
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(request.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.behavior {
            Behavior::Fixed(questions) => Ok(questions
                .iter()
                .take(request.question_count)
                .cloned()
                .collect()),
            Behavior::Numbered(count) => Ok((0..*count).map(numbered_question).collect()),
            Behavior::Raw(reply) => parse_question_set(reply),
            Behavior::Fail(message) => anyhow::bail!("{message}"),
        }
    }
}
