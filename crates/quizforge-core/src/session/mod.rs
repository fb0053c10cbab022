//! The test-taking state machine.
//!
//! A [`TestSession`] moves `Loading → InProgress → Submitted`. While in
//! progress it tracks the current question, the answers given so far and the
//! seconds left. Submission (manual, or forced when the clock runs out)
//! scores the attempt and freezes it; a new attempt needs a new session.
//!
//! The session itself never looks at a clock. Something calls
//! [`TestSession::tick`] once per second; [`countdown`] provides a tokio task
//! that does exactly that and stops as soon as the session is submitted.

pub mod countdown;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::SessionError;
use crate::model::{Test, OPTION_COUNT};

pub use countdown::{Countdown, SharedSession, TimedSession};

/// Minimum score, in percent, that counts as a pass.
pub const DEFAULT_PASS_THRESHOLD_PERCENT: u8 = 70;

/// Coarse session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Loading,
    InProgress,
    Submitted,
}

impl SessionState {
    fn as_str(self) -> &'static str {
        match self {
            SessionState::Loading => "loading",
            SessionState::InProgress => "in progress",
            SessionState::Submitted => "submitted",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why an attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitReason {
    Manual,
    TimeExpired,
}

/// What happened on a clock tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// One second was taken off the clock.
    Running { remaining_seconds: u64 },
    /// The clock hit zero and the attempt was submitted.
    Expired,
    /// The session is not in progress; nothing changed.
    Inactive,
}

/// One question's outcome in a submitted attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionReview {
    pub index: usize,
    pub prompt: String,
    pub chosen_option_index: Option<usize>,
    pub correct_option_index: usize,
    pub is_correct: bool,
    pub explanation: String,
}

/// The scored outcome of an attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptResult {
    pub test_id: u64,
    /// `round(100 * correct / total)`.
    pub score_percent: u8,
    pub correct_count: usize,
    pub answered_count: usize,
    pub total_questions: usize,
    pub passed: bool,
    pub reason: SubmitReason,
    pub review: Vec<QuestionReview>,
}

/// Score as a rounded percentage. Unanswered questions are simply not correct.
pub fn score_percent(correct: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    ((correct as f64 / total as f64) * 100.0).round() as u8
}

#[derive(Debug, Clone)]
struct Attempt {
    test: Arc<Test>,
    current: usize,
    answers: BTreeMap<usize, usize>,
    remaining_seconds: u64,
}

impl Attempt {
    fn new(test: Arc<Test>, remaining_seconds: u64) -> Self {
        Self {
            test,
            current: 0,
            answers: BTreeMap::new(),
            remaining_seconds,
        }
    }

    fn last_index(&self) -> usize {
        self.test.questions.len().saturating_sub(1)
    }

    fn score(&self, reason: SubmitReason, pass_threshold: u8) -> AttemptResult {
        let review: Vec<QuestionReview> = self
            .test
            .questions
            .iter()
            .enumerate()
            .map(|(index, q)| {
                let chosen = self.answers.get(&index).copied();
                QuestionReview {
                    index,
                    prompt: q.prompt.clone(),
                    chosen_option_index: chosen,
                    correct_option_index: q.correct_option_index,
                    is_correct: chosen == Some(q.correct_option_index),
                    explanation: q.explanation.clone(),
                }
            })
            .collect();

        let correct_count = review.iter().filter(|r| r.is_correct).count();
        let total_questions = review.len();
        let score = score_percent(correct_count, total_questions);

        AttemptResult {
            test_id: self.test.id,
            score_percent: score,
            correct_count,
            answered_count: self.answers.len(),
            total_questions,
            passed: score >= pass_threshold,
            reason,
            review,
        }
    }
}

#[derive(Debug, Clone)]
enum Phase {
    Loading,
    InProgress(Attempt),
    Submitted {
        attempt: Attempt,
        result: AttemptResult,
    },
}

/// One student's attempt at one test.
#[derive(Debug, Clone)]
pub struct TestSession {
    test_id: u64,
    pass_threshold: u8,
    phase: Phase,
}

impl TestSession {
    /// A session waiting for its test to be loaded.
    pub fn new(test_id: u64) -> Self {
        Self {
            test_id,
            pass_threshold: DEFAULT_PASS_THRESHOLD_PERCENT,
            phase: Phase::Loading,
        }
    }

    /// A session that starts immediately with the test's full duration.
    pub fn start(test: Arc<Test>) -> Self {
        let seconds = test.duration_seconds;
        Self::start_with_time_limit(test, seconds)
    }

    /// A session that starts immediately with a custom clock.
    pub fn start_with_time_limit(test: Arc<Test>, seconds: u64) -> Self {
        Self {
            test_id: test.id,
            pass_threshold: DEFAULT_PASS_THRESHOLD_PERCENT,
            phase: Phase::InProgress(Attempt::new(test, seconds)),
        }
    }

    pub fn with_pass_threshold(mut self, percent: u8) -> Self {
        self.pass_threshold = percent.min(100);
        self
    }

    /// Score a finished answer sheet in one go.
    pub fn grade(
        test: Arc<Test>,
        answers: &BTreeMap<usize, usize>,
        pass_threshold: u8,
    ) -> Result<AttemptResult, SessionError> {
        let mut session = Self::start(test).with_pass_threshold(pass_threshold);
        for (&question, &option) in answers {
            session.answer(question, option)?;
        }
        session.submit().cloned()
    }

    /// `Loading → InProgress` once the test arrives.
    pub fn load(&mut self, test: Arc<Test>) -> Result<(), SessionError> {
        if !matches!(self.phase, Phase::Loading) {
            return Err(self.not_in("load a test"));
        }
        if test.id != self.test_id {
            return Err(SessionError::TestMismatch {
                expected: self.test_id,
                actual: test.id,
            });
        }
        let seconds = test.duration_seconds;
        self.phase = Phase::InProgress(Attempt::new(test, seconds));
        Ok(())
    }

    pub fn state(&self) -> SessionState {
        match self.phase {
            Phase::Loading => SessionState::Loading,
            Phase::InProgress(_) => SessionState::InProgress,
            Phase::Submitted { .. } => SessionState::Submitted,
        }
    }

    pub fn test_id(&self) -> u64 {
        self.test_id
    }

    pub fn is_submitted(&self) -> bool {
        matches!(self.phase, Phase::Submitted { .. })
    }

    /// Record (or replace) the answer to a question.
    pub fn answer(&mut self, question_index: usize, option_index: usize) -> Result<(), SessionError> {
        let attempt = self.in_progress_mut("answer")?;
        let len = attempt.test.questions.len();
        if question_index >= len {
            return Err(SessionError::QuestionOutOfRange {
                index: question_index,
                len,
            });
        }
        if option_index >= OPTION_COUNT {
            return Err(SessionError::OptionOutOfRange(option_index));
        }
        attempt.answers.insert(question_index, option_index);
        Ok(())
    }

    /// Answer the question currently shown.
    pub fn answer_current(&mut self, option_index: usize) -> Result<(), SessionError> {
        let current = self.in_progress_mut("answer")?.current;
        self.answer(current, option_index)
    }

    /// Jump to a question; out-of-range targets are clamped.
    pub fn navigate(&mut self, to_index: usize) -> Result<usize, SessionError> {
        let attempt = self.in_progress_mut("navigate")?;
        attempt.current = to_index.min(attempt.last_index());
        Ok(attempt.current)
    }

    pub fn next(&mut self) -> Result<usize, SessionError> {
        let current = self.in_progress_mut("navigate")?.current;
        self.navigate(current.saturating_add(1))
    }

    pub fn previous(&mut self) -> Result<usize, SessionError> {
        let current = self.in_progress_mut("navigate")?.current;
        self.navigate(current.saturating_sub(1))
    }

    /// Take one second off the clock, submitting when it reaches zero.
    pub fn tick(&mut self) -> Tick {
        let Phase::InProgress(attempt) = &mut self.phase else {
            return Tick::Inactive;
        };
        attempt.remaining_seconds = attempt.remaining_seconds.saturating_sub(1);
        if attempt.remaining_seconds > 0 {
            return Tick::Running {
                remaining_seconds: attempt.remaining_seconds,
            };
        }
        self.finish(SubmitReason::TimeExpired);
        Tick::Expired
    }

    /// Score the attempt and freeze it.
    pub fn submit(&mut self) -> Result<&AttemptResult, SessionError> {
        self.in_progress_mut("submit")?;
        self.finish(SubmitReason::Manual);
        self.result()
            .ok_or_else(|| self.not_in("read the result"))
    }

    fn finish(&mut self, reason: SubmitReason) {
        let phase = std::mem::replace(&mut self.phase, Phase::Loading);
        self.phase = match phase {
            Phase::InProgress(attempt) => {
                let result = attempt.score(reason, self.pass_threshold);
                tracing::debug!(
                    test_id = self.test_id,
                    score = result.score_percent,
                    ?reason,
                    "attempt submitted"
                );
                Phase::Submitted { attempt, result }
            }
            other => other,
        };
    }

    /// The scored result, once submitted.
    pub fn result(&self) -> Option<&AttemptResult> {
        match &self.phase {
            Phase::Submitted { result, .. } => Some(result),
            _ => None,
        }
    }

    pub fn final_score_percent(&self) -> Option<u8> {
        self.result().map(|r| r.score_percent)
    }

    pub fn test(&self) -> Option<&Arc<Test>> {
        self.attempt().map(|a| &a.test)
    }

    pub fn current_index(&self) -> Option<usize> {
        self.attempt().map(|a| a.current)
    }

    pub fn current_question(&self) -> Option<&crate::model::Question> {
        self.attempt().and_then(|a| a.test.questions.get(a.current))
    }

    /// Answers given so far, keyed by question index.
    pub fn answers(&self) -> Option<&BTreeMap<usize, usize>> {
        self.attempt().map(|a| &a.answers)
    }

    pub fn remaining_seconds(&self) -> Option<u64> {
        self.attempt().map(|a| a.remaining_seconds)
    }

    /// Remaining time as `m:ss`.
    pub fn clock(&self) -> Option<String> {
        self.remaining_seconds().map(format_clock)
    }

    /// Position in the test as a percentage, counting the current question.
    pub fn progress_percent(&self) -> Option<f64> {
        self.attempt().map(|a| {
            let total = a.test.questions.len().max(1) as f64;
            (a.current + 1) as f64 / total * 100.0
        })
    }

    fn attempt(&self) -> Option<&Attempt> {
        match &self.phase {
            Phase::Loading => None,
            Phase::InProgress(attempt) | Phase::Submitted { attempt, .. } => Some(attempt),
        }
    }

    fn in_progress_mut(&mut self, operation: &'static str) -> Result<&mut Attempt, SessionError> {
        let state = self.state().as_str();
        match &mut self.phase {
            Phase::InProgress(attempt) => Ok(attempt),
            _ => Err(SessionError::NotInProgress { operation, state }),
        }
    }

    fn not_in(&self, operation: &'static str) -> SessionError {
        SessionError::NotInProgress {
            operation,
            state: self.state().as_str(),
        }
    }
}

/// Format seconds as `m:ss`.
pub fn format_clock(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
