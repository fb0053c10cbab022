//! Upload engine: document in, stored test out.
//!
//! [`QuizEngine`] validates an upload, runs the local analysis on a blocking
//! worker, optionally asks an external [`QuestionGenerator`] for questions,
//! falls back to local synthesis when that fails, and stores the result in a
//! [`TestRepository`].

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::classify::classify;
use crate::error::{InputError, QuizError};
use crate::extract::extract_text;
use crate::is_usable_text;
use crate::mine::{mine_sentences, mine_terms};
use crate::model::{NewTest, Question, Subject, Test};
use crate::session::{AttemptResult, TestSession, DEFAULT_PASS_THRESHOLD_PERCENT};
use crate::store::TestRepository;
use crate::synthesize::{synthesize, unreadable_document_fill};
use crate::traits::{GenerateRequest, QuestionGenerator};

/// Configuration for the upload engine.
#[derive(Debug, Clone)]
pub struct QuizEngineConfig {
    /// Question count when the upload does not ask for one.
    pub default_question_count: usize,
    /// Requested counts are clamped into `min..=max`.
    pub min_question_count: usize,
    pub max_question_count: usize,
    /// Largest accepted document, in bytes.
    pub max_upload_bytes: usize,
    /// Upper bound on a single collaborator call.
    pub generator_timeout: Duration,
    /// Minimum score that counts as a pass when grading.
    pub pass_threshold_percent: u8,
}

impl Default for QuizEngineConfig {
    fn default() -> Self {
        Self {
            default_question_count: 10,
            min_question_count: 5,
            max_question_count: 50,
            max_upload_bytes: 20 * 1024 * 1024,
            generator_timeout: Duration::from_secs(60),
            pass_threshold_percent: DEFAULT_PASS_THRESHOLD_PERCENT,
        }
    }
}

/// One document upload.
#[derive(Debug, Clone, Default)]
pub struct UploadRequest {
    /// The raw document. `None` or empty means nothing was attached.
    pub document: Option<Vec<u8>>,
    pub filename: String,
    pub title: String,
    /// Empty means "derive one from the filename".
    pub description: String,
    /// `None` means the configured default.
    pub question_count: Option<usize>,
}

/// Where a test's questions came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationSource {
    /// The external generator.
    Collaborator,
    /// Local synthesis from extracted text.
    Heuristic,
    /// Canned questions; the document text was unusable.
    Degraded,
}

/// What happened during an upload, for the caller to show or log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostics {
    /// Characters of text recovered by local extraction.
    pub extracted_text_length: usize,
    pub detected_subject: Subject,
    pub source: GenerationSource,
    pub used_collaborator: bool,
    /// Why the collaborator was not used, when one was configured.
    pub collaborator_error: Option<String>,
    pub message: String,
}

/// The stored test plus how it was made.
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    pub test: Arc<Test>,
    pub diagnostics: Diagnostics,
}

/// Local analysis of one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentAnalysis {
    pub text: String,
    pub subject: Subject,
    pub terms: Vec<String>,
    pub sentences: Vec<String>,
}

impl DocumentAnalysis {
    /// Extract, classify and mine a document.
    pub fn of(document: &[u8]) -> Self {
        let text = extract_text(document);
        let subject = classify(&text);
        let terms = mine_terms(&text);
        let sentences = mine_sentences(&text);
        Self {
            text,
            subject,
            terms,
            sentences,
        }
    }

    pub fn text_length(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_usable(&self) -> bool {
        is_usable_text(&self.text)
    }
}

/// Parse the raw question-count form field.
///
/// Blank means "use the default". Anything else must be a non-negative
/// integer; range clamping happens later.
pub fn parse_question_count(raw: &str) -> Result<Option<usize>, InputError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<usize>()
        .map(Some)
        .map_err(|_| InputError::InvalidQuestionCount(raw.to_string()))
}

/// Turns uploaded documents into stored tests.
pub struct QuizEngine {
    repository: Arc<dyn TestRepository>,
    generator: Option<Arc<dyn QuestionGenerator>>,
    config: QuizEngineConfig,
}

impl QuizEngine {
    pub fn new(repository: Arc<dyn TestRepository>, config: QuizEngineConfig) -> Self {
        Self {
            repository,
            generator: None,
            config,
        }
    }

    /// Try this collaborator before falling back to local synthesis.
    pub fn with_generator(mut self, generator: Arc<dyn QuestionGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn config(&self) -> &QuizEngineConfig {
        &self.config
    }

    pub fn generator_name(&self) -> Option<&str> {
        self.generator.as_deref().map(|g| g.name())
    }

    /// The number of questions an upload asking for `requested` will get.
    pub fn clamp_question_count(&self, requested: Option<usize>) -> usize {
        let min = self.config.min_question_count.max(1);
        let max = self.config.max_question_count.max(min);
        requested
            .unwrap_or(self.config.default_question_count)
            .clamp(min, max)
    }

    /// Generate and store a test from an uploaded document.
    #[tracing::instrument(skip_all, fields(filename = %request.filename, title = %request.title))]
    pub async fn upload(&self, request: UploadRequest) -> Result<UploadOutcome, QuizError> {
        let document = match request.document {
            Some(bytes) if !bytes.is_empty() => bytes,
            _ => return Err(InputError::MissingFile.into()),
        };
        let title = request.title.trim().to_string();
        if title.is_empty() {
            return Err(InputError::EmptyTitle.into());
        }
        if document.len() > self.config.max_upload_bytes {
            return Err(InputError::FileTooLarge {
                size: document.len(),
                limit: self.config.max_upload_bytes,
            }
            .into());
        }
        let question_count = self.clamp_question_count(request.question_count);

        let document = Arc::new(document);
        let analysis = {
            let document = Arc::clone(&document);
            tokio::task::spawn_blocking(move || DocumentAnalysis::of(&document))
                .await
                .map_err(|e| {
                    tracing::error!(error = %e, "document analysis task failed");
                    anyhow::anyhow!("document analysis failed: {e}")
                })?
        };
        tracing::debug!(chars = analysis.text_length(), "document analyzed");
        if analysis.is_usable() {
            let top: Vec<&str> = analysis.terms.iter().take(5).map(String::as_str).collect();
            tracing::info!(
                subject = %analysis.subject,
                terms = %top.join(", "),
                "detected subject"
            );
        }

        let mut collaborator_error = None;
        let mut generated = None;
        if let Some(generator) = &self.generator {
            let gen_request = GenerateRequest {
                document: document.to_vec(),
                filename: request.filename.clone(),
                question_count,
            };
            match self.ask_collaborator(generator.as_ref(), &gen_request).await {
                Ok(questions) => generated = Some(questions),
                Err(reason) => {
                    tracing::warn!(
                        generator = generator.name(),
                        %reason,
                        "collaborator failed, falling back to local generation"
                    );
                    collaborator_error = Some(reason);
                }
            }
        }

        let (questions, source) = match generated {
            Some(questions) => (questions, GenerationSource::Collaborator),
            None if analysis.is_usable() => (
                synthesize(
                    &analysis.text,
                    analysis.subject,
                    &analysis.terms,
                    &analysis.sentences,
                    question_count,
                ),
                GenerationSource::Heuristic,
            ),
            None => (
                unreadable_document_fill(question_count),
                GenerationSource::Degraded,
            ),
        };

        let message = match source {
            GenerationSource::Collaborator => format!(
                "PDF analyzed by {} and questions generated from the document content",
                self.generator_name().unwrap_or("the question generator")
            ),
            GenerationSource::Heuristic => format!(
                "Generated {} questions based on extracted PDF content ({} characters analyzed)",
                questions.len(),
                analysis.text_length()
            ),
            GenerationSource::Degraded => {
                "Generated questions based on PDF upload (limited text extraction)".to_string()
            }
        };

        let draft = NewTest {
            title,
            description: request.description.trim().to_string(),
            source_filename: request.filename,
            questions,
            subject: analysis.subject,
            created_at: Utc::now(),
        };
        let test = self.repository.create(draft).await.map_err(|e| {
            tracing::error!(error = %format!("{e:#}"), "failed to store test");
            QuizError::Internal(e)
        })?;
        tracing::info!(
            id = test.id,
            questions = test.question_count(),
            ?source,
            "test created"
        );

        Ok(UploadOutcome {
            diagnostics: Diagnostics {
                extracted_text_length: analysis.text_length(),
                detected_subject: analysis.subject,
                source,
                used_collaborator: source == GenerationSource::Collaborator,
                collaborator_error,
                message,
            },
            test,
        })
    }

    /// Call the collaborator under the configured timeout.
    ///
    /// Success means at least `question_count` valid questions; any surplus
    /// is dropped.
    async fn ask_collaborator(
        &self,
        generator: &dyn QuestionGenerator,
        request: &GenerateRequest,
    ) -> Result<Vec<Question>, String> {
        let timeout = self.config.generator_timeout;
        let mut questions = match tokio::time::timeout(timeout, generator.generate(request)).await {
            Err(_) => return Err(format!("timed out after {}s", timeout.as_secs_f64())),
            Ok(Err(e)) => return Err(format!("{e:#}")),
            Ok(Ok(questions)) => questions,
        };

        if let Some((index, err)) = questions
            .iter()
            .enumerate()
            .find_map(|(i, q)| q.validate().err().map(|e| (i, e)))
        {
            return Err(format!("question {index} is malformed: {err}"));
        }
        if questions.len() < request.question_count {
            return Err(format!(
                "returned {} questions, {} requested",
                questions.len(),
                request.question_count
            ));
        }
        questions.truncate(request.question_count);
        Ok(questions)
    }

    /// All stored tests, oldest first.
    pub async fn list(&self) -> Result<Vec<Arc<Test>>, QuizError> {
        Ok(self.repository.list().await?)
    }

    pub async fn get(&self, id: u64) -> Result<Arc<Test>, QuizError> {
        self.repository
            .get(id)
            .await?
            .ok_or(QuizError::NotFound(id))
    }

    /// Score a complete answer sheet against a stored test.
    pub async fn grade(
        &self,
        id: u64,
        answers: &BTreeMap<usize, usize>,
    ) -> Result<AttemptResult, QuizError> {
        let test = self.get(id).await?;
        Ok(TestSession::grade(
            test,
            answers,
            self.config.pass_threshold_percent,
        )?)
    }
}
