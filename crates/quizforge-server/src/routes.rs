//! Request handlers.

use std::collections::BTreeMap;

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use quizforge_core::engine::{parse_question_count, GenerationSource, UploadRequest};
use quizforge_core::model::{Question, Subject, Test};
use quizforge_core::session::AttemptResult;

use crate::error::ApiError;
use crate::AppState;

const DEFAULT_FILENAME: &str = "upload.pdf";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    pub filename: String,
    pub title: String,
    pub description: String,
    pub questions: Vec<Question>,
    pub extracted_text_length: usize,
    pub detected_subject: Subject,
    pub message: String,
    /// `true` when the questions did not come from the external generator.
    pub using_mock_data: bool,
    pub source: GenerationSource,
    pub test: Test,
}

#[derive(Debug, Serialize)]
pub struct TestList {
    pub tests: Vec<Test>,
}

#[derive(Debug, Deserialize)]
pub struct AttemptRequest {
    /// Question index to chosen option index.
    #[serde(default)]
    pub answers: BTreeMap<usize, usize>,
}

/// Read the upload form into an engine request.
async fn read_upload_form(mut multipart: Multipart) -> Result<UploadRequest, ApiError> {
    let mut request = UploadRequest::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "pdf" => {
                request.filename = field
                    .file_name()
                    .filter(|n| !n.is_empty())
                    .unwrap_or(DEFAULT_FILENAME)
                    .to_string();
                request.document = Some(field.bytes().await?.to_vec());
            }
            "title" => request.title = field.text().await?,
            "description" => request.description = field.text().await?,
            "questions" => request.question_count = parse_question_count(&field.text().await?)?,
            other => {
                tracing::debug!(field = other, "ignoring unknown form field");
            }
        }
    }
    Ok(request)
}

/// `POST /api/upload-pdf`
pub async fn upload_pdf(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let request = read_upload_form(multipart?).await?;
    let outcome = state.engine.upload(request).await?;
    let diagnostics = outcome.diagnostics;
    let test = outcome.test.as_ref().clone();

    Ok(Json(UploadResponse {
        success: true,
        filename: test.source_filename.clone(),
        title: test.title.clone(),
        description: test.description.clone(),
        questions: test.questions.clone(),
        extracted_text_length: diagnostics.extracted_text_length,
        detected_subject: diagnostics.detected_subject,
        message: diagnostics.message,
        using_mock_data: !diagnostics.used_collaborator,
        source: diagnostics.source,
        test,
    }))
}

/// `GET /api/upload-pdf`
///
/// Returns full records, answer keys included.
pub async fn list_tests(State(state): State<AppState>) -> Result<Json<TestList>, ApiError> {
    let tests = state.engine.list().await?;
    Ok(Json(TestList {
        tests: tests.iter().map(|t| t.as_ref().clone()).collect(),
    }))
}

/// `GET /api/tests/{id}`
pub async fn get_test(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Test>, ApiError> {
    let test = state.engine.get(id).await?;
    Ok(Json(test.as_ref().clone()))
}

/// `POST /api/tests/{id}/attempts`
pub async fn grade_attempt(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(sheet): Json<AttemptRequest>,
) -> Result<Json<AttemptResult>, ApiError> {
    let result = state.engine.grade(id, &sheet.answers).await?;
    tracing::info!(
        test_id = id,
        score = result.score_percent,
        passed = result.passed,
        "attempt graded"
    );
    Ok(Json(result))
}
