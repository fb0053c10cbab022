use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use quizforge_core::engine::{QuizEngine, QuizEngineConfig};
use quizforge_core::store::InMemoryTestStore;
use quizforge_providers::MockGenerator;
use quizforge_server::{router, AppState};

const BOUNDARY: &str = "quizforge-test-boundary";

const BIOLOGY_PDF: &[u8] = b"%PDF-1.4\n1 0 obj\nBT\n\
    (Photosynthesis converts light energy into chemical energy inside every plant cell.) Tj\n\
    (Chlorophyll absorbs light in the chloroplasts of the organism.) Tj\n\
    (Photosynthesis releases oxygen as a byproduct of splitting water.) Tj\n\
    ET\nendobj\n%%EOF";

enum Part<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a str, &'a [u8]),
}

fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                        .as_bytes(),
                );
            }
            Part::File(name, filename, bytes) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                         Content-Type: application/pdf\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
                body.extend_from_slice(b"\r\n");
            }
        }
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(parts: &[Part<'_>]) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/api/upload-pdf")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, json: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json.to_string()))
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

fn app_with(config: QuizEngineConfig, generator: Option<MockGenerator>) -> Router {
    let mut engine = QuizEngine::new(Arc::new(InMemoryTestStore::new()), config);
    if let Some(generator) = generator {
        engine = engine.with_generator(Arc::new(generator));
    }
    router(AppState::new(engine))
}

fn app() -> Router {
    app_with(QuizEngineConfig::default(), None)
}

#[tokio::test]
async fn upload_builds_test_from_pdf_text() {
    let app = app();
    let (status, body) = send(
        &app,
        upload_request(&[
            Part::File("pdf", "cells.pdf", BIOLOGY_PDF),
            Part::Text("title", "Cells"),
            Part::Text("questions", "8"),
        ]),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(body["success"], true);
    assert_eq!(body["filename"], "cells.pdf");
    assert_eq!(body["description"], "Test based on cells.pdf");
    assert_eq!(body["detectedSubject"], "Biology");
    assert_eq!(body["usingMockData"], true);
    assert_eq!(body["source"], "heuristic");
    assert_eq!(body["questions"].as_array().unwrap().len(), 8);
    assert!(body["extractedTextLength"].as_u64().unwrap() > 50);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("Generated 8 questions"));

    let test = &body["test"];
    assert_eq!(test["id"], 1);
    assert_eq!(test["difficulty"], "Easy");
    assert_eq!(test["durationSeconds"], 900);
    assert_eq!(test["questions"][0]["options"].as_array().unwrap().len(), 4);
    assert_eq!(test["questions"][0]["correctOptionIndex"], 0);
}

#[tokio::test]
async fn missing_file_is_a_client_error() {
    let app = app();
    let (status, body) = send(&app, upload_request(&[Part::Text("title", "No file")])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No file provided");

    let (status, body) = send(
        &app,
        upload_request(&[Part::File("pdf", "a.pdf", BIOLOGY_PDF), Part::Text("title", " ")]),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Title is required");

    let (status, _) = send(
        &app,
        upload_request(&[
            Part::File("pdf", "a.pdf", BIOLOGY_PDF),
            Part::Text("title", "T"),
            Part::Text("questions", "lots"),
        ]),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Nothing was stored.
    let (_, list) = send(&app, get("/api/upload-pdf")).await;
    assert_eq!(list["tests"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn non_multipart_upload_is_rejected() {
    let app = app();
    let (status, _) = send(&app, post_json("/api/upload-pdf", serde_json::json!({}))).await;
    assert!(status.is_client_error());
}

#[tokio::test]
async fn oversized_upload_is_rejected() {
    let app = app_with(
        QuizEngineConfig {
            max_upload_bytes: 100,
            ..QuizEngineConfig::default()
        },
        None,
    );
    let (status, body) = send(
        &app,
        upload_request(&[Part::File("pdf", "big.pdf", BIOLOGY_PDF), Part::Text("title", "Big")]),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("limit is 100 bytes"));
}

#[tokio::test]
async fn unreadable_pdf_gets_canned_questions() {
    let app = app();
    let (status, body) = send(
        &app,
        upload_request(&[
            Part::File("pdf", "scan.pdf", b"%PDF-1.7\n\x00\x01\x02\x03%%EOF"),
            Part::Text("title", "Scanned"),
        ]),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "degraded");
    assert_eq!(body["detectedSubject"], "General");
    assert_eq!(body["questions"].as_array().unwrap().len(), 10);
    assert_eq!(
        body["message"],
        "Generated questions based on PDF upload (limited text extraction)"
    );
}

#[tokio::test]
async fn generator_questions_are_used_when_available() {
    let app = app_with(QuizEngineConfig::default(), Some(MockGenerator::numbered(10)));
    let (status, body) = send(
        &app,
        upload_request(&[Part::File("pdf", "cells.pdf", BIOLOGY_PDF), Part::Text("title", "Cells")]),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["usingMockData"], false);
    assert_eq!(body["source"], "collaborator");
    assert_eq!(body["questions"][0]["prompt"], "Mock question 1?");
    assert_eq!(body["questions"][1]["correctOptionIndex"], 1);
}

#[tokio::test]
async fn failing_generator_falls_back() {
    let app = app_with(
        QuizEngineConfig {
            generator_timeout: Duration::from_millis(20),
            ..QuizEngineConfig::default()
        },
        Some(MockGenerator::numbered(10).delayed(Duration::from_secs(5))),
    );
    let (status, body) = send(
        &app,
        upload_request(&[Part::File("pdf", "cells.pdf", BIOLOGY_PDF), Part::Text("title", "Cells")]),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["usingMockData"], true);
    assert_eq!(body["source"], "heuristic");
}

#[tokio::test]
async fn list_get_and_grade() {
    let app = app();
    for title in ["First", "Second"] {
        let (status, _) = send(
            &app,
            upload_request(&[
                Part::File("pdf", "cells.pdf", BIOLOGY_PDF),
                Part::Text("title", title),
                Part::Text("description", "Chapter 3"),
                Part::Text("questions", "5"),
            ]),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, list) = send(&app, get("/api/upload-pdf")).await;
    assert_eq!(status, StatusCode::OK);
    let tests = list["tests"].as_array().unwrap();
    assert_eq!(tests.len(), 2);
    assert_eq!(tests[0]["id"], 1);
    assert_eq!(tests[1]["title"], "Second");
    assert_eq!(tests[1]["description"], "Chapter 3");

    let (status, test) = send(&app, get("/api/tests/2")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(test["questions"].as_array().unwrap().len(), 5);

    let (status, _) = send(&app, get("/api/tests/42")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, result) = send(
        &app,
        post_json(
            "/api/tests/2/attempts",
            serde_json::json!({ "answers": { "0": 0, "1": 0, "2": 0, "3": 2 } }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "response: {result}");
    assert_eq!(result["scorePercent"], 60);
    assert_eq!(result["correctCount"], 3);
    assert_eq!(result["passed"], false);
    assert_eq!(result["review"][3]["chosenOptionIndex"], 2);
    assert_eq!(result["review"][4]["chosenOptionIndex"], Value::Null);

    let (status, _) = send(
        &app,
        post_json(
            "/api/tests/2/attempts",
            serde_json::json!({ "answers": { "0": 7 } }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send(
        &app,
        post_json("/api/tests/42/attempts", serde_json::json!({ "answers": {} })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn concurrent_uploads_get_distinct_ids() {
    let app = app();
    let requests = (0..8).map(|i| {
        let app = app.clone();
        async move {
            let title = format!("Test {i}");
            let (status, body) = send(
                &app,
                upload_request(&[
                    Part::File("pdf", "cells.pdf", BIOLOGY_PDF),
                    Part::Text("title", &title),
                ]),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            body["test"]["id"].as_u64().unwrap()
        }
    });
    let mut ids: Vec<u64> = futures::future::join_all(requests).await;
    ids.sort_unstable();
    assert_eq!(ids, (1..=8).collect::<Vec<u64>>());
}
