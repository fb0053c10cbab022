//! quizforge-server: HTTP boundary for the upload engine.
//!
//! Routes:
//!
//! - `POST /api/upload-pdf` (multipart: `pdf`, `title`, `description`, `questions`)
//! - `GET  /api/upload-pdf` lists every stored test
//! - `GET  /api/tests/{id}`
//! - `POST /api/tests/{id}/attempts` grades an answer sheet

pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;

use quizforge_core::engine::QuizEngine;

pub use error::ApiError;

/// Room for the non-file multipart fields and part headers.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<QuizEngine>,
}

impl AppState {
    pub fn new(engine: QuizEngine) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let body_limit = state
        .engine
        .config()
        .max_upload_bytes
        .saturating_add(MULTIPART_OVERHEAD_BYTES);

    Router::new()
        .route(
            "/api/upload-pdf",
            post(routes::upload_pdf).get(routes::list_tests),
        )
        .route("/api/tests/{id}", get(routes::get_test))
        .route("/api/tests/{id}/attempts", post(routes::grade_attempt))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

/// Serve the router on an already-bound listener until ctrl-c.
pub async fn serve(listener: TcpListener, state: AppState) -> anyhow::Result<()> {
    let app = router(state);
    tracing::info!(local_addr = %listener.local_addr()?, "starting server");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
