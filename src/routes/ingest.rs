// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Inbound Parse webhook.
//!
//! Always answers 200: the parser retries anything else, and a retry
//! appends the same reps a second time.

use crate::services::{IngestService, Submission};
use crate::AppState;
use axum::{
    extract::{rejection::FormRejection, State},
    http::StatusCode,
    routing::post,
    Form, Router,
};
use chrono::Utc;
use std::sync::Arc;

/// Ingestion routes, including the path older mail routing still posts to.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ingest", post(handle_submission))
        .route("/parseapi/index.php", post(handle_submission))
}

/// Receive one parsed email (POST).
async fn handle_submission(
    State(state): State<Arc<AppState>>,
    form: Result<Form<Submission>, FormRejection>,
) -> StatusCode {
    let Form(submission) = match form {
        Ok(form) => form,
        Err(e) => {
            tracing::warn!(event = "bad_parse", error = %e, "Malformed ingestion payload");
            return StatusCode::OK;
        }
    };

    let outcome = IngestService::new(&state.config, state.store.as_ref(), state.notifier.as_ref())
        .ingest(&submission, Utc::now())
        .await;
    tracing::debug!(?outcome, "Submission processed");

    StatusCode::OK
}
