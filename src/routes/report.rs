// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Report page and JSON feed.

use crate::error::{AppError, Result};
use crate::services::report::{feed, render_html};
use crate::services::ReportService;
use crate::AppState;
use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;

/// Report routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/view", get(view))
}

#[derive(Deserialize)]
struct ViewParams {
    email: Option<String>,
    /// `1` or `true` selects the JSON feed
    json: Option<String>,
}

impl ViewParams {
    fn wants_json(&self) -> bool {
        matches!(self.json.as_deref(), Some("1") | Some("true"))
    }
}

/// Render the report for one email address.
async fn view(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ViewParams>,
) -> Result<Response> {
    let email = params
        .email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing email parameter".to_string()))?;

    let today = Utc::now().date_naive();
    let report = ReportService::new(&state.config, state.store.as_ref())
        .build(email, today)
        .await;

    if params.wants_json() {
        Ok(Json(feed(&report)).into_response())
    } else {
        Ok(Html(render_html(&report, &state.config)).into_response())
    }
}
