// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Integration tests for the report page, JSON feed and health check.

use axum::http::{header, StatusCode};
use chrono::Utc;
use countmyreps::db::{get_or_create_user, RepStore};

mod common;
use common::{body_json, body_text, create_test_app, get};

#[tokio::test]
async fn test_health_check() {
    let app = create_test_app();

    let response = get(&app, "/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_missing_email_is_bad_request() {
    let app = create_test_app();

    let response = get(&app, "/view").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "bad_request");

    let response = get(&app, "/view?email=%20").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_html_report() {
    let app = create_test_app();
    let user_id = get_or_create_user(app.store.as_ref(), "joe@x.com").await.unwrap();
    app.store
        .append_rep(&user_id, "pullups", 12, Utc::now())
        .await
        .unwrap();

    let response = get(&app, "/view?email=joe@x.com").await;

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers().get(header::CONTENT_TYPE).unwrap().clone();
    assert!(content_type.to_str().unwrap().starts_with("text/html"));
    assert_eq!(
        response.headers().get("X-Content-Type-Options").unwrap(),
        "nosniff"
    );

    let html = body_text(response).await;
    assert!(html.contains("joe@x.com"));
    assert!(html.contains("Orange County"));
    assert!(html.contains("Grand total: 12"));
    assert!(html.contains("Reps per person: N/A"));
}

#[tokio::test]
async fn test_feed_for_unknown_user_is_empty() {
    let app = create_test_app();

    let json = body_json(get(&app, "/view?email=nobody@x.com&json=1").await).await;

    assert_eq!(json["user"]["total"], 0);
    assert_eq!(json["user"]["display_name"], "nobody@x.com");
    assert!(json["user"]["records"].as_object().unwrap().is_empty());
    assert_eq!(json["OC"]["person_count"], 40);
}

#[tokio::test]
async fn test_storage_failure_degrades_to_no_data() {
    let app = create_test_app();
    app.store.set_offline(true);

    let response = get(&app, "/view?email=joe@x.com").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("No data"));

    let json = body_json(get(&app, "/view?email=joe@x.com&json=1").await).await;
    assert_eq!(json["user"]["total"], 0);
    assert_eq!(json["OC"]["total"], 0);
}
