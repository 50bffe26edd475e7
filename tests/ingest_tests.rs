// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! End-to-end tests for the ingestion webhook.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use countmyreps::config::Config;
use countmyreps::db::RepStore;
use countmyreps::services::RecordingNotifier;
use tower::ServiceExt;

mod common;
use common::{body_json, create_test_app, create_test_app_with, get, post_form};

const ADDRESS: &str = "pullups-pushups-airsquats-situps@countmyreps.com";

#[tokio::test]
async fn test_valid_submission_is_reported() {
    let app = create_test_app();

    let response = post_form(
        &app,
        "/ingest",
        &[("to", ADDRESS), ("from", "<joe@x.com>"), ("subject", "10,20,30,40")],
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let user_id = app
        .store
        .find_user_by_email("joe@x.com")
        .await
        .unwrap()
        .expect("user should be created");
    let records = app.store.fetch_records_by_user(&user_id, None).await.unwrap();
    let mut counts: Vec<(String, u64)> = records
        .iter()
        .map(|r| (r.exercise.clone(), r.count))
        .collect();
    counts.sort();
    assert_eq!(
        counts,
        vec![
            ("airsquats".to_string(), 30),
            ("pullups".to_string(), 10),
            ("pushups".to_string(), 20),
            ("situps".to_string(), 40),
        ]
    );

    let feed = body_json(get(&app, "/view?email=joe@x.com&json=1").await).await;
    assert_eq!(feed["user"]["total"], 100);
    assert_eq!(feed["user"]["totals"]["pushups"], 20);
}

#[tokio::test]
async fn test_wrong_recipient_stores_nothing_and_notifies_once() {
    let app = create_test_app();

    let response = post_form(
        &app,
        "/ingest",
        &[
            ("to", "someone@countmyreps.com"),
            ("from", "<joe@x.com>"),
            ("subject", "10,20,30,40"),
        ],
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.store.rep_count(), 0);

    let sent = app.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "joe@x.com");
    assert!(sent[0].html.contains("someone@countmyreps.com"));
}

#[tokio::test]
async fn test_non_numeric_subject_is_rejected() {
    let app = create_test_app();

    let response = post_form(
        &app,
        "/ingest",
        &[("to", ADDRESS), ("from", "joe@x.com"), ("subject", "10,abc,30,40")],
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.store.rep_count(), 0);
    assert_eq!(app.notifier.sent().len(), 1);
}

#[tokio::test]
async fn test_out_of_range_counts_are_rejected() {
    let app = create_test_app();
    post_form(
        &app,
        "/ingest",
        &[("to", ADDRESS), ("from", "joe@x.com"), ("subject", "1,2,3,4")],
    )
    .await;

    for subject in ["1e30,1e30,0,0", "99999999999999999999,0,0,0"] {
        let response = post_form(
            &app,
            "/ingest",
            &[("to", ADDRESS), ("from", "joe@x.com"), ("subject", subject)],
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    assert_eq!(app.store.rep_count(), 4);
    let sent = app.notifier.sent();
    assert_eq!(sent.len(), 3);
    assert!(sent[1..]
        .iter()
        .all(|n| n.subject.contains("non_numeric_value")));

    let feed = body_json(get(&app, "/view?email=joe@x.com&json=1").await).await;
    assert_eq!(feed["user"]["total"], 10);
    let response = get(&app, "/view?email=joe@x.com").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_storage_failure_still_returns_ok() {
    let app = create_test_app();
    app.store.set_offline(true);

    let response = post_form(
        &app,
        "/ingest",
        &[("to", ADDRESS), ("from", "joe@x.com"), ("subject", "10,20,30,40")],
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    app.store.set_offline(false);
    assert_eq!(app.store.rep_count(), 0);

    let sent = app.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].html.contains("unexpected error"));
}

#[tokio::test]
async fn test_notification_failure_still_returns_ok() {
    let app = create_test_app_with(Config::test_default(), RecordingNotifier::failing());

    let response = post_form(
        &app,
        "/ingest",
        &[("to", ADDRESS), ("from", "joe@x.com"), ("subject", "1,2,3,4")],
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.store.rep_count(), 4);
}

#[tokio::test]
async fn test_malformed_payload_returns_ok() {
    let app = create_test_app();

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/ingest")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{\"subject\": 1}"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.store.rep_count(), 0);
    assert!(app.notifier.sent().is_empty());
}

#[tokio::test]
async fn test_legacy_path_and_alias_address() {
    let app = create_test_app();

    let response = post_form(
        &app,
        "/parseapi/index.php",
        &[
            ("to", "CountMyReps <pullups-pushups-squats-situps@countmyreps.com>"),
            ("from", "Ann Smith <ann@x.com>"),
            ("subject", "1, 2, 3, 4"),
            ("text", "sent from my phone"),
        ],
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.store.rep_count(), 4);
    assert!(app.store.find_user_by_email("ann@x.com").await.unwrap().is_some());
}

#[tokio::test]
async fn test_office_assignment_flows_into_office_report() {
    let app = create_test_app();

    post_form(
        &app,
        "/ingest",
        &[("to", ADDRESS), ("from", "joe@x.com"), ("subject", "oc")],
    )
    .await;
    assert_eq!(app.store.rep_count(), 0);

    post_form(
        &app,
        "/ingest",
        &[("to", ADDRESS), ("from", "joe@x.com"), ("subject", "10,20,30,40")],
    )
    .await;

    let feed = body_json(get(&app, "/view?email=joe@x.com&json=1").await).await;
    assert_eq!(feed["OC"]["total"], 100);
    assert_eq!(feed["OC"]["display_name"], "Orange County");
    assert_eq!(feed["Denver"]["total"], 0);

    let last = app.notifier.sent().pop().unwrap();
    assert!(last.html.contains("for the OC team"));
}

#[tokio::test]
async fn test_repeated_submission_appends_duplicates() {
    let app = create_test_app();
    let fields = [("to", ADDRESS), ("from", "joe@x.com"), ("subject", "1,1,1,1")];

    post_form(&app, "/ingest", &fields).await;
    post_form(&app, "/ingest", &fields).await;

    assert_eq!(app.store.rep_count(), 8);
}
