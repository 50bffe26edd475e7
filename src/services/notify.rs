// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Outbound email notices.
//!
//! Delivery is one-way: callers hand a notice to [`deliver`] and move on.
//! A failed delivery is visible only in the logs.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Mutex;

/// An email to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub to: String,
    /// Copied recipients
    pub cc: Vec<String>,
    pub subject: String,
    /// HTML body
    pub html: String,
}

/// Notification delivery errors.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Notice has no recipient")]
    NoRecipient,

    #[error("Mail request failed: {0}")]
    Request(String),

    #[error("Unexpected status from mail API: {status} - {body}")]
    Status { status: u16, body: String },
}

/// Sends notices through some outbound channel.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notice: &Notice) -> Result<(), NotifyError>;
}

/// Send a notice and log, rather than return, any failure.
pub async fn deliver(notifier: &dyn Notifier, notice: Notice) {
    match notifier.send(&notice).await {
        Ok(()) => tracing::debug!(to = %notice.to, subject = %notice.subject, "Notice sent"),
        Err(e) => tracing::warn!(
            event = "notify_failed",
            to = %notice.to,
            subject = %notice.subject,
            error = %e,
            "Failed to send notice"
        ),
    }
}

// ─── SendGrid ────────────────────────────────────────────────

const SENDGRID_BASE_URL: &str = "https://api.sendgrid.com";
const FROM_NAME: &str = "CountMyReps";

/// SendGrid v3 mail API client.
#[derive(Clone)]
pub struct SendGridNotifier {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    from: String,
}

#[derive(Serialize)]
struct MailAddress<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Serialize)]
struct Personalization<'a> {
    to: Vec<MailAddress<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    cc: Vec<MailAddress<'a>>,
}

#[derive(Serialize)]
struct MailContent<'a> {
    #[serde(rename = "type")]
    content_type: &'a str,
    value: &'a str,
}

#[derive(Serialize)]
struct MailRequest<'a> {
    personalizations: Vec<Personalization<'a>>,
    from: MailAddress<'a>,
    subject: &'a str,
    content: Vec<MailContent<'a>>,
}

impl SendGridNotifier {
    pub fn new(api_key: String, from: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: SENDGRID_BASE_URL.to_string(),
            api_key,
            from,
        }
    }

    /// Point the client at another host (tests, proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn request_body<'a>(&'a self, notice: &'a Notice) -> MailRequest<'a> {
        MailRequest {
            personalizations: vec![Personalization {
                to: vec![MailAddress {
                    email: &notice.to,
                    name: Some(display_name(&notice.to)),
                }],
                cc: notice
                    .cc
                    .iter()
                    .map(|email| MailAddress {
                        email: email.as_str(),
                        name: None,
                    })
                    .collect(),
            }],
            from: MailAddress {
                email: &self.from,
                name: Some(FROM_NAME),
            },
            subject: &notice.subject,
            content: vec![MailContent {
                content_type: "text/html",
                value: &notice.html,
            }],
        }
    }
}

#[async_trait]
impl Notifier for SendGridNotifier {
    async fn send(&self, notice: &Notice) -> Result<(), NotifyError> {
        if notice.to.trim().is_empty() {
            return Err(NotifyError::NoRecipient);
        }

        let url = format!("{}/v3/mail/send", self.base_url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(notice))
            .send()
            .await
            .map_err(|e| NotifyError::Request(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(NotifyError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

/// Greeting name from an address: `first.last@x.com` gives `first`.
fn display_name(email: &str) -> &str {
    let local = email.split('@').next().unwrap_or(email);
    local.split('.').next().unwrap_or(local)
}

// ─── Local implementations ───────────────────────────────────

/// Drops notices; used when outbound mail is switched off.
#[derive(Default)]
pub struct DisabledNotifier;

#[async_trait]
impl Notifier for DisabledNotifier {
    async fn send(&self, notice: &Notice) -> Result<(), NotifyError> {
        tracing::debug!(to = %notice.to, subject = %notice.subject, "Notifications disabled; dropping notice");
        Ok(())
    }
}

/// Records every notice it is asked to send. Can be told to fail.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notice>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// A notifier that records each attempt and then fails it.
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    /// Every attempted notice, in order.
    pub fn sent(&self) -> Vec<Notice> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, notice: &Notice) -> Result<(), NotifyError> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(notice.clone());
        }
        if self.fail {
            return Err(NotifyError::Request("recording notifier set to fail".to_string()));
        }
        Ok(())
    }
}
