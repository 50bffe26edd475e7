// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Submission ingestion.
//!
//! Handles the core workflow for one inbound email:
//! 1. Parse sender and subject tokens
//! 2. Validate recipient and values (or recognise an office assignment)
//! 3. Persist rep records or the office assignment
//! 4. Notify the sender
//!
//! Nothing here returns an error: every failure ends in an outcome that the
//! webhook acknowledges with 200 so the upstream parser does not retry.

use chrono::{DateTime, Utc};

use crate::config::Config;
use crate::db::{get_or_create_user, RepStore, StoreError};
use crate::models::stats::average_per_day;
use crate::services::notices::{
    rejection_notice, success_notice, unexpected_error_notice, SuccessSummary,
};
use crate::services::notify::{deliver, Notifier};
use crate::services::report::{days_elapsed, office_stats, ReportService};
use crate::services::submission::{ParsedSubmission, Submission};
use crate::services::validator::{RejectReason, RepEntry, SubmissionValidator, Verdict};

/// What happened to a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    Recorded { user_id: String, entries: Vec<RepEntry> },
    OfficeSet { user_id: String, office: String },
    Rejected(RejectReason),
    /// Submission was valid but storage failed
    StorageFailed,
}

/// Runs submissions through parse, validate, persist and notify.
pub struct IngestService<'a> {
    config: &'a Config,
    store: &'a dyn RepStore,
    notifier: &'a dyn Notifier,
}

impl<'a> IngestService<'a> {
    pub fn new(config: &'a Config, store: &'a dyn RepStore, notifier: &'a dyn Notifier) -> Self {
        Self {
            config,
            store,
            notifier,
        }
    }

    /// Ingest one submission received at `now`.
    pub async fn ingest(&self, submission: &Submission, now: DateTime<Utc>) -> IngestOutcome {
        let parsed = submission.parse(&self.config.ingest.kinds);
        let verdict =
            SubmissionValidator::new(&self.config.ingest, &self.config.offices).validate(&parsed);

        match verdict {
            Verdict::Rejected(reason) => {
                self.reject(&parsed, reason, now).await;
                IngestOutcome::Rejected(reason)
            }
            Verdict::SetOffice(office) => match self.assign_office(&parsed.sender, &office).await {
                Ok(user_id) => IngestOutcome::OfficeSet { user_id, office },
                Err(e) => self.storage_failed(&parsed, e).await,
            },
            Verdict::Valid(entries) => match self.record(&parsed.sender, &entries, now).await {
                Ok(user_id) => {
                    if self.config.success_emails {
                        self.send_summary(&parsed.sender, &user_id, now).await;
                    }
                    IngestOutcome::Recorded { user_id, entries }
                }
                Err(e) => self.storage_failed(&parsed, e).await,
            },
        }
    }

    async fn reject(&self, parsed: &ParsedSubmission, reason: RejectReason, now: DateTime<Utc>) {
        let event = match reason {
            RejectReason::WrongAddress => "rejected",
            RejectReason::NonNumericValue => "bad_parse",
        };
        tracing::warn!(
            event,
            reason = %reason,
            sender = %parsed.sender,
            recipient = %parsed.recipient,
            subject = %parsed.subject,
            "Rejected submission"
        );

        let notice = rejection_notice(
            self.config,
            &parsed.sender,
            &parsed.recipient,
            &parsed.subject,
            reason,
            now,
        );
        deliver(self.notifier, notice).await;
    }

    async fn assign_office(&self, sender: &str, office: &str) -> Result<String, StoreError> {
        let user_id = get_or_create_user(self.store, sender).await?;
        self.store.set_office(&user_id, office).await?;
        tracing::info!(event = "office_set", user_id = %user_id, office, "Office assigned");
        Ok(user_id)
    }

    /// Append every entry with one shared timestamp.
    async fn record(
        &self,
        sender: &str,
        entries: &[RepEntry],
        now: DateTime<Utc>,
    ) -> Result<String, StoreError> {
        let user_id = get_or_create_user(self.store, sender).await?;
        for entry in entries {
            self.store
                .append_rep(&user_id, &entry.exercise, entry.count, now)
                .await?;
        }
        tracing::info!(
            event = "reps_recorded",
            user_id = %user_id,
            entries = entries.len(),
            total = entries.iter().fold(0u64, |t, e| t.saturating_add(e.count)),
            "Reps recorded"
        );
        Ok(user_id)
    }

    async fn storage_failed(&self, parsed: &ParsedSubmission, error: StoreError) -> IngestOutcome {
        tracing::error!(
            error = %error,
            sender = %parsed.sender,
            subject = %parsed.subject,
            "Failed to store submission"
        );
        deliver(
            self.notifier,
            unexpected_error_notice(&parsed.sender, &error.to_string()),
        )
        .await;
        IngestOutcome::StorageFailed
    }

    /// Success email with the sender's running total and office standings.
    ///
    /// The reps are already stored, so a failed read only skips the email.
    async fn send_summary(&self, sender: &str, user_id: &str, now: DateTime<Utc>) {
        let today = now.date_naive();
        let window = self.config.report_window(today);

        let loaded = async {
            let records = self.store.fetch_records_by_user(user_id, Some(window)).await?;
            let office = self.store.user_office(user_id).await?;
            Ok::<_, StoreError>((records, office))
        }
        .await;

        let (records, office) = match loaded {
            Ok(loaded) => loaded,
            Err(e) => {
                tracing::warn!(user_id, error = %e, "Skipping success notice");
                return;
            }
        };

        let total = records.iter().fold(0u64, |t, r| t.saturating_add(r.count));
        let sections = ReportService::new(self.config, self.store)
            .office_sections(today)
            .await;
        let stats = office_stats(&sections);

        let notice = success_notice(
            self.config,
            &SuccessSummary {
                sender,
                office: office.as_deref(),
                total,
                average_per_day: average_per_day(total, days_elapsed(window, today)),
                office_stats: &stats,
            },
        );
        deliver(self.notifier, notice).await;
    }
}
