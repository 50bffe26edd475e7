// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod ingest;
pub mod notices;
pub mod notify;
pub mod report;
pub mod submission;
pub mod validator;

pub use ingest::{IngestOutcome, IngestService};
pub use notify::{
    DisabledNotifier, Notice, Notifier, NotifyError, RecordingNotifier, SendGridNotifier,
};
pub use report::{Report, ReportService};
pub use submission::{ParsedSubmission, Submission};
pub use validator::{RejectReason, SubmissionValidator, Verdict};
