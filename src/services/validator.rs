// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Validation of parsed submissions.
//!
//! Checks run in order and stop at the first failure:
//! 1. recipient must be an accepted ingestion address
//! 2. an office name as the subject assigns the sender's office
//! 3. every configured kind must have a numeric value

use std::fmt;

use crate::config::{IngestConfig, RecipientMatch};
use crate::models::user::match_office;
use crate::models::Office;
use crate::services::submission::{extract_sender_email, ParsedSubmission};

/// Why a submission was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    WrongAddress,
    NonNumericValue,
}

impl RejectReason {
    pub fn as_str(self) -> &'static str {
        match self {
            RejectReason::WrongAddress => "wrong_address",
            RejectReason::NonNumericValue => "non_numeric_value",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One validated (kind, count) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepEntry {
    pub exercise: String,
    pub count: u64,
}

/// Outcome of validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Rep counts to append, one per configured kind
    Valid(Vec<RepEntry>),
    /// Subject named an office; value is the roster's spelling
    SetOffice(String),
    Rejected(RejectReason),
}

/// Validates parsed submissions against the ingestion config and roster.
pub struct SubmissionValidator<'a> {
    ingest: &'a IngestConfig,
    offices: &'a [Office],
}

impl<'a> SubmissionValidator<'a> {
    pub fn new(ingest: &'a IngestConfig, offices: &'a [Office]) -> Self {
        Self { ingest, offices }
    }

    pub fn validate(&self, parsed: &ParsedSubmission) -> Verdict {
        if !self.recipient_accepted(&parsed.recipient) {
            return Verdict::Rejected(RejectReason::WrongAddress);
        }

        if self.ingest.office_assignment {
            if let Some(office) = match_office(&parsed.subject, self.offices) {
                return Verdict::SetOffice(office.name.clone());
            }
        }

        let kinds = &self.ingest.kinds;
        let mut entries = Vec::with_capacity(kinds.len());
        for (kind, value) in kinds.iter().zip(parsed.tokens.values(kinds.len())) {
            match value.and_then(parse_count) {
                Some(count) => entries.push(RepEntry {
                    exercise: kind.to_string(),
                    count,
                }),
                None => return Verdict::Rejected(RejectReason::NonNumericValue),
            }
        }
        Verdict::Valid(entries)
    }

    /// True if the recipient is the ingestion address or a legacy alias.
    pub fn recipient_accepted(&self, recipient: &str) -> bool {
        let recipient = extract_sender_email(recipient).trim();
        if recipient.is_empty() {
            return false;
        }
        let lowered = recipient.to_lowercase();
        self.ingest
            .accepted_addresses()
            .any(|accepted| match self.ingest.recipient_match {
                RecipientMatch::Exact => recipient.eq_ignore_ascii_case(accepted),
                RecipientMatch::Contains => lowered.contains(&accepted.to_lowercase()),
            })
    }
}

/// Largest count accepted for one kind in one submission.
pub const MAX_COUNT: u64 = 100_000;

/// Interpret one subject token as a rep count.
///
/// Surrounding whitespace is ignored. Integers and finite decimals are
/// numeric; decimals truncate toward zero and negatives count as their
/// absolute value so nobody can subtract from a total. Anything above
/// [`MAX_COUNT`] is not a count.
pub fn parse_count(token: &str) -> Option<u64> {
    let token = token.trim();
    let count = match token.parse::<i64>() {
        Ok(n) => n.unsigned_abs(),
        Err(_) => match token.parse::<f64>() {
            Ok(n) if n.is_finite() && n.abs() <= MAX_COUNT as f64 => n.abs().trunc() as u64,
            _ => return None,
        },
    };
    (count <= MAX_COUNT).then_some(count)
}
