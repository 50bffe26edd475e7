// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Parsing of inbound email payloads.
//!
//! Parsing never fails: malformed senders pass through unchanged and a
//! subject with the wrong number of values yields a shape-mismatch
//! sentinel. The validator decides what to reject.

use serde::Deserialize;

use crate::models::ExerciseKinds;

/// One inbound email as posted by the Inbound Parse webhook.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Submission {
    /// Recipient alias the sender used
    #[serde(default)]
    pub to: String,
    /// Raw `From` header
    #[serde(default)]
    pub from: String,
    /// Subject line carrying the rep counts
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub html: Option<String>,
}

/// Subject tokens matched positionally against the configured kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepTokens {
    /// One raw token per configured kind, in kind order
    Positional(Vec<String>),
    /// Token count did not match; every value reads as missing
    ShapeMismatch { expected: usize, found: usize },
}

impl RepTokens {
    /// Value for each kind position; `None` everywhere on a shape mismatch.
    pub fn values(&self, len: usize) -> Vec<Option<&str>> {
        match self {
            RepTokens::Positional(tokens) => tokens.iter().map(|t| Some(t.as_str())).collect(),
            RepTokens::ShapeMismatch { .. } => vec![None; len],
        }
    }

    pub fn is_shape_mismatch(&self) -> bool {
        matches!(self, RepTokens::ShapeMismatch { .. })
    }
}

/// A submission after parsing, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSubmission {
    /// Raw recipient as received
    pub recipient: String,
    /// Normalized sender address
    pub sender: String,
    /// Raw subject as received
    pub subject: String,
    pub tokens: RepTokens,
}

impl Submission {
    pub fn parse(&self, kinds: &ExerciseKinds) -> ParsedSubmission {
        ParsedSubmission {
            recipient: self.to.clone(),
            sender: extract_sender_email(&self.from).to_string(),
            subject: self.subject.clone(),
            tokens: extract_rep_values(&self.subject, kinds),
        }
    }
}

/// Get the address out of a `From` header.
///
/// - `John Smith <smith@example.com>` gives `smith@example.com`
/// - `<smith@example.com>` gives `smith@example.com`
/// - `smith@example.com` is returned as is
///
/// The bracket match is greedy (first `<` to last `>`). If the bracketed
/// text has no `@`, the whole input is returned unchanged.
pub fn extract_sender_email(raw_from: &str) -> &str {
    let bracketed = raw_from.find('<').and_then(|open| {
        let rest = &raw_from[open + 1..];
        rest.rfind('>').map(|close| &rest[..close])
    });

    match bracketed {
        Some(addr) if addr.contains('@') => addr,
        _ => raw_from,
    }
}

/// Split a subject on commas and match the tokens to the kinds.
///
/// Tokens are not trimmed here; `" 20"` stays `" 20"`.
pub fn extract_rep_values(subject: &str, kinds: &ExerciseKinds) -> RepTokens {
    let tokens: Vec<String> = subject.split(',').map(str::to_string).collect();
    if tokens.len() != kinds.len() {
        return RepTokens::ShapeMismatch {
            expected: kinds.len(),
            found: tokens.len(),
        };
    }
    RepTokens::Positional(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_kinds() -> ExerciseKinds {
        ExerciseKinds::new(["situps", "pushups", "pullups"])
    }

    #[test]
    fn test_extract_sender_from_named_header() {
        assert_eq!(extract_sender_email("Name <a@b.com>"), "a@b.com");
        assert_eq!(extract_sender_email("<joe@x.com>"), "joe@x.com");
    }

    #[test]
    fn test_extract_sender_bare_address() {
        assert_eq!(extract_sender_email("a@b.com"), "a@b.com");
    }

    #[test]
    fn test_extract_sender_malformed_passes_through() {
        assert_eq!(extract_sender_email("not-an-email"), "not-an-email");
        assert_eq!(extract_sender_email("Joe <joe at x>"), "Joe <joe at x>");
        assert_eq!(extract_sender_email("Joe <joe@x.com"), "Joe <joe@x.com");
        assert_eq!(extract_sender_email(""), "");
    }

    #[test]
    fn test_extract_sender_greedy_brackets() {
        assert_eq!(extract_sender_email("A <a@b.com> <c@d.com>"), "a@b.com> <c@d.com");
    }

    #[test]
    fn test_extract_rep_values_matches_kinds() {
        let tokens = extract_rep_values("15,20,5", &three_kinds());
        assert_eq!(
            tokens,
            RepTokens::Positional(vec!["15".into(), "20".into(), "5".into()])
        );
    }

    #[test]
    fn test_extract_rep_values_does_not_trim() {
        let tokens = extract_rep_values("15, 20 ,5", &three_kinds());
        assert_eq!(
            tokens.values(3),
            vec![Some("15"), Some(" 20 "), Some("5")]
        );
    }

    #[test]
    fn test_extract_rep_values_shape_mismatch() {
        let tokens = extract_rep_values("15,20,5", &ExerciseKinds::default());
        assert_eq!(
            tokens,
            RepTokens::ShapeMismatch {
                expected: 4,
                found: 3
            }
        );
        assert_eq!(tokens.values(4), vec![None, None, None, None]);
    }

    #[test]
    fn test_parse_submission() {
        let submission = Submission {
            to: "pullups-pushups-airsquats-situps@x".to_string(),
            from: "Joe <joe@x.com>".to_string(),
            subject: "10,20,30,40".to_string(),
            ..Default::default()
        };

        let parsed = submission.parse(&ExerciseKinds::default());

        assert_eq!(parsed.sender, "joe@x.com");
        assert!(!parsed.tokens.is_shape_mismatch());
    }
}
