// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Rep records and the configured exercise kinds.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// A single persisted rep count.
///
/// Stored in the `reps` collection. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepRecord {
    /// Owning user's document ID
    pub user_id: String,
    /// Exercise kind tag (e.g. "pullups")
    pub exercise: String,
    /// Rep count, never negative
    pub count: u64,
    /// When the submission was received
    pub created_at: DateTime<Utc>,
}

/// Ordered list of exercise kinds accepted from subject-line tokens.
///
/// Token `i` of a subject maps to kind `i`. Senders were told this order,
/// so changing it breaks every existing sender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExerciseKinds(Vec<String>);

impl ExerciseKinds {
    pub fn new<I, S>(kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(kinds.into_iter().map(Into::into).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// The ingestion address derived from the kinds, e.g.
    /// `pullups-pushups-airsquats-situps@countmyreps.com`.
    pub fn default_address(&self, domain: &str) -> String {
        format!("{}@{}", self.0.join("-"), domain)
    }
}

impl Default for ExerciseKinds {
    fn default() -> Self {
        Self::new(["pullups", "pushups", "airsquats", "situps"])
    }
}

/// Inclusive range of calendar days used to bound report queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl RepWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// True if the timestamp falls on any day from `start` through `end`.
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start_instant() && at < self.end_instant()
    }

    fn start_instant(&self) -> DateTime<Utc> {
        self.start.and_time(NaiveTime::MIN).and_utc()
    }

    fn end_instant(&self) -> DateTime<Utc> {
        self.end.and_time(NaiveTime::MIN).and_utc() + Duration::days(1)
    }
}

/// Apply an optional window to fetched records and order them by time.
pub fn select_window(mut records: Vec<RepRecord>, window: Option<RepWindow>) -> Vec<RepRecord> {
    if let Some(window) = window {
        records.retain(|r| window.contains(r.created_at));
    }
    records.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(at: DateTime<Utc>) -> RepRecord {
        RepRecord {
            user_id: "u1".to_string(),
            exercise: "pushups".to_string(),
            count: 1,
            created_at: at,
        }
    }

    #[test]
    fn test_default_address() {
        assert_eq!(
            ExerciseKinds::default().default_address("countmyreps.com"),
            "pullups-pushups-airsquats-situps@countmyreps.com"
        );
    }

    #[test]
    fn test_window_includes_whole_end_day() {
        let window = RepWindow::new(
            NaiveDate::from_ymd_opt(2025, 10, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 10, 31).unwrap(),
        );
        assert!(window.contains(Utc.with_ymd_and_hms(2025, 10, 1, 0, 0, 0).unwrap()));
        assert!(window.contains(Utc.with_ymd_and_hms(2025, 10, 31, 23, 59, 59).unwrap()));
        assert!(!window.contains(Utc.with_ymd_and_hms(2025, 11, 1, 0, 0, 0).unwrap()));
        assert!(!window.contains(Utc.with_ymd_and_hms(2025, 9, 30, 23, 59, 59).unwrap()));
    }

    #[test]
    fn test_select_window_sorts_and_filters() {
        let late = Utc.with_ymd_and_hms(2025, 10, 5, 12, 0, 0).unwrap();
        let early = Utc.with_ymd_and_hms(2025, 10, 2, 12, 0, 0).unwrap();
        let outside = Utc.with_ymd_and_hms(2025, 11, 2, 12, 0, 0).unwrap();
        let window = RepWindow::new(
            NaiveDate::from_ymd_opt(2025, 10, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 10, 31).unwrap(),
        );

        let selected = select_window(
            vec![record(late), record(outside), record(early)],
            Some(window),
        );

        let times: Vec<_> = selected.iter().map(|r| r.created_at).collect();
        assert_eq!(times, vec![early, late]);
    }
}
