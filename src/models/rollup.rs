// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Date-keyed rollups of rep records.
//!
//! Records are folded into `date key -> exercise -> sum`. Past days use a
//! `YYYY-MM-DD` key; records from today keep their full timestamp so the
//! report shows each of today's submissions on its own row.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::models::{ExerciseKinds, RepRecord};
use crate::time_utils::{DAY_FORMAT, TIMESTAMP_FORMAT};

/// Per-kind sums for one date key.
pub type KindTotals = BTreeMap<String, u64>;

/// Records folded by date key, then by exercise kind.
///
/// Serializes as a plain `{date_key: {kind: sum}}` object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Rollup {
    buckets: BTreeMap<String, KindTotals>,
}

/// Bucket key for a record timestamp.
pub fn date_key(at: DateTime<Utc>, today: NaiveDate) -> String {
    if at.date_naive() == today {
        at.format(TIMESTAMP_FORMAT).to_string()
    } else {
        at.format(DAY_FORMAT).to_string()
    }
}

/// Fold records into a rollup. Kinds with no records for a key are absent.
pub fn rollup_by_date(records: &[RepRecord], today: NaiveDate) -> Rollup {
    let mut rollup = Rollup::default();
    for record in records {
        rollup.add(date_key(record.created_at, today), &record.exercise, record.count);
    }
    rollup
}

/// Sum of every per-kind sum in the rollup.
pub fn grand_total(rollup: &Rollup) -> u64 {
    rollup.grand_total()
}

impl Rollup {
    fn add(&mut self, key: String, exercise: &str, count: u64) {
        let slot = self
            .buckets
            .entry(key)
            .or_default()
            .entry(exercise.to_string())
            .or_insert(0);
        *slot = slot.saturating_add(count);
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn get(&self, key: &str) -> Option<&KindTotals> {
        self.buckets.get(key)
    }

    /// Date keys in ascending order with their per-kind sums.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &KindTotals)> {
        self.buckets.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn grand_total(&self) -> u64 {
        self.buckets
            .values()
            .flat_map(|kinds| kinds.values())
            .fold(0u64, |total, count| total.saturating_add(*count))
    }

    /// Sum per exercise kind across all date keys.
    pub fn totals_by_kind(&self) -> KindTotals {
        let mut totals = KindTotals::new();
        for kinds in self.buckets.values() {
            for (kind, count) in kinds {
                let total = totals.entry(kind.clone()).or_insert(0);
                *total = total.saturating_add(*count);
            }
        }
        totals
    }

    /// Dense view for rendering: every day from `from` through `to` gets a
    /// row, and every row gets a zero for each missing kind.
    ///
    /// A day already covered by timestamp keys (today) gets no extra row.
    pub fn seed_calendar(&mut self, from: NaiveDate, to: NaiveDate, kinds: &ExerciseKinds) {
        for day in from.iter_days().take_while(|d| *d <= to) {
            let day_key = day.format(DAY_FORMAT).to_string();
            let covered = self
                .buckets
                .range(day_key.clone()..)
                .next()
                .is_some_and(|(k, _)| k.starts_with(&day_key));
            if !covered {
                self.buckets.insert(day_key, KindTotals::new());
            }
        }

        for totals in self.buckets.values_mut() {
            for kind in kinds.iter() {
                totals.entry(kind.to_string()).or_insert(0);
            }
        }
    }
}
