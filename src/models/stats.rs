//! Participation and per-person statistics derived from rollup totals.
//!
//! Everything here is a pure function of already-aggregated numbers.
//! Divisions by a zero headcount yield the `0` sentinel instead of faulting.

use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

use crate::models::{Office, RepRecord};

/// A displayed statistic: a number, or "N/A" for the requesting user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatValue {
    Value(u64),
    NotApplicable,
}

impl StatValue {
    pub fn value(self) -> Option<u64> {
        match self {
            StatValue::Value(v) => Some(v),
            StatValue::NotApplicable => None,
        }
    }
}

impl fmt::Display for StatValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatValue::Value(v) => write!(f, "{}", v),
            StatValue::NotApplicable => f.write_str("N/A"),
        }
    }
}

impl Serialize for StatValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            StatValue::Value(v) => serializer.serialize_u64(*v),
            StatValue::NotApplicable => serializer.serialize_str("N/A"),
        }
    }
}

/// Participants versus roster size for one office.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OfficeParticipation {
    /// Distinct users with at least one record in the window
    pub participating: u64,
    /// Configured roster size
    pub headcount: u64,
}

/// Count distinct users among the records.
pub fn participation(records: &[RepRecord]) -> u64 {
    let users: HashSet<&str> = records.iter().map(|r| r.user_id.as_str()).collect();
    users.len() as u64
}

/// Participation for an office, with the headcount taken from the roster.
pub fn per_office_participation(records: &[RepRecord], office: &Office) -> OfficeParticipation {
    OfficeParticipation {
        participating: participation(records),
        headcount: office.headcount,
    }
}

/// Integer division that yields 0 for a zero divisor.
pub fn guarded_div(numerator: u64, denominator: u64) -> u64 {
    numerator.checked_div(denominator).unwrap_or(0)
}

/// `round(100 * part / whole)`, or 0 when `whole` is 0.
pub fn percent(part: u64, whole: u64) -> u64 {
    guarded_div(
        part.saturating_mul(200).saturating_add(whole),
        whole.saturating_mul(2),
    )
}

/// Average per day over `days`, treating fewer than one day as one.
pub fn average_per_day(total: u64, days: u64) -> u64 {
    total / days.max(1)
}

/// Display statistics for a user or an office.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EntityStats {
    pub grand_total: u64,
    pub reps_per_person: StatValue,
    pub reps_per_person_participating: StatValue,
    pub reps_per_person_per_day: StatValue,
    pub percent_participating: StatValue,
}

impl EntityStats {
    /// Stats for an office. `day_of_month` is the current day (1-based).
    pub fn for_office(grand_total: u64, participation: OfficeParticipation, day_of_month: u32) -> Self {
        let per_person = guarded_div(grand_total, participation.headcount);
        Self {
            grand_total,
            reps_per_person: StatValue::Value(per_person),
            reps_per_person_participating: StatValue::Value(
                grand_total / participation.participating.max(1),
            ),
            reps_per_person_per_day: StatValue::Value(guarded_div(
                per_person,
                u64::from(day_of_month),
            )),
            percent_participating: StatValue::Value(percent(
                participation.participating,
                participation.headcount,
            )),
        }
    }

    /// Stats for the requesting user: headcount does not apply to one person.
    pub fn for_requesting_user(grand_total: u64) -> Self {
        Self {
            grand_total,
            reps_per_person: StatValue::NotApplicable,
            reps_per_person_participating: StatValue::NotApplicable,
            reps_per_person_per_day: StatValue::NotApplicable,
            percent_participating: StatValue::NotApplicable,
        }
    }
}

/// Office with the most reps per person per day.
///
/// Ties go to the name that sorts first.
pub fn lead_office(stats: &BTreeMap<String, EntityStats>) -> Option<&str> {
    let mut lead: Option<(&str, u64)> = None;
    for (name, s) in stats {
        let per_day = s.reps_per_person_per_day.value().unwrap_or(0);
        match lead {
            Some((_, best)) if per_day <= best => {}
            _ => lead = Some((name.as_str(), per_day)),
        }
    }
    lead.map(|(name, _)| name)
}
