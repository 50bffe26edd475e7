//! User and office models for storage and reporting.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User profile stored in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Document ID (URL-encoded email)
    pub id: String,
    /// Email address exactly as submitted
    pub email: String,
    /// Office name, once the user has assigned one
    #[serde(default)]
    pub office: Option<String>,
    /// When the first valid submission arrived
    pub created_at: DateTime<Utc>,
}

/// An office from the configured roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Office {
    /// Short name used in subjects and storage ("OC")
    pub name: String,
    /// Name shown in reports ("Orange County")
    pub display_name: String,
    /// Roster size; not derived from records
    pub headcount: u64,
}

/// Find an office whose name matches `subject` ignoring case and
/// surrounding whitespace.
pub fn match_office<'a>(subject: &str, offices: &'a [Office]) -> Option<&'a Office> {
    let wanted = subject.trim().to_lowercase();
    if wanted.is_empty() {
        return None;
    }
    offices.iter().find(|o| o.name.to_lowercase() == wanted)
}
