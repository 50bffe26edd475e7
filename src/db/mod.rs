//! Storage layer: the `RepStore` contract and its implementations.

pub mod firestore;
pub mod memory;

pub use self::firestore::FirestoreDb;
pub use self::memory::MemoryStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{RepRecord, RepWindow};

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const REPS: &str = "reps";
}

/// Failure from the storage collaborator.
///
/// Always distinct from a validation rejection: a submission that fails here
/// was valid.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Storage query failed: {0}")]
    Query(String),

    #[error("Unknown user: {0}")]
    UnknownUser(String),
}

/// Operations the ingestion and report pipelines need from storage.
///
/// Every call may fail; callers decide how to degrade.
#[async_trait]
pub trait RepStore: Send + Sync {
    /// Look up a user's ID by exact email.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<String>, StoreError>;

    /// Create a user and return its ID.
    async fn create_user(&self, email: &str) -> Result<String, StoreError>;

    /// Append one rep record.
    async fn append_rep(
        &self,
        user_id: &str,
        exercise: &str,
        count: u64,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Assign a user to an office.
    async fn set_office(&self, user_id: &str, office: &str) -> Result<(), StoreError>;

    /// The user's office, if one was assigned.
    async fn user_office(&self, user_id: &str) -> Result<Option<String>, StoreError>;

    /// A user's records, oldest first.
    async fn fetch_records_by_user(
        &self,
        user_id: &str,
        window: Option<RepWindow>,
    ) -> Result<Vec<RepRecord>, StoreError>;

    /// Records of every user assigned to the office, oldest first.
    async fn fetch_records_by_office(
        &self,
        office: &str,
        window: Option<RepWindow>,
    ) -> Result<Vec<RepRecord>, StoreError>;

    /// Number of users assigned to the office.
    async fn count_users_in_office(&self, office: &str) -> Result<u64, StoreError>;
}

/// Find a user by email, creating one if absent.
pub async fn get_or_create_user(store: &dyn RepStore, email: &str) -> Result<String, StoreError> {
    if let Some(id) = store.find_user_by_email(email).await? {
        return Ok(id);
    }
    let id = store.create_user(email).await?;
    tracing::info!(event = "new_user", email, user_id = %id, "Created user");
    Ok(id)
}
