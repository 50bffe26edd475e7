//! In-process `RepStore` for local development and tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::RwLock;

use crate::db::{RepStore, StoreError};
use crate::models::rep::select_window;
use crate::models::{RepRecord, RepWindow, User};

/// Store backed by process memory. Data is lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    /// Users keyed by email
    users: DashMap<String, User>,
    reps: RwLock<Vec<RepRecord>>,
    next_id: AtomicU64,
    /// Fail every call (test builds use this to exercise degraded paths)
    offline: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with `StoreError::Unavailable`.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of stored rep records.
    pub fn rep_count(&self) -> usize {
        self.reps.read().map(|r| r.len()).unwrap_or(0)
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "memory store is offline".to_string(),
            ));
        }
        Ok(())
    }

    fn find_by_id(&self, user_id: &str) -> Option<User> {
        self.users
            .iter()
            .find(|u| u.id == user_id)
            .map(|u| u.value().clone())
    }

    fn all_reps(&self) -> Result<Vec<RepRecord>, StoreError> {
        self.reps
            .read()
            .map(|r| r.clone())
            .map_err(|_| StoreError::Query("rep list lock poisoned".to_string()))
    }
}

#[async_trait]
impl RepStore for MemoryStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<String>, StoreError> {
        self.check_online()?;
        Ok(self.users.get(email).map(|u| u.id.clone()))
    }

    async fn create_user(&self, email: &str) -> Result<String, StoreError> {
        self.check_online()?;
        let user = self.users.entry(email.to_string()).or_insert_with(|| User {
            id: format!("user-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1),
            email: email.to_string(),
            office: None,
            created_at: Utc::now(),
        });
        Ok(user.id.clone())
    }

    async fn append_rep(
        &self,
        user_id: &str,
        exercise: &str,
        count: u64,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.check_online()?;
        self.reps
            .write()
            .map_err(|_| StoreError::Query("rep list lock poisoned".to_string()))?
            .push(RepRecord {
                user_id: user_id.to_string(),
                exercise: exercise.to_string(),
                count,
                created_at: at,
            });
        Ok(())
    }

    async fn set_office(&self, user_id: &str, office: &str) -> Result<(), StoreError> {
        self.check_online()?;
        let mut user = self
            .users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or_else(|| StoreError::UnknownUser(user_id.to_string()))?;
        user.office = Some(office.to_string());
        Ok(())
    }

    async fn user_office(&self, user_id: &str) -> Result<Option<String>, StoreError> {
        self.check_online()?;
        Ok(self.find_by_id(user_id).and_then(|u| u.office))
    }

    async fn fetch_records_by_user(
        &self,
        user_id: &str,
        window: Option<RepWindow>,
    ) -> Result<Vec<RepRecord>, StoreError> {
        self.check_online()?;
        let mut records = self.all_reps()?;
        records.retain(|r| r.user_id == user_id);
        Ok(select_window(records, window))
    }

    async fn fetch_records_by_office(
        &self,
        office: &str,
        window: Option<RepWindow>,
    ) -> Result<Vec<RepRecord>, StoreError> {
        self.check_online()?;
        let members: Vec<String> = self
            .users
            .iter()
            .filter(|u| u.office.as_deref() == Some(office))
            .map(|u| u.id.clone())
            .collect();
        let mut records = self.all_reps()?;
        records.retain(|r| members.contains(&r.user_id));
        Ok(select_window(records, window))
    }

    async fn count_users_in_office(&self, office: &str) -> Result<u64, StoreError> {
        self.check_online()?;
        Ok(self
            .users
            .iter()
            .filter(|u| u.office.as_deref() == Some(office))
            .count() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::get_or_create_user;
    use chrono::TimeZone;

    #[tokio::test]
    async fn test_get_or_create_user_is_stable() {
        let store = MemoryStore::new();

        let first = get_or_create_user(&store, "joe@x.com").await.unwrap();
        let second = get_or_create_user(&store, "joe@x.com").await.unwrap();
        let other = get_or_create_user(&store, "Joe@x.com").await.unwrap();

        assert_eq!(first, second);
        assert_ne!(first, other); // email identity is case-sensitive
    }

    #[tokio::test]
    async fn test_office_records_and_headcount() {
        let store = MemoryStore::new();
        let joe = store.create_user("joe@x.com").await.unwrap();
        let ann = store.create_user("ann@x.com").await.unwrap();
        let bob = store.create_user("bob@x.com").await.unwrap();
        store.set_office(&joe, "OC").await.unwrap();
        store.set_office(&ann, "OC").await.unwrap();
        store.set_office(&bob, "Denver").await.unwrap();

        let at = Utc.with_ymd_and_hms(2025, 10, 3, 8, 0, 0).unwrap();
        store.append_rep(&joe, "pushups", 10, at).await.unwrap();
        store.append_rep(&bob, "pushups", 99, at).await.unwrap();

        let oc = store.fetch_records_by_office("OC", None).await.unwrap();
        assert_eq!(oc.len(), 1);
        assert_eq!(oc[0].count, 10);
        assert_eq!(store.count_users_in_office("OC").await.unwrap(), 2);
        assert_eq!(store.user_office(&bob).await.unwrap().as_deref(), Some("Denver"));
    }

    #[tokio::test]
    async fn test_set_office_unknown_user() {
        let store = MemoryStore::new();
        let err = store.set_office("nobody", "OC").await.unwrap_err();
        assert!(matches!(err, StoreError::UnknownUser(_)));
    }

    #[tokio::test]
    async fn test_offline_store_fails_every_call() {
        let store = MemoryStore::new();
        store.set_offline(true);

        assert!(store.find_user_by_email("joe@x.com").await.is_err());
        assert!(store.fetch_records_by_office("OC", None).await.is_err());
        assert!(store.count_users_in_office("OC").await.is_err());
    }
}
