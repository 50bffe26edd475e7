// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper implementing `RepStore`.
//!
//! Collections:
//! - `users` (document ID = URL-encoded email)
//! - `reps` (one document per exercise per submission, auto ID)

use crate::db::{collections, RepStore, StoreError};
use crate::models::rep::select_window;
use crate::models::{RepRecord, RepWindow, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::{stream, StreamExt};

const MAX_CONCURRENT_DB_OPS: usize = 50;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, StoreError> {
        // The emulator rejects real credentials, so connect unauthenticated.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id).await.map_err(|e| {
            StoreError::Unavailable(format!("Failed to connect to Firestore: {}", e))
        })?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, StoreError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            StoreError::Unavailable(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, StoreError> {
        self.client.as_ref().ok_or_else(|| {
            StoreError::Unavailable("Database not connected (offline mode)".to_string())
        })
    }

    /// Document ID for a user: emails may contain `/`, which Firestore forbids.
    fn user_doc_id(email: &str) -> String {
        urlencoding::encode(email).into_owned()
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, StoreError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))
    }

    async fn users_in_office(&self, office: &str) -> Result<Vec<User>, StoreError> {
        let office = office.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(move |q| q.for_all([q.field("office").eq(office.clone())]))
            .obj()
            .query()
            .await
            .map_err(|e| StoreError::Query(e.to_string()))
    }

    async fn reps_for_user(&self, user_id: &str) -> Result<Vec<RepRecord>, StoreError> {
        let user_id = user_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::REPS)
            .filter(move |q| q.for_all([q.field("user_id").eq(user_id.clone())]))
            .obj()
            .query()
            .await
            .map_err(|e| StoreError::Query(e.to_string()))
    }
}

#[async_trait]
impl RepStore for FirestoreDb {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<String>, StoreError> {
        let doc_id = Self::user_doc_id(email);
        Ok(self.get_user(&doc_id).await?.map(|u| u.id))
    }

    async fn create_user(&self, email: &str) -> Result<String, StoreError> {
        let user = User {
            id: Self::user_doc_id(email),
            email: email.to_string(),
            office: None,
            created_at: Utc::now(),
        };

        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.id)
            .object(&user)
            .execute()
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;
        Ok(user.id)
    }

    async fn append_rep(
        &self,
        user_id: &str,
        exercise: &str,
        count: u64,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let record = RepRecord {
            user_id: user_id.to_string(),
            exercise: exercise.to_string(),
            count,
            created_at: at,
        };

        let _: RepRecord = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::REPS)
            .generate_document_id()
            .object(&record)
            .execute()
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;
        Ok(())
    }

    async fn set_office(&self, user_id: &str, office: &str) -> Result<(), StoreError> {
        // Fetch-modify-write to preserve other fields
        let mut user = self
            .get_user(user_id)
            .await?
            .ok_or_else(|| StoreError::UnknownUser(user_id.to_string()))?;
        user.office = Some(office.to_string());

        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(user_id)
            .object(&user)
            .execute()
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;
        Ok(())
    }

    async fn user_office(&self, user_id: &str) -> Result<Option<String>, StoreError> {
        Ok(self.get_user(user_id).await?.and_then(|u| u.office))
    }

    async fn fetch_records_by_user(
        &self,
        user_id: &str,
        window: Option<RepWindow>,
    ) -> Result<Vec<RepRecord>, StoreError> {
        let records = self.reps_for_user(user_id).await?;
        Ok(select_window(records, window))
    }

    async fn fetch_records_by_office(
        &self,
        office: &str,
        window: Option<RepWindow>,
    ) -> Result<Vec<RepRecord>, StoreError> {
        let members = self.users_in_office(office).await?;

        // Firestore has no joins: fetch each member's reps with bounded concurrency.
        let per_user = stream::iter(members)
            .map(|user| async move { self.reps_for_user(&user.id).await })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<Vec<RepRecord>, StoreError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<Vec<RepRecord>>, StoreError>>()?;

        let records = per_user.into_iter().flatten().collect();
        Ok(select_window(records, window))
    }

    async fn count_users_in_office(&self, office: &str) -> Result<u64, StoreError> {
        Ok(self.users_in_office(office).await?.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_doc_id_escapes_slashes() {
        assert_eq!(FirestoreDb::user_doc_id("joe@x.com"), "joe%40x.com");
        assert!(!FirestoreDb::user_doc_id("a/b@x.com").contains('/'));
    }

    #[tokio::test]
    async fn test_offline_mock_reports_unavailable() {
        let db = FirestoreDb::new_mock();
        let err = db.find_user_by_email("joe@x.com").await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }
}
