// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (credentials, profile, social edge lists)
//! - Events (participants and embedded comments)
//!
//! Conditional writes run inside a Firestore transaction: the stored
//! revision is read with the transaction's consistency selector, and the
//! write is only added and committed if it still matches.

use crate::db::{collections, GraphEdgeWrite, Repository, WriteOutcome};
use crate::error::AppError;
use crate::models::{Event, User};
use async_trait::async_trait;
use firestore::errors::FirestoreError;
use firestore::{FirestoreConsistencySelector, FirestoreQueryDirection, FirestoreTransaction};
use futures_util::{stream, StreamExt};
use serde::{de::DeserializeOwned, Serialize};

const MAX_CONCURRENT_DB_OPS: usize = 50;

/// Documents that carry a write revision.
trait Revisioned: Serialize + DeserializeOwned + Send + Sync {
    fn id(&self) -> &str;
    fn revision(&self) -> u64;
}

impl Revisioned for User {
    fn id(&self) -> &str {
        &self.id
    }
    fn revision(&self) -> u64 {
        self.revision
    }
}

impl Revisioned for Event {
    fn id(&self) -> &str {
        &self.id
    }
    fn revision(&self) -> u64 {
        self.revision
    }
}

/// Firestore aborts a transaction that lost a race for a document
/// (`ABORTED`) and flags it, like other transient failures, as retryable.
fn is_contention(err: &FirestoreError) -> bool {
    matches!(err, FirestoreError::DatabaseError(e) if e.retry_possible)
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
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
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create an offline client. All database operations return an error.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    async fn get_doc<T: Revisioned>(&self, collection: &str, id: &str) -> Result<Option<T>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collection)
            .obj()
            .one(id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn find_user_by_field(&self, field: &'static str, value: &str) -> Result<Option<User>, AppError> {
        let value = value.to_string();
        let users: Vec<User> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(move |q| q.for_all([q.field(field).eq(value.clone())]))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(users.into_iter().next())
    }

    async fn upsert<T: Revisioned>(&self, collection: &str, doc: &T) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collection)
            .document_id(doc.id())
            .object(doc)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Transaction Helpers ─────────────────────────────────────

    /// Read a document as part of `transaction` and compare its revision.
    async fn check_revision<T: Revisioned>(
        &self,
        transaction: &FirestoreTransaction<'_>,
        collection: &str,
        id: &str,
        expected: u64,
    ) -> Result<Option<bool>, AppError> {
        let reader = self.get_client()?.clone_with_consistency_selector(
            FirestoreConsistencySelector::Transaction(transaction.transaction_id().clone()),
        );

        let stored: Option<T> = match reader
            .fluent()
            .select()
            .by_id_in(collection)
            .obj()
            .one(id)
            .await
        {
            Ok(stored) => stored,
            // Another transaction holds the document; report it as changed.
            Err(e) if is_contention(&e) => {
                tracing::debug!(collection, id, error = %e, "Transactional read contended");
                return Ok(Some(false));
            }
            Err(e) => {
                return Err(AppError::Database(format!(
                    "Failed to read {} in transaction: {}",
                    collection, e
                )))
            }
        };

        Ok(stored.map(|doc| doc.revision() == expected))
    }

    fn add_write<T: Revisioned>(
        &self,
        transaction: &mut FirestoreTransaction<'_>,
        collection: &str,
        doc: &T,
    ) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .update()
            .in_col(collection)
            .document_id(doc.id())
            .object(doc)
            .add_to_transaction(transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add {} to transaction: {}", collection, e))
            })?;
        Ok(())
    }

    /// Write every document in `docs` if all stored revisions still match.
    async fn conditional_write<T: Revisioned>(
        &self,
        collection: &str,
        docs: &[(&T, u64)],
    ) -> Result<WriteOutcome, AppError> {
        let mut transaction = self
            .get_client()?
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        let mut outcome = WriteOutcome::Committed;
        for (doc, expected) in docs {
            match self
                .check_revision::<T>(&transaction, collection, doc.id(), *expected)
                .await?
            {
                Some(true) => {}
                Some(false) => {
                    outcome = WriteOutcome::Conflict;
                    break;
                }
                None => {
                    outcome = WriteOutcome::Missing;
                    break;
                }
            }
        }

        if outcome != WriteOutcome::Committed {
            let _ = transaction.rollback().await;
            return Ok(outcome);
        }

        for (doc, _) in docs {
            self.add_write(&mut transaction, collection, *doc)?;
        }

        match transaction.commit().await {
            Ok(_) => Ok(WriteOutcome::Committed),
            Err(e) if is_contention(&e) => {
                tracing::debug!(collection, error = %e, "Transaction commit aborted");
                Ok(WriteOutcome::Conflict)
            }
            Err(e) => Err(AppError::Database(format!(
                "Transaction commit failed: {}",
                e
            ))),
        }
    }
}

#[async_trait]
impl Repository for FirestoreDb {
    // ─── User Operations ─────────────────────────────────────────

    async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        self.get_doc(collections::USERS, id).await
    }

    async fn get_users(&self, ids: &[String]) -> Result<Vec<User>, AppError> {
        let results = stream::iter(ids.iter().cloned())
            .map(|id| async move { self.get_user(&id).await })
            .buffered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<Option<User>, AppError>>>()
            .await;

        let mut users = Vec::with_capacity(results.len());
        for result in results {
            if let Some(user) = result? {
                users.push(user);
            }
        }
        Ok(users)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        self.find_user_by_field("email", email).await
    }

    async fn find_user_by_verification_token(
        &self,
        token: &str,
    ) -> Result<Option<User>, AppError> {
        self.find_user_by_field("verificationToken", token).await
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .order_by([("createdAt", FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn create_user(&self, user: &User) -> Result<bool, AppError> {
        // Firestore has no unique index; two racing registrations for one
        // email can both pass this check.
        if self.find_user_by_email(&user.email).await?.is_some() {
            return Ok(false);
        }
        self.upsert(collections::USERS, user).await?;
        Ok(true)
    }

    async fn save_user(
        &self,
        user: &User,
        expected_revision: u64,
    ) -> Result<WriteOutcome, AppError> {
        self.conditional_write(collections::USERS, &[(user, expected_revision)])
            .await
    }

    async fn apply_graph_edge(&self, write: &GraphEdgeWrite) -> Result<WriteOutcome, AppError> {
        self.conditional_write(
            collections::USERS,
            &[
                (&write.actor, write.actor_expected),
                (&write.target, write.target_expected),
            ],
        )
        .await
    }

    // ─── Event Operations ────────────────────────────────────────

    async fn get_event(&self, id: &str) -> Result<Option<Event>, AppError> {
        self.get_doc(collections::EVENTS, id).await
    }

    async fn list_events(&self) -> Result<Vec<Event>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::EVENTS)
            .order_by([("createdAt", FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn create_event(&self, event: &Event) -> Result<(), AppError> {
        self.upsert(collections::EVENTS, event).await
    }

    async fn save_event(
        &self,
        event: &Event,
        expected_revision: u64,
    ) -> Result<WriteOutcome, AppError> {
        self.conditional_write(collections::EVENTS, &[(event, expected_revision)])
            .await
    }

    async fn delete_event(&self, id: &str) -> Result<bool, AppError> {
        if self.get_event(id).await?.is_none() {
            return Ok(false);
        }

        self.get_client()?
            .fluent()
            .delete()
            .from(collections::EVENTS)
            .document_id(id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::debug!(event_id = id, "Deleted event document");
        Ok(true)
    }
}
