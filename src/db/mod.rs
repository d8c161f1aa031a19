// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer.
//!
//! Services talk to a [`Repository`]; [`FirestoreDb`] is the production
//! document store and [`MemoryDb`] an in-process store for local runs and tests.
//!
//! Writes to existing documents are conditional on the `revision` the caller
//! read. A mismatch is reported as [`WriteOutcome::Conflict`] and the caller
//! re-reads and re-applies its rules.

pub mod firestore;
pub mod memory;

pub use self::firestore::FirestoreDb;
pub use memory::MemoryDb;

use crate::error::AppError;
use crate::models::{Event, User};
use async_trait::async_trait;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const EVENTS: &str = "events";
}

/// Result of a conditional write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Committed,
    /// A stored revision no longer matches what was read.
    Conflict,
    /// A document involved in the write no longer exists.
    Missing,
}

/// Both user documents touched by one social-graph action.
///
/// The documents carry their new revisions; `*_expected` are the revisions
/// that were read.
#[derive(Debug, Clone)]
pub struct GraphEdgeWrite {
    pub actor: User,
    pub actor_expected: u64,
    pub target: User,
    pub target_expected: u64,
}

#[async_trait]
pub trait Repository: Send + Sync {
    /// Generate an identifier for a new document.
    fn new_id(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }

    // ─── Users ───────────────────────────────────────────────────

    async fn get_user(&self, id: &str) -> Result<Option<User>, AppError>;

    /// Fetch several users; ids without a document are skipped.
    async fn get_users(&self, ids: &[String]) -> Result<Vec<User>, AppError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn find_user_by_verification_token(&self, token: &str)
        -> Result<Option<User>, AppError>;

    async fn list_users(&self) -> Result<Vec<User>, AppError>;

    /// Store a new user. Returns `false` if the email is already registered.
    async fn create_user(&self, user: &User) -> Result<bool, AppError>;

    /// Replace a user document if its stored revision equals `expected_revision`.
    async fn save_user(&self, user: &User, expected_revision: u64)
        -> Result<WriteOutcome, AppError>;

    /// Write both sides of a social-graph edge together.
    async fn apply_graph_edge(&self, write: &GraphEdgeWrite) -> Result<WriteOutcome, AppError>;

    // ─── Events ──────────────────────────────────────────────────

    async fn get_event(&self, id: &str) -> Result<Option<Event>, AppError>;

    async fn list_events(&self) -> Result<Vec<Event>, AppError>;

    async fn create_event(&self, event: &Event) -> Result<(), AppError>;

    /// Replace an event document if its stored revision equals `expected_revision`.
    async fn save_event(
        &self,
        event: &Event,
        expected_revision: u64,
    ) -> Result<WriteOutcome, AppError>;

    /// Delete an event with its embedded comments. Returns `false` if absent.
    async fn delete_event(&self, id: &str) -> Result<bool, AppError>;
}
