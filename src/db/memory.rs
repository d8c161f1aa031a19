// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process repository backed by `DashMap`.
//!
//! Used with `STORAGE_BACKEND=memory` and by the test suite. Event writes are
//! conditional under the entry lock; all user writes go through one mutex so
//! that a graph edge touching two users is applied as a unit.

use std::sync::Mutex;

use async_trait::async_trait;
use dashmap::DashMap;

use super::{GraphEdgeWrite, Repository, WriteOutcome};
use crate::error::AppError;
use crate::models::{Event, User};

#[derive(Default)]
pub struct MemoryDb {
    users: DashMap<String, User>,
    events: DashMap<String, Event>,
    user_writes: Mutex<()>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_user_writes(&self) -> Result<std::sync::MutexGuard<'_, ()>, AppError> {
        self.user_writes
            .lock()
            .map_err(|_| AppError::Database("user write lock poisoned".to_string()))
    }

    fn revision_matches(&self, id: &str, expected: u64) -> Option<bool> {
        self.users.get(id).map(|u| u.revision == expected)
    }
}

#[async_trait]
impl Repository for MemoryDb {
    async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        Ok(self.users.get(id).map(|u| u.clone()))
    }

    async fn get_users(&self, ids: &[String]) -> Result<Vec<User>, AppError> {
        Ok(ids
            .iter()
            .filter_map(|id| self.users.get(id).map(|u| u.clone()))
            .collect())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .iter()
            .find(|u| u.email == email)
            .map(|u| u.clone()))
    }

    async fn find_user_by_verification_token(
        &self,
        token: &str,
    ) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .iter()
            .find(|u| u.verification_token.as_deref() == Some(token))
            .map(|u| u.clone()))
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let mut users: Vec<User> = self.users.iter().map(|u| u.clone()).collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(users)
    }

    async fn create_user(&self, user: &User) -> Result<bool, AppError> {
        let _guard = self.lock_user_writes()?;
        if self.users.iter().any(|u| u.email == user.email) {
            return Ok(false);
        }
        self.users.insert(user.id.clone(), user.clone());
        Ok(true)
    }

    async fn save_user(
        &self,
        user: &User,
        expected_revision: u64,
    ) -> Result<WriteOutcome, AppError> {
        let _guard = self.lock_user_writes()?;
        match self.revision_matches(&user.id, expected_revision) {
            None => Ok(WriteOutcome::Missing),
            Some(false) => Ok(WriteOutcome::Conflict),
            Some(true) => {
                self.users.insert(user.id.clone(), user.clone());
                Ok(WriteOutcome::Committed)
            }
        }
    }

    async fn apply_graph_edge(&self, write: &GraphEdgeWrite) -> Result<WriteOutcome, AppError> {
        let _guard = self.lock_user_writes()?;
        let actor = self.revision_matches(&write.actor.id, write.actor_expected);
        let target = self.revision_matches(&write.target.id, write.target_expected);

        match (actor, target) {
            (None, _) | (_, None) => Ok(WriteOutcome::Missing),
            (Some(true), Some(true)) => {
                self.users
                    .insert(write.actor.id.clone(), write.actor.clone());
                self.users
                    .insert(write.target.id.clone(), write.target.clone());
                Ok(WriteOutcome::Committed)
            }
            _ => Ok(WriteOutcome::Conflict),
        }
    }

    async fn get_event(&self, id: &str) -> Result<Option<Event>, AppError> {
        Ok(self.events.get(id).map(|e| e.clone()))
    }

    async fn list_events(&self) -> Result<Vec<Event>, AppError> {
        let mut events: Vec<Event> = self.events.iter().map(|e| e.clone()).collect();
        events.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(events)
    }

    async fn create_event(&self, event: &Event) -> Result<(), AppError> {
        self.events.insert(event.id.clone(), event.clone());
        Ok(())
    }

    async fn save_event(
        &self,
        event: &Event,
        expected_revision: u64,
    ) -> Result<WriteOutcome, AppError> {
        match self.events.get_mut(&event.id) {
            None => Ok(WriteOutcome::Missing),
            Some(mut stored) => {
                if stored.revision != expected_revision {
                    return Ok(WriteOutcome::Conflict);
                }
                *stored = event.clone();
                Ok(WriteOutcome::Committed)
            }
        }
    }

    async fn delete_event(&self, id: &str) -> Result<bool, AppError> {
        Ok(self.events.remove(id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str, email: &str) -> User {
        User::new(
            id.to_string(),
            "First".to_string(),
            "Last".to_string(),
            id.to_string(),
            email.to_string(),
            "hash".to_string(),
        )
    }

    #[tokio::test]
    async fn test_create_user_rejects_duplicate_email() {
        let db = MemoryDb::new();
        assert!(db.create_user(&user("a", "x@example.com")).await.unwrap());
        assert!(!db.create_user(&user("b", "x@example.com")).await.unwrap());
        assert!(db.get_user("b").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_user_is_conditional_on_revision() {
        let db = MemoryDb::new();
        let mut u = user("a", "a@example.com");
        db.create_user(&u).await.unwrap();

        u.bio = "first".to_string();
        u.revision = 1;
        assert_eq!(db.save_user(&u, 0).await.unwrap(), WriteOutcome::Committed);

        // Stale writer still believes revision 0.
        let mut stale = u.clone();
        stale.bio = "stale".to_string();
        assert_eq!(db.save_user(&stale, 0).await.unwrap(), WriteOutcome::Conflict);
        assert_eq!(db.get_user("a").await.unwrap().unwrap().bio, "first");

        let ghost = user("ghost", "g@example.com");
        assert_eq!(db.save_user(&ghost, 0).await.unwrap(), WriteOutcome::Missing);
    }

    #[tokio::test]
    async fn test_graph_edge_writes_both_or_neither() {
        let db = MemoryDb::new();
        let a = user("a", "a@example.com");
        let b = user("b", "b@example.com");
        db.create_user(&a).await.unwrap();
        db.create_user(&b).await.unwrap();

        let mut a2 = a.clone();
        let mut b2 = b.clone();
        a2.following.insert("b".to_string());
        b2.followers.insert("a".to_string());
        a2.revision = 1;
        b2.revision = 1;

        // Target revision is stale: nothing is written.
        let stale = GraphEdgeWrite {
            actor: a2.clone(),
            actor_expected: 0,
            target: b2.clone(),
            target_expected: 7,
        };
        assert_eq!(db.apply_graph_edge(&stale).await.unwrap(), WriteOutcome::Conflict);
        assert!(db.get_user("a").await.unwrap().unwrap().following.is_empty());

        let write = GraphEdgeWrite {
            actor: a2,
            actor_expected: 0,
            target: b2,
            target_expected: 0,
        };
        assert_eq!(db.apply_graph_edge(&write).await.unwrap(), WriteOutcome::Committed);
        assert!(db.get_user("a").await.unwrap().unwrap().following.contains("b"));
        assert!(db.get_user("b").await.unwrap().unwrap().followers.contains("a"));
    }
}
