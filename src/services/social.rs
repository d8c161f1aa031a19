// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Follow and friendship edges between two users.

use std::sync::Arc;

use super::MAX_WRITE_ATTEMPTS;
use crate::db::{GraphEdgeWrite, Repository, WriteOutcome};
use crate::error::{AppError, Result};
use crate::models::User;
use crate::rules::social_graph::pair_is_consistent;
use crate::rules::{GraphAction, GraphOutcome};

#[derive(Clone)]
pub struct SocialService {
    db: Arc<dyn Repository>,
}

impl SocialService {
    pub fn new(db: Arc<dyn Repository>) -> Self {
        Self { db }
    }

    async fn load(&self, id: &str) -> Result<User> {
        self.db
            .get_user(id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    /// Perform `action` from `actor_id` towards `target_id`.
    ///
    /// Both documents are written together or not at all.
    pub async fn apply(&self, actor_id: &str, target_id: &str, action: GraphAction) -> Result<GraphOutcome> {
        if actor_id == target_id {
            return Err(action.self_target_violation().into());
        }

        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let mut actor = self.load(actor_id).await?;
            let mut target = self.load(target_id).await?;
            let actor_expected = actor.revision;
            let target_expected = target.revision;

            let outcome = action.apply(&mut actor, &mut target).inspect_err(|violation| {
                tracing::debug!(
                    actor_id,
                    target_id,
                    ?action,
                    kind = violation.kind(),
                    "Social action rejected"
                );
            })?;

            if !pair_is_consistent(&actor, &target) {
                // Only reachable from documents that were already one-sided.
                tracing::warn!(
                    actor_id,
                    target_id,
                    ?action,
                    "Inconsistent social edges after update"
                );
            }

            actor.revision = actor_expected + 1;
            target.revision = target_expected + 1;
            let write = GraphEdgeWrite {
                actor,
                actor_expected,
                target,
                target_expected,
            };

            match self.db.apply_graph_edge(&write).await? {
                WriteOutcome::Committed => {
                    tracing::info!(actor_id, target_id, ?outcome, "Social graph updated");
                    return Ok(outcome);
                }
                WriteOutcome::Conflict => {
                    tracing::debug!(actor_id, target_id, attempt, "User changed concurrently, retrying");
                }
                WriteOutcome::Missing => {
                    return Err(AppError::NotFound("User not found".to_string()));
                }
            }
        }

        tracing::warn!(
            actor_id,
            target_id,
            attempts = MAX_WRITE_ATTEMPTS,
            "Giving up on social graph write after repeated conflicts"
        );
        Err(AppError::Conflict(
            "Profile was modified concurrently, please retry".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryDb;
    use crate::error::RuleViolation;

    async fn setup() -> (SocialService, Arc<MemoryDb>) {
        let db = Arc::new(MemoryDb::new());
        for id in ["alice", "bob"] {
            let user = User::new(
                id.to_string(),
                id.to_string(),
                "Test".to_string(),
                id.to_string(),
                format!("{}@example.com", id),
                "hash".to_string(),
            );
            db.create_user(&user).await.unwrap();
        }
        (SocialService::new(db.clone()), db)
    }

    async fn pair(db: &MemoryDb) -> (User, User) {
        (
            db.get_user("alice").await.unwrap().unwrap(),
            db.get_user("bob").await.unwrap().unwrap(),
        )
    }

    #[tokio::test]
    async fn test_request_then_accept() {
        let (service, db) = setup().await;

        let sent = service
            .apply("alice", "bob", GraphAction::SendFriendRequest)
            .await
            .unwrap();
        assert_eq!(sent, GraphOutcome::RequestSent);

        let (alice, bob) = pair(&db).await;
        assert!(bob.friend_requests.contains("alice"));
        assert!(alice.sent_friend_requests.contains("bob"));
        assert_eq!(alice.revision, 1);
        assert_eq!(bob.revision, 1);

        let accepted = service
            .apply("bob", "alice", GraphAction::AcceptFriendRequest)
            .await
            .unwrap();
        assert_eq!(accepted, GraphOutcome::BecameFriends);

        let (alice, bob) = pair(&db).await;
        assert!(alice.friends.contains("bob") && bob.friends.contains("alice"));
        assert!(pair_is_consistent(&alice, &bob));
    }

    #[tokio::test]
    async fn test_self_target_rejected_before_lookup() {
        let (service, _) = setup().await;
        assert!(matches!(
            service.apply("ghost", "ghost", GraphAction::Follow).await,
            Err(AppError::Rule(RuleViolation::CannotFollowSelf))
        ));
    }

    #[tokio::test]
    async fn test_missing_target() {
        let (service, _) = setup().await;
        assert!(matches!(
            service.apply("alice", "nobody", GraphAction::Follow).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_rejected_action_writes_nothing() {
        let (service, db) = setup().await;
        let err = service
            .apply("alice", "bob", GraphAction::RemoveFriend)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Rule(RuleViolation::NotFriends)));

        let (alice, bob) = pair(&db).await;
        assert_eq!(alice.revision, 0);
        assert_eq!(bob.revision, 0);
    }

    #[tokio::test]
    async fn test_concurrent_crossed_requests_end_as_friends() {
        let (service, db) = setup().await;

        let a = {
            let service = service.clone();
            tokio::spawn(async move {
                service
                    .apply("alice", "bob", GraphAction::SendFriendRequest)
                    .await
            })
        };
        let b = {
            let service = service.clone();
            tokio::spawn(async move {
                service
                    .apply("bob", "alice", GraphAction::SendFriendRequest)
                    .await
            })
        };
        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();

        let (alice, bob) = pair(&db).await;
        assert!(alice.friends.contains("bob"));
        assert!(pair_is_consistent(&alice, &bob));
    }
}
