// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Event lifecycle: create, edit, delete, join/leave and comments.
//!
//! Every mutation is a read-apply-write cycle on one event document. The
//! write is conditional on the revision that was read; on conflict the event
//! is re-read and the membership rules are evaluated again, so capacity and
//! duplicate checks always see the state that is actually persisted.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use geo::{Distance, Haversine};
use serde::Deserialize;
use validator::{Validate, ValidationError};

use super::resolve::Resolver;
use super::MAX_WRITE_ATTEMPTS;
use crate::db::{Repository, WriteOutcome};
use crate::error::{AppError, Result, RuleViolation};
use crate::models::event::DEFAULT_EMOJI;
use crate::models::{Comment, CommentView, Event, EventView, Location};
use crate::rules::membership::{self, EventPatch};

/// Payload for creating an event.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type")]
    #[validate(length(min = 1, message = "Type is required"))]
    pub event_type: String,
    #[serde(default)]
    pub emoji: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    pub time: DateTime<Utc>,
    #[validate(custom(function = "validate_location"))]
    pub location: Location,
    #[serde(default)]
    #[validate(range(min = 1, message = "Participant limit must be at least 1"))]
    pub participants_limit: Option<u32>,
}

fn validate_location(location: &Location) -> std::result::Result<(), ValidationError> {
    if location.is_valid() {
        Ok(())
    } else {
        Err(ValidationError::new("location").with_message("Location is out of range".into()))
    }
}

/// Restrict listings to events within `radius_km` of a point.
#[derive(Debug, Clone, Copy)]
pub struct NearFilter {
    pub center: Location,
    pub radius_km: f64,
}

impl NearFilter {
    pub fn contains(&self, location: Location) -> bool {
        let meters = Haversine.distance(self.center.to_point(), location.to_point());
        meters <= self.radius_km * 1000.0
    }
}

#[derive(Clone)]
pub struct EventService {
    db: Arc<dyn Repository>,
}

impl EventService {
    pub fn new(db: Arc<dyn Repository>) -> Self {
        Self { db }
    }

    async fn load(&self, event_id: &str) -> Result<Event> {
        self.db
            .get_event(event_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Event not found".to_string()))
    }

    async fn view(&self, event: &Event) -> Result<EventView> {
        let resolver = Resolver::load(self.db.as_ref(), event.referenced_users()).await?;
        Ok(resolver.event(event))
    }

    /// Re-read, apply `rule`, and write back until the conditional write lands.
    async fn mutate<T, F>(&self, event_id: &str, mut rule: F) -> Result<(Event, T)>
    where
        F: FnMut(&mut Event) -> std::result::Result<T, RuleViolation> + Send,
        T: Send,
    {
        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let mut event = self.load(event_id).await?;
            let expected = event.revision;

            let value = rule(&mut event).inspect_err(|violation| {
                tracing::debug!(
                    event_id,
                    kind = violation.kind(),
                    "Event rule rejected request"
                );
            })?;
            event.revision = expected + 1;

            match self.db.save_event(&event, expected).await? {
                WriteOutcome::Committed => return Ok((event, value)),
                WriteOutcome::Conflict => {
                    tracing::debug!(event_id, attempt, "Event changed concurrently, retrying");
                }
                WriteOutcome::Missing => {
                    return Err(AppError::NotFound("Event not found".to_string()));
                }
            }
        }

        tracing::warn!(
            event_id,
            attempts = MAX_WRITE_ATTEMPTS,
            "Giving up on event write after repeated conflicts"
        );
        Err(AppError::Conflict(
            "Event was modified concurrently, please retry".to_string(),
        ))
    }

    // ─── Queries ─────────────────────────────────────────────────

    pub async fn list(&self, near: Option<NearFilter>) -> Result<Vec<EventView>> {
        let events: Vec<Event> = self
            .db
            .list_events()
            .await?
            .into_iter()
            .filter(|e| near.map_or(true, |n| n.contains(e.location)))
            .collect();

        let resolver =
            Resolver::load(self.db.as_ref(), events.iter().flat_map(|e| e.referenced_users()))
                .await?;
        Ok(events.iter().map(|e| resolver.event(e)).collect())
    }

    pub async fn get(&self, event_id: &str) -> Result<EventView> {
        let event = self.load(event_id).await?;
        self.view(&event).await
    }

    // ─── Lifecycle ───────────────────────────────────────────────

    pub async fn create(&self, creator_id: &str, new_event: NewEvent) -> Result<EventView> {
        new_event.validate()?;

        let now = Utc::now();
        let event = Event {
            id: self.db.new_id(),
            title: new_event.title,
            description: new_event.description,
            event_type: new_event.event_type,
            emoji: new_event
                .emoji
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| DEFAULT_EMOJI.to_string()),
            address: new_event.address,
            time: new_event.time,
            location: new_event.location,
            creator: creator_id.to_string(),
            participants: Vec::new(),
            participants_limit: new_event.participants_limit,
            comments: Vec::new(),
            created_at: now,
            revision: 0,
        };

        self.db.create_event(&event).await?;
        tracing::info!(event_id = %event.id, creator = creator_id, "Event created");

        self.view(&event).await
    }

    pub async fn update(&self, event_id: &str, editor_id: &str, patch: EventPatch) -> Result<EventView> {
        patch.validate().map_err(AppError::BadRequest)?;

        let (event, ()) = self
            .mutate(event_id, |event| {
                membership::apply_update(event, editor_id, patch.clone())
            })
            .await?;

        tracing::info!(event_id, editor = editor_id, "Event updated");
        self.view(&event).await
    }

    pub async fn delete(&self, event_id: &str, requester_id: &str) -> Result<()> {
        let event = self.load(event_id).await?;
        membership::ensure_host(&event, requester_id)?;

        if !self.db.delete_event(event_id).await? {
            return Err(AppError::NotFound("Event not found".to_string()));
        }
        tracing::info!(event_id, "Event deleted");
        Ok(())
    }

    // ─── Membership ──────────────────────────────────────────────

    pub async fn join(&self, event_id: &str, user_id: &str) -> Result<EventView> {
        let (event, ()) = self
            .mutate(event_id, |event| membership::join(event, user_id))
            .await?;

        tracing::info!(
            event_id,
            user_id,
            participants = event.participants.len(),
            limit = ?event.participants_limit,
            "User joined event"
        );
        self.view(&event).await
    }

    pub async fn leave(&self, event_id: &str, user_id: &str) -> Result<EventView> {
        let (event, ()) = self
            .mutate(event_id, |event| membership::leave(event, user_id))
            .await?;

        tracing::info!(event_id, user_id, "User left event");
        self.view(&event).await
    }

    // ─── Comments ────────────────────────────────────────────────

    pub async fn add_comment(&self, event_id: &str, author_id: &str, text: &str) -> Result<CommentView> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::BadRequest("Comment text is required".to_string()));
        }

        let comment = Comment {
            id: self.db.new_id(),
            user: author_id.to_string(),
            text: text.to_string(),
            created_at: Utc::now(),
        };

        let (_, ()) = self
            .mutate(event_id, |event| {
                membership::add_comment(event, comment.clone());
                Ok(())
            })
            .await?;

        tracing::info!(event_id, comment_id = %comment.id, author = author_id, "Comment added");

        let resolver = Resolver::load(self.db.as_ref(), [&comment.user]).await?;
        Ok(resolver.comment(&comment))
    }

    pub async fn delete_comment(&self, event_id: &str, requester_id: &str, comment_id: &str) -> Result<()> {
        let (_, removed) = self
            .mutate(event_id, |event| {
                membership::remove_comment(event, requester_id, comment_id)
            })
            .await?;

        tracing::info!(
            event_id,
            comment_id,
            author = %removed.user,
            requester = requester_id,
            "Comment deleted"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryDb;
    use crate::models::{User, UserRef};

    async fn setup() -> (EventService, Arc<MemoryDb>) {
        let db = Arc::new(MemoryDb::new());
        for id in ["host", "u1", "u2"] {
            let user = User::new(
                id.to_string(),
                format!("{}-first", id),
                "Last".to_string(),
                id.to_string(),
                format!("{}@example.com", id),
                "hash".to_string(),
            );
            db.create_user(&user).await.unwrap();
        }
        (EventService::new(db.clone()), db)
    }

    fn new_event(limit: Option<u32>) -> NewEvent {
        NewEvent {
            title: "Sunset hike".to_string(),
            description: None,
            event_type: "Activity".to_string(),
            emoji: None,
            address: None,
            time: Utc::now(),
            location: Location {
                lat: 37.33,
                lng: -122.08,
            },
            participants_limit: limit,
        }
    }

    #[tokio::test]
    async fn test_create_does_not_join_creator() {
        let (service, _) = setup().await;
        let view = service.create("host", new_event(None)).await.unwrap();

        assert!(view.participants.is_empty());
        assert_eq!(view.emoji, DEFAULT_EMOJI);
        assert!(matches!(&view.creator, UserRef::Resolved(s) if s.id == "host"));
    }

    #[tokio::test]
    async fn test_create_validation() {
        let (service, _) = setup().await;

        let mut blank = new_event(None);
        blank.title = String::new();
        assert!(matches!(
            service.create("host", blank).await,
            Err(AppError::BadRequest(_))
        ));

        assert!(matches!(
            service.create("host", new_event(Some(0))).await,
            Err(AppError::BadRequest(_))
        ));

        let mut far = new_event(None);
        far.location.lng = 200.0;
        assert!(matches!(
            service.create("host", far).await,
            Err(AppError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_limit_one_scenario() {
        let (service, _) = setup().await;
        let event = service.create("host", new_event(Some(1))).await.unwrap();

        let joined = service.join(&event.id, "u1").await.unwrap();
        assert_eq!(joined.participants.len(), 1);
        assert_eq!(joined.participants[0].id(), "u1");

        let err = service.join(&event.id, "u2").await.unwrap_err();
        assert!(matches!(err, AppError::Rule(RuleViolation::EventFull)));
    }

    #[tokio::test]
    async fn test_join_unknown_event() {
        let (service, _) = setup().await;
        assert!(matches!(
            service.join("missing", "u1").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_and_delete_are_host_only() {
        let (service, db) = setup().await;
        let event = service.create("host", new_event(None)).await.unwrap();

        let patch = EventPatch {
            title: Some("Moonrise hike".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            service.update(&event.id, "u1", patch.clone()).await,
            Err(AppError::Rule(RuleViolation::NotAuthorized))
        ));
        let updated = service.update(&event.id, "host", patch).await.unwrap();
        assert_eq!(updated.title, "Moonrise hike");
        assert_eq!(updated.event_type, "Activity");

        assert!(matches!(
            service.delete(&event.id, "u1").await,
            Err(AppError::Rule(RuleViolation::NotAuthorized))
        ));
        service.delete(&event.id, "host").await.unwrap();
        assert!(db.get_event(&event.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_comment_scenario() {
        let (service, _) = setup().await;
        let event = service.create("host", new_event(None)).await.unwrap();

        let comment = service
            .add_comment(&event.id, "u1", "Can I bring my dog?")
            .await
            .unwrap();
        assert!(matches!(&comment.user, UserRef::Resolved(s) if s.id == "u1"));

        let err = service
            .delete_comment(&event.id, "u2", &comment.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Rule(RuleViolation::AccessDenied)));

        service
            .delete_comment(&event.id, "host", &comment.id)
            .await
            .unwrap();
        assert!(service.get(&event.id).await.unwrap().comments.is_empty());
    }

    #[tokio::test]
    async fn test_empty_comment_rejected() {
        let (service, _) = setup().await;
        let event = service.create("host", new_event(None)).await.unwrap();
        assert!(matches!(
            service.add_comment(&event.id, "u1", "   ").await,
            Err(AppError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_list_near_filter() {
        let (service, _) = setup().await;
        service.create("host", new_event(None)).await.unwrap();

        let mut far = new_event(None);
        // New York
        far.location = Location {
            lat: 40.71,
            lng: -74.0,
        };
        service.create("host", far).await.unwrap();

        assert_eq!(service.list(None).await.unwrap().len(), 2);

        let near = NearFilter {
            center: Location {
                lat: 37.39,
                lng: -122.08,
            },
            radius_km: 25.0,
        };
        let nearby = service.list(Some(near)).await.unwrap();
        assert_eq!(nearby.len(), 1);
        assert_eq!(nearby[0].location.lat, 37.33);
    }
}
