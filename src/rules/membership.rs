// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Event membership state machine.
//!
//! Per (event, user) the user is either not joined, joined, or hosting
//! (the creator). Hosting never passes through joined; a creator may still
//! join explicitly, but can never leave.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

use crate::error::RuleViolation;
use crate::models::{Comment, Event, Location};

/// Add `user_id` to the participants.
///
/// Checked in order: already joined, then capacity.
pub fn join(event: &mut Event, user_id: &str) -> Result<(), RuleViolation> {
    if event.is_participant(user_id) {
        return Err(RuleViolation::AlreadyJoined);
    }
    if !event.has_capacity() {
        return Err(RuleViolation::EventFull);
    }
    event.participants.push(user_id.to_string());
    Ok(())
}

/// Remove `user_id` from the participants.
///
/// The creator is rejected before the participation check, so a host always
/// sees `CreatorCannotLeave` whether or not they joined.
pub fn leave(event: &mut Event, user_id: &str) -> Result<(), RuleViolation> {
    if event.is_creator(user_id) {
        return Err(RuleViolation::CreatorCannotLeave);
    }
    if !event.is_participant(user_id) {
        return Err(RuleViolation::NotAParticipant);
    }
    event.participants.retain(|p| p != user_id);
    Ok(())
}

/// Only the creator may edit or delete an event.
pub fn ensure_host(event: &Event, user_id: &str) -> Result<(), RuleViolation> {
    if event.is_creator(user_id) {
        Ok(())
    } else {
        Err(RuleViolation::NotAuthorized)
    }
}

/// Partial update of an event.
///
/// `None` means the field was omitted. For optional fields the inner
/// `Option` distinguishes an explicit `null` (clear) from a value, so an empty
/// string is stored as-is rather than treated as "not supplied".
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    #[serde(default, rename = "type")]
    pub event_type: Option<String>,
    #[serde(default)]
    pub emoji: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub address: Option<Option<String>>,
    #[serde(default)]
    pub time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default, deserialize_with = "present")]
    pub participants_limit: Option<Option<u32>>,
}

/// Wraps any present value (including `null`) in `Some`, so that a missing
/// field stays `None` via `#[serde(default)]`.
fn present<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

impl EventPatch {
    /// Shape checks that do not depend on the stored event.
    pub fn validate(&self) -> Result<(), String> {
        if matches!(&self.title, Some(t) if t.trim().is_empty()) {
            return Err("Title cannot be empty".to_string());
        }
        if matches!(&self.event_type, Some(t) if t.trim().is_empty()) {
            return Err("Type cannot be empty".to_string());
        }
        if matches!(&self.emoji, Some(e) if e.is_empty()) {
            return Err("Emoji cannot be empty".to_string());
        }
        if matches!(&self.location, Some(loc) if !loc.is_valid()) {
            return Err("Location is out of range".to_string());
        }
        if matches!(self.participants_limit, Some(Some(0))) {
            return Err("Participant limit must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Apply `patch` as the creator. Omitted fields keep their prior values.
pub fn apply_update(
    event: &mut Event,
    editor_id: &str,
    patch: EventPatch,
) -> Result<(), RuleViolation> {
    ensure_host(event, editor_id)?;

    if let Some(Some(limit)) = patch.participants_limit {
        if event.participants.len() > limit as usize {
            return Err(RuleViolation::LimitBelowParticipantCount);
        }
    }

    if let Some(title) = patch.title {
        event.title = title;
    }
    if let Some(description) = patch.description {
        event.description = description;
    }
    if let Some(event_type) = patch.event_type {
        event.event_type = event_type;
    }
    if let Some(emoji) = patch.emoji {
        event.emoji = emoji;
    }
    if let Some(address) = patch.address {
        event.address = address;
    }
    if let Some(time) = patch.time {
        event.time = time;
    }
    if let Some(location) = patch.location {
        event.location = location;
    }
    if let Some(limit) = patch.participants_limit {
        event.participants_limit = limit;
    }
    Ok(())
}

/// Any authenticated user may comment; membership is not required.
pub fn add_comment(event: &mut Event, comment: Comment) {
    event.comments.push(comment);
}

/// Remove a comment as its author or as the event host.
pub fn remove_comment(
    event: &mut Event,
    requester_id: &str,
    comment_id: &str,
) -> Result<Comment, RuleViolation> {
    let index = event
        .comments
        .iter()
        .position(|c| c.id == comment_id)
        .ok_or(RuleViolation::NotFound)?;

    let comment = &event.comments[index];
    if comment.user != requester_id && !event.is_creator(requester_id) {
        return Err(RuleViolation::AccessDenied);
    }
    Ok(event.comments.remove(index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::event::DEFAULT_EMOJI;

    fn event(limit: Option<u32>) -> Event {
        Event {
            id: "e1".to_string(),
            title: "Board games".to_string(),
            description: Some("Bring snacks".to_string()),
            event_type: "Board Game".to_string(),
            emoji: DEFAULT_EMOJI.to_string(),
            address: Some("12 Main St".to_string()),
            time: Utc::now(),
            location: Location {
                lat: 37.4,
                lng: -122.1,
            },
            creator: "host".to_string(),
            participants: vec![],
            participants_limit: limit,
            comments: vec![],
            created_at: Utc::now(),
            revision: 0,
        }
    }

    fn comment(id: &str, author: &str) -> Comment {
        Comment {
            id: id.to_string(),
            user: author.to_string(),
            text: "See you there".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_join_full_event() {
        let mut e = event(Some(1));
        join(&mut e, "u1").unwrap();
        assert_eq!(e.participants, vec!["u1".to_string()]);

        assert_eq!(join(&mut e, "u2"), Err(RuleViolation::EventFull));
        assert_eq!(e.participants, vec!["u1".to_string()]);
    }

    #[test]
    fn test_duplicate_join_checked_before_capacity() {
        let mut e = event(Some(1));
        join(&mut e, "u1").unwrap();
        // Full and already joined: the duplicate is reported.
        assert_eq!(join(&mut e, "u1"), Err(RuleViolation::AlreadyJoined));
    }

    #[test]
    fn test_creator_not_auto_joined_but_may_join() {
        let mut e = event(None);
        assert!(!e.is_participant("host"));
        join(&mut e, "host").unwrap();
        assert!(e.is_participant("host"));
    }

    #[test]
    fn test_join_then_leave_restores_participants() {
        let mut e = event(Some(5));
        join(&mut e, "a").unwrap();
        join(&mut e, "b").unwrap();
        let before = e.participants.clone();

        join(&mut e, "c").unwrap();
        leave(&mut e, "c").unwrap();
        assert_eq!(e.participants, before);
    }

    #[test]
    fn test_creator_cannot_leave_regardless_of_participation() {
        let mut e = event(None);
        assert_eq!(leave(&mut e, "host"), Err(RuleViolation::CreatorCannotLeave));

        join(&mut e, "host").unwrap();
        assert_eq!(leave(&mut e, "host"), Err(RuleViolation::CreatorCannotLeave));
        assert!(e.is_participant("host"));
    }

    #[test]
    fn test_leave_without_joining() {
        let mut e = event(None);
        assert_eq!(leave(&mut e, "u1"), Err(RuleViolation::NotAParticipant));
    }

    #[test]
    fn test_limit_never_exceeded_over_join_leave_sequence() {
        let limit = 3;
        let mut e = event(Some(limit));
        let users = ["a", "b", "c", "d", "e"];

        for round in 0..20 {
            let user = users[round % users.len()];
            if round % 3 == 2 {
                let _ = leave(&mut e, user);
            } else {
                let _ = join(&mut e, user);
            }
            assert!(e.participants.len() <= limit as usize);
        }
    }

    #[test]
    fn test_update_requires_host() {
        let mut e = event(None);
        let patch = EventPatch {
            title: Some("Hijacked".to_string()),
            ..Default::default()
        };
        assert_eq!(
            apply_update(&mut e, "u1", patch),
            Err(RuleViolation::NotAuthorized)
        );
        assert_eq!(e.title, "Board games");
    }

    #[test]
    fn test_update_distinguishes_empty_from_omitted() {
        let mut e = event(Some(4));
        let patch: EventPatch = serde_json::from_value(serde_json::json!({
            "description": "",
            "address": null
        }))
        .unwrap();

        apply_update(&mut e, "host", patch).unwrap();
        assert_eq!(e.description.as_deref(), Some(""));
        assert_eq!(e.address, None);
        // Omitted fields are untouched.
        assert_eq!(e.title, "Board games");
        assert_eq!(e.participants_limit, Some(4));
    }

    #[test]
    fn test_update_can_clear_limit() {
        let mut e = event(Some(2));
        let patch: EventPatch =
            serde_json::from_value(serde_json::json!({ "participantsLimit": null })).unwrap();
        apply_update(&mut e, "host", patch).unwrap();
        assert_eq!(e.participants_limit, None);
    }

    #[test]
    fn test_update_rejects_limit_below_participants() {
        let mut e = event(Some(3));
        join(&mut e, "a").unwrap();
        join(&mut e, "b").unwrap();

        let patch = EventPatch {
            participants_limit: Some(Some(1)),
            ..Default::default()
        };
        assert_eq!(
            apply_update(&mut e, "host", patch),
            Err(RuleViolation::LimitBelowParticipantCount)
        );
        assert_eq!(e.participants_limit, Some(3));
    }

    #[test]
    fn test_patch_validation() {
        let zero: EventPatch =
            serde_json::from_value(serde_json::json!({ "participantsLimit": 0 })).unwrap();
        assert!(zero.validate().is_err());

        let blank_title = EventPatch {
            title: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(blank_title.validate().is_err());

        let bad_location = EventPatch {
            location: Some(Location {
                lat: 91.0,
                lng: 0.0,
            }),
            ..Default::default()
        };
        assert!(bad_location.validate().is_err());

        assert!(EventPatch::default().validate().is_ok());
    }

    #[test]
    fn test_comment_deletion_author_or_host() {
        let mut e = event(None);
        add_comment(&mut e, comment("c1", "u1"));
        add_comment(&mut e, comment("c2", "u1"));

        assert_eq!(
            remove_comment(&mut e, "u2", "c1"),
            Err(RuleViolation::AccessDenied)
        );
        assert_eq!(e.comments.len(), 2);

        let removed = remove_comment(&mut e, "host", "c1").unwrap();
        assert_eq!(removed.id, "c1");

        remove_comment(&mut e, "u1", "c2").unwrap();
        assert!(e.comments.is_empty());
    }

    #[test]
    fn test_remove_missing_comment() {
        let mut e = event(None);
        assert_eq!(
            remove_comment(&mut e, "host", "nope"),
            Err(RuleViolation::NotFound)
        );
    }
}
