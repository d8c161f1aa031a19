// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Event model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{EventId, UserId};

pub const DEFAULT_EMOJI: &str = "📅";

/// Map coordinate of an event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lng)
    }

    pub fn to_point(self) -> geo::Point<f64> {
        geo::Point::new(self.lng, self.lat)
    }
}

/// Comment embedded in an event document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    /// Author
    pub user: UserId,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Event document stored in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Document ID
    pub id: EventId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Category tag ("Activity", "Dining", "Board Game", ...)
    #[serde(rename = "type")]
    pub event_type: String,
    pub emoji: String,
    #[serde(default)]
    pub address: Option<String>,
    /// Scheduled start
    pub time: DateTime<Utc>,
    pub location: Location,
    /// Host; never changes after creation
    pub creator: UserId,
    /// Joined users in join order. The creator is only present after an explicit join.
    #[serde(default)]
    pub participants: Vec<UserId>,
    /// `None` means unlimited
    #[serde(default)]
    pub participants_limit: Option<u32>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    pub created_at: DateTime<Utc>,
    /// Bumped on every write; used for conditional updates.
    #[serde(default)]
    pub revision: u64,
}

impl Event {
    pub fn is_participant(&self, user_id: &str) -> bool {
        self.participants.iter().any(|p| p == user_id)
    }

    pub fn is_creator(&self, user_id: &str) -> bool {
        self.creator == user_id
    }

    /// Whether another participant fits under the cap.
    pub fn has_capacity(&self) -> bool {
        match self.participants_limit {
            Some(limit) => self.participants.len() < limit as usize,
            None => true,
        }
    }

    /// Every user id referenced by this event (creator, participants, comment authors).
    pub fn referenced_users(&self) -> impl Iterator<Item = &UserId> {
        std::iter::once(&self.creator)
            .chain(self.participants.iter())
            .chain(self.comments.iter().map(|c| &c.user))
    }
}
