// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API representations with user references resolved.
//!
//! Built by `services::resolve::Resolver`; never read back from storage.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{EventId, Location, UserId, UserRef};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: String,
    pub user: UserRef,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventView {
    pub id: EventId,
    pub title: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub event_type: String,
    pub emoji: String,
    pub address: Option<String>,
    pub time: DateTime<Utc>,
    pub location: Location,
    pub creator: UserRef,
    pub participants: Vec<UserRef>,
    pub participants_limit: Option<u32>,
    pub comments: Vec<CommentView>,
    pub created_at: DateTime<Utc>,
}

/// A user as shown to other users: credentials and verification state removed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileView {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub is_verified: bool,
    pub is_admin: bool,
    pub is_disabled: bool,
    pub bio: String,
    pub interests: Vec<String>,
    pub profile_picture: String,
    pub looking_for: String,
    pub favorite_activities: Vec<String>,
    pub availability: String,
    pub followers: Vec<UserRef>,
    pub following: Vec<UserRef>,
    pub friends: Vec<UserRef>,
    pub friend_requests: Vec<UserRef>,
    pub sent_friend_requests: Vec<UserRef>,
    pub created_at: DateTime<Utc>,
}
