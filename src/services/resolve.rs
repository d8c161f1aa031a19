// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Resolve stored user ids into summary profiles for API responses.

use std::collections::{BTreeSet, HashMap};

use crate::db::Repository;
use crate::error::AppError;
use crate::models::{
    Comment, CommentView, Event, EventView, ProfileView, User, UserId, UserRef, UserSummary,
};

/// Lookup table from user id to summary, loaded once per response.
#[derive(Debug, Default)]
pub struct Resolver {
    summaries: HashMap<UserId, UserSummary>,
}

impl Resolver {
    /// Fetch every distinct user in `ids`.
    pub async fn load<'a, I>(db: &dyn Repository, ids: I) -> Result<Self, AppError>
    where
        I: IntoIterator<Item = &'a UserId>,
    {
        let unique: Vec<UserId> = ids
            .into_iter()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        if unique.is_empty() {
            return Ok(Self::default());
        }

        let users = db.get_users(&unique).await?;
        if users.len() < unique.len() {
            tracing::debug!(
                requested = unique.len(),
                found = users.len(),
                "Some referenced users no longer exist"
            );
        }
        Ok(Self::from_users(&users))
    }

    pub fn from_users(users: &[User]) -> Self {
        Self {
            summaries: users
                .iter()
                .map(|u| (u.id.clone(), UserSummary::from(u)))
                .collect(),
        }
    }

    pub fn user_ref(&self, id: &str) -> UserRef {
        match self.summaries.get(id) {
            Some(summary) => UserRef::Resolved(summary.clone()),
            None => UserRef::Reference { id: id.to_string() },
        }
    }

    fn refs<'a>(&self, ids: impl IntoIterator<Item = &'a UserId>) -> Vec<UserRef> {
        ids.into_iter().map(|id| self.user_ref(id)).collect()
    }

    pub fn comment(&self, comment: &Comment) -> CommentView {
        CommentView {
            id: comment.id.clone(),
            user: self.user_ref(&comment.user),
            text: comment.text.clone(),
            created_at: comment.created_at,
        }
    }

    pub fn event(&self, event: &Event) -> EventView {
        EventView {
            id: event.id.clone(),
            title: event.title.clone(),
            description: event.description.clone(),
            event_type: event.event_type.clone(),
            emoji: event.emoji.clone(),
            address: event.address.clone(),
            time: event.time,
            location: event.location,
            creator: self.user_ref(&event.creator),
            participants: self.refs(&event.participants),
            participants_limit: event.participants_limit,
            comments: event.comments.iter().map(|c| self.comment(c)).collect(),
            created_at: event.created_at,
        }
    }

    pub fn profile(&self, user: &User) -> ProfileView {
        ProfileView {
            id: user.id.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            is_verified: user.is_verified,
            is_admin: user.is_admin,
            is_disabled: user.is_disabled,
            bio: user.bio.clone(),
            interests: user.interests.clone(),
            profile_picture: user.profile_picture.clone(),
            looking_for: user.looking_for.clone(),
            favorite_activities: user.favorite_activities.clone(),
            availability: user.availability.clone(),
            followers: self.refs(&user.followers),
            following: self.refs(&user.following),
            friends: self.refs(&user.friends),
            friend_requests: self.refs(&user.friend_requests),
            sent_friend_requests: self.refs(&user.sent_friend_requests),
            created_at: user.created_at,
        }
    }
}

/// Every user id referenced by a profile's edge lists.
pub fn profile_references(user: &User) -> impl Iterator<Item = &UserId> {
    user.followers
        .iter()
        .chain(user.following.iter())
        .chain(user.friends.iter())
        .chain(user.friend_requests.iter())
        .chain(user.sent_friend_requests.iter())
}
