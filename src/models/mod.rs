// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod event;
pub mod profile;
pub mod user;
pub mod view;

pub use event::{Comment, Event, Location};
pub use profile::{UserRef, UserSummary};
pub use user::User;
pub use view::{CommentView, EventView, ProfileView};

/// Document identifier of a user.
pub type UserId = String;
/// Document identifier of an event.
pub type EventId = String;
