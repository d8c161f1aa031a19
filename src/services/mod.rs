// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod accounts;
pub mod events;
pub mod password;
pub mod resolve;
pub mod social;

pub use accounts::{AccountService, AdminFlag, LoginRequest, ProfileUpdate, RegisterRequest};
pub use events::{EventService, NearFilter, NewEvent};
pub use password::PasswordHasher;
pub use resolve::Resolver;
pub use social::SocialService;

/// Conditional writes re-read and retry this many times before reporting a conflict.
pub const MAX_WRITE_ATTEMPTS: u32 = 5;
