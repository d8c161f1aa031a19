// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Third Spaces: map-pinned local events and a friends/followers graph
//!
//! This crate provides the backend API: accounts, events with optional
//! participant caps and comments, and the follow / friend-request protocol.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod rules;
pub mod services;

use std::sync::Arc;

use config::Config;
use db::Repository;
use services::{AccountService, EventService, SocialService};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Arc<dyn Repository>,
    pub events: EventService,
    pub social: SocialService,
    pub accounts: AccountService,
}

impl AppState {
    pub fn new(config: Config, db: Arc<dyn Repository>) -> Self {
        Self {
            events: EventService::new(db.clone()),
            social: SocialService::new(db.clone()),
            accounts: AccountService::new(db.clone(), &config),
            config,
            db,
        }
    }
}
