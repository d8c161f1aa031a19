// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Event routes.
//!
//! Listing and reading are public; every mutation requires a session.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{EventView, Location};
use crate::rules::EventPatch;
use crate::services::{NearFilter, NewEvent};
use crate::AppState;
use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use super::MessageResponse;

pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/events", get(list_events))
        .route("/api/events/{id}", get(get_event))
}

/// Routes that require authentication.
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/events", post(create_event))
        .route(
            "/api/events/{id}",
            axum::routing::put(update_event).delete(delete_event),
        )
        .route("/api/events/{id}/join", post(join_event))
        .route("/api/events/{id}/leave", post(leave_event))
}

// ─── Queries ─────────────────────────────────────────────────

/// Optional proximity filter for the event list.
#[derive(Debug, Deserialize)]
pub struct ListEventsParams {
    lat: Option<f64>,
    lng: Option<f64>,
    radius_km: Option<f64>,
}

impl ListEventsParams {
    fn near_filter(&self) -> Result<Option<NearFilter>> {
        match (self.lat, self.lng, self.radius_km) {
            (None, None, None) => Ok(None),
            (Some(lat), Some(lng), Some(radius_km)) => {
                let center = Location { lat, lng };
                if !center.is_valid() || !radius_km.is_finite() || radius_km < 0.0 {
                    return Err(AppError::BadRequest(
                        "Invalid location filter".to_string(),
                    ));
                }
                Ok(Some(NearFilter { center, radius_km }))
            }
            _ => Err(AppError::BadRequest(
                "lat, lng and radius_km must be given together".to_string(),
            )),
        }
    }
}

async fn list_events(
    State(state): State<Arc<AppState>>,
    params: std::result::Result<Query<ListEventsParams>, QueryRejection>,
) -> Result<Json<Vec<EventView>>> {
    let Query(params) = params?;
    let near = params.near_filter()?;
    Ok(Json(state.events.list(near).await?))
}

async fn get_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<EventView>> {
    Ok(Json(state.events.get(&id).await?))
}

// ─── Mutations ───────────────────────────────────────────────

async fn create_event(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    payload: std::result::Result<Json<NewEvent>, JsonRejection>,
) -> Result<(StatusCode, Json<EventView>)> {
    let Json(new_event) = payload?;
    let event = state.events.create(&user.id, new_event).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

async fn update_event(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    payload: std::result::Result<Json<EventPatch>, JsonRejection>,
) -> Result<Json<EventView>> {
    let Json(patch) = payload?;
    Ok(Json(state.events.update(&id, &user.id, patch).await?))
}

async fn delete_event(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>> {
    state.events.delete(&id, &user.id).await?;
    Ok(MessageResponse::new("Event deleted successfully"))
}

async fn join_event(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<EventView>> {
    Ok(Json(state.events.join(&id, &user.id).await?))
}

async fn leave_event(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<EventView>> {
    Ok(Json(state.events.leave(&id, &user.id).await?))
}
