// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Follow routes and event comments.

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::CommentView;
use crate::rules::GraphAction;
use crate::AppState;
use axum::{
    extract::rejection::JsonRejection,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use super::MessageResponse;

/// Routes that require authentication.
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/social/follow/{id}", post(follow))
        .route("/api/social/unfollow/{id}", post(unfollow))
        .route("/api/social/events/{id}/comment", post(add_comment))
        .route(
            "/api/social/events/{id}/comment/{comment_id}",
            delete(delete_comment),
        )
}

/// Run one social-graph action from the caller towards `target_id`.
pub(super) async fn graph_action(
    state: &AppState,
    user: &AuthUser,
    target_id: &str,
    action: GraphAction,
) -> Result<Json<MessageResponse>> {
    let outcome = state.social.apply(&user.id, target_id, action).await?;
    Ok(MessageResponse::new(outcome.message()))
}

async fn follow(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>> {
    graph_action(&state, &user, &id, GraphAction::Follow).await
}

async fn unfollow(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>> {
    graph_action(&state, &user, &id, GraphAction::Unfollow).await
}

// ─── Comments ────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    #[serde(default)]
    text: String,
}

async fn add_comment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    payload: std::result::Result<Json<CommentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CommentView>)> {
    let Json(request) = payload?;
    let comment = state.events.add_comment(&id, &user.id, &request.text).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

async fn delete_comment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((id, comment_id)): Path<(String, String)>,
) -> Result<Json<MessageResponse>> {
    state
        .events
        .delete_comment(&id, &user.id, &comment_id)
        .await?;
    Ok(MessageResponse::new("Comment deleted successfully"))
}
