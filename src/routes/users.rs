// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account, profile, friendship and admin routes under `/api/users`.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::ProfileView;
use crate::rules::GraphAction;
use crate::services::accounts::ChangePasswordRequest;
use crate::services::{AdminFlag, ProfileUpdate, RegisterRequest};
use crate::AppState;
use axum::{
    extract::rejection::JsonRejection,
    extract::{Path, State},
    http::StatusCode,
    response::Redirect,
    routing::{delete, get, post, put},
    Extension, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use super::social::graph_action;
use super::MessageResponse;

pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/users", post(register))
        .route("/api/users/verify/{token}", get(verify_email))
        .route("/api/users/{id}", get(get_profile))
}

/// Routes that require authentication.
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/users/all", get(list_users))
        .route("/api/users/profile", put(update_profile))
        .route("/api/users/change-password", post(change_password))
        .route(
            "/api/users/friend-request/{id}",
            post(send_friend_request).delete(cancel_friend_request),
        )
        .route("/api/users/accept-friend/{id}", post(accept_friend))
        .route("/api/users/decline-friend/{id}", post(decline_friend))
        .route("/api/users/remove-friend/{id}", delete(remove_friend))
        .route("/api/users/{id}/toggle/{property}", put(toggle_flag))
}

// ─── Registration ────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RegisterResponse {
    pub message: String,
    /// Link that completes email verification.
    pub verification_url: String,
}

async fn register(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisterResponse>)> {
    let Json(request) = payload?;
    let registration = state.accounts.register(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered. Please verify your email.".to_string(),
            verification_url: registration.verification_url,
        }),
    ))
}

async fn verify_email(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<Redirect> {
    state.accounts.verify_email(&token).await?;
    Ok(Redirect::to(&format!(
        "{}/login?verified=true",
        state.config.frontend_url
    )))
}

// ─── Profiles ────────────────────────────────────────────────

async fn get_profile(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ProfileView>> {
    Ok(Json(state.accounts.get_profile(&id).await?))
}

async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    payload: std::result::Result<Json<ProfileUpdate>, JsonRejection>,
) -> Result<Json<ProfileView>> {
    let Json(update) = payload?;
    Ok(Json(state.accounts.update_profile(&user.id, update).await?))
}

async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    payload: std::result::Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>> {
    let Json(request) = payload?;
    state.accounts.change_password(&user.id, request).await?;
    Ok(MessageResponse::new("Password changed successfully"))
}

// ─── Friendship ──────────────────────────────────────────────

async fn send_friend_request(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>> {
    graph_action(&state, &user, &id, GraphAction::SendFriendRequest).await
}

async fn cancel_friend_request(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>> {
    graph_action(&state, &user, &id, GraphAction::CancelFriendRequest).await
}

async fn accept_friend(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>> {
    graph_action(&state, &user, &id, GraphAction::AcceptFriendRequest).await
}

async fn decline_friend(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>> {
    graph_action(&state, &user, &id, GraphAction::DeclineFriendRequest).await
}

async fn remove_friend(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>> {
    graph_action(&state, &user, &id, GraphAction::RemoveFriend).await
}

// ─── Admin ───────────────────────────────────────────────────

fn admin_only(user: &AuthUser) -> Result<()> {
    if user.is_admin {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "admin_required",
            "Admin access required".to_string(),
        ))
    }
}

async fn list_users(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<ProfileView>>> {
    admin_only(&user)?;
    Ok(Json(state.accounts.list_users(&user.id).await?))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ToggleResponse {
    pub message: String,
    pub value: bool,
}

async fn toggle_flag(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((id, property)): Path<(String, String)>,
) -> Result<Json<ToggleResponse>> {
    admin_only(&user)?;
    let flag: AdminFlag = property.parse()?;
    let value = state.accounts.toggle_flag(&user.id, &id, flag).await?;

    Ok(Json(ToggleResponse {
        message: format!("{} updated", property),
        value,
    }))
}
