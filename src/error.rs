// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// A precondition of the membership or social-graph rules that did not hold.
///
/// Each variant has a stable machine-readable [`kind`](RuleViolation::kind).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RuleViolation {
    #[error("Not found")]
    NotFound,
    #[error("Not authorized to modify this event")]
    NotAuthorized,
    #[error("You have already joined this event")]
    AlreadyJoined,
    #[error("Event is full")]
    EventFull,
    #[error("You are not a participant of this event")]
    NotAParticipant,
    #[error("Creator cannot leave the event. Delete it instead.")]
    CreatorCannotLeave,
    #[error("Participant limit cannot be lower than the current participant count")]
    LimitBelowParticipantCount,
    #[error("Access denied")]
    AccessDenied,
    #[error("You cannot follow yourself")]
    CannotFollowSelf,
    #[error("Cannot send friend request to yourself")]
    CannotRequestSelf,
    #[error("You already follow this user")]
    AlreadyFollowing,
    #[error("You do not follow this user")]
    NotFollowing,
    #[error("Already friends")]
    AlreadyFriends,
    #[error("Friend request already sent")]
    AlreadyRequested,
    #[error("No friend request from this user")]
    NoSuchRequest,
    #[error("You are not friends with this user")]
    NotFriends,
}

impl RuleViolation {
    /// Machine-readable identifier returned in the `error` field.
    pub fn kind(&self) -> &'static str {
        match self {
            RuleViolation::NotFound => "not_found",
            RuleViolation::NotAuthorized => "not_authorized",
            RuleViolation::AlreadyJoined => "already_joined",
            RuleViolation::EventFull => "event_full",
            RuleViolation::NotAParticipant => "not_a_participant",
            RuleViolation::CreatorCannotLeave => "creator_cannot_leave",
            RuleViolation::LimitBelowParticipantCount => "limit_below_participant_count",
            RuleViolation::AccessDenied => "access_denied",
            RuleViolation::CannotFollowSelf => "cannot_follow_self",
            RuleViolation::CannotRequestSelf => "cannot_request_self",
            RuleViolation::AlreadyFollowing => "already_following",
            RuleViolation::NotFollowing => "not_following",
            RuleViolation::AlreadyFriends => "already_friends",
            RuleViolation::AlreadyRequested => "already_requested",
            RuleViolation::NoSuchRequest => "no_such_request",
            RuleViolation::NotFriends => "not_friends",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            RuleViolation::NotFound => StatusCode::NOT_FOUND,
            RuleViolation::NotAuthorized | RuleViolation::AccessDenied => StatusCode::FORBIDDEN,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Forbidden: {1}")]
    Forbidden(&'static str, String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Rule(#[from] RuleViolation),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Machine-readable error kind, as rendered in the response body.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Unauthorized => "unauthorized",
            AppError::InvalidCredentials => "invalid_credentials",
            AppError::Forbidden(kind, _) => kind,
            AppError::NotFound(_) => "not_found",
            AppError::BadRequest(_) => "bad_request",
            AppError::Conflict(_) => "conflict",
            AppError::Rule(rule) => rule.kind(),
            AppError::Database(_) => "database_error",
            AppError::Internal(_) => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized | AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(..) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Rule(rule) => rule.status(),
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::BadRequest(errors.to_string())
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::Unauthorized | AppError::InvalidCredentials => self.to_string(),
            AppError::Forbidden(_, msg)
            | AppError::NotFound(msg)
            | AppError::BadRequest(msg)
            | AppError::Conflict(msg) => msg.clone(),
            AppError::Rule(rule) => rule.to_string(),
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                "Internal Server Error".to_string()
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                "Internal Server Error".to_string()
            }
        };

        let body = ErrorResponse {
            error: self.kind().to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
