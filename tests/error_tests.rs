// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::http::StatusCode;
use axum::response::IntoResponse;
use third_spaces::error::{AppError, RuleViolation};

async fn render(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[test]
fn test_rule_violation_status_mapping() {
    let forbidden = [RuleViolation::NotAuthorized, RuleViolation::AccessDenied];
    for rule in forbidden {
        assert_eq!(AppError::from(rule).status(), StatusCode::FORBIDDEN);
    }

    assert_eq!(
        AppError::from(RuleViolation::NotFound).status(),
        StatusCode::NOT_FOUND
    );

    let bad_request = [
        RuleViolation::AlreadyJoined,
        RuleViolation::EventFull,
        RuleViolation::NotAParticipant,
        RuleViolation::CreatorCannotLeave,
        RuleViolation::LimitBelowParticipantCount,
        RuleViolation::CannotFollowSelf,
        RuleViolation::CannotRequestSelf,
        RuleViolation::AlreadyFollowing,
        RuleViolation::NotFollowing,
        RuleViolation::AlreadyFriends,
        RuleViolation::AlreadyRequested,
        RuleViolation::NoSuchRequest,
        RuleViolation::NotFriends,
    ];
    for rule in bad_request {
        assert_eq!(
            AppError::from(rule).status(),
            StatusCode::BAD_REQUEST,
            "{:?}",
            rule
        );
    }
}

#[test]
fn test_app_error_status_mapping() {
    assert_eq!(AppError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        AppError::InvalidCredentials.status(),
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(
        AppError::Forbidden("account_disabled", "x".to_string()).status(),
        StatusCode::FORBIDDEN
    );
    assert_eq!(
        AppError::Conflict("x".to_string()).status(),
        StatusCode::CONFLICT
    );
    assert_eq!(
        AppError::Database("x".to_string()).status(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

#[tokio::test]
async fn test_rule_violation_body() {
    let (status, body) = render(RuleViolation::EventFull.into()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "event_full");
    assert_eq!(body["message"], "Event is full");
}

#[tokio::test]
async fn test_forbidden_kind_is_rendered() {
    let (status, body) = render(AppError::Forbidden(
        "email_not_verified",
        "Please verify your email".to_string(),
    ))
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "email_not_verified");
    assert_eq!(body["message"], "Please verify your email");
}

#[tokio::test]
async fn test_internal_details_are_not_leaked() {
    let (status, body) = render(AppError::Database(
        "connection refused to 10.0.0.3:8080".to_string(),
    ))
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "database_error");
    assert_eq!(body["message"], "Internal Server Error");

    let (_, body) = render(AppError::Internal(anyhow::anyhow!("secret detail"))).await;
    assert_eq!(body["message"], "Internal Server Error");
}
