// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Registration, email verification, login, and profile management.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::Deserialize;
use validator::{Validate, ValidationError};

use super::password::PasswordHasher;
use super::resolve::{profile_references, Resolver};
use super::MAX_WRITE_ATTEMPTS;
use crate::config::Config;
use crate::db::{Repository, WriteOutcome};
use crate::error::{AppError, Result};
use crate::middleware::auth::create_jwt;
use crate::models::{ProfileView, User};

const VERIFICATION_TOKEN_TTL_HOURS: i64 = 24;
const MAX_TAG_LEN: usize = 50;

fn validate_password(password: &str) -> std::result::Result<(), ValidationError> {
    let len = password.chars().count();
    let complex = password.chars().any(|c| c.is_lowercase())
        && password.chars().any(|c| c.is_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| !c.is_alphanumeric());

    if (8..=26).contains(&len) && complex {
        Ok(())
    } else {
        Err(ValidationError::new("password").with_message(
            "Password must be 8-26 characters with upper and lower case letters, a digit and a symbol"
                .into(),
        ))
    }
}

fn validate_tags(tags: &[String]) -> std::result::Result<(), ValidationError> {
    if tags.iter().all(|t| t.chars().count() <= MAX_TAG_LEN) {
        Ok(())
    } else {
        Err(ValidationError::new("tags").with_message("Each entry must be at most 50 characters".into()))
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: String,
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(custom(function = "validate_password"))]
    pub password: String,
    #[serde(default)]
    #[validate(length(max = 500, message = "Bio must be at most 500 characters"))]
    pub bio: String,
    #[serde(default)]
    #[validate(
        length(max = 3, message = "At most 3 interests"),
        custom(function = "validate_tags")
    )]
    pub interests: Vec<String>,
    #[serde(default)]
    pub profile_picture: String,
    #[serde(default)]
    pub looking_for: String,
    #[serde(default)]
    #[validate(custom(function = "validate_tags"))]
    pub favorite_activities: Vec<String>,
    #[serde(default)]
    pub availability: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    #[validate(custom(function = "validate_password"))]
    pub new_password: String,
}

/// Partial profile edit. Omitted fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[validate(length(min = 1, message = "First name cannot be empty"))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, message = "Last name cannot be empty"))]
    pub last_name: Option<String>,
    #[validate(length(min = 1, message = "Username cannot be empty"))]
    pub username: Option<String>,
    #[validate(length(max = 500, message = "Bio must be at most 500 characters"))]
    pub bio: Option<String>,
    #[validate(custom(function = "validate_tags"))]
    pub interests: Option<Vec<String>>,
    pub profile_picture: Option<String>,
    pub looking_for: Option<String>,
    #[validate(custom(function = "validate_tags"))]
    pub favorite_activities: Option<Vec<String>>,
    pub availability: Option<String>,
}

impl ProfileUpdate {
    fn apply(self, user: &mut User) {
        if let Some(v) = self.first_name {
            user.first_name = v;
        }
        if let Some(v) = self.last_name {
            user.last_name = v;
        }
        if let Some(v) = self.username {
            user.username = v;
        }
        if let Some(v) = self.bio {
            user.bio = v;
        }
        if let Some(v) = self.interests {
            user.interests = v;
        }
        if let Some(v) = self.profile_picture {
            user.profile_picture = v;
        }
        if let Some(v) = self.looking_for {
            user.looking_for = v;
        }
        if let Some(v) = self.favorite_activities {
            user.favorite_activities = v;
        }
        if let Some(v) = self.availability {
            user.availability = v;
        }
    }
}

/// Account flags an admin may flip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminFlag {
    IsAdmin,
    IsDisabled,
}

impl FromStr for AdminFlag {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "isAdmin" => Ok(AdminFlag::IsAdmin),
            "isDisabled" => Ok(AdminFlag::IsDisabled),
            _ => Err(AppError::BadRequest("Invalid property".to_string())),
        }
    }
}

/// A newly created, unverified account.
#[derive(Debug, Clone)]
pub struct Registration {
    pub user_id: String,
    pub verification_url: String,
}

#[derive(Clone)]
pub struct AccountService {
    db: Arc<dyn Repository>,
    hasher: PasswordHasher,
    jwt_signing_key: Vec<u8>,
    public_api_url: String,
}

impl AccountService {
    pub fn new(db: Arc<dyn Repository>, config: &Config) -> Self {
        Self {
            db,
            hasher: PasswordHasher::new(config.password_hash_iterations),
            jwt_signing_key: config.jwt_signing_key.clone(),
            public_api_url: config.public_api_url.clone(),
        }
    }

    async fn load(&self, user_id: &str) -> Result<User> {
        self.db
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    /// Re-read, apply `edit`, and write back until the conditional write lands.
    async fn mutate<T, F>(&self, user_id: &str, mut edit: F) -> Result<(User, T)>
    where
        F: FnMut(&mut User) -> Result<T> + Send,
        T: Send,
    {
        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let mut user = self.load(user_id).await?;
            let expected = user.revision;

            let value = edit(&mut user)?;
            user.revision = expected + 1;

            match self.db.save_user(&user, expected).await? {
                WriteOutcome::Committed => return Ok((user, value)),
                WriteOutcome::Conflict => {
                    tracing::debug!(user_id, attempt, "User changed concurrently, retrying");
                }
                WriteOutcome::Missing => {
                    return Err(AppError::NotFound("User not found".to_string()));
                }
            }
        }

        tracing::warn!(
            user_id,
            attempts = MAX_WRITE_ATTEMPTS,
            "Giving up on user write after repeated conflicts"
        );
        Err(AppError::Conflict(
            "Profile was modified concurrently, please retry".to_string(),
        ))
    }

    async fn require_admin(&self, requester_id: &str) -> Result<()> {
        let requester = self.load(requester_id).await?;
        if requester.is_admin && !requester.is_disabled {
            Ok(())
        } else {
            tracing::debug!(requester_id, "Non-admin attempted admin operation");
            Err(AppError::Forbidden(
                "admin_required",
                "Admin access required".to_string(),
            ))
        }
    }

    // ─── Registration & Login ────────────────────────────────────

    pub async fn register(&self, request: RegisterRequest) -> Result<Registration> {
        request.validate()?;

        let email = request.email.trim().to_lowercase();
        let password_hash = self.hasher.hash(&request.password)?;
        let token = self.hasher.random_token()?;

        let mut user = User::new(
            self.db.new_id(),
            request.first_name,
            request.last_name,
            request.username,
            email,
            password_hash,
        );
        user.bio = request.bio;
        user.interests = request.interests;
        user.profile_picture = request.profile_picture;
        user.looking_for = request.looking_for;
        user.favorite_activities = request.favorite_activities;
        user.availability = request.availability;
        user.verification_token = Some(token.clone());
        user.verification_token_expires =
            Some(Utc::now() + Duration::hours(VERIFICATION_TOKEN_TTL_HOURS));

        if !self.db.create_user(&user).await? {
            tracing::debug!("Registration rejected for existing email");
            return Err(AppError::Conflict("Email already in use".to_string()));
        }

        tracing::info!(user_id = %user.id, "User registered");

        Ok(Registration {
            user_id: user.id,
            verification_url: format!("{}/api/users/verify/{}", self.public_api_url, token),
        })
    }

    pub async fn verify_email(&self, token: &str) -> Result<()> {
        let invalid = || AppError::BadRequest("Invalid or expired verification token".to_string());

        let user = self
            .db
            .find_user_by_verification_token(token)
            .await?
            .ok_or_else(invalid)?;

        let (user, ()) = self
            .mutate(&user.id, |user| {
                if !user.verification_token_valid(token, Utc::now()) {
                    return Err(invalid());
                }
                user.is_verified = true;
                user.verification_token = None;
                user.verification_token_expires = None;
                Ok(())
            })
            .await?;

        tracing::info!(user_id = %user.id, "Email verified");
        Ok(())
    }

    /// Check credentials and issue a session token.
    pub async fn login(&self, request: LoginRequest) -> Result<String> {
        let email = request.email.trim().to_lowercase();
        let user = self
            .db
            .find_user_by_email(&email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if !self.hasher.verify(&request.password, &user.password_hash) {
            tracing::debug!(user_id = %user.id, "Login with wrong password");
            return Err(AppError::InvalidCredentials);
        }
        if user.is_disabled {
            return Err(AppError::Forbidden(
                "account_disabled",
                "Account is disabled".to_string(),
            ));
        }
        if !user.is_verified {
            return Err(AppError::Forbidden(
                "email_not_verified",
                "Please verify your email before logging in".to_string(),
            ));
        }

        let token = create_jwt(&user, &self.jwt_signing_key)?;
        tracing::info!(user_id = %user.id, "User logged in");
        Ok(token)
    }

    pub async fn change_password(&self, user_id: &str, request: ChangePasswordRequest) -> Result<()> {
        request.validate()?;

        let current = self.load(user_id).await?;
        if !self
            .hasher
            .verify(&request.current_password, &current.password_hash)
        {
            return Err(AppError::BadRequest(
                "Current password is incorrect".to_string(),
            ));
        }
        let new_hash = self.hasher.hash(&request.new_password)?;

        let (_, ()) = self
            .mutate(user_id, |user| {
                // A concurrent change would invalidate the check above.
                if user.password_hash != current.password_hash {
                    return Err(AppError::Conflict(
                        "Password was changed concurrently".to_string(),
                    ));
                }
                user.password_hash = new_hash.clone();
                Ok(())
            })
            .await?;

        tracing::info!(user_id, "Password changed");
        Ok(())
    }

    // ─── Profiles ────────────────────────────────────────────────

    async fn view(&self, user: &User) -> Result<ProfileView> {
        let resolver = Resolver::load(self.db.as_ref(), profile_references(user)).await?;
        Ok(resolver.profile(user))
    }

    pub async fn get_profile(&self, user_id: &str) -> Result<ProfileView> {
        let user = self.load(user_id).await?;
        self.view(&user).await
    }

    pub async fn update_profile(&self, user_id: &str, update: ProfileUpdate) -> Result<ProfileView> {
        update.validate()?;

        let (user, ()) = self
            .mutate(user_id, |user| {
                update.clone().apply(user);
                Ok(())
            })
            .await?;

        tracing::info!(user_id, "Profile updated");
        self.view(&user).await
    }

    // ─── Admin ───────────────────────────────────────────────────

    pub async fn list_users(&self, requester_id: &str) -> Result<Vec<ProfileView>> {
        self.require_admin(requester_id).await?;

        let users = self.db.list_users().await?;
        let resolver = Resolver::from_users(&users);
        Ok(users.iter().map(|u| resolver.profile(u)).collect())
    }

    /// Flip `flag` on `user_id` and return the new value.
    pub async fn toggle_flag(&self, requester_id: &str, user_id: &str, flag: AdminFlag) -> Result<bool> {
        self.require_admin(requester_id).await?;

        let (_, value) = self
            .mutate(user_id, |user| {
                let field = match flag {
                    AdminFlag::IsAdmin => &mut user.is_admin,
                    AdminFlag::IsDisabled => &mut user.is_disabled,
                };
                *field = !*field;
                Ok(*field)
            })
            .await?;

        tracing::info!(requester_id, user_id, ?flag, value, "Account flag toggled");
        Ok(value)
    }
}
