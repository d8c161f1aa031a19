//! User model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::UserId;

/// User document stored in Firestore.
///
/// The five edge sets hold user ids. Symmetry between two documents
/// (`friends`, `friend_requests`/`sent_friend_requests`, `followers`/`following`)
/// is maintained by [`crate::rules::social_graph`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Document ID
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    /// PBKDF2 credential string (see `services::password`)
    pub password_hash: String,

    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub is_disabled: bool,
    #[serde(default)]
    pub verification_token: Option<String>,
    #[serde(default)]
    pub verification_token_expires: Option<DateTime<Utc>>,

    // ─── Profile ─────────────────────────────────────────────────
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub interests: Vec<String>,
    /// URL or data URI
    #[serde(default)]
    pub profile_picture: String,
    /// e.g. "New Friends", "Activity Partners"
    #[serde(default)]
    pub looking_for: String,
    #[serde(default)]
    pub favorite_activities: Vec<String>,
    /// e.g. "Weekends", "Evenings"
    #[serde(default)]
    pub availability: String,

    // ─── Social edges ────────────────────────────────────────────
    #[serde(default)]
    pub followers: BTreeSet<UserId>,
    #[serde(default)]
    pub following: BTreeSet<UserId>,
    #[serde(default)]
    pub friends: BTreeSet<UserId>,
    /// Incoming, unaccepted
    #[serde(default)]
    pub friend_requests: BTreeSet<UserId>,
    /// Outgoing, unaccepted
    #[serde(default)]
    pub sent_friend_requests: BTreeSet<UserId>,

    pub created_at: DateTime<Utc>,
    /// Bumped on every write; used for conditional updates.
    #[serde(default)]
    pub revision: u64,
}

impl User {
    /// A fresh, unverified account with empty profile and no edges.
    pub fn new(
        id: UserId,
        first_name: String,
        last_name: String,
        username: String,
        email: String,
        password_hash: String,
    ) -> Self {
        Self {
            id,
            first_name,
            last_name,
            username,
            email,
            password_hash,
            is_verified: false,
            is_admin: false,
            is_disabled: false,
            verification_token: None,
            verification_token_expires: None,
            bio: String::new(),
            interests: Vec::new(),
            profile_picture: String::new(),
            looking_for: String::new(),
            favorite_activities: Vec::new(),
            availability: String::new(),
            followers: BTreeSet::new(),
            following: BTreeSet::new(),
            friends: BTreeSet::new(),
            friend_requests: BTreeSet::new(),
            sent_friend_requests: BTreeSet::new(),
            created_at: Utc::now(),
            revision: 0,
        }
    }

    /// Whether the stored verification token matches and has not expired.
    pub fn verification_token_valid(&self, token: &str, now: DateTime<Utc>) -> bool {
        match (&self.verification_token, self.verification_token_expires) {
            (Some(stored), Some(expires)) => stored == token && expires > now,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn user() -> User {
        User::new(
            "u1".to_string(),
            "Ada".to_string(),
            "Lovelace".to_string(),
            "ada".to_string(),
            "ada@example.com".to_string(),
            "hash".to_string(),
        )
    }

    #[test]
    fn test_verification_token_expiry() {
        let now = Utc::now();
        let mut u = user();
        assert!(!u.verification_token_valid("abc", now));

        u.verification_token = Some("abc".to_string());
        u.verification_token_expires = Some(now + Duration::hours(24));
        assert!(u.verification_token_valid("abc", now));
        assert!(!u.verification_token_valid("abd", now));
        assert!(!u.verification_token_valid("abc", now + Duration::hours(25)));
    }

    #[test]
    fn test_missing_edge_fields_default_to_empty() {
        let json = serde_json::json!({
            "id": "u2",
            "firstName": "Grace",
            "lastName": "Hopper",
            "username": "grace",
            "email": "grace@example.com",
            "passwordHash": "hash",
            "createdAt": "2025-01-01T00:00:00Z"
        });

        let u: User = serde_json::from_value(json).unwrap();
        assert!(u.friends.is_empty());
        assert!(u.sent_friend_requests.is_empty());
        assert!(!u.is_verified);
        assert_eq!(u.revision, 0);
    }
}
