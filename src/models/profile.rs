// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Summary profile shape and user references as returned by the API.

use serde::{Deserialize, Serialize};

use super::{User, UserId};

/// The subset of a profile shown wherever another user is referenced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub profile_picture: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            username: user.username.clone(),
            profile_picture: user.profile_picture.clone(),
        }
    }
}

/// A reference to a user, either resolved to a summary or left as a bare id
/// when the referenced document no longer exists.
///
/// Serialized with an explicit `kind` tag so clients never have to guess.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UserRef {
    Reference { id: UserId },
    Resolved(UserSummary),
}

impl UserRef {
    pub fn id(&self) -> &str {
        match self {
            UserRef::Reference { id } => id,
            UserRef::Resolved(summary) => &summary.id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_ref_is_tagged() {
        let bare = serde_json::to_value(UserRef::Reference {
            id: "u1".to_string(),
        })
        .unwrap();
        assert_eq!(bare["kind"], "reference");
        assert_eq!(bare["id"], "u1");

        let resolved = serde_json::to_value(UserRef::Resolved(UserSummary {
            id: "u2".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            username: "ada".to_string(),
            profile_picture: String::new(),
        }))
        .unwrap();
        assert_eq!(resolved["kind"], "resolved");
        assert_eq!(resolved["firstName"], "Ada");
    }
}
