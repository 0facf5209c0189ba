// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Avatar choices offered by the frontend.
pub const AVATAR_IDS: [&str; 8] = [
    "chef-1", "chef-2", "chef-3", "chef-4", "chef-5", "chef-6", "chef-7", "chef-8",
];

/// User profile stored in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// User ID (also used as document ID)
    pub id: String,
    pub name: String,
    /// Lowercased, unique across users
    pub email: String,
    /// bcrypt hash; None for accounts created through Google sign-in
    #[serde(default)]
    pub password_hash: Option<String>,
    /// Profile picture URL from the OAuth provider
    #[serde(default)]
    pub image: Option<String>,
    /// Chosen avatar ID (one of [`AVATAR_IDS`])
    #[serde(default)]
    pub avatar: Option<String>,
    /// Recipe IDs this user has liked
    #[serde(default)]
    pub liked_recipes: Vec<String>,
    /// Pending password-reset code, if any
    #[serde(default)]
    pub reset_otp: Option<ResetOtp>,
    pub created_at: DateTime<Utc>,
}

/// Hashed password-reset code and its expiry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetOtp {
    /// bcrypt hash of the 6-digit code
    pub hash: String,
    pub expires_at: DateTime<Utc>,
    /// Wrong codes submitted against this record
    #[serde(default)]
    pub failed_attempts: u32,
}

impl User {
    /// Build a new user with a fresh ID.
    pub fn new(name: &str, email: &str, password_hash: Option<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            email: normalize_email(email),
            password_hash,
            image: None,
            avatar: None,
            liked_recipes: Vec::new(),
            reset_otp: None,
            created_at: Utc::now(),
        }
    }

    pub fn has_password(&self) -> bool {
        self.password_hash.is_some()
    }

    pub fn has_liked(&self, recipe_id: &str) -> bool {
        self.liked_recipes.iter().any(|id| id == recipe_id)
    }
}

/// Emails are compared and stored lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
