// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer.
//!
//! Handlers talk to a [`Store`]; production uses [`FirestoreDb`], tests and
//! local development use [`MemoryDb`].

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryDb;

use crate::error::AppError;
use crate::models::{BatchPlan, LikeOutcome, Recipe, ResetOtp, ShoppingList, User};
use crate::time_utils::{format_utc_rfc3339, parse_utc_rfc3339};
use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    /// Email → user ID index (enforces email uniqueness)
    pub const USER_EMAILS: &str = "user_emails";
    pub const RECIPES: &str = "recipes";
    /// Keyed by user ID
    pub const SHOPPING_LISTS: &str = "shopping_lists";
    pub const BATCH_PLANS: &str = "batch_plans";
}

/// Position in the public feed (newest first).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedCursor {
    pub created_at: DateTime<Utc>,
    pub recipe_id: String,
}

impl FeedCursor {
    pub fn after(recipe: &Recipe) -> Self {
        Self {
            created_at: recipe.created_at,
            recipe_id: recipe.id.clone(),
        }
    }

    /// Whether `recipe` sorts strictly after this cursor in feed order.
    pub fn admits(&self, recipe: &Recipe) -> bool {
        (recipe.created_at, recipe.id.as_str()) < (self.created_at, self.recipe_id.as_str())
    }

    /// Opaque token handed to clients.
    pub fn encode(&self) -> String {
        URL_SAFE_NO_PAD.encode(format!(
            "{}|{}",
            format_utc_rfc3339(self.created_at),
            self.recipe_id
        ))
    }

    /// Parse a client-supplied token; None if it was not produced by [`encode`](Self::encode).
    pub fn decode(token: &str) -> Option<Self> {
        let bytes = URL_SAFE_NO_PAD.decode(token.trim()).ok()?;
        let text = String::from_utf8(bytes).ok()?;
        let (created_at, recipe_id) = text.split_once('|')?;
        if recipe_id.is_empty() {
            return None;
        }
        Some(Self {
            created_at: parse_utc_rfc3339(created_at)?,
            recipe_id: recipe_id.to_string(),
        })
    }
}

/// Document store operations used by the API.
///
/// Every operation that touches more than one document is atomic.
#[async_trait]
pub trait Store: Send + Sync {
    // ─── Users ───────────────────────────────────────────────

    /// Insert a new user. Fails with `Conflict` if the email is taken.
    async fn create_user(&self, user: &User) -> Result<(), AppError>;

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError>;

    /// Look up a user by (already normalized) email.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// Write the profile fields (`name`, `avatar`, `image`) of an existing user.
    async fn update_profile(&self, user: &User) -> Result<(), AppError>;

    async fn set_password(&self, user_id: &str, password_hash: &str) -> Result<(), AppError>;

    /// Store or clear the pending reset code.
    async fn set_reset_otp(&self, user_id: &str, otp: Option<&ResetOtp>)
        -> Result<(), AppError>;

    /// Replace the password and clear the reset code, but only if the stored
    /// reset code hash still equals `otp_hash`. Returns false otherwise.
    async fn consume_reset_otp(
        &self,
        user_id: &str,
        otp_hash: &str,
        new_password_hash: &str,
    ) -> Result<bool, AppError>;

    /// Count one wrong guess against the reset code whose hash is
    /// `otp_hash`. Returns the new count, or None if that code is gone.
    async fn record_reset_failure(
        &self,
        user_id: &str,
        otp_hash: &str,
    ) -> Result<Option<u32>, AppError>;

    // ─── Recipes ─────────────────────────────────────────────

    async fn insert_recipe(&self, recipe: &Recipe) -> Result<(), AppError>;

    async fn get_recipe(&self, recipe_id: &str) -> Result<Option<Recipe>, AppError>;

    /// All recipes owned by a user, newest first.
    async fn list_recipes_for_owner(&self, owner_id: &str) -> Result<Vec<Recipe>, AppError>;

    /// Public recipes, newest first, strictly after `cursor`.
    async fn list_public_recipes(
        &self,
        cursor: Option<&FeedCursor>,
        limit: u32,
    ) -> Result<Vec<Recipe>, AppError>;

    /// Change visibility of a recipe owned by `owner_id`.
    /// Returns the updated recipe, or None if absent or not owned.
    async fn set_recipe_visibility(
        &self,
        recipe_id: &str,
        owner_id: &str,
        is_public: bool,
    ) -> Result<Option<Recipe>, AppError>;

    /// Delete a recipe owned by `owner_id`. Returns false if absent or not owned.
    async fn delete_recipe(&self, recipe_id: &str, owner_id: &str) -> Result<bool, AppError>;

    /// Atomically toggle `user_id`'s like on a recipe, updating both the
    /// user's liked list and the recipe's counter.
    /// Returns None if the user or recipe does not exist.
    async fn toggle_like(
        &self,
        user_id: &str,
        recipe_id: &str,
    ) -> Result<Option<LikeOutcome>, AppError>;

    /// Drop `recipe_id` from the user's liked list without touching any
    /// recipe. Returns false if the user is missing or never liked it.
    async fn forget_like(&self, user_id: &str, recipe_id: &str) -> Result<bool, AppError>;

    // ─── Shopping lists ──────────────────────────────────────

    async fn get_shopping_list(&self, user_id: &str) -> Result<Option<ShoppingList>, AppError>;

    async fn put_shopping_list(&self, list: &ShoppingList) -> Result<(), AppError>;

    async fn delete_shopping_list(&self, user_id: &str) -> Result<(), AppError>;

    // ─── Batch plans ─────────────────────────────────────────

    async fn insert_batch_plan(&self, plan: &BatchPlan) -> Result<(), AppError>;

    async fn get_batch_plan(&self, plan_id: &str) -> Result<Option<BatchPlan>, AppError>;

    /// All plans owned by a user, newest first.
    async fn list_batch_plans(&self, owner_id: &str) -> Result<Vec<BatchPlan>, AppError>;

    /// Delete a plan owned by `owner_id`. Returns false if absent or not owned.
    async fn delete_batch_plan(&self, plan_id: &str, owner_id: &str) -> Result<bool, AppError>;
}

/// Apply a like toggle to in-memory copies of both documents.
///
/// Shared by the store implementations so both agree on the rules.
pub(crate) fn apply_like_toggle(user: &mut User, recipe: &mut Recipe) -> LikeOutcome {
    let liked = if user.has_liked(&recipe.id) {
        user.liked_recipes.retain(|id| id != &recipe.id);
        recipe.likes = recipe.likes.saturating_sub(1);
        false
    } else {
        user.liked_recipes.push(recipe.id.clone());
        recipe.likes = recipe.likes.saturating_add(1);
        true
    };

    LikeOutcome {
        liked,
        likes: recipe.likes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_feed_cursor_token() {
        let cursor = FeedCursor {
            created_at: Utc.timestamp_opt(1_760_000_000, 5_000).unwrap(),
            recipe_id: "r-42".to_string(),
        };
        let token = cursor.encode();
        assert!(!token.contains('|'));
        assert_eq!(FeedCursor::decode(&token), Some(cursor));
    }

    #[test]
    fn test_feed_cursor_rejects_tampering() {
        assert_eq!(FeedCursor::decode("!!!"), None);
        assert_eq!(FeedCursor::decode(&URL_SAFE_NO_PAD.encode("no-separator")), None);
        assert_eq!(FeedCursor::decode(&URL_SAFE_NO_PAD.encode("yesterday|r1")), None);
    }
}
