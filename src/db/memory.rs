// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process document store.
//!
//! Backs the integration tests and `STORE_BACKEND=memory` local runs.
//! Multi-document operations hold entry locks in a fixed order
//! (users before recipes) so they are atomic and cannot deadlock.

use super::{apply_like_toggle, FeedCursor, Store};
use crate::error::AppError;
use crate::models::{BatchPlan, LikeOutcome, Recipe, ResetOtp, ShoppingList, User};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// Document store backed by concurrent hash maps.
#[derive(Default)]
pub struct MemoryDb {
    users: DashMap<String, User>,
    /// Normalized email → user ID
    user_emails: DashMap<String, String>,
    recipes: DashMap<String, Recipe>,
    shopping_lists: DashMap<String, ShoppingList>,
    batch_plans: DashMap<String, BatchPlan>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    fn missing_user(user_id: &str) -> AppError {
        AppError::NotFound(format!("User {} not found", user_id))
    }
}

fn newest_first<T, F>(items: &mut [T], key: F)
where
    F: Fn(&T) -> (chrono::DateTime<chrono::Utc>, String),
{
    items.sort_by_key(|item| std::cmp::Reverse(key(item)));
}

#[async_trait]
impl Store for MemoryDb {
    // ─── Users ───────────────────────────────────────────────

    async fn create_user(&self, user: &User) -> Result<(), AppError> {
        match self.user_emails.entry(user.email.clone()) {
            Entry::Occupied(_) => Err(AppError::Conflict(
                "An account with this email already exists".to_string(),
            )),
            Entry::Vacant(slot) => {
                self.users.insert(user.id.clone(), user.clone());
                slot.insert(user.id.clone());
                Ok(())
            }
        }
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        Ok(self.users.get(user_id).map(|u| u.clone()))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let Some(user_id) = self.user_emails.get(email).map(|id| id.clone()) else {
            return Ok(None);
        };
        self.get_user(&user_id).await
    }

    async fn update_profile(&self, user: &User) -> Result<(), AppError> {
        let mut stored = self
            .users
            .get_mut(&user.id)
            .ok_or_else(|| Self::missing_user(&user.id))?;
        stored.name = user.name.clone();
        stored.avatar = user.avatar.clone();
        stored.image = user.image.clone();
        Ok(())
    }

    async fn set_password(&self, user_id: &str, password_hash: &str) -> Result<(), AppError> {
        let mut stored = self
            .users
            .get_mut(user_id)
            .ok_or_else(|| Self::missing_user(user_id))?;
        stored.password_hash = Some(password_hash.to_string());
        Ok(())
    }

    async fn set_reset_otp(
        &self,
        user_id: &str,
        otp: Option<&ResetOtp>,
    ) -> Result<(), AppError> {
        let mut stored = self
            .users
            .get_mut(user_id)
            .ok_or_else(|| Self::missing_user(user_id))?;
        stored.reset_otp = otp.cloned();
        Ok(())
    }

    async fn consume_reset_otp(
        &self,
        user_id: &str,
        otp_hash: &str,
        new_password_hash: &str,
    ) -> Result<bool, AppError> {
        let Some(mut stored) = self.users.get_mut(user_id) else {
            return Ok(false);
        };
        let matches = stored
            .reset_otp
            .as_ref()
            .is_some_and(|otp| otp.hash == otp_hash);
        if !matches {
            return Ok(false);
        }
        stored.reset_otp = None;
        stored.password_hash = Some(new_password_hash.to_string());
        Ok(true)
    }

    async fn record_reset_failure(
        &self,
        user_id: &str,
        otp_hash: &str,
    ) -> Result<Option<u32>, AppError> {
        let Some(mut stored) = self.users.get_mut(user_id) else {
            return Ok(None);
        };
        Ok(stored
            .reset_otp
            .as_mut()
            .filter(|otp| otp.hash == otp_hash)
            .map(|otp| {
                otp.failed_attempts = otp.failed_attempts.saturating_add(1);
                otp.failed_attempts
            }))
    }

    // ─── Recipes ─────────────────────────────────────────────

    async fn insert_recipe(&self, recipe: &Recipe) -> Result<(), AppError> {
        self.recipes.insert(recipe.id.clone(), recipe.clone());
        Ok(())
    }

    async fn get_recipe(&self, recipe_id: &str) -> Result<Option<Recipe>, AppError> {
        Ok(self.recipes.get(recipe_id).map(|r| r.clone()))
    }

    async fn list_recipes_for_owner(&self, owner_id: &str) -> Result<Vec<Recipe>, AppError> {
        let mut recipes: Vec<Recipe> = self
            .recipes
            .iter()
            .filter(|r| r.owner_id == owner_id)
            .map(|r| r.clone())
            .collect();
        newest_first(&mut recipes, |r| (r.created_at, r.id.clone()));
        Ok(recipes)
    }

    async fn list_public_recipes(
        &self,
        cursor: Option<&FeedCursor>,
        limit: u32,
    ) -> Result<Vec<Recipe>, AppError> {
        let mut recipes: Vec<Recipe> = self
            .recipes
            .iter()
            .filter(|r| r.is_public)
            .filter(|r| cursor.map_or(true, |c| c.admits(r)))
            .map(|r| r.clone())
            .collect();
        newest_first(&mut recipes, |r| (r.created_at, r.id.clone()));
        recipes.truncate(limit as usize);
        Ok(recipes)
    }

    async fn set_recipe_visibility(
        &self,
        recipe_id: &str,
        owner_id: &str,
        is_public: bool,
    ) -> Result<Option<Recipe>, AppError> {
        let Some(mut recipe) = self.recipes.get_mut(recipe_id) else {
            return Ok(None);
        };
        if !recipe.is_owned_by(owner_id) {
            return Ok(None);
        }
        recipe.is_public = is_public;
        Ok(Some(recipe.clone()))
    }

    async fn delete_recipe(&self, recipe_id: &str, owner_id: &str) -> Result<bool, AppError> {
        Ok(self
            .recipes
            .remove_if(recipe_id, |_, r| r.is_owned_by(owner_id))
            .is_some())
    }

    async fn toggle_like(
        &self,
        user_id: &str,
        recipe_id: &str,
    ) -> Result<Option<LikeOutcome>, AppError> {
        let Some(mut user) = self.users.get_mut(user_id) else {
            return Ok(None);
        };
        let Some(mut recipe) = self.recipes.get_mut(recipe_id) else {
            return Ok(None);
        };
        Ok(Some(apply_like_toggle(&mut user, &mut recipe)))
    }

    async fn forget_like(&self, user_id: &str, recipe_id: &str) -> Result<bool, AppError> {
        let Some(mut user) = self.users.get_mut(user_id) else {
            return Ok(false);
        };
        let before = user.liked_recipes.len();
        user.liked_recipes.retain(|id| id != recipe_id);
        Ok(user.liked_recipes.len() != before)
    }

    // ─── Shopping lists ──────────────────────────────────────

    async fn get_shopping_list(&self, user_id: &str) -> Result<Option<ShoppingList>, AppError> {
        Ok(self.shopping_lists.get(user_id).map(|l| l.clone()))
    }

    async fn put_shopping_list(&self, list: &ShoppingList) -> Result<(), AppError> {
        self.shopping_lists
            .insert(list.user_id.clone(), list.clone());
        Ok(())
    }

    async fn delete_shopping_list(&self, user_id: &str) -> Result<(), AppError> {
        self.shopping_lists.remove(user_id);
        Ok(())
    }

    // ─── Batch plans ─────────────────────────────────────────

    async fn insert_batch_plan(&self, plan: &BatchPlan) -> Result<(), AppError> {
        self.batch_plans.insert(plan.id.clone(), plan.clone());
        Ok(())
    }

    async fn get_batch_plan(&self, plan_id: &str) -> Result<Option<BatchPlan>, AppError> {
        Ok(self.batch_plans.get(plan_id).map(|p| p.clone()))
    }

    async fn list_batch_plans(&self, owner_id: &str) -> Result<Vec<BatchPlan>, AppError> {
        let mut plans: Vec<BatchPlan> = self
            .batch_plans
            .iter()
            .filter(|p| p.owner_id == owner_id)
            .map(|p| p.clone())
            .collect();
        newest_first(&mut plans, |p| (p.created_at, p.id.clone()));
        Ok(plans)
    }

    async fn delete_batch_plan(&self, plan_id: &str, owner_id: &str) -> Result<bool, AppError> {
        Ok(self
            .batch_plans
            .remove_if(plan_id, |_, p| p.is_owned_by(owner_id))
            .is_some())
    }
}
