// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Recipe model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// One ingredient line of a recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RecipeIngredient {
    pub item: String,
    /// True if the user did not list this ingredient
    pub missing: bool,
}

/// Macro totals for a recipe or dish.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Macros {
    #[serde(default)]
    pub calories: String,
    #[serde(default)]
    pub protein: String,
    #[serde(default)]
    pub carbs: String,
    #[serde(default)]
    pub fats: String,
}

/// Recipe stored in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Recipe {
    /// Recipe ID (also used as document ID)
    pub id: String,
    pub title: String,
    /// Human-readable time estimate ("25 mins")
    pub time: String,
    pub ingredients: Vec<RecipeIngredient>,
    pub instructions: Vec<String>,
    pub macros: Macros,
    pub magic_tip: String,
    /// Owning user ID
    pub owner_id: String,
    pub is_public: bool,
    pub likes: u32,
    #[serde(with = "crate::time_utils::sortable_rfc3339")]
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub created_at: DateTime<Utc>,
    /// Source recipe ID when saved from the public feed
    #[serde(default)]
    pub copied_from: Option<String>,
}

impl Recipe {
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.owner_id == user_id
    }

    /// Whether `user_id` may read (and like) this recipe.
    pub fn is_visible_to(&self, user_id: &str) -> bool {
        self.is_public || self.is_owned_by(user_id)
    }

    /// Copy this recipe into another user's cookbook.
    pub fn copy_for(&self, owner_id: &str) -> Recipe {
        Recipe {
            id: uuid::Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            is_public: false,
            likes: 0,
            created_at: Utc::now(),
            copied_from: Some(self.id.clone()),
            ..self.clone()
        }
    }
}

/// Result of a like/unlike toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LikeOutcome {
    /// Like state after the toggle
    pub liked: bool,
    /// Recipe like count after the toggle
    pub likes: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Recipe {
        Recipe {
            id: "r1".to_string(),
            title: "Egg Fried Rice".to_string(),
            time: "15 mins".to_string(),
            ingredients: vec![RecipeIngredient {
                item: "2 cups rice".to_string(),
                missing: false,
            }],
            instructions: vec!["Fry it".to_string()],
            macros: Macros::default(),
            magic_tip: "Use day-old rice".to_string(),
            owner_id: "alice".to_string(),
            is_public: true,
            likes: 7,
            created_at: Utc::now(),
            copied_from: None,
        }
    }

    #[test]
    fn test_copy_for_resets_ownership_and_likes() {
        let copy = sample().copy_for("bob");
        assert_ne!(copy.id, "r1");
        assert_eq!(copy.owner_id, "bob");
        assert!(!copy.is_public);
        assert_eq!(copy.likes, 0);
        assert_eq!(copy.copied_from.as_deref(), Some("r1"));
        assert_eq!(copy.title, "Egg Fried Rice");
    }

    #[test]
    fn test_visibility() {
        let mut recipe = sample();
        assert!(recipe.is_visible_to("bob"));
        recipe.is_public = false;
        assert!(!recipe.is_visible_to("bob"));
        assert!(recipe.is_visible_to("alice"));
    }
}
