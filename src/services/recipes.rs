// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! AI recipe generation: prompt construction and answer parsing.

use crate::models::{Macros, Recipe, RecipeIngredient};
use crate::services::ai_response::{
    clean_lines, lenient_string, lenient_string_list, parse_json, require_text, AiResponseError,
};
use crate::services::llm::{CompletionOptions, PromptPair};
use chrono::Utc;
use serde::Deserialize;

/// Sampling settings for recipe generation.
pub const RECIPE_COMPLETION: CompletionOptions = CompletionOptions::json(0.7, 1500);

/// What the user asked for.
#[derive(Debug, Clone, Default)]
pub struct RecipeRequest {
    pub ingredients: Vec<String>,
    pub dietary: Vec<String>,
    pub healthy_mode: bool,
    pub allow_staples: bool,
}

/// A validated recipe from the model, not yet owned by anyone.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedRecipe {
    pub title: String,
    pub time: String,
    pub ingredients: Vec<RecipeIngredient>,
    pub instructions: Vec<String>,
    pub macros: Macros,
    pub magic_tip: String,
}

impl GeneratedRecipe {
    /// Turn into a private cookbook recipe for `owner_id`.
    pub fn into_recipe(self, owner_id: &str) -> Recipe {
        Recipe {
            id: uuid::Uuid::new_v4().to_string(),
            title: self.title,
            time: self.time,
            ingredients: self.ingredients,
            instructions: self.instructions,
            macros: self.macros,
            magic_tip: self.magic_tip,
            owner_id: owner_id.to_string(),
            is_public: false,
            likes: 0,
            created_at: Utc::now(),
            copied_from: None,
        }
    }
}

const RECIPE_SYSTEM_PROMPT: &str = r#"You are Chefini, a resourceful home chef who turns leftovers into delicious meals.
Create exactly ONE recipe and answer with a single JSON object, no markdown, no commentary:
{
  "title": "<creative dish name>",
  "time": "<total time, e.g. \"25 mins\">",
  "ingredients": [{"item": "<quantity and ingredient>", "missing": <true if not in the user's list>}],
  "instructions": ["<step 1>", "<step 2>"],
  "macros": {"calories": "<per serving>", "protein": "<grams>", "carbs": "<grams>", "fats": "<grams>"},
  "magicTip": "<one chef's secret that elevates the dish>"
}
Keep instructions concise and ordered. Never include anything that is not food."#;

/// Build the prompt pair for a recipe request.
pub fn build_prompt(request: &RecipeRequest) -> PromptPair {
    let mut user = format!(
        "Ingredients I have: {}.\n",
        request.ingredients.join(", ")
    );

    if !request.dietary.is_empty() {
        user.push_str(&format!(
            "Dietary requirements (must be respected): {}.\n",
            request.dietary.join(", ")
        ));
    }

    if request.healthy_mode {
        user.push_str(
            "Healthy mode: favour lean protein and vegetables, minimal oil and sugar, \
             and keep the dish under 600 calories per serving.\n",
        );
    }

    if request.allow_staples {
        user.push_str(
            "You may also use common pantry staples (salt, pepper, oil, water, basic spices).\n",
        );
    } else {
        user.push_str(
            "Use only the ingredients I listed. If something else is unavoidable, \
             keep it to a minimum and mark it as missing.\n",
        );
    }

    user.push_str("Make the most of what I have and keep it practical for a home kitchen.");

    PromptPair {
        system: RECIPE_SYSTEM_PROMPT.to_string(),
        user,
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawIngredient {
    Text(String),
    Object {
        #[serde(alias = "name", alias = "ingredient")]
        item: String,
    },
}

impl RawIngredient {
    fn into_text(self) -> String {
        match self {
            RawIngredient::Text(text) => text,
            RawIngredient::Object { item } => item,
        }
    }
}

/// Macro totals as the model sends them.
#[derive(Deserialize, Default)]
pub(crate) struct RawMacros {
    #[serde(default, deserialize_with = "lenient_string")]
    calories: String,
    #[serde(default, deserialize_with = "lenient_string")]
    protein: String,
    #[serde(default, deserialize_with = "lenient_string")]
    carbs: String,
    #[serde(default, alias = "fat", deserialize_with = "lenient_string")]
    fats: String,
}

impl From<RawMacros> for Macros {
    fn from(raw: RawMacros) -> Self {
        Macros {
            calories: raw.calories.trim().to_string(),
            protein: raw.protein.trim().to_string(),
            carbs: raw.carbs.trim().to_string(),
            fats: raw.fats.trim().to_string(),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRecipe {
    #[serde(default)]
    title: Option<String>,
    #[serde(default, alias = "cookingTime", deserialize_with = "lenient_string")]
    time: String,
    #[serde(default)]
    ingredients: Vec<RawIngredient>,
    #[serde(default, alias = "steps", deserialize_with = "lenient_string_list")]
    instructions: Vec<String>,
    #[serde(default)]
    macros: Option<RawMacros>,
    #[serde(default, alias = "magic_tip", alias = "tip", deserialize_with = "lenient_string")]
    magic_tip: String,
}

/// Parse and validate a recipe answer, marking ingredients the user lacks.
pub fn parse_recipe(raw: &str, available: &[String]) -> Result<GeneratedRecipe, AiResponseError> {
    let parsed: RawRecipe = parse_json(raw)?;

    let title = require_text(parsed.title, "title")?;

    let ingredient_texts = clean_lines(
        parsed
            .ingredients
            .into_iter()
            .map(RawIngredient::into_text)
            .collect(),
    );
    if ingredient_texts.is_empty() {
        return Err(AiResponseError::missing("ingredients"));
    }

    let instructions = clean_lines(parsed.instructions);
    if instructions.is_empty() {
        return Err(AiResponseError::missing("instructions"));
    }

    Ok(GeneratedRecipe {
        title,
        time: parsed.time.trim().to_string(),
        ingredients: mark_missing(ingredient_texts, available),
        instructions,
        macros: parsed.macros.unwrap_or_default().into(),
        magic_tip: parsed.magic_tip.trim().to_string(),
    })
}

/// Flag every ingredient that does not contain one of the user's
/// ingredients as a (case-insensitive) substring.
pub fn mark_missing(items: Vec<String>, available: &[String]) -> Vec<RecipeIngredient> {
    let available: Vec<String> = available
        .iter()
        .map(|a| a.trim().to_lowercase())
        .filter(|a| !a.is_empty())
        .collect();

    items
        .into_iter()
        .map(|item| {
            let lowered = item.to_lowercase();
            let have = available.iter().any(|a| lowered.contains(a.as_str()));
            RecipeIngredient {
                item,
                missing: !have,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn have(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_mark_missing_by_substring() {
        let marked = mark_missing(
            have(&["2 cups cooked Rice", "3 eggs", "1 tbsp soy sauce", "Spring onion"]),
            &have(&["rice", " EGG "]),
        );
        let flags: Vec<bool> = marked.iter().map(|i| i.missing).collect();
        assert_eq!(flags, vec![false, false, true, true]);
        assert_eq!(marked[0].item, "2 cups cooked Rice");
    }

    #[test]
    fn test_parse_recipe_overrides_model_missing_flags() {
        let raw = r#"```json
        {
          "title": "Egg Fried Rice",
          "time": 15,
          "ingredients": [
            {"item": "2 cups rice", "missing": true},
            "2 eggs",
            {"name": "soy sauce", "missing": false}
          ],
          "instructions": ["Scramble eggs", "Add rice", "  "],
          "macros": {"calories": 520, "protein": "18g", "carbs": "70g", "fat": "16g"},
          "magicTip": "Use cold rice"
        }
        ```"#;

        let recipe = parse_recipe(raw, &have(&["rice", "egg"])).unwrap();
        assert_eq!(recipe.title, "Egg Fried Rice");
        assert_eq!(recipe.time, "15");
        assert_eq!(
            recipe.ingredients,
            vec![
                RecipeIngredient {
                    item: "2 cups rice".to_string(),
                    missing: false
                },
                RecipeIngredient {
                    item: "2 eggs".to_string(),
                    missing: false
                },
                RecipeIngredient {
                    item: "soy sauce".to_string(),
                    missing: true
                },
            ]
        );
        assert_eq!(recipe.instructions.len(), 2);
        assert_eq!(recipe.macros.calories, "520");
        assert_eq!(recipe.macros.fats, "16g");
        assert_eq!(recipe.magic_tip, "Use cold rice");
    }

    #[test]
    fn test_parse_recipe_requires_fields() {
        let no_title = r#"{"ingredients": ["rice"], "instructions": ["cook"]}"#;
        assert_eq!(
            parse_recipe(no_title, &[]),
            Err(AiResponseError::missing("title"))
        );

        let no_ingredients = r#"{"title": "X", "ingredients": [], "instructions": ["cook"]}"#;
        assert_eq!(
            parse_recipe(no_ingredients, &[]),
            Err(AiResponseError::missing("ingredients"))
        );

        let no_steps = r#"{"title": "X", "ingredients": ["rice"]}"#;
        assert_eq!(
            parse_recipe(no_steps, &[]),
            Err(AiResponseError::missing("instructions"))
        );
    }

    #[test]
    fn test_parse_recipe_rejects_non_json() {
        assert!(matches!(
            parse_recipe("I'd love to help! Try making fried rice.", &[]),
            Err(AiResponseError::Parse(_))
        ));
    }

    #[test]
    fn test_build_prompt_reflects_options() {
        let request = RecipeRequest {
            ingredients: have(&["rice", "egg"]),
            dietary: have(&["vegetarian"]),
            healthy_mode: true,
            allow_staples: false,
        };
        let prompt = build_prompt(&request);
        assert!(prompt.system.contains("\"magicTip\""));
        assert!(prompt.user.contains("rice, egg"));
        assert!(prompt.user.contains("vegetarian"));
        assert!(prompt.user.contains("Healthy mode"));
        assert!(prompt.user.contains("Use only the ingredients I listed"));

        let relaxed = build_prompt(&RecipeRequest {
            allow_staples: true,
            ..request
        });
        assert!(relaxed.user.contains("pantry staples"));
        assert!(!relaxed.user.contains("Use only"));
    }
}
