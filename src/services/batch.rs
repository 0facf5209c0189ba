// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Batch meal-prep planning: one cooking session, several days of meals.

use crate::models::{BatchPlan, DayPlan, PrepTask};
use crate::services::ai_response::{
    clean_lines, lenient_opt_string, lenient_string, lenient_string_list, parse_json,
    require_text, AiResponseError,
};
use crate::services::llm::{CompletionOptions, PromptPair};
use crate::services::recipes::RawMacros;
use chrono::Utc;
use serde::Deserialize;

/// Batch plans are long; give the model room.
pub const BATCH_COMPLETION: CompletionOptions = CompletionOptions::json(0.6, 3000);

pub const MIN_DAYS: u32 = 1;
pub const MAX_DAYS: u32 = 7;

#[derive(Debug, Clone)]
pub struct BatchRequest {
    pub ingredients: Vec<String>,
    pub days: u32,
    pub servings: u32,
    pub dietary: Vec<String>,
    pub healthy_mode: bool,
}

const BATCH_SYSTEM_PROMPT: &str = r#"You are Chefini, a meal-prep planner. Design a plan where ALL cooking happens in one session (the build phase) and each following day only needs quick assembly or reheating (the runtime phase).
Answer with a single JSON object, no markdown, no commentary:
{
  "title": "<plan name>",
  "ingredients": ["<quantity and ingredient>"],
  "buildPhase": [{"task": "<prep task>", "duration": "<e.g. 20 mins>", "temperature": "<oven/stove setting or null>", "rationale": "<why this order or method>"}],
  "runtimePhase": [{"day": 1, "dish": "<dish name>", "instructions": ["<assembly/reheat step>"], "macros": {"calories": "", "protein": "", "carbs": "", "fats": ""}}],
  "storageTip": "<how to store components so they stay fresh>"
}
Order build tasks so oven and stove time overlap. Provide exactly one runtime entry per day."#;

pub fn build_prompt(request: &BatchRequest) -> PromptPair {
    let mut user = format!(
        "Plan {} day(s) of meals for {} serving(s) per meal.\nIngredients available: {}.\n",
        request.days,
        request.servings,
        request.ingredients.join(", ")
    );

    if !request.dietary.is_empty() {
        user.push_str(&format!(
            "Dietary requirements (must be respected): {}.\n",
            request.dietary.join(", ")
        ));
    }

    if request.healthy_mode {
        user.push_str("Healthy mode: balanced macros, plenty of vegetables, minimal oil and sugar.\n");
    }

    user.push_str("Vary the dishes across days so the same base doesn't get boring.");

    PromptPair {
        system: BATCH_SYSTEM_PROMPT.to_string(),
        user,
    }
}

#[derive(Deserialize)]
struct RawPrepTask {
    #[serde(default, alias = "step", deserialize_with = "lenient_string")]
    task: String,
    #[serde(default, alias = "time", deserialize_with = "lenient_string")]
    duration: String,
    #[serde(default, alias = "temp", deserialize_with = "lenient_opt_string")]
    temperature: Option<String>,
    #[serde(default, alias = "why", deserialize_with = "lenient_string")]
    rationale: String,
}

#[derive(Deserialize)]
struct RawDayPlan {
    #[serde(default)]
    day: Option<u32>,
    #[serde(default, alias = "title", alias = "meal", deserialize_with = "lenient_string")]
    dish: String,
    #[serde(default, alias = "steps", deserialize_with = "lenient_string_list")]
    instructions: Vec<String>,
    #[serde(default)]
    macros: Option<RawMacros>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBatchPlan {
    #[serde(default)]
    title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string_list")]
    ingredients: Vec<String>,
    #[serde(default, alias = "build_phase")]
    build_phase: Vec<RawPrepTask>,
    #[serde(default, alias = "runtime_phase")]
    runtime_phase: Vec<RawDayPlan>,
    #[serde(default, alias = "storage_tip", deserialize_with = "lenient_string")]
    storage_tip: String,
}

/// Parse and validate a batch plan answer into a plan owned by `owner_id`.
pub fn parse_plan(
    raw: &str,
    request: &BatchRequest,
    owner_id: &str,
) -> Result<BatchPlan, AiResponseError> {
    let parsed: RawBatchPlan = parse_json(raw)?;

    let build_phase: Vec<PrepTask> = parsed
        .build_phase
        .into_iter()
        .filter(|t| !t.task.trim().is_empty())
        .map(|t| PrepTask {
            task: t.task.trim().to_string(),
            duration: t.duration.trim().to_string(),
            temperature: t.temperature.map(|s| s.trim().to_string()),
            rationale: t.rationale.trim().to_string(),
        })
        .collect();
    if build_phase.is_empty() {
        return Err(AiResponseError::missing("buildPhase"));
    }

    let runtime_phase: Vec<DayPlan> = parsed
        .runtime_phase
        .into_iter()
        .filter(|d| !d.dish.trim().is_empty())
        .enumerate()
        .map(|(idx, d)| DayPlan {
            day: d.day.unwrap_or(idx as u32 + 1),
            dish: d.dish.trim().to_string(),
            instructions: clean_lines(d.instructions),
            macros: d.macros.unwrap_or_default().into(),
        })
        .collect();
    if runtime_phase.is_empty() {
        return Err(AiResponseError::missing("runtimePhase"));
    }

    let title = require_text(parsed.title, "title")
        .unwrap_or_else(|_| format!("{}-day batch prep", request.days));

    let ingredients = match clean_lines(parsed.ingredients) {
        list if list.is_empty() => request.ingredients.clone(),
        list => list,
    };

    Ok(BatchPlan {
        id: uuid::Uuid::new_v4().to_string(),
        owner_id: owner_id.to_string(),
        title,
        days: request.days,
        servings: request.servings,
        ingredients,
        build_phase,
        runtime_phase,
        storage_tip: parsed.storage_tip.trim().to_string(),
        created_at: Utc::now(),
    })
}
