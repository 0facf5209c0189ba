// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! AI routes: recipe generation, flavor debugger and input validation.

use crate::error::Result;
use crate::extract::ApiJson;
use crate::middleware::auth::AuthUser;
use crate::models::Recipe;
use crate::services::content_check::{self, ContentVerdict};
use crate::services::flavor::{self, FlavorDiagnosis, FLAVOR_COMPLETION};
use crate::services::recipes::{self, RecipeRequest, RECIPE_COMPLETION};
use crate::AppState;
use axum::{extract::State, http::StatusCode, routing::post, Extension, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::{Validate, ValidationError};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/generate", post(generate_recipe))
        .route("/api/ai/flavor-debug", post(flavor_debug))
        .route("/api/ai/validate", post(validate_content))
}

pub const MAX_INGREDIENT_CHARS: usize = 60;

pub(crate) const SAVE_FAILED_WARNING: &str =
    "Generated successfully, but it could not be saved. Copy it before leaving this page.";

/// Every ingredient non-blank and at most [`MAX_INGREDIENT_CHARS`] long.
pub(crate) fn validate_ingredient_items(items: &[String]) -> std::result::Result<(), ValidationError> {
    if items.iter().any(|item| item.trim().is_empty()) {
        return Err(ValidationError::new("blank_ingredient")
            .with_message("Ingredients must not be blank".into()));
    }
    validate_item_lengths(items)
}

/// Every item at most [`MAX_INGREDIENT_CHARS`] long after trimming.
pub(crate) fn validate_item_lengths(items: &[String]) -> std::result::Result<(), ValidationError> {
    if items
        .iter()
        .any(|item| item.trim().chars().count() > MAX_INGREDIENT_CHARS)
    {
        return Err(ValidationError::new("item_too_long").with_message(
            format!("Each item must be at most {MAX_INGREDIENT_CHARS} characters").into(),
        ));
    }
    Ok(())
}

pub(crate) fn trimmed(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

// ─── Recipe generation ───────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    #[validate(
        length(min = 1, max = 20, message = "Provide between 1 and 20 ingredients"),
        custom(function = "validate_ingredient_items")
    )]
    pub ingredients: Vec<String>,
    #[serde(default)]
    #[validate(length(max = 10, message = "At most 10 dietary preferences"))]
    pub dietary: Vec<String>,
    #[serde(default)]
    pub healthy_mode: bool,
    #[serde(default)]
    pub allow_staples: bool,
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct GenerateResponse {
    pub recipe: Recipe,
    pub saved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

async fn generate_recipe(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiJson(req): ApiJson<GenerateRequest>,
) -> Result<(StatusCode, Json<GenerateResponse>)> {
    req.validate()?;

    let request = RecipeRequest {
        ingredients: trimmed(req.ingredients),
        dietary: trimmed(req.dietary),
        healthy_mode: req.healthy_mode,
        allow_staples: req.allow_staples,
    };

    tracing::info!(
        user_id = %auth.user_id,
        ingredients = request.ingredients.len(),
        healthy_mode = request.healthy_mode,
        "Generating recipe"
    );

    let raw = state
        .llm
        .complete(&recipes::build_prompt(&request), RECIPE_COMPLETION)
        .await?;
    let recipe = recipes::parse_recipe(&raw, &request.ingredients)?.into_recipe(&auth.user_id);

    match state.db.insert_recipe(&recipe).await {
        Ok(()) => {
            tracing::info!(user_id = %auth.user_id, recipe_id = %recipe.id, "Saved generated recipe");
            Ok((
                StatusCode::CREATED,
                Json(GenerateResponse {
                    recipe,
                    saved: true,
                    warning: None,
                }),
            ))
        }
        Err(e) => {
            tracing::error!(user_id = %auth.user_id, error = %e, "Failed to save generated recipe");
            Ok((
                StatusCode::OK,
                Json(GenerateResponse {
                    recipe,
                    saved: false,
                    warning: Some(SAVE_FAILED_WARNING.to_string()),
                }),
            ))
        }
    }
}

// ─── Flavor debugger ─────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct FlavorDebugRequest {
    #[validate(length(min = 1, max = 100, message = "Dish must be 1-100 characters"))]
    pub dish: String,
    #[validate(length(min = 1, max = 500, message = "Problem must be 1-500 characters"))]
    pub problem: String,
}

async fn flavor_debug(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiJson(mut req): ApiJson<FlavorDebugRequest>,
) -> Result<Json<FlavorDiagnosis>> {
    req.dish = req.dish.trim().to_string();
    req.problem = req.problem.trim().to_string();
    req.validate()?;

    tracing::info!(user_id = %auth.user_id, "Debugging a dish");

    let raw = state
        .llm
        .complete(&flavor::build_prompt(&req.dish, &req.problem), FLAVOR_COMPLETION)
        .await?;
    Ok(Json(flavor::parse_diagnosis(&raw)?))
}

// ─── Content validation ──────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct ValidateRequest {
    #[validate(length(min = 1, max = 1000, message = "Text must be 1-1000 characters"))]
    pub text: String,
}

async fn validate_content(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<ValidateRequest>,
) -> Result<Json<ContentVerdict>> {
    req.validate()?;
    Ok(Json(content_check::classify(state.llm.as_ref(), &req.text).await))
}
