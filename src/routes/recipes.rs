// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Cookbook and public feed routes.

use crate::db::FeedCursor;
use crate::error::{AppError, Result};
use crate::extract::{ApiJson, ApiQuery};
use crate::middleware::auth::AuthUser;
use crate::models::{LikeOutcome, Recipe};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/recipes", get(list_my_recipes))
        .route("/api/recipes/public", get(public_feed))
        .route("/api/recipes/{id}", get(get_recipe).delete(delete_recipe))
        .route("/api/recipes/{id}/visibility", patch(set_visibility))
        .route("/api/recipes/{id}/save", post(save_recipe))
        .route("/api/recipes/{id}/like", post(toggle_like))
}

const DEFAULT_FEED_LIMIT: u32 = 20;
const MAX_FEED_LIMIT: u32 = 50;

fn not_found(recipe_id: &str) -> AppError {
    AppError::NotFound(format!("Recipe {} not found", recipe_id))
}

#[derive(Debug, Serialize)]
pub struct RecipeResponse {
    pub recipe: Recipe,
}

#[derive(Debug, Serialize)]
pub struct RecipesResponse {
    pub recipes: Vec<Recipe>,
}

async fn list_my_recipes(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<RecipesResponse>> {
    let recipes = state.db.list_recipes_for_owner(&auth.user_id).await?;
    Ok(Json(RecipesResponse { recipes }))
}

async fn get_recipe(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(recipe_id): Path<String>,
) -> Result<Json<RecipeResponse>> {
    let recipe = state
        .db
        .get_recipe(&recipe_id)
        .await?
        .filter(|r| r.is_visible_to(&auth.user_id))
        .ok_or_else(|| not_found(&recipe_id))?;
    Ok(Json(RecipeResponse { recipe }))
}

async fn delete_recipe(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(recipe_id): Path<String>,
) -> Result<StatusCode> {
    if !state.db.delete_recipe(&recipe_id, &auth.user_id).await? {
        return Err(not_found(&recipe_id));
    }
    tracing::info!(user_id = %auth.user_id, recipe_id = %recipe_id, "Deleted recipe");
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibilityRequest {
    pub is_public: bool,
}

async fn set_visibility(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(recipe_id): Path<String>,
    ApiJson(req): ApiJson<VisibilityRequest>,
) -> Result<Json<RecipeResponse>> {
    let recipe = state
        .db
        .set_recipe_visibility(&recipe_id, &auth.user_id, req.is_public)
        .await?
        .ok_or_else(|| not_found(&recipe_id))?;

    tracing::info!(
        user_id = %auth.user_id,
        recipe_id = %recipe_id,
        is_public = req.is_public,
        "Changed recipe visibility"
    );
    Ok(Json(RecipeResponse { recipe }))
}

async fn save_recipe(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(recipe_id): Path<String>,
) -> Result<(StatusCode, Json<RecipeResponse>)> {
    let source = state
        .db
        .get_recipe(&recipe_id)
        .await?
        .filter(|r| r.is_visible_to(&auth.user_id))
        .ok_or_else(|| not_found(&recipe_id))?;

    if source.is_owned_by(&auth.user_id) {
        return Err(AppError::BadRequest(
            "This recipe is already in your cookbook".to_string(),
        ));
    }

    let copy = source.copy_for(&auth.user_id);
    state.db.insert_recipe(&copy).await?;

    tracing::info!(
        user_id = %auth.user_id,
        recipe_id = %copy.id,
        copied_from = %recipe_id,
        "Saved recipe from feed"
    );
    Ok((StatusCode::CREATED, Json(RecipeResponse { recipe: copy })))
}

async fn toggle_like(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(recipe_id): Path<String>,
) -> Result<Json<LikeOutcome>> {
    let Some(recipe) = state.db.get_recipe(&recipe_id).await? else {
        // A deleted recipe can still sit in the caller's liked list.
        if state.db.forget_like(&auth.user_id, &recipe_id).await? {
            return Ok(Json(LikeOutcome {
                liked: false,
                likes: 0,
            }));
        }
        return Err(not_found(&recipe_id));
    };

    // Private recipes of other users are indistinguishable from missing
    // ones, except to users who liked them while public and may unlike.
    if !recipe.is_visible_to(&auth.user_id) {
        let liked = state
            .db
            .get_user(&auth.user_id)
            .await?
            .is_some_and(|u| u.has_liked(&recipe_id));
        if !liked {
            return Err(not_found(&recipe_id));
        }
    }

    let outcome = state
        .db
        .toggle_like(&auth.user_id, &recipe_id)
        .await?
        .ok_or_else(|| not_found(&recipe_id))?;

    tracing::debug!(
        user_id = %auth.user_id,
        recipe_id = %recipe_id,
        liked = outcome.liked,
        likes = outcome.likes,
        "Toggled like"
    );
    Ok(Json(outcome))
}

// ─── Public feed ─────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub cursor: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct FeedItem {
    #[serde(flatten)]
    #[cfg_attr(feature = "binding-generation", ts(flatten))]
    pub recipe: Recipe,
    pub liked_by_me: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct FeedResponse {
    pub recipes: Vec<FeedItem>,
    pub next_cursor: Option<String>,
}

async fn public_feed(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiQuery(params): ApiQuery<FeedQuery>,
) -> Result<Json<FeedResponse>> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_FEED_LIMIT)
        .clamp(1, MAX_FEED_LIMIT);

    let cursor = params
        .cursor
        .as_deref()
        .filter(|c| !c.is_empty())
        .map(|raw| {
            FeedCursor::decode(raw)
                .ok_or_else(|| AppError::BadRequest("Invalid 'cursor' parameter".to_string()))
        })
        .transpose()?;

    // One extra tells us whether there is another page.
    let mut recipes = state
        .db
        .list_public_recipes(cursor.as_ref(), limit + 1)
        .await?;
    let next_cursor = if recipes.len() > limit as usize {
        recipes.truncate(limit as usize);
        recipes.last().map(|r| FeedCursor::after(r).encode())
    } else {
        None
    };

    let liked: HashSet<String> = state
        .db
        .get_user(&auth.user_id)
        .await?
        .map(|u| u.liked_recipes.into_iter().collect())
        .unwrap_or_default();

    let recipes = recipes
        .into_iter()
        .map(|recipe| FeedItem {
            liked_by_me: liked.contains(&recipe.id),
            recipe,
        })
        .collect();

    Ok(Json(FeedResponse {
        recipes,
        next_cursor,
    }))
}
