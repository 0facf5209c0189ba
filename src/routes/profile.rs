// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile routes for the signed-in user.

use crate::error::{AppError, Result};
use crate::extract::ApiJson;
use crate::middleware::auth::AuthUser;
use crate::models::user::AVATAR_IDS;
use crate::models::User;
use crate::services::identity::MAX_NAME_CHARS;
use crate::AppState;
use axum::{extract::State, routing::get, Extension, Json, Router};
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/profile", get(get_profile).put(update_profile))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ProfileResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub image: Option<String>,
    pub avatar: Option<String>,
    pub has_password: bool,
    pub liked_recipes: Vec<String>,
    pub recipe_count: usize,
}

async fn load_user(state: &AppState, auth: &AuthUser) -> Result<User> {
    state
        .db
        .get_user(&auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

async fn profile_response(state: &AppState, user: User) -> Result<ProfileResponse> {
    let recipe_count = state.db.list_recipes_for_owner(&user.id).await?.len();
    Ok(ProfileResponse {
        has_password: user.has_password(),
        id: user.id,
        name: user.name,
        email: user.email,
        image: user.image,
        avatar: user.avatar,
        liked_recipes: user.liked_recipes,
        recipe_count,
    })
}

async fn get_profile(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<ProfileResponse>> {
    let user = load_user(&state, &auth).await?;
    Ok(Json(profile_response(&state, user).await?))
}

/// Distinguishes an explicit `null` from an absent field.
fn present<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub name: Option<String>,
    /// Absent: unchanged. `null` or `""`: cleared.
    #[serde(default, deserialize_with = "present")]
    pub avatar: Option<Option<String>>,
}

async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiJson(req): ApiJson<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>> {
    let mut user = load_user(&state, &auth).await?;

    if let Some(name) = req.name {
        let name = name.trim();
        if name.is_empty() || name.chars().count() > MAX_NAME_CHARS {
            return Err(AppError::BadRequest(format!(
                "Name must be 1-{} characters",
                MAX_NAME_CHARS
            )));
        }
        user.name = name.to_string();
    }

    if let Some(avatar) = req.avatar {
        user.avatar = match avatar.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(id) if AVATAR_IDS.contains(&id) => Some(id.to_string()),
            Some(id) => {
                return Err(AppError::BadRequest(format!("Unknown avatar: {}", id)));
            }
        };
    }

    state.db.update_profile(&user).await?;
    tracing::debug!(user_id = %user.id, "Updated profile");

    Ok(Json(profile_response(&state, user).await?))
}
