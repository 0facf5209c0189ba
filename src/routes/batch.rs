// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Batch meal-prep plan routes.

use crate::error::{AppError, Result};
use crate::extract::ApiJson;
use crate::middleware::auth::AuthUser;
use crate::models::BatchPlan;
use crate::routes::ai::{trimmed, validate_ingredient_items, SAVE_FAILED_WARNING};
use crate::services::batch::{self, BatchRequest, BATCH_COMPLETION, MAX_DAYS, MIN_DAYS};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/batch", get(list_plans))
        .route("/api/batch/generate", post(generate_plan))
        .route("/api/batch/{id}", get(get_plan).delete(delete_plan))
}

fn default_servings() -> u32 {
    2
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GenerateBatchRequest {
    #[validate(
        length(min = 1, max = 20, message = "Provide between 1 and 20 ingredients"),
        custom(function = "validate_ingredient_items")
    )]
    pub ingredients: Vec<String>,
    pub days: u32,
    #[serde(default = "default_servings")]
    #[validate(range(min = 1, max = 8, message = "Servings must be between 1 and 8"))]
    pub servings: u32,
    #[serde(default)]
    #[validate(length(max = 10, message = "At most 10 dietary preferences"))]
    pub dietary: Vec<String>,
    #[serde(default)]
    pub healthy_mode: bool,
}

#[derive(Debug, Serialize)]
pub struct GenerateBatchResponse {
    pub plan: BatchPlan,
    pub saved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

async fn generate_plan(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiJson(req): ApiJson<GenerateBatchRequest>,
) -> Result<(StatusCode, Json<GenerateBatchResponse>)> {
    req.validate()?;
    if !(MIN_DAYS..=MAX_DAYS).contains(&req.days) {
        return Err(AppError::BadRequest(format!(
            "Plans cover {} to {} days",
            MIN_DAYS, MAX_DAYS
        )));
    }

    let request = BatchRequest {
        ingredients: trimmed(req.ingredients),
        days: req.days,
        servings: req.servings,
        dietary: trimmed(req.dietary),
        healthy_mode: req.healthy_mode,
    };

    tracing::info!(
        user_id = %auth.user_id,
        days = request.days,
        servings = request.servings,
        "Generating batch plan"
    );

    let raw = state
        .llm
        .complete(&batch::build_prompt(&request), BATCH_COMPLETION)
        .await?;
    let plan = batch::parse_plan(&raw, &request, &auth.user_id)?;

    match state.db.insert_batch_plan(&plan).await {
        Ok(()) => {
            tracing::info!(user_id = %auth.user_id, plan_id = %plan.id, "Saved batch plan");
            Ok((
                StatusCode::CREATED,
                Json(GenerateBatchResponse {
                    plan,
                    saved: true,
                    warning: None,
                }),
            ))
        }
        Err(e) => {
            tracing::error!(user_id = %auth.user_id, error = %e, "Failed to save batch plan");
            Ok((
                StatusCode::OK,
                Json(GenerateBatchResponse {
                    plan,
                    saved: false,
                    warning: Some(SAVE_FAILED_WARNING.to_string()),
                }),
            ))
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PlansResponse {
    pub plans: Vec<BatchPlan>,
}

async fn list_plans(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<PlansResponse>> {
    let plans = state.db.list_batch_plans(&auth.user_id).await?;
    Ok(Json(PlansResponse { plans }))
}

#[derive(Debug, Serialize)]
pub struct PlanResponse {
    pub plan: BatchPlan,
}

fn not_found(plan_id: &str) -> AppError {
    AppError::NotFound(format!("Batch plan {} not found", plan_id))
}

async fn get_plan(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(plan_id): Path<String>,
) -> Result<Json<PlanResponse>> {
    let plan = state
        .db
        .get_batch_plan(&plan_id)
        .await?
        .filter(|p| p.is_owned_by(&auth.user_id))
        .ok_or_else(|| not_found(&plan_id))?;
    Ok(Json(PlanResponse { plan }))
}

async fn delete_plan(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(plan_id): Path<String>,
) -> Result<StatusCode> {
    if !state.db.delete_batch_plan(&plan_id, &auth.user_id).await? {
        return Err(not_found(&plan_id));
    }
    tracing::info!(user_id = %auth.user_id, plan_id = %plan_id, "Deleted batch plan");
    Ok(StatusCode::NO_CONTENT)
}
