// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shopping list routes.

use crate::error::{AppError, Result};
use crate::extract::ApiJson;
use crate::middleware::auth::AuthUser;
use crate::models::shopping::MAX_SHOPPING_ITEMS;
use crate::models::ShoppingList;
use crate::routes::ai::validate_item_lengths;
use crate::services::ordering::{order_links, OrderLinks};
use crate::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/shopping-list",
            get(get_list).post(add_items).delete(clear_list),
        )
        .route("/api/shopping-list/items", delete(remove_item))
        .route("/api/shopping-list/order-links", get(get_order_links))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingListResponse {
    pub items: Vec<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<Option<ShoppingList>> for ShoppingListResponse {
    fn from(list: Option<ShoppingList>) -> Self {
        match list {
            Some(list) => Self {
                items: list.items,
                updated_at: Some(list.updated_at),
            },
            None => Self {
                items: Vec::new(),
                updated_at: None,
            },
        }
    }
}

async fn get_list(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<ShoppingListResponse>> {
    let list = state.db.get_shopping_list(&auth.user_id).await?;
    Ok(Json(list.into()))
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddItemsRequest {
    #[validate(custom(function = "validate_item_lengths"))]
    pub items: Vec<String>,
}

async fn add_items(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiJson(req): ApiJson<AddItemsRequest>,
) -> Result<Json<ShoppingListResponse>> {
    req.validate()?;

    let mut list = state
        .db
        .get_shopping_list(&auth.user_id)
        .await?
        .unwrap_or_else(|| ShoppingList::empty(&auth.user_id));

    let added = list.add_items(&req.items);
    if list.items.len() > MAX_SHOPPING_ITEMS {
        return Err(AppError::BadRequest(format!(
            "A shopping list holds at most {} items",
            MAX_SHOPPING_ITEMS
        )));
    }

    if added > 0 {
        state.db.put_shopping_list(&list).await?;
    }
    tracing::debug!(user_id = %auth.user_id, added, total = list.items.len(), "Added shopping items");

    Ok(Json(Some(list).into()))
}

#[derive(Debug, Deserialize)]
pub struct RemoveItemRequest {
    pub item: String,
}

async fn remove_item(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiJson(req): ApiJson<RemoveItemRequest>,
) -> Result<Json<ShoppingListResponse>> {
    let not_on_list = || AppError::NotFound(format!("'{}' is not on your list", req.item.trim()));

    let mut list = state
        .db
        .get_shopping_list(&auth.user_id)
        .await?
        .ok_or_else(not_on_list)?;

    if !list.remove_item(&req.item) {
        return Err(not_on_list());
    }
    state.db.put_shopping_list(&list).await?;

    Ok(Json(Some(list).into()))
}

async fn clear_list(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<StatusCode> {
    state.db.delete_shopping_list(&auth.user_id).await?;
    tracing::debug!(user_id = %auth.user_id, "Cleared shopping list");
    Ok(StatusCode::NO_CONTENT)
}

async fn get_order_links(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<OrderLinks>> {
    let items = state
        .db
        .get_shopping_list(&auth.user_id)
        .await?
        .map(|list| list.items)
        .unwrap_or_default();
    Ok(Json(order_links(&items)))
}
