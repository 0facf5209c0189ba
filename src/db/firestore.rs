// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (profile, password, reset codes, liked recipes)
//! - Recipes (cookbook and public feed)
//! - Shopping lists (one document per user)
//! - Batch plans

use super::{apply_like_toggle, collections, FeedCursor, Store};
use crate::error::AppError;
use crate::models::{BatchPlan, LikeOutcome, Recipe, ResetOtp, ShoppingList, User};
use crate::time_utils::format_sortable;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Document in the email index collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EmailIndexEntry {
    user_id: String,
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // The emulator does not check credentials; skip the ADC lookup.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    async fn get_by_id<T>(&self, collection: &str, id: &str) -> Result<Option<T>, AppError>
    where
        T: for<'de> Deserialize<'de> + Send,
    {
        fetch(self.get_client()?, collection, id).await
    }

    async fn put<T>(&self, collection: &str, id: &str, object: &T) -> Result<(), AppError>
    where
        T: Serialize + for<'de> Deserialize<'de> + Send + Sync,
    {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collection)
            .document_id(id)
            .object(object)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Overwrite selected fields of a user document.
    async fn update_user_fields(&self, user: &User, fields: &[&str]) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .fields(fields.iter().copied())
            .in_col(collections::USERS)
            .document_id(&user.id)
            .object(user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn require_user(&self, user_id: &str) -> Result<User, AppError> {
        self.get_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))
    }

    async fn delete_doc(&self, collection: &str, id: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collection)
            .document_id(id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}

async fn fetch<T>(
    client: &firestore::FirestoreDb,
    collection: &str,
    id: &str,
) -> Result<Option<T>, AppError>
where
    T: for<'de> Deserialize<'de> + Send,
{
    client
        .fluent()
        .select()
        .by_id_in(collection)
        .obj()
        .one(id)
        .await
        .map_err(|e| AppError::Database(e.to_string()))
}

/// Client whose reads belong to `transaction`, so the commit fails if a
/// document read through it changed in the meantime.
fn reader_in(
    client: &firestore::FirestoreDb,
    transaction: &firestore::FirestoreTransaction<'_>,
) -> firestore::FirestoreDb {
    client.clone_with_consistency_selector(firestore::FirestoreConsistencySelector::Transaction(
        transaction.transaction_id().clone(),
    ))
}

#[async_trait]
impl Store for FirestoreDb {
    // ─── User Operations ─────────────────────────────────────────

    async fn create_user(&self, user: &User) -> Result<(), AppError> {
        let client = self.get_client()?;

        // `insert` fails if the document exists, so the email index
        // document acts as a unique constraint.
        let index_id = urlencoding::encode(&user.email).into_owned();
        let inserted: Result<EmailIndexEntry, _> = client
            .fluent()
            .insert()
            .into(collections::USER_EMAILS)
            .document_id(&index_id)
            .object(&EmailIndexEntry {
                user_id: user.id.clone(),
            })
            .execute()
            .await;

        match inserted {
            Ok(_) => {}
            Err(firestore::errors::FirestoreError::DataConflictError(_)) => {
                return Err(AppError::Conflict(
                    "An account with this email already exists".to_string(),
                ));
            }
            Err(e) => return Err(AppError::Database(e.to_string())),
        }

        if let Err(e) = self.put(collections::USERS, &user.id, user).await {
            // Release the email so the user can retry the signup.
            if let Err(cleanup) = self.delete_doc(collections::USER_EMAILS, &index_id).await {
                tracing::error!(error = %cleanup, "Failed to release email index entry");
            }
            return Err(e);
        }

        tracing::info!(user_id = %user.id, "User created");
        Ok(())
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        self.get_by_id(collections::USERS, user_id).await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let index_id = urlencoding::encode(email).into_owned();
        let Some(entry) = self
            .get_by_id::<EmailIndexEntry>(collections::USER_EMAILS, &index_id)
            .await?
        else {
            return Ok(None);
        };
        self.get_user(&entry.user_id).await
    }

    async fn update_profile(&self, user: &User) -> Result<(), AppError> {
        self.update_user_fields(user, &["name", "avatar", "image"])
            .await
    }

    async fn set_password(&self, user_id: &str, password_hash: &str) -> Result<(), AppError> {
        let mut user = self.require_user(user_id).await?;
        user.password_hash = Some(password_hash.to_string());
        self.update_user_fields(&user, &["passwordHash"]).await
    }

    async fn set_reset_otp(
        &self,
        user_id: &str,
        otp: Option<&ResetOtp>,
    ) -> Result<(), AppError> {
        let mut user = self.require_user(user_id).await?;
        user.reset_otp = otp.cloned();
        self.update_user_fields(&user, &["resetOtp"]).await
    }

    async fn consume_reset_otp(
        &self,
        user_id: &str,
        otp_hash: &str,
        new_password_hash: &str,
    ) -> Result<bool, AppError> {
        let client = self.get_client()?;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        let reader = reader_in(client, &transaction);
        let Some(mut user) = fetch::<User>(&reader, collections::USERS, user_id).await? else {
            let _ = transaction.rollback().await;
            return Ok(false);
        };

        let matches = user
            .reset_otp
            .as_ref()
            .is_some_and(|otp| otp.hash == otp_hash);
        if !matches {
            let _ = transaction.rollback().await;
            return Ok(false);
        }

        user.reset_otp = None;
        user.password_hash = Some(new_password_hash.to_string());

        client
            .fluent()
            .update()
            .fields(["passwordHash", "resetOtp"])
            .in_col(collections::USERS)
            .document_id(&user.id)
            .object(&user)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add user to transaction: {}", e))
            })?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        Ok(true)
    }

    async fn record_reset_failure(
        &self,
        user_id: &str,
        otp_hash: &str,
    ) -> Result<Option<u32>, AppError> {
        let client = self.get_client()?;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        let reader = reader_in(client, &transaction);
        let Some(mut user) = fetch::<User>(&reader, collections::USERS, user_id).await? else {
            let _ = transaction.rollback().await;
            return Ok(None);
        };

        let Some(otp) = user.reset_otp.as_mut().filter(|otp| otp.hash == otp_hash) else {
            let _ = transaction.rollback().await;
            return Ok(None);
        };
        otp.failed_attempts = otp.failed_attempts.saturating_add(1);
        let failed_attempts = otp.failed_attempts;

        client
            .fluent()
            .update()
            .fields(["resetOtp"])
            .in_col(collections::USERS)
            .document_id(&user.id)
            .object(&user)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add user to transaction: {}", e))
            })?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        Ok(Some(failed_attempts))
    }

    // ─── Recipe Operations ───────────────────────────────────────

    async fn insert_recipe(&self, recipe: &Recipe) -> Result<(), AppError> {
        self.put(collections::RECIPES, &recipe.id, recipe).await
    }

    async fn get_recipe(&self, recipe_id: &str) -> Result<Option<Recipe>, AppError> {
        self.get_by_id(collections::RECIPES, recipe_id).await
    }

    async fn list_recipes_for_owner(&self, owner_id: &str) -> Result<Vec<Recipe>, AppError> {
        let owner_id = owner_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::RECIPES)
            .filter(move |q| q.field("ownerId").eq(owner_id.clone()))
            .order_by([("createdAt", firestore::FirestoreQueryDirection::Descending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn list_public_recipes(
        &self,
        cursor: Option<&FeedCursor>,
        limit: u32,
    ) -> Result<Vec<Recipe>, AppError> {
        // Over-fetch by one page of ties so recipes sharing the cursor's
        // timestamp are not skipped; the exact cut is made below.
        let query = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::RECIPES);

        let query = if let Some(cursor) = cursor {
            let created_at = format_sortable(cursor.created_at);
            query.filter(move |q| {
                q.for_all([
                    q.field("isPublic").eq(true),
                    q.field("createdAt").less_than_or_equal(created_at.clone()),
                ])
            })
        } else {
            query.filter(|q| q.field("isPublic").eq(true))
        };

        let mut recipes: Vec<Recipe> = query
            .order_by([
                ("createdAt", firestore::FirestoreQueryDirection::Descending),
                ("id", firestore::FirestoreQueryDirection::Descending),
            ])
            .limit(limit.saturating_mul(2).max(limit.saturating_add(1)))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if let Some(cursor) = cursor {
            recipes.retain(|r| cursor.admits(r));
        }
        recipes.truncate(limit as usize);
        Ok(recipes)
    }

    async fn set_recipe_visibility(
        &self,
        recipe_id: &str,
        owner_id: &str,
        is_public: bool,
    ) -> Result<Option<Recipe>, AppError> {
        let Some(mut recipe) = self.get_recipe(recipe_id).await? else {
            return Ok(None);
        };
        if !recipe.is_owned_by(owner_id) {
            return Ok(None);
        }
        recipe.is_public = is_public;

        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .fields(["isPublic"])
            .in_col(collections::RECIPES)
            .document_id(&recipe.id)
            .object(&recipe)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(Some(recipe))
    }

    async fn delete_recipe(&self, recipe_id: &str, owner_id: &str) -> Result<bool, AppError> {
        match self.get_recipe(recipe_id).await? {
            Some(recipe) if recipe.is_owned_by(owner_id) => {
                self.delete_doc(collections::RECIPES, recipe_id).await?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Toggle a like in one transaction covering the user and the recipe.
    ///
    /// Both documents are written together; a concurrent toggle touching
    /// either document makes the commit fail rather than lose an update.
    async fn toggle_like(
        &self,
        user_id: &str,
        recipe_id: &str,
    ) -> Result<Option<LikeOutcome>, AppError> {
        let client = self.get_client()?;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        let reader = reader_in(client, &transaction);
        let (Some(mut user), Some(mut recipe)) = (
            fetch::<User>(&reader, collections::USERS, user_id).await?,
            fetch::<Recipe>(&reader, collections::RECIPES, recipe_id).await?,
        ) else {
            let _ = transaction.rollback().await;
            return Ok(None);
        };

        let outcome = apply_like_toggle(&mut user, &mut recipe);

        client
            .fluent()
            .update()
            .fields(["likedRecipes"])
            .in_col(collections::USERS)
            .document_id(&user.id)
            .object(&user)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add user to transaction: {}", e))
            })?;

        client
            .fluent()
            .update()
            .fields(["likes"])
            .in_col(collections::RECIPES)
            .document_id(&recipe.id)
            .object(&recipe)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add recipe to transaction: {}", e))
            })?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        tracing::debug!(
            user_id,
            recipe_id,
            liked = outcome.liked,
            likes = outcome.likes,
            "Like toggled"
        );

        Ok(Some(outcome))
    }

    async fn forget_like(&self, user_id: &str, recipe_id: &str) -> Result<bool, AppError> {
        let client = self.get_client()?;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        let reader = reader_in(client, &transaction);
        let Some(mut user) = fetch::<User>(&reader, collections::USERS, user_id).await? else {
            let _ = transaction.rollback().await;
            return Ok(false);
        };
        if !user.has_liked(recipe_id) {
            let _ = transaction.rollback().await;
            return Ok(false);
        }
        user.liked_recipes.retain(|id| id != recipe_id);

        client
            .fluent()
            .update()
            .fields(["likedRecipes"])
            .in_col(collections::USERS)
            .document_id(&user.id)
            .object(&user)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add user to transaction: {}", e))
            })?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        tracing::debug!(user_id, recipe_id, "Dropped like on deleted recipe");
        Ok(true)
    }

    // ─── Shopping List Operations ────────────────────────────────

    async fn get_shopping_list(&self, user_id: &str) -> Result<Option<ShoppingList>, AppError> {
        self.get_by_id(collections::SHOPPING_LISTS, user_id).await
    }

    async fn put_shopping_list(&self, list: &ShoppingList) -> Result<(), AppError> {
        self.put(collections::SHOPPING_LISTS, &list.user_id, list)
            .await
    }

    async fn delete_shopping_list(&self, user_id: &str) -> Result<(), AppError> {
        self.delete_doc(collections::SHOPPING_LISTS, user_id).await
    }

    // ─── Batch Plan Operations ───────────────────────────────────

    async fn insert_batch_plan(&self, plan: &BatchPlan) -> Result<(), AppError> {
        self.put(collections::BATCH_PLANS, &plan.id, plan).await
    }

    async fn get_batch_plan(&self, plan_id: &str) -> Result<Option<BatchPlan>, AppError> {
        self.get_by_id(collections::BATCH_PLANS, plan_id).await
    }

    async fn list_batch_plans(&self, owner_id: &str) -> Result<Vec<BatchPlan>, AppError> {
        let owner_id = owner_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::BATCH_PLANS)
            .filter(move |q| q.field("ownerId").eq(owner_id.clone()))
            .order_by([("createdAt", firestore::FirestoreQueryDirection::Descending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn delete_batch_plan(&self, plan_id: &str, owner_id: &str) -> Result<bool, AppError> {
        match self.get_batch_plan(plan_id).await? {
            Some(plan) if plan.is_owned_by(owner_id) => {
                self.delete_doc(collections::BATCH_PLANS, plan_id).await?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
