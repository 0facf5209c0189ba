// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sign-in strategies and session issuance.
//!
//! Each way of proving identity implements [`SignInStrategy`] and resolves
//! to a stored [`User`]; [`establish_session`] then issues the session JWT
//! the same way for all of them.

use crate::config::Config;
use crate::db::Store;
use crate::error::AppError;
use crate::middleware::auth::create_jwt;
use crate::models::user::normalize_email;
use crate::models::User;
use crate::services::google_oidc::{GoogleIdentity, GoogleOidcVerifier};
use crate::services::password::verify_secret_blocking;
use async_trait::async_trait;

/// Longest display name we store.
pub const MAX_NAME_CHARS: usize = 60;

/// A way for a caller to prove who they are.
#[async_trait]
pub trait SignInStrategy: Send + Sync {
    /// Short label for logs.
    fn method(&self) -> &'static str;

    /// Resolve the caller to a stored user, creating one if the method allows.
    async fn authenticate(&self, db: &dyn Store) -> Result<User, AppError>;
}

/// Email + password against the stored bcrypt hash.
pub struct PasswordSignIn {
    pub email: String,
    pub password: String,
}

#[async_trait]
impl SignInStrategy for PasswordSignIn {
    fn method(&self) -> &'static str {
        "password"
    }

    async fn authenticate(&self, db: &dyn Store) -> Result<User, AppError> {
        let email = normalize_email(&self.email);

        // Unknown email, OAuth-only account and wrong password look the same.
        let user = db
            .find_user_by_email(&email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;
        let hash = user
            .password_hash
            .clone()
            .ok_or(AppError::InvalidCredentials)?;

        if !verify_secret_blocking(self.password.clone(), hash).await? {
            return Err(AppError::InvalidCredentials);
        }
        Ok(user)
    }
}

/// A Google ID token from Google Identity Services.
pub struct GoogleSignIn<'a> {
    pub verifier: &'a GoogleOidcVerifier,
    pub id_token: String,
}

#[async_trait]
impl SignInStrategy for GoogleSignIn<'_> {
    fn method(&self) -> &'static str {
        "google"
    }

    async fn authenticate(&self, db: &dyn Store) -> Result<User, AppError> {
        let identity = self.verifier.verify_id_token(&self.id_token).await?;
        find_or_create_google_user(db, identity).await
    }
}

async fn find_or_create_google_user(
    db: &dyn Store,
    identity: GoogleIdentity,
) -> Result<User, AppError> {
    let email = normalize_email(&identity.email);
    let subject = identity.subject;

    if let Some(mut user) = db.find_user_by_email(&email).await? {
        if identity.picture.is_some() && user.image != identity.picture {
            user.image = identity.picture;
            db.update_profile(&user).await?;
        }
        return Ok(user);
    }

    let name = identity
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| email.split('@').next().unwrap_or_default());
    let mut user = User::new(&truncate_name(name), &email, None);
    user.image = identity.picture;

    match db.create_user(&user).await {
        Ok(()) => {
            tracing::info!(
                user_id = %user.id,
                google_subject = %subject,
                "Created account from Google sign-in"
            );
            Ok(user)
        }
        // Lost a race with a concurrent first sign-in for the same email.
        Err(AppError::Conflict(_)) => db
            .find_user_by_email(&email)
            .await?
            .ok_or_else(|| AppError::Database(format!("user for {email} vanished"))),
        Err(e) => Err(e),
    }
}

fn truncate_name(name: &str) -> String {
    name.chars().take(MAX_NAME_CHARS).collect()
}

/// A signed-in user and their session token.
pub struct Session {
    pub user: User,
    pub token: String,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &self.user.id)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Issue a session JWT for `user`.
pub fn establish_session(user: User, config: &Config) -> Result<Session, AppError> {
    let token = create_jwt(
        &user.id,
        &user.email,
        &config.jwt_signing_key,
        config.session_ttl_days,
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))?;

    Ok(Session { user, token })
}

/// Run a strategy and issue a session for the resulting user.
pub async fn sign_in(
    strategy: &dyn SignInStrategy,
    db: &dyn Store,
    config: &Config,
) -> Result<Session, AppError> {
    let user = strategy.authenticate(db).await.map_err(|e| {
        tracing::info!(method = strategy.method(), error = %e, "Sign-in failed");
        e
    })?;

    tracing::info!(method = strategy.method(), user_id = %user.id, "Signed in");
    establish_session(user, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryDb;
    use crate::middleware::auth::verify_jwt;
    use crate::services::password::hash_secret;

    async fn db_with_user(password: Option<&str>) -> MemoryDb {
        let db = MemoryDb::new();
        let hash = password.map(|p| hash_secret(p, 4).unwrap());
        db.create_user(&User::new("Ada", "ada@example.com", hash))
            .await
            .unwrap();
        db
    }

    #[tokio::test]
    async fn test_password_sign_in() {
        let db = db_with_user(Some("correct horse")).await;

        let ok = PasswordSignIn {
            email: " ADA@example.com".to_string(),
            password: "correct horse".to_string(),
        };
        assert_eq!(ok.authenticate(&db).await.unwrap().name, "Ada");

        let wrong = PasswordSignIn {
            email: "ada@example.com".to_string(),
            password: "battery staple".to_string(),
        };
        assert!(matches!(
            wrong.authenticate(&db).await,
            Err(AppError::InvalidCredentials)
        ));

        let unknown = PasswordSignIn {
            email: "bob@example.com".to_string(),
            password: "correct horse".to_string(),
        };
        assert!(matches!(
            unknown.authenticate(&db).await,
            Err(AppError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_password_sign_in_rejects_oauth_only_account() {
        let db = db_with_user(None).await;
        let attempt = PasswordSignIn {
            email: "ada@example.com".to_string(),
            password: "anything at all".to_string(),
        };
        assert!(matches!(
            attempt.authenticate(&db).await,
            Err(AppError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_google_identity_creates_then_reuses_user() {
        let db = MemoryDb::new();
        let identity = GoogleIdentity {
            subject: "g-1".to_string(),
            email: "Grace@Example.com".to_string(),
            name: None,
            picture: Some("https://img/1".to_string()),
        };

        let created = find_or_create_google_user(&db, identity.clone()).await.unwrap();
        assert_eq!(created.name, "grace");
        assert!(!created.has_password());

        let refreshed = find_or_create_google_user(
            &db,
            GoogleIdentity {
                picture: Some("https://img/2".to_string()),
                ..identity
            },
        )
        .await
        .unwrap();
        assert_eq!(refreshed.id, created.id);
        assert_eq!(refreshed.image.as_deref(), Some("https://img/2"));
    }

    #[test]
    fn test_establish_session_token_carries_identity() {
        let config = Config::test_default();
        let user = User::new("Ada", "ada@example.com", None);
        let session = establish_session(user.clone(), &config).unwrap();

        let claims = verify_jwt(&session.token, &config.jwt_signing_key).unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.email, "ada@example.com");
        assert!(!format!("{:?}", session).contains(&session.token));
    }
}
