// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account and session routes: signup, sign-in, logout, password reset.

use axum::{
    extract::State,
    http::StatusCode,
    routing::post,
    Extension, Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::extract::ApiJson;
use crate::middleware::auth::{AuthUser, SESSION_COOKIE};
use crate::models::user::normalize_email;
use crate::models::User;
use crate::services::mailer::EmailMessage;
use crate::services::otp::{self, OtpError};
use crate::services::password::{hash_secret_blocking, verify_secret_blocking};
use crate::services::{establish_session, sign_in, GoogleSignIn, PasswordSignIn, Session};
use crate::AppState;

/// Routes reachable without a session.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth/signup", post(signup))
        .route("/api/auth/login", post(login))
        .route("/api/auth/google", post(google))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/forgot-password", post(forgot_password))
        .route("/api/auth/verify-otp", post(verify_otp))
        .route("/api/auth/reset-password", post(reset_password))
}

/// Routes that need a session; the auth middleware is applied in routes/mod.rs.
pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/auth/change-password", post(change_password))
}

const RESET_REQUEST_MESSAGE: &str =
    "If an account exists for this email, a reset code has been sent";

// ─── Responses ───────────────────────────────────────────────

/// Public view of a user.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub image: Option<String>,
    pub avatar: Option<String>,
    pub has_password: bool,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            image: user.image.clone(),
            avatar: user.avatar.clone(),
            has_password: user.has_password(),
        }
    }
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForgotPasswordResponse {
    pub message: String,
    pub should_proceed: bool,
}

#[derive(Debug, Serialize)]
pub struct VerifyOtpResponse {
    pub message: String,
    pub verified: bool,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

// ─── Cookies ─────────────────────────────────────────────────

fn session_cookie(token: String, config: &Config) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.secure_cookies())
        .max_age(time::Duration::days(config.session_ttl_days))
        .build()
}

/// Same attributes as the session cookie so browsers match and drop it.
fn removal_cookie(config: &Config) -> Cookie<'static> {
    let mut cookie = session_cookie(String::new(), config);
    cookie.make_removal();
    cookie
}

fn session_response(
    session: Session,
    jar: CookieJar,
    status: StatusCode,
    config: &Config,
) -> (StatusCode, CookieJar, Json<AuthResponse>) {
    let jar = jar.add(session_cookie(session.token.clone(), config));
    (
        status,
        jar,
        Json(AuthResponse {
            user: UserResponse::from(&session.user),
            token: session.token,
        }),
    )
}

// ─── Signup / sign-in ────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(length(min = 1, max = 60, message = "Name must be 1-60 characters"))]
    pub name: String,
    #[validate(email(message = "Please enter a valid email address"))]
    pub email: String,
    #[validate(length(min = 8, max = 128, message = "Password must be 8-128 characters"))]
    pub password: String,
}

async fn signup(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    ApiJson(mut req): ApiJson<SignupRequest>,
) -> Result<(StatusCode, CookieJar, Json<AuthResponse>)> {
    req.name = req.name.trim().to_string();
    req.email = normalize_email(&req.email);
    req.validate()?;

    let hash = hash_secret_blocking(req.password, state.config.bcrypt_cost).await?;
    let user = User::new(&req.name, &req.email, Some(hash));
    state.db.create_user(&user).await?;

    tracing::info!(user_id = %user.id, "Created account");

    let session = establish_session(user, &state.config)?;
    Ok(session_response(session, jar, StatusCode::CREATED, &state.config))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<(StatusCode, CookieJar, Json<AuthResponse>)> {
    let strategy = PasswordSignIn {
        email: req.email,
        password: req.password,
    };
    let session = sign_in(&strategy, state.db.as_ref(), &state.config).await?;
    Ok(session_response(session, jar, StatusCode::OK, &state.config))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleSignInRequest {
    pub id_token: String,
}

async fn google(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    ApiJson(req): ApiJson<GoogleSignInRequest>,
) -> Result<(StatusCode, CookieJar, Json<AuthResponse>)> {
    let strategy = GoogleSignIn {
        verifier: state.google_verifier.as_ref(),
        id_token: req.id_token,
    };
    let session = sign_in(&strategy, state.db.as_ref(), &state.config).await?;
    Ok(session_response(session, jar, StatusCode::OK, &state.config))
}

async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> (StatusCode, CookieJar) {
    (StatusCode::NO_CONTENT, jar.add(removal_cookie(&state.config)))
}

// ─── Password reset ──────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "Please enter a valid email address"))]
    pub email: String,
}

async fn forgot_password(
    State(state): State<Arc<AppState>>,
    ApiJson(mut req): ApiJson<ForgotPasswordRequest>,
) -> Result<Json<ForgotPasswordResponse>> {
    req.email = normalize_email(&req.email);
    req.validate()?;

    let Some(user) = state.db.find_user_by_email(&req.email).await? else {
        tracing::info!("Password reset requested for unknown email");
        return Ok(Json(ForgotPasswordResponse {
            message: RESET_REQUEST_MESSAGE.to_string(),
            should_proceed: false,
        }));
    };

    if !user.has_password() {
        return Err(AppError::BadRequest(
            "This account signs in with Google. Please continue with Google instead".to_string(),
        ));
    }

    let issued = otp::issue_blocking(Utc::now(), state.config.bcrypt_cost).await?;
    state.db.set_reset_otp(&user.id, Some(&issued.record)).await?;

    let email = EmailMessage::reset_code(&user.email, &user.name, &issued.code);
    if let Err(e) = state.mailer.send(&email).await {
        // An undelivered code must not stay redeemable.
        if let Err(clear_err) = state.db.set_reset_otp(&user.id, None).await {
            tracing::error!(user_id = %user.id, error = %clear_err, "Failed to clear undelivered reset code");
        }
        return Err(e);
    }

    tracing::info!(user_id = %user.id, "Issued password reset code");

    Ok(Json(ForgotPasswordResponse {
        message: RESET_REQUEST_MESSAGE.to_string(),
        should_proceed: true,
    }))
}

#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp: String,
}

/// Load the user and check their pending code without consuming it.
async fn check_reset_code(state: &AppState, email: &str, code: &str) -> Result<User> {
    let user = state
        .db
        .find_user_by_email(&normalize_email(email))
        .await?
        .ok_or(OtpError::NotRequested)?;

    let checked = otp::check_blocking(user.reset_otp.clone(), code.to_string(), Utc::now()).await?;
    if let (Err(OtpError::Mismatch), Some(record)) = (checked, user.reset_otp.as_ref()) {
        let failures = state.db.record_reset_failure(&user.id, &record.hash).await?;
        tracing::info!(user_id = %user.id, failures, "Wrong password reset code");
    }
    checked?;
    Ok(user)
}

async fn verify_otp(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<VerifyOtpRequest>,
) -> Result<Json<VerifyOtpResponse>> {
    check_reset_code(&state, &req.email, &req.otp).await?;

    Ok(Json(VerifyOtpResponse {
        message: "Code verified".to_string(),
        verified: true,
    }))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub email: String,
    pub otp: String,
    #[validate(length(min = 8, max = 128, message = "Password must be 8-128 characters"))]
    pub new_password: String,
}

async fn reset_password(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>> {
    req.validate()?;

    let user = check_reset_code(&state, &req.email, &req.otp).await?;
    let otp_hash = user
        .reset_otp
        .as_ref()
        .map(|record| record.hash.clone())
        .ok_or(OtpError::NotRequested)?;

    let new_hash = hash_secret_blocking(req.new_password, state.config.bcrypt_cost).await?;

    // Fails if another request redeemed the code since we checked it.
    if !state
        .db
        .consume_reset_otp(&user.id, &otp_hash, &new_hash)
        .await?
    {
        return Err(OtpError::Mismatch.into());
    }

    tracing::info!(user_id = %user.id, "Password reset with emailed code");
    notify_password_changed(&state, &user).await;

    Ok(Json(MessageResponse {
        message: "Password has been reset. You can now sign in".to_string(),
    }))
}

// ─── Change password ─────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    #[validate(length(min = 8, max = 128, message = "Password must be 8-128 characters"))]
    pub new_password: String,
}

async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiJson(req): ApiJson<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>> {
    req.validate()?;

    let user = state
        .db
        .get_user(&auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let Some(current_hash) = user.password_hash.clone() else {
        return Err(AppError::BadRequest(
            "This account signs in with Google and has no password".to_string(),
        ));
    };

    if !verify_secret_blocking(req.current_password.clone(), current_hash).await? {
        return Err(AppError::InvalidCredentials);
    }

    if req.new_password == req.current_password {
        return Err(AppError::BadRequest(
            "New password must be different from the current one".to_string(),
        ));
    }

    let new_hash = hash_secret_blocking(req.new_password, state.config.bcrypt_cost).await?;
    state.db.set_password(&user.id, &new_hash).await?;

    tracing::info!(user_id = %user.id, "Password changed");
    notify_password_changed(&state, &user).await;

    Ok(Json(MessageResponse {
        message: "Password updated".to_string(),
    }))
}

/// Best effort: the password change already happened.
async fn notify_password_changed(state: &AppState, user: &User) {
    let email = EmailMessage::password_changed(&user.email, &user.name);
    if let Err(e) = state.mailer.send(&email).await {
        tracing::warn!(user_id = %user.id, error = %e, "Failed to send password change notice");
    }
}
