// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Password-reset one-time codes.
//!
//! A code moves through `issued → (verified | expired | locked | consumed)`:
//! - [`issue`] creates a random 6-digit code and its hashed record;
//! - [`check`] validates a submitted code against the stored record;
//! - wrong guesses are counted on the record (`Store::record_reset_failure`)
//!   and [`MAX_OTP_ATTEMPTS`] of them lock it;
//! - consumption is done by the store (`Store::consume_reset_otp`), which
//!   clears the record in the same write that replaces the password.
//!
//! Only the bcrypt hash is ever persisted.

use crate::error::AppError;
use crate::models::ResetOtp;
use crate::services::password::hash_secret;
use chrono::{DateTime, Duration, Utc};
use rand::Rng;

/// How long an issued code stays valid.
pub const OTP_TTL_MINUTES: i64 = 10;

/// Number of digits in a code.
pub const OTP_DIGITS: usize = 6;

/// Wrong guesses allowed before a code is locked.
pub const MAX_OTP_ATTEMPTS: u32 = 5;

/// A freshly issued code: plaintext for the email, record for the store.
pub struct IssuedOtp {
    pub code: String,
    pub record: ResetOtp,
}

impl std::fmt::Debug for IssuedOtp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuedOtp")
            .field("code", &"<redacted>")
            .field("record", &self.record)
            .finish()
    }
}

/// Why a submitted code was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum OtpError {
    #[error("No password reset was requested for this account")]
    NotRequested,

    #[error("This code has expired. Please request a new one")]
    Expired,

    #[error("Invalid code")]
    Mismatch,

    #[error("Too many incorrect codes. Please request a new one")]
    Locked,
}

impl From<OtpError> for AppError {
    fn from(err: OtpError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

/// Generate a uniformly random 6-digit code (leading zeros allowed).
pub fn generate_code() -> String {
    let n: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("{:06}", n)
}

/// Issue a new code valid for [`OTP_TTL_MINUTES`] from `now`.
pub fn issue(now: DateTime<Utc>, cost: u32) -> Result<IssuedOtp, AppError> {
    let code = generate_code();
    let hash = hash_secret(&code, cost)?;
    Ok(IssuedOtp {
        code,
        record: ResetOtp {
            hash,
            expires_at: now + Duration::minutes(OTP_TTL_MINUTES),
            failed_attempts: 0,
        },
    })
}

/// Check a submitted code against the stored record at time `now`.
///
/// The code is valid strictly before `expires_at`.
pub fn check(record: Option<&ResetOtp>, code: &str, now: DateTime<Utc>) -> Result<(), OtpError> {
    let record = record.ok_or(OtpError::NotRequested)?;

    if now >= record.expires_at {
        return Err(OtpError::Expired);
    }
    if record.failed_attempts >= MAX_OTP_ATTEMPTS {
        return Err(OtpError::Locked);
    }

    let code = code.trim();
    if code.len() != OTP_DIGITS || !code.chars().all(|c| c.is_ascii_digit()) {
        return Err(OtpError::Mismatch);
    }

    if !crate::services::password::verify_secret(code, &record.hash) {
        return Err(OtpError::Mismatch);
    }

    Ok(())
}

/// [`issue`] on the blocking pool.
pub async fn issue_blocking(now: DateTime<Utc>, cost: u32) -> Result<IssuedOtp, AppError> {
    tokio::task::spawn_blocking(move || issue(now, cost))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("OTP issue task failed: {}", e)))?
}

/// [`check`] on the blocking pool.
pub async fn check_blocking(
    record: Option<ResetOtp>,
    code: String,
    now: DateTime<Utc>,
) -> Result<Result<(), OtpError>, AppError> {
    tokio::task::spawn_blocking(move || check(record.as_ref(), &code, now))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("OTP check task failed: {}", e)))
}
