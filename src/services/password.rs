// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Password and reset-code hashing (bcrypt).

use crate::error::AppError;

/// Hash a secret with a fresh salt.
pub fn hash_secret(secret: &str, cost: u32) -> Result<String, AppError> {
    bcrypt::hash(secret, cost)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("bcrypt hash failed: {}", e)))
}

/// Compare a secret against a stored bcrypt hash.
///
/// A malformed stored hash is treated as a mismatch.
pub fn verify_secret(secret: &str, hash: &str) -> bool {
    match bcrypt::verify(secret, hash) {
        Ok(matches) => matches,
        Err(e) => {
            tracing::warn!(error = %e, "Stored bcrypt hash could not be parsed");
            false
        }
    }
}

/// Hash on the blocking pool; bcrypt is deliberately slow.
pub async fn hash_secret_blocking(secret: String, cost: u32) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || hash_secret(&secret, cost))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("hash task failed: {}", e)))?
}

/// Verify on the blocking pool.
pub async fn verify_secret_blocking(secret: String, hash: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || verify_secret(&secret, &hash))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("verify task failed: {}", e)))
}
