// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JWT authentication tests.
//!
//! These tests verify that JWT tokens created by the sign-in flow can be
//! decoded by the auth middleware, catching compatibility issues early.

use chefini_api::middleware::auth::{create_jwt, verify_jwt};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

const SIGNING_KEY: &[u8] = b"test_signing_key_32_bytes_long!!";

/// Claims structure that must match what the middleware expects.
/// If either create_jwt or the middleware changes, this test should catch
/// the incompatibility.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    email: String,
    exp: usize,
    iat: usize,
}

fn now() -> usize {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as usize
}

#[test]
fn test_jwt_roundtrip() {
    let token = create_jwt("user-123", "asha@example.com", SIGNING_KEY, 30).unwrap();

    // Decode token the way an independent client would
    let key = DecodingKey::from_secret(SIGNING_KEY);
    let validation = Validation::new(Algorithm::HS256);
    let token_data = decode::<Claims>(&token, &key, &validation)
        .expect("Failed to decode JWT - check Claims struct compatibility");

    assert_eq!(token_data.claims.sub, "user-123");
    assert_eq!(token_data.claims.email, "asha@example.com");
    assert!(token_data.claims.exp > token_data.claims.iat);

    // And the way the middleware does
    let claims = verify_jwt(&token, SIGNING_KEY).unwrap();
    assert_eq!(claims.sub, "user-123");
}

#[test]
fn test_jwt_expiration_matches_ttl() {
    let token = create_jwt("user-123", "asha@example.com", SIGNING_KEY, 30).unwrap();

    let key = DecodingKey::from_secret(SIGNING_KEY);
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false; // We'll check manually
    let token_data = decode::<Claims>(&token, &key, &validation).unwrap();

    // Token should expire at least 29 days in the future
    assert!(
        token_data.claims.exp > now() + 86400 * 29,
        "Token expiration should be ~30 days in the future"
    );
    assert!(token_data.claims.exp <= now() + 86400 * 30 + 5);
}

#[test]
fn test_expired_token_rejected() {
    let issued = now() - 86400 * 31;
    let claims = Claims {
        sub: "user-123".to_string(),
        email: "asha@example.com".to_string(),
        iat: issued,
        exp: issued + 86400 * 30,
    };
    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(SIGNING_KEY),
    )
    .unwrap();

    assert!(verify_jwt(&token, SIGNING_KEY).is_err());
}

#[test]
fn test_other_algorithm_rejected() {
    let claims = Claims {
        sub: "user-123".to_string(),
        email: "asha@example.com".to_string(),
        iat: now(),
        exp: now() + 3600,
    };
    let token = encode(
        &Header::new(Algorithm::HS512),
        &claims,
        &EncodingKey::from_secret(SIGNING_KEY),
    )
    .unwrap();

    assert!(verify_jwt(&token, SIGNING_KEY).is_err());
}
