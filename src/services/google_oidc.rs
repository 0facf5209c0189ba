// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Verification of Google Sign-In ID tokens.
//!
//! The frontend obtains an ID token from Google Identity Services and posts
//! it to `/api/auth/google`. We check the RS256 signature against Google's
//! published keys (cached per `Cache-Control`), then the issuer, audience
//! (our OAuth client id) and that Google has verified the email.

use crate::config::Config;
use crate::error::AppError;
use anyhow::Context;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use reqwest::header::CACHE_CONTROL;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};

const GOOGLE_CERTS_URL: &str = "https://www.googleapis.com/oauth2/v3/certs";
const GOOGLE_ISSUERS: [&str; 2] = ["https://accounts.google.com", "accounts.google.com"];
const HTTP_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_KEY_TTL: Duration = Duration::from_secs(300);
const CLOCK_SKEW_SECS: u64 = 60;
/// Unknown kids do not trigger a refetch more often than this.
const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// Identity asserted by a verified Google ID token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleIdentity {
    pub subject: String,
    pub email: String,
    pub name: Option<String>,
    pub picture: Option<String>,
}

/// Why a Google ID token was not accepted.
#[derive(Debug, Clone, thiserror::Error)]
pub enum OidcError {
    /// Bad signature, wrong audience, unverified email, ...
    #[error("Google ID token rejected: {0}")]
    Rejected(String),
    /// Could not fetch Google's signing keys.
    #[error("Google key fetch failed: {0}")]
    Transient(String),
}

impl From<OidcError> for AppError {
    fn from(err: OidcError) -> Self {
        match err {
            OidcError::Rejected(reason) => {
                tracing::warn!(reason = %reason, "Rejected Google ID token");
                AppError::InvalidToken
            }
            OidcError::Transient(reason) => AppError::Upstream(reason),
        }
    }
}

enum KeySource {
    Google,
    Static {
        kid: String,
        key: Arc<DecodingKey>,
    },
}

struct CachedKeys {
    by_kid: HashMap<String, Arc<DecodingKey>>,
    fetched_at: Instant,
    expires_at: Instant,
}

/// Verifier for Google Sign-In ID tokens.
pub struct GoogleOidcVerifier {
    http_client: reqwest::Client,
    client_id: String,
    source: KeySource,
    keys: RwLock<Option<CachedKeys>>,
    refresh_lock: Mutex<()>,
}

impl GoogleOidcVerifier {
    /// Verifier that fetches and caches Google's public keys.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let verifier = Self::build(config, KeySource::Google)?;
        tracing::info!(client_id = %verifier.client_id, "Initialized Google sign-in verifier");
        Ok(verifier)
    }

    /// Verifier with a single fixed RSA public key, for tests.
    pub fn new_with_static_key(
        config: &Config,
        kid: impl Into<String>,
        key: DecodingKey,
    ) -> anyhow::Result<Self> {
        let kid = kid.into();
        if kid.trim().is_empty() {
            anyhow::bail!("static key id must not be empty");
        }
        Self::build(
            config,
            KeySource::Static {
                kid,
                key: Arc::new(key),
            },
        )
    }

    fn build(config: &Config, source: KeySource) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .context("failed building Google certs HTTP client")?;

        Ok(Self {
            http_client,
            client_id: config.google_client_id.clone(),
            source,
            keys: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        })
    }

    /// Verify an ID token and return the identity it asserts.
    pub async fn verify_id_token(&self, token: &str) -> Result<GoogleIdentity, OidcError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(OidcError::Rejected("empty token".to_string()));
        }

        let header = decode_header(token)
            .map_err(|e| OidcError::Rejected(format!("invalid JWT header: {e}")))?;
        if header.alg != Algorithm::RS256 {
            return Err(OidcError::Rejected(format!(
                "unexpected JWT alg: {:?}",
                header.alg
            )));
        }
        let kid = header
            .kid
            .ok_or_else(|| OidcError::Rejected("missing JWT kid".to_string()))?;

        let key = self.key_for(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);
        validation.set_issuer(&GOOGLE_ISSUERS);
        validation.set_audience(&[self.client_id.as_str()]);
        validation.leeway = CLOCK_SKEW_SECS;

        let claims = decode::<IdTokenClaims>(token, key.as_ref(), &validation)
            .map_err(|e| OidcError::Rejected(format!("JWT validation failed: {e}")))?
            .claims;

        let email = claims
            .email
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())
            .ok_or_else(|| OidcError::Rejected("missing email claim".to_string()))?;

        if claims.email_verified != Some(true) {
            return Err(OidcError::Rejected(format!(
                "email not verified by Google: {email}"
            )));
        }

        tracing::debug!(subject = %claims.sub, email = %email, "Verified Google ID token");

        Ok(GoogleIdentity {
            subject: claims.sub,
            email,
            name: claims.name.filter(|n| !n.trim().is_empty()),
            picture: claims.picture.filter(|p| !p.trim().is_empty()),
        })
    }

    async fn key_for(&self, kid: &str) -> Result<Arc<DecodingKey>, OidcError> {
        if let KeySource::Static {
            kid: static_kid,
            key,
        } = &self.source
        {
            return if kid == static_kid {
                Ok(key.clone())
            } else {
                Err(OidcError::Rejected(format!("unknown JWT kid: {kid}")))
            };
        }

        if let Some(key) = self.cached_key(kid).await {
            return Ok(key);
        }

        let _guard = self.refresh_lock.lock().await;
        // Another task may have refreshed while we waited.
        if let Some(key) = self.cached_key(kid).await {
            return Ok(key);
        }
        if self.recently_refreshed().await {
            return Err(OidcError::Rejected(format!("unknown JWT kid: {kid}")));
        }

        // Google rotates keys; a miss may mean our cache predates the rotation.
        self.refresh_keys().await?;
        self.cached_key(kid)
            .await
            .ok_or_else(|| OidcError::Rejected(format!("unknown JWT kid: {kid}")))
    }

    async fn recently_refreshed(&self) -> bool {
        let now = Instant::now();
        self.keys.read().await.as_ref().is_some_and(|cached| {
            cached.expires_at > now && now.duration_since(cached.fetched_at) < MIN_REFRESH_INTERVAL
        })
    }

    async fn cached_key(&self, kid: &str) -> Option<Arc<DecodingKey>> {
        let now = Instant::now();
        self.keys
            .read()
            .await
            .as_ref()
            .filter(|cached| cached.expires_at > now)
            .and_then(|cached| cached.by_kid.get(kid))
            .cloned()
    }

    /// Fetch Google's current keys. Callers hold `refresh_lock`.
    async fn refresh_keys(&self) -> Result<(), OidcError> {
        let response = self
            .http_client
            .get(GOOGLE_CERTS_URL)
            .send()
            .await
            .map_err(|e| OidcError::Transient(format!("certs request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(OidcError::Transient(format!(
                "certs request returned status {}",
                response.status()
            )));
        }

        let ttl = response
            .headers()
            .get(CACHE_CONTROL)
            .and_then(|v| v.to_str().ok())
            .and_then(max_age)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_KEY_TTL);

        let jwks: Jwks = response
            .json()
            .await
            .map_err(|e| OidcError::Transient(format!("invalid certs JSON: {e}")))?;

        let by_kid = usable_keys(jwks);
        if by_kid.is_empty() {
            return Err(OidcError::Transient(
                "certs response had no usable RSA keys".to_string(),
            ));
        }

        tracing::debug!(keys = by_kid.len(), ttl_secs = ttl.as_secs(), "Refreshed Google signing keys");

        let fetched_at = Instant::now();
        *self.keys.write().await = Some(CachedKeys {
            by_kid,
            fetched_at,
            expires_at: fetched_at + ttl,
        });
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct Jwks {
    keys: Vec<Jwk>,
}

#[derive(Debug, Deserialize)]
struct Jwk {
    kid: String,
    kty: String,
    alg: Option<String>,
    n: String,
    e: String,
    #[serde(rename = "use")]
    use_: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IdTokenClaims {
    sub: String,
    email: Option<String>,
    email_verified: Option<bool>,
    name: Option<String>,
    picture: Option<String>,
}

fn usable_keys(jwks: Jwks) -> HashMap<String, Arc<DecodingKey>> {
    jwks.keys
        .into_iter()
        .filter(|jwk| jwk.kty == "RSA" && !jwk.kid.trim().is_empty())
        .filter(|jwk| jwk.alg.as_deref().map_or(true, |alg| alg == "RS256"))
        .filter(|jwk| jwk.use_.as_deref().map_or(true, |u| u == "sig"))
        .filter_map(|jwk| match DecodingKey::from_rsa_components(&jwk.n, &jwk.e) {
            Ok(key) => Some((jwk.kid, Arc::new(key))),
            Err(e) => {
                tracing::warn!(error = %e, kid = %jwk.kid, "Skipping invalid RSA key");
                None
            }
        })
        .collect()
}

fn max_age(cache_control: &str) -> Option<u64> {
    cache_control
        .split(',')
        .filter_map(|directive| directive.trim().strip_prefix("max-age="))
        .find_map(|raw| raw.trim_matches('"').parse().ok())
}
