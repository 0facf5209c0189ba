// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Secrets (JWT key, LLM and mail relay credentials) are injected as
//! environment variables by the deployment and read once at startup.

use std::env;

/// Which document store backs the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Firestore,
    /// Process-local store, for local development without GCP.
    Memory,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Frontend URL (CORS origin, cookie attributes, email links)
    pub frontend_url: String,
    /// GCP project ID
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// Session lifetime in days
    pub session_ttl_days: i64,
    /// Google OAuth client ID (expected ID token audience)
    pub google_client_id: String,
    /// Base URL of an OpenAI-compatible chat completions API
    pub llm_base_url: String,
    /// Model name sent with every completion request
    pub llm_model: String,
    /// Mail relay endpoint accepting JSON messages
    pub mail_relay_url: String,
    /// Sender address for outgoing mail
    pub mail_from: String,
    /// bcrypt work factor for passwords and reset codes
    pub bcrypt_cost: u32,
    pub store_backend: StoreBackend,

    // --- Secrets ---
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    pub llm_api_key: String,
    pub mail_api_key: String,
}

impl Config {
    /// Config for tests only.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            session_ttl_days: 30,
            google_client_id: "test-client.apps.googleusercontent.com".to_string(),
            llm_base_url: "http://localhost:9999/v1".to_string(),
            llm_model: "test-model".to_string(),
            mail_relay_url: "http://localhost:9998/send".to_string(),
            mail_from: "Chefini <no-reply@chefini.test>".to_string(),
            // bcrypt's minimum cost keeps tests fast
            bcrypt_cost: 4,
            store_backend: StoreBackend::Memory,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            llm_api_key: "test_llm_key".to_string(),
            mail_api_key: "test_mail_key".to_string(),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// A `.env` file is read first if present (local development).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let store_backend = match env::var("STORE_BACKEND")
            .unwrap_or_else(|_| "firestore".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "firestore" => StoreBackend::Firestore,
            "memory" => StoreBackend::Memory,
            other => return Err(ConfigError::Invalid("STORE_BACKEND", other.to_string())),
        };

        let bcrypt_cost = match env::var("BCRYPT_COST") {
            Ok(raw) => {
                let cost: u32 = raw
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::Invalid("BCRYPT_COST", raw.clone()))?;
                if !(4..=31).contains(&cost) {
                    return Err(ConfigError::Invalid("BCRYPT_COST", raw));
                }
                cost
            }
            Err(_) => bcrypt::DEFAULT_COST,
        };

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            session_ttl_days: env::var("SESSION_TTL_DAYS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|days| *days > 0)
                .unwrap_or(30),
            google_client_id: required("GOOGLE_CLIENT_ID")?,
            llm_base_url: env::var("LLM_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            llm_model: env::var("LLM_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            mail_relay_url: required("MAIL_RELAY_URL")?,
            mail_from: env::var("MAIL_FROM")
                .unwrap_or_else(|_| "Chefini <no-reply@chefini.app>".to_string()),
            bcrypt_cost,
            store_backend,

            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
            llm_api_key: required("LLM_API_KEY")?,
            mail_api_key: required("MAIL_API_KEY")?,
        })
    }

    /// Whether session cookies must carry the `Secure` attribute.
    pub fn secure_cookies(&self) -> bool {
        self.frontend_url.starts_with("https://")
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .map(|v| v.trim().to_string())
        .map_err(|_| ConfigError::Missing(name))
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
