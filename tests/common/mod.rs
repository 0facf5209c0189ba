// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use chefini_api::config::Config;
use chefini_api::db::{FirestoreDb, MemoryDb, Store};
use chefini_api::error::AppError;
use chefini_api::routes::create_router;
use chefini_api::services::llm::{CompletionClient, CompletionOptions, PromptPair};
use chefini_api::services::{EmailMessage, GoogleOidcVerifier, Mailer};
use chefini_api::AppState;
use jsonwebtoken::DecodingKey;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

/// Key id of the fixture RSA key standing in for Google's signing key.
#[allow(dead_code)]
pub const GOOGLE_TEST_KID: &str = "test-google-key";
#[allow(dead_code)]
pub const GOOGLE_TEST_PRIVATE_KEY: &[u8] = include_bytes!("../fixtures/google_test_key.pem");
const GOOGLE_TEST_PUBLIC_KEY: &[u8] = include_bytes!("../fixtures/google_test_key.pub.pem");

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// LLM stand-in answering from a queue of canned responses.
#[derive(Default)]
pub struct ScriptedLlm {
    responses: Mutex<VecDeque<Result<String, String>>>,
    prompts: Mutex<Vec<PromptPair>>,
}

#[allow(dead_code)]
impl ScriptedLlm {
    pub fn push_ok(&self, body: impl Into<String>) {
        self.responses.lock().unwrap().push_back(Ok(body.into()));
    }

    pub fn push_err(&self, reason: impl Into<String>) {
        self.responses.lock().unwrap().push_back(Err(reason.into()));
    }

    pub fn prompts(&self) -> Vec<PromptPair> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionClient for ScriptedLlm {
    async fn complete(
        &self,
        prompt: &PromptPair,
        _options: CompletionOptions,
    ) -> Result<String, AppError> {
        self.prompts.lock().unwrap().push(prompt.clone());
        match self.responses.lock().unwrap().pop_front() {
            Some(Ok(body)) => Ok(body),
            Some(Err(reason)) => Err(AppError::Upstream(reason)),
            None => Err(AppError::Upstream("no scripted response".to_string())),
        }
    }
}

/// Mailer that keeps messages instead of sending them.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<EmailMessage>>,
    fail: AtomicBool,
}

#[allow(dead_code)]
impl RecordingMailer {
    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn fail_sends(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// The 6-digit code from the most recent reset email.
    pub fn last_reset_code(&self) -> Option<String> {
        self.sent()
            .iter()
            .rev()
            .find(|m| m.subject.contains("reset code"))
            .and_then(|m| {
                m.text
                    .split(|c: char| !c.is_ascii_digit())
                    .find(|chunk| chunk.len() == 6)
                    .map(str::to_string)
            })
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), AppError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Upstream("mail relay down".to_string()));
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

/// A router wired to test doubles, plus handles to inspect them.
#[allow(dead_code)]
pub struct TestApp {
    pub router: axum::Router,
    pub state: Arc<AppState>,
    pub llm: Arc<ScriptedLlm>,
    pub mailer: Arc<RecordingMailer>,
}

/// Create a test app backed by an in-memory store.
#[allow(dead_code)]
pub fn create_test_app() -> TestApp {
    create_test_app_with(Config::test_default(), Arc::new(MemoryDb::new()))
}

/// Create a test app with a given config and store.
#[allow(dead_code)]
pub fn create_test_app_with(config: Config, db: Arc<dyn Store>) -> TestApp {
    let llm = Arc::new(ScriptedLlm::default());
    let mailer = Arc::new(RecordingMailer::default());
    let google_verifier = Arc::new(
        GoogleOidcVerifier::new_with_static_key(
            &config,
            GOOGLE_TEST_KID,
            DecodingKey::from_rsa_pem(GOOGLE_TEST_PUBLIC_KEY).unwrap(),
        )
        .unwrap(),
    );

    let state = Arc::new(AppState {
        config,
        db,
        llm: llm.clone(),
        mailer: mailer.clone(),
        google_verifier,
    });

    TestApp {
        router: create_router(state.clone()),
        state,
        llm,
        mailer,
    }
}

/// Response pieces tests look at.
#[allow(dead_code)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

#[allow(dead_code)]
impl TestApp {
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    /// Send a body verbatim with the given content type.
    pub async fn request_raw(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        content_type: &str,
        body: &str,
    ) -> TestResponse {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, content_type);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), 1 << 20)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            // Non-JSON bodies come back as a string so callers can assert on them.
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, token: &str) -> TestResponse {
        self.request(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    /// Sign up a user and return `(token, user_id)`.
    pub async fn signup(&self, name: &str, email: &str, password: &str) -> (String, String) {
        let response = self
            .post(
                "/api/auth/signup",
                None,
                serde_json::json!({"name": name, "email": email, "password": password}),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        (
            response.body["token"].as_str().unwrap().to_string(),
            response.body["user"]["id"].as_str().unwrap().to_string(),
        )
    }
}

/// A well-formed recipe answer from the model.
#[allow(dead_code)]
pub fn recipe_json(title: &str) -> String {
    serde_json::json!({
        "title": title,
        "time": "15 mins",
        "ingredients": [
            {"item": "2 cups cooked rice", "missing": false},
            {"item": "2 eggs", "missing": false},
            {"item": "1 tbsp soy sauce", "missing": false},
            {"item": "Spring onions", "missing": true}
        ],
        "instructions": ["Scramble the eggs", "Fry the rice", "Season and serve"],
        "macros": {"calories": "480", "protein": "18g", "carbs": "62g", "fats": "16g"},
        "magicTip": "Use day-old rice"
    })
    .to_string()
}
