// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session cookie attribute tests.
//!
//! These tests verify the cookie set on sign-in and the removal cookie set
//! on logout carry matching attributes for local and https frontends.

use axum::http::{header, HeaderMap, Method, StatusCode};
use chefini_api::config::Config;
use chefini_api::db::MemoryDb;
use std::sync::Arc;

mod common;

fn set_cookie_headers(headers: &HeaderMap) -> Vec<String> {
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|value| value.to_str().unwrap().to_string())
        .collect()
}

fn find_cookie(headers: &[String], name: &str) -> String {
    headers
        .iter()
        .find(|value| value.starts_with(&format!("{name}=")))
        .cloned()
        .unwrap_or_else(|| panic!("missing Set-Cookie header for {name}: {headers:?}"))
}

fn app_with_frontend(frontend_url: &str) -> common::TestApp {
    let config = Config {
        frontend_url: frontend_url.to_string(),
        ..Config::test_default()
    };
    common::create_test_app_with(config, Arc::new(MemoryDb::new()))
}

#[tokio::test]
async fn test_signup_sets_session_cookie_localhost() {
    let app = app_with_frontend("http://localhost:5173");

    let response = app
        .post(
            "/api/auth/signup",
            None,
            serde_json::json!({"name": "Asha", "email": "asha@example.com", "password": "curry-leaves"}),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);

    let cookie = find_cookie(&set_cookie_headers(&response.headers), "chefini_token");
    let token = response.body["token"].as_str().unwrap();
    assert!(cookie.starts_with(&format!("chefini_token={token}")));
    assert!(cookie.contains("Path=/"));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(cookie.contains(&format!("Max-Age={}", 30 * 24 * 60 * 60)));
    assert!(!cookie.contains("Secure"));
}

#[tokio::test]
async fn test_login_cookie_is_secure_for_https_frontend() {
    let app = app_with_frontend("https://chefini.example");
    app.signup("Asha", "asha@example.com", "curry-leaves").await;

    let response = app
        .post(
            "/api/auth/login",
            None,
            serde_json::json!({"email": "asha@example.com", "password": "curry-leaves"}),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let cookie = find_cookie(&set_cookie_headers(&response.headers), "chefini_token");
    assert!(cookie.contains("Secure"));
    assert!(cookie.contains("HttpOnly"));
}

#[tokio::test]
async fn test_logout_cookie_removal_localhost_attributes() {
    let app = app_with_frontend("http://localhost:5173");

    let response = app
        .request(Method::POST, "/api/auth/logout", None, None)
        .await;

    assert_eq!(response.status, StatusCode::NO_CONTENT);

    let cookie = find_cookie(&set_cookie_headers(&response.headers), "chefini_token");
    assert!(cookie.starts_with("chefini_token=;"));
    assert!(cookie.contains("Path=/"));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(cookie.contains("Max-Age=0"));
    assert!(!cookie.contains("Secure"));
    assert!(!cookie.contains("Domain="));
}

#[tokio::test]
async fn test_logout_cookie_removal_https_attributes() {
    let app = app_with_frontend("https://chefini.example");

    let response = app
        .request(Method::POST, "/api/auth/logout", None, None)
        .await;

    assert_eq!(response.status, StatusCode::NO_CONTENT);

    let cookie = find_cookie(&set_cookie_headers(&response.headers), "chefini_token");
    assert!(cookie.contains("Path=/"));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(cookie.contains("Max-Age=0"));
    assert!(cookie.contains("Secure"));
}
