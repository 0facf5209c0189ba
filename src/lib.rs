// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Chefini: turn leftover ingredients into recipes.
//!
//! This crate provides the backend API: accounts and sessions, AI recipe
//! and meal-prep generation, the cookbook and public feed, shopping lists
//! and the flavor debugger.

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::Store;
use services::{CompletionClient, GoogleOidcVerifier, Mailer};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Arc<dyn Store>,
    pub llm: Arc<dyn CompletionClient>,
    pub mailer: Arc<dyn Mailer>,
    pub google_verifier: Arc<GoogleOidcVerifier>,
}
