// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod batch;
pub mod recipe;
pub mod shopping;
pub mod user;

pub use batch::{BatchPlan, DayPlan, PrepTask};
pub use recipe::{LikeOutcome, Macros, Recipe, RecipeIngredient};
pub use shopping::ShoppingList;
pub use user::{ResetOtp, User};
