// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Batch meal-prep plan model.
//!
//! A plan has two phases: a one-off *build* phase (cook and prep everything
//! in a single session) and a *runtime* phase (what to eat each day).

use super::recipe::Macros;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A prep task done during the cooking session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrepTask {
    pub task: String,
    /// Human-readable duration ("40 mins")
    pub duration: String,
    #[serde(default)]
    pub temperature: Option<String>,
    /// Why this step is done this way
    #[serde(default)]
    pub rationale: String,
}

/// The dish served on one day of the plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayPlan {
    pub day: u32,
    pub dish: String,
    pub instructions: Vec<String>,
    pub macros: Macros,
}

/// A stored batch plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchPlan {
    /// Plan ID (also used as document ID)
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub days: u32,
    pub servings: u32,
    pub ingredients: Vec<String>,
    pub build_phase: Vec<PrepTask>,
    pub runtime_phase: Vec<DayPlan>,
    pub storage_tip: String,
    #[serde(with = "crate::time_utils::sortable_rfc3339")]
    pub created_at: DateTime<Utc>,
}

impl BatchPlan {
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.owner_id == user_id
    }
}
