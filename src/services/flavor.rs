// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Flavor debugger: diagnose a cooking mistake and suggest rescues.

use crate::services::ai_response::{
    clean_lines, lenient_string, lenient_string_list, parse_json, require_text, AiResponseError,
};
use crate::services::llm::{CompletionOptions, PromptPair};
use serde::{Deserialize, Serialize};

pub const FLAVOR_COMPLETION: CompletionOptions = CompletionOptions::json(0.4, 800);

/// Diagnosis returned to the client.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlavorDiagnosis {
    pub diagnosis: String,
    pub causes: Vec<String>,
    pub fixes: Vec<String>,
    pub prevention: String,
}

const FLAVOR_SYSTEM_PROMPT: &str = r#"You are Chefini's flavor debugger, a calm professional chef who rescues dishes.
Given a dish and what went wrong, explain the likely cause and how to fix it NOW with common kitchen ingredients.
Answer with a single JSON object, no markdown, no commentary:
{
  "diagnosis": "<one-sentence summary of what happened>",
  "causes": ["<likely cause>"],
  "fixes": ["<concrete rescue step, most effective first>"],
  "prevention": "<how to avoid it next time>"
}"#;

pub fn build_prompt(dish: &str, problem: &str) -> PromptPair {
    PromptPair {
        system: FLAVOR_SYSTEM_PROMPT.to_string(),
        user: format!("Dish: {}\nWhat went wrong: {}", dish.trim(), problem.trim()),
    }
}

#[derive(Deserialize)]
struct RawDiagnosis {
    #[serde(default)]
    diagnosis: Option<String>,
    #[serde(default, alias = "cause", deserialize_with = "lenient_string_list")]
    causes: Vec<String>,
    #[serde(default, alias = "solutions", deserialize_with = "lenient_string_list")]
    fixes: Vec<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    prevention: String,
}

pub fn parse_diagnosis(raw: &str) -> Result<FlavorDiagnosis, AiResponseError> {
    let parsed: RawDiagnosis = parse_json(raw)?;

    let diagnosis = require_text(parsed.diagnosis, "diagnosis")?;
    let fixes = clean_lines(parsed.fixes);
    if fixes.is_empty() {
        return Err(AiResponseError::missing("fixes"));
    }

    Ok(FlavorDiagnosis {
        diagnosis,
        causes: clean_lines(parsed.causes),
        fixes,
        prevention: parsed.prevention.trim().to_string(),
    })
}
