// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Ingredient input classifier.
//!
//! Asks the LLM whether free text is food-related and inoffensive. Any
//! failure (transport, parse, missing field) yields "valid": a flaky
//! classifier must not block users.

use crate::services::ai_response::parse_json;
use crate::services::llm::{CompletionClient, CompletionOptions, PromptPair};
use serde::{Deserialize, Serialize};

pub const CLASSIFIER_COMPLETION: CompletionOptions = CompletionOptions::json(0.0, 100);

/// Classifier verdict returned to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentVerdict {
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ContentVerdict {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            reason: None,
        }
    }
}

const CLASSIFIER_SYSTEM_PROMPT: &str = r#"You are a strict input classifier for a cooking app.
Decide whether the user's text is a list of food ingredients or cooking-related items, and contains nothing offensive, hateful or sexual.
Answer with a single JSON object: {"isValid": <true|false>, "reason": "<short reason when invalid>"}"#;

pub fn build_prompt(text: &str) -> PromptPair {
    PromptPair {
        system: CLASSIFIER_SYSTEM_PROMPT.to_string(),
        user: format!("Text: {}", text.trim()),
    }
}

#[derive(Deserialize)]
struct RawVerdict {
    #[serde(alias = "is_valid", alias = "valid", rename = "isValid")]
    is_valid: bool,
    #[serde(default)]
    reason: Option<String>,
}

/// Interpret a classifier answer; unreadable answers pass.
pub fn parse_verdict(raw: &str) -> ContentVerdict {
    match parse_json::<RawVerdict>(raw) {
        Ok(v) if v.is_valid => ContentVerdict::valid(),
        Ok(v) => ContentVerdict {
            is_valid: false,
            reason: Some(
                v.reason
                    .map(|r| r.trim().to_string())
                    .filter(|r| !r.is_empty())
                    .unwrap_or_else(|| "Please enter food ingredients only".to_string()),
            ),
        },
        Err(e) => {
            tracing::warn!(error = %e, "Content classifier answer unreadable, allowing input");
            ContentVerdict::valid()
        }
    }
}

/// Classify `text`, failing open.
pub async fn classify(client: &dyn CompletionClient, text: &str) -> ContentVerdict {
    match client
        .complete(&build_prompt(text), CLASSIFIER_COMPLETION)
        .await
    {
        Ok(raw) => parse_verdict(&raw),
        Err(e) => {
            tracing::warn!(error = %e, "Content classifier unavailable, allowing input");
            ContentVerdict::valid()
        }
    }
}
