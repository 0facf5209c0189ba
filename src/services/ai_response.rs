// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Parsing of JSON answers from the LLM.
//!
//! Models often wrap JSON in markdown fences or add a sentence of preamble,
//! and are loose about types (`"calories": 450` vs `"450 kcal"`). This
//! module tolerates both, then hands typed values to the feature parsers,
//! which check their required fields before anything downstream trusts them.

use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;

/// Why an LLM answer could not be used.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AiResponseError {
    /// Not JSON, or JSON of the wrong shape.
    #[error("response is not valid JSON: {0}")]
    Parse(String),

    /// Well-formed JSON missing something we require.
    #[error("response failed validation: {0}")]
    Validation(String),
}

impl AiResponseError {
    pub fn missing(field: &str) -> Self {
        AiResponseError::Validation(format!("missing or empty `{}`", field))
    }
}

/// Strip markdown code fences and surrounding prose from a JSON answer.
pub fn strip_code_fences(raw: &str) -> &str {
    let mut text = raw.trim();

    if let Some(rest) = text.strip_prefix("```") {
        // Drop the info string ("json") on the opening fence line.
        text = match rest.find('\n') {
            Some(idx) => &rest[idx + 1..],
            None => rest,
        };
        text = text.trim_end();
        text = text.strip_suffix("```").unwrap_or(text);
        text = text.trim();
    }

    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => text,
    }
}

/// Parse an LLM answer into `T`.
pub fn parse_json<T: DeserializeOwned>(raw: &str) -> Result<T, AiResponseError> {
    let cleaned = strip_code_fences(raw);
    serde_json::from_str(cleaned).map_err(|e| AiResponseError::Parse(e.to_string()))
}

/// Strings with surrounding whitespace removed; blanks dropped.
pub fn clean_lines(lines: Vec<String>) -> Vec<String> {
    lines
        .into_iter()
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .collect()
}

/// Require a non-blank string field.
pub fn require_text(value: Option<String>, field: &str) -> Result<String, AiResponseError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AiResponseError::missing(field))
}

/// Accept a string, number or bool and render it as a string.
pub fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(
        match Option::<serde_json::Value>::deserialize(deserializer)? {
            Some(serde_json::Value::String(s)) => s,
            Some(serde_json::Value::Number(n)) => n.to_string(),
            Some(serde_json::Value::Bool(b)) => b.to_string(),
            _ => String::new(),
        },
    )
}

/// Like [`lenient_string`], keeping absence distinct from empty.
pub fn lenient_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = lenient_string(deserializer)?;
    Ok((!s.trim().is_empty()).then_some(s))
}

/// A list of strings, where the model may have sent a single string.
pub fn lenient_string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        Many(Vec<serde_json::Value>),
        One(String),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        Some(OneOrMany::Many(values)) => values
            .into_iter()
            .filter_map(|v| match v {
                serde_json::Value::String(s) => Some(s),
                serde_json::Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        Some(OneOrMany::One(s)) => vec![s],
        None => Vec::new(),
    })
}
