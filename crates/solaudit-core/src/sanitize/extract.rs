//! JSON extraction from free-form model output.
//!
//! The model is an untrusted text oracle. Extraction is an ordered chain of
//! independent strategies, each producing a candidate slice that must parse
//! as a JSON object. The first strategy that yields an object wins.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

use crate::error::AnalysisError;

static JSON_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```json\s*(.*?)\s*```").expect("static regex"));

static ANY_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```\s*(.*?)\s*```").expect("static regex"));

static BRACE_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)(\{.*\})").expect("static regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// The whole text is the payload.
    Direct,
    /// Content of the first fence tagged `json`.
    JsonFence,
    /// Content of the first fence of any kind.
    AnyFence,
    /// Greedy span from the first `{` to the last `}`.
    BraceSpan,
}

impl Strategy {
    /// Priority order of the extraction chain.
    pub const CHAIN: [Strategy; 4] = [
        Strategy::Direct,
        Strategy::JsonFence,
        Strategy::AnyFence,
        Strategy::BraceSpan,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Direct => "direct",
            Strategy::JsonFence => "json_fence",
            Strategy::AnyFence => "any_fence",
            Strategy::BraceSpan => "brace_span",
        }
    }

    /// The text this strategy would hand to the JSON parser, if any.
    pub fn candidate<'a>(&self, raw: &'a str) -> Option<&'a str> {
        let capture = |re: &Regex| re.captures(raw).and_then(|c| c.get(1)).map(|m| m.as_str());
        match self {
            Strategy::Direct => Some(raw),
            Strategy::JsonFence => capture(&JSON_FENCE),
            Strategy::AnyFence => capture(&ANY_FENCE),
            Strategy::BraceSpan => capture(&BRACE_SPAN),
        }
    }

    /// Parse this strategy's candidate. Only JSON objects count as located.
    pub fn try_extract(&self, raw: &str) -> Option<Value> {
        let candidate = self.candidate(raw)?;
        match serde_json::from_str::<Value>(candidate) {
            Ok(value @ Value::Object(_)) => Some(value),
            _ => None,
        }
    }
}

/// Run the strategy chain and report which strategy matched.
pub fn try_extract_json(raw: &str) -> Option<(Strategy, Value)> {
    Strategy::CHAIN
        .into_iter()
        .find_map(|s| s.try_extract(raw).map(|v| (s, v)))
}

/// Locate the JSON object in `raw` or fail the whole run.
pub fn extract_json(raw: &str) -> Result<Value, AnalysisError> {
    match try_extract_json(raw) {
        Some((strategy, value)) => {
            tracing::debug!(strategy = strategy.name(), "located JSON payload");
            Ok(value)
        }
        None => {
            tracing::warn!(len = raw.len(), "no JSON object found in model response");
            Err(AnalysisError::UnparseableResponse)
        }
    }
}
