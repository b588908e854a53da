//! Field coercion for extracted payloads.
//!
//! Nothing here fails. Every defect is absorbed by a per-field fallback:
//! empty list, zero stars or the fallback summary. Callers can only tell a
//! fallback happened from the resulting values.

use serde_json::Value;

use crate::report::model::{AuditResult, FALLBACK_SUMMARY, MAX_STARS, Vulnerabilities};

/// Display form of a JSON value.
///
/// `null` becomes the empty string so that it is dropped from lists.
/// Integral floats print without a fractional part.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.to_string()
            } else if let Some(u) = n.as_u64() {
                u.to_string()
            } else {
                let f = n.as_f64().unwrap_or_default();
                if f.fract() == 0.0 && f.abs() < 1e21 {
                    format!("{f:.0}")
                } else {
                    f.to_string()
                }
            }
        }
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Stringify each element of a list field, dropping empty results.
///
/// A missing or non-array value yields an empty list.
pub fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .map(stringify)
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

/// Numeric coercion of a loosely typed value. NaN when not numeric.
fn numeric(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                0.0
            } else {
                trimmed.parse::<f64>().unwrap_or(f64::NAN)
            }
        }
        Some(Value::Bool(b)) => f64::from(u8::from(*b)),
        Some(Value::Null) | None => 0.0,
        Some(Value::Array(items)) => match items.as_slice() {
            [] => 0.0,
            [Value::Bool(_)] => f64::NAN,
            [single] => numeric(Some(single)),
            _ => f64::NAN,
        },
        Some(Value::Object(_)) => f64::NAN,
    }
}

/// Coerce a model rating into `0..=MAX_STARS`.
///
/// Non-numeric input becomes 0. A one-element array counts as its element.
/// Fractions are truncated after clamping.
pub fn coerce_stars(value: Option<&Value>) -> u8 {
    let n = numeric(value);
    if n.is_nan() {
        return 0;
    }
    n.clamp(0.0, f64::from(MAX_STARS)).trunc() as u8
}

/// Falsy scalars (`0`, `false`) count as missing.
pub fn coerce_summary(value: Option<&Value>) -> String {
    let summary = match value {
        Some(Value::Bool(false)) => String::new(),
        Some(Value::Number(n)) if n.as_f64() == Some(0.0) => String::new(),
        other => other.map(stringify).unwrap_or_default(),
    };
    if summary.trim().is_empty() {
        FALLBACK_SUMMARY.to_string()
    } else {
        summary
    }
}

/// Build an `AuditResult` from any JSON value. Policy is not applied here.
pub fn coerce_audit(payload: &Value) -> AuditResult {
    let vulns = payload.get("vulnerabilities");
    let bucket = |name: &str| string_list(vulns.and_then(|v| v.get(name)));

    AuditResult {
        stars: coerce_stars(payload.get("stars")),
        summary: coerce_summary(payload.get("summary")),
        vulnerabilities: Vulnerabilities {
            critical: bucket("critical"),
            high: bucket("high"),
            medium: bucket("medium"),
            low: bucket("low"),
        },
        recommendations: string_list(payload.get("recommendations")),
        gas_optimizations: string_list(payload.get("gasOptimizations")),
    }
}
