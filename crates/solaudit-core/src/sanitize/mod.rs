//! Response sanitizer and policy enforcer.
//!
//! Turns raw model text into a policy-compliant `AuditResult` in three
//! steps: extraction (`extract`), coercion (`coerce`), then the strict
//! rating rules (`rules::eval`). Only extraction can fail.

pub mod coerce;
pub mod extract;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AnalysisError;
use crate::report::model::AuditResult;
use crate::rules::eval::{self, PolicyOutcome};

pub use extract::{Strategy, extract_json, try_extract_json};

/// A sanitized audit and the record of the policy pass that produced it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuditOutcome {
    pub result: AuditResult,
    pub policy: PolicyOutcome,
}

/// Coerce an already extracted payload and enforce the rating policy.
pub fn sanitize_payload(payload: &Value) -> AuditOutcome {
    let mut result = coerce::coerce_audit(payload);
    let policy = eval::enforce(&mut result);
    AuditOutcome { result, policy }
}

/// Full sanitization of raw model output.
pub fn sanitize(raw: &str) -> Result<AuditOutcome, AnalysisError> {
    let payload = extract_json(raw)?;
    Ok(sanitize_payload(&payload))
}
