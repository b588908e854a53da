//! Applies the rating rules to a coerced audit result.
//!
//! Responsibilities:
//! - Walk the rule list in order over a single mutable star count
//! - Record which rules fired and what they changed
//!
//! Non-responsibilities:
//! - Extracting or coercing model output (handled in `sanitize`)
//! - Deciding rule thresholds (fixed in `rules::catalog`)

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::report::model::AuditResult;
use crate::rules::catalog::{RatingRule, RuleId, STRICT_POLICY, STRICT_POLICY_NAME};

/// A rule whose predicate held during enforcement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppliedRule {
    pub rule_id: RuleId,
    pub title: String,
    pub stars_before: u8,
    pub stars_after: u8,
    pub evidence: serde_json::Value,
}

/// Record of one policy pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PolicyOutcome {
    pub policy: String,
    /// Rating after coercion, before any rule ran.
    pub model_stars: u8,
    pub final_stars: u8,
    pub applied: Vec<AppliedRule>,
}

impl PolicyOutcome {
    pub fn unchanged(stars: u8) -> Self {
        Self {
            policy: STRICT_POLICY_NAME.to_string(),
            model_stars: stars,
            final_stars: stars,
            applied: vec![],
        }
    }

    pub fn was_lowered(&self) -> bool {
        self.final_stars < self.model_stars
    }
}

/// Enforce the strict rating policy on `result` in place.
pub fn enforce(result: &mut AuditResult) -> PolicyOutcome {
    enforce_with(result, STRICT_POLICY)
}

/// Enforce an ordered rule list on `result` in place.
///
/// Rules are cumulative. A rule whose predicate holds is recorded even when
/// its effect leaves the rating unchanged.
pub fn enforce_with(result: &mut AuditResult, rules: &[RatingRule]) -> PolicyOutcome {
    let mut outcome = PolicyOutcome::unchanged(result.stars);

    for rule in rules {
        if !(rule.applies)(&result.vulnerabilities) {
            continue;
        }
        let before = result.stars;
        result.stars = (rule.effect)(before).min(before);
        outcome.applied.push(AppliedRule {
            rule_id: rule.id,
            title: rule.title.to_string(),
            stars_before: before,
            stars_after: result.stars,
            evidence: json!({
                "critical_count": result.vulnerabilities.critical.len(),
                "high_count": result.vulnerabilities.high.len(),
            }),
        });
    }

    outcome.final_stars = result.stars;
    if !outcome.applied.is_empty() {
        tracing::debug!(
            model_stars = outcome.model_stars,
            final_stars = outcome.final_stars,
            rules = ?outcome.applied.iter().map(|r| r.rule_id.as_str()).collect::<Vec<_>>(),
            "rating policy applied"
        );
    }
    outcome
}
