//! The audit pipeline: validate, prompt, generate once, sanitize.

use crate::ai::Generator;
use crate::error::AnalysisResult;
use crate::generate::{FenceRules, StructuredTask};
use crate::prompt;
use crate::sanitize::sanitize_payload;
use crate::source::check_solidity;

pub use crate::sanitize::AuditOutcome;

pub const AUDIT_TASK: StructuredTask<AuditOutcome> = StructuredTask {
    name: "audit",
    fences: FenceRules::Keep,
    coerce: sanitize_payload,
};

/// Run one audit of `source`.
///
/// The source pre-check runs before the generator is touched, so a rejected
/// contract never costs a request.
pub fn analyze(generator: &dyn Generator, source: &str) -> AnalysisResult<AuditOutcome> {
    check_solidity(source)?;
    let outcome = AUDIT_TASK.run(generator, &prompt::audit_prompt(source))?;
    tracing::info!(
        stars = outcome.result.stars,
        findings = outcome.result.vulnerabilities.total(),
        lowered = outcome.policy.was_lowered(),
        "audit completed"
    );
    Ok(outcome)
}
