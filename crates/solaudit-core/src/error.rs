use thiserror::Error;

use crate::ai::GenerationError;
use crate::source::validate::ValidationIssue;

/// Failures of an analysis or generation pipeline run.
///
/// Only these abort a run. Malformed fields inside an otherwise locatable
/// payload are absorbed by coercion and never show up here.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("{0}")]
    Validation(#[from] ValidationIssue),

    #[error("analysis failed, please try again in a few moments: {0}")]
    Generation(#[from] GenerationError),

    #[error("could not find valid JSON in the model response")]
    UnparseableResponse,

    #[error("analysis is cooling down, try again in {remaining_secs}s")]
    CooldownActive { remaining_secs: u64 },
}

impl AnalysisError {
    /// Whether the user can simply run the same request again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AnalysisError::Generation(_)
                | AnalysisError::UnparseableResponse
                | AnalysisError::CooldownActive { .. }
        )
    }
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;
