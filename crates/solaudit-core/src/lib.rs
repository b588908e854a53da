pub mod ai;
pub mod audit;
pub mod chain;
pub mod config;
pub mod docs;
pub mod error;
pub mod generate;
pub mod prompt;
pub mod report;
pub mod rules;
pub mod sanitize;
pub mod session;
pub mod source;
pub mod util;

pub use audit::{AuditOutcome, analyze};
pub use error::AnalysisError;

pub const TOOL_NAME: &str = "solaudit";

/// JSON schema version of exported audit reports.
/// This must be bumped only when the report layout changes semantically.
pub const SCHEMA_VERSION: &str = "0.1.0";

pub const RULE_CATALOG_VERSION: &str = "0.1.0";
