pub mod read;
pub mod validate;

pub use read::{SourceContext, contract_hash, read_source};
pub use validate::{ValidationIssue, check_solidity};
