//! Prompt construction for every generation task.
//!
//! All builders are pure functions of their inputs. Submitted source is
//! embedded verbatim; the model is trusted to treat it as data.

mod audit;
mod generation;
pub mod templates;

pub use audit::audit_prompt;
pub use generation::{TestFramework, contract_prompt, documentation_prompt, test_prompt};
pub use templates::{ContractTemplate, TemplateKind};
