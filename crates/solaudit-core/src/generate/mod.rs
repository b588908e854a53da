//! Two-phase generation helpers shared by every feature.
//!
//! Each task is: build a prompt, call the generator once, strip code fences,
//! then either return the cleaned text or extract and coerce a JSON object.
//! Only the audit task carries a rating policy; it plugs in through the
//! coerce callback like any other.

use regex::Regex;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::LazyLock;

use crate::ai::Generator;
use crate::docs::model::{Documentation, coerce_documentation};
use crate::error::{AnalysisError, AnalysisResult};
use crate::prompt::{self, ContractTemplate, TestFramework};
use crate::sanitize::extract_json;
use crate::source::ValidationIssue;

static LANGUAGE_FENCE_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```[a-z]*\n").expect("static regex"));

/// How code fences are removed from raw model text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FenceRules {
    /// Leave the text untouched; the extraction chain handles fences.
    Keep,
    /// Trim, then drop one leading ```` ```json ```` and one trailing ```` ``` ````.
    JsonEnvelope,
    /// Drop every ```` ```lang ```` opener, every remaining fence and every `*`.
    AnyLanguage,
    /// Drop ```` ```solidity ```` openers and every remaining fence.
    Solidity,
}

impl FenceRules {
    pub fn strip(&self, raw: &str) -> String {
        match self {
            FenceRules::Keep => raw.to_string(),
            FenceRules::JsonEnvelope => {
                let mut text = raw.trim();
                if let Some(rest) = text.strip_prefix("```json") {
                    text = rest.trim_start();
                }
                if let Some(rest) = text.strip_suffix("```") {
                    text = rest.trim_end();
                }
                text.to_string()
            }
            FenceRules::AnyLanguage => LANGUAGE_FENCE_OPEN
                .replace_all(raw, "")
                .replace("```", "")
                .replace('*', "")
                .trim()
                .to_string(),
            FenceRules::Solidity => raw
                .replace("```solidity\n", "")
                .replace("```\n", "")
                .replace("```", "")
                .trim()
                .to_string(),
        }
    }
}

/// A generation task whose output is a JSON object coerced into `T`.
pub struct StructuredTask<T> {
    pub name: &'static str,
    pub fences: FenceRules,
    /// Validate-and-coerce step. Must not fail.
    pub coerce: fn(&Value) -> T,
}

impl<T> StructuredTask<T> {
    /// Strip, extract and coerce already generated text.
    pub fn parse(&self, raw: &str) -> AnalysisResult<T> {
        let cleaned = self.fences.strip(raw);
        let payload = extract_json(&cleaned)?;
        Ok((self.coerce)(&payload))
    }

    pub fn run(&self, generator: &dyn Generator, prompt: &str) -> AnalysisResult<T> {
        tracing::debug!(task = self.name, "running structured generation");
        let raw = generator.generate(prompt)?;
        self.parse(&raw)
    }
}

/// Generate free text and strip its fences.
pub fn generate_text(
    generator: &dyn Generator,
    prompt: &str,
    fences: FenceRules,
) -> AnalysisResult<String> {
    let raw = generator.generate(prompt)?;
    Ok(fences.strip(&raw))
}

pub const DOCUMENTATION_TASK: StructuredTask<Documentation> = StructuredTask {
    name: "documentation",
    fences: FenceRules::JsonEnvelope,
    coerce: coerce_documentation,
};

fn require_source(source: &str) -> AnalysisResult<()> {
    if source.trim().is_empty() {
        return Err(ValidationIssue::EmptySource.into());
    }
    Ok(())
}

pub fn generate_documentation(
    generator: &dyn Generator,
    source: &str,
) -> AnalysisResult<Documentation> {
    require_source(source)?;
    DOCUMENTATION_TASK.run(generator, &prompt::documentation_prompt(source))
}

pub fn generate_tests(
    generator: &dyn Generator,
    source: &str,
    framework: TestFramework,
) -> AnalysisResult<String> {
    require_source(source)?;
    generate_text(
        generator,
        &prompt::test_prompt(source, framework),
        FenceRules::AnyLanguage,
    )
}

/// Output of the contract builder.
#[derive(Debug)]
pub struct ContractDraft {
    pub code: String,
    /// Set when generation failed and `code` is the template's base code.
    pub failure: Option<AnalysisError>,
}

/// Generate a contract from a template, falling back to the base code on failure.
pub fn build_contract(
    generator: &dyn Generator,
    template: &ContractTemplate,
    custom_features: Option<&str>,
    params: &BTreeMap<String, String>,
) -> AnalysisResult<ContractDraft> {
    let prompt = prompt::contract_prompt(template, custom_features, params);
    match generate_text(generator, &prompt, FenceRules::Solidity) {
        Ok(code) => Ok(ContractDraft {
            code,
            failure: None,
        }),
        Err(e) if !template.base_code.is_empty() => {
            tracing::warn!(template = template.name, error = %e, "falling back to base code");
            Ok(ContractDraft {
                code: template.base_code.to_string(),
                failure: Some(e),
            })
        }
        Err(e) => Err(e),
    }
}
