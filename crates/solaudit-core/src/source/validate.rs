//! Syntactic pre-check for submitted Solidity source.
//!
//! This is a heuristic, not a parser: it only looks for a version pragma and
//! a contract declaration. False positives and negatives are accepted.

use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

static PRAGMA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"pragma\s+solidity\s+[\^]?\d+\.\d+\.\d+").expect("static regex")
});

static CONTRACT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"contract\s+\w+").expect("static regex"));

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum ValidationIssue {
    #[error("Please enter your smart contract code.")]
    EmptySource,

    #[error(
        "Invalid input. Please ensure your code is a valid Solidity smart contract (missing pragma directive)."
    )]
    MissingPragma,

    #[error(
        "Invalid input. Please ensure your code is a valid Solidity smart contract (missing contract declaration)."
    )]
    MissingContract,
}

/// Reject input that does not look like a compilable Solidity unit.
///
/// Must pass before any generation call is made.
pub fn check_solidity(code: &str) -> Result<(), ValidationIssue> {
    if code.trim().is_empty() {
        return Err(ValidationIssue::EmptySource);
    }
    if !PRAGMA.is_match(code) {
        return Err(ValidationIssue::MissingPragma);
    }
    if !CONTRACT.is_match(code) {
        return Err(ValidationIssue::MissingContract);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = "// SPDX-License-Identifier: MIT\npragma solidity ^0.8.19;\n\ncontract Vault {\n}\n";

    #[test]
    fn accepts_pragma_and_contract() {
        assert_eq!(check_solidity(VALID), Ok(()));
    }

    #[test]
    fn accepts_pragma_without_caret() {
        assert_eq!(
            check_solidity("pragma solidity 0.8.0;\ncontract A {}"),
            Ok(())
        );
    }

    #[test]
    fn rejects_contract_without_pragma() {
        assert_eq!(
            check_solidity("contract Vault { function f() public {} }"),
            Err(ValidationIssue::MissingPragma)
        );
    }

    #[test]
    fn rejects_pragma_without_contract() {
        assert_eq!(
            check_solidity("pragma solidity ^0.8.19;\nlibrary Math {}"),
            Err(ValidationIssue::MissingContract)
        );
    }

    #[test]
    fn rejects_range_pragma_without_full_version() {
        assert_eq!(
            check_solidity("pragma solidity >=0.8;\ncontract A {}"),
            Err(ValidationIssue::MissingPragma)
        );
    }

    #[test]
    fn rejects_blank_input() {
        assert_eq!(check_solidity("  \n\t"), Err(ValidationIssue::EmptySource));
    }
}
