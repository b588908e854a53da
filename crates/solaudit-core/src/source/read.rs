use anyhow::{Context, Result};
use sha3::{Digest, Keccak256};
use std::{fs, path::Path};

use crate::report::model::SourceInfo;

/// Submitted contract source used during analysis and registration.
///
/// Holds the exact text analyzed and the registry identity derived from it.
#[derive(Debug, Clone)]
pub struct SourceContext {
    /// Optional source path (informational only).
    pub path: Option<String>,

    /// Exact source text.
    pub code: String,

    /// Size of the source in UTF-8 bytes.
    pub size_bytes: u64,

    /// Keccak-256 of the UTF-8 bytes, as used by the audit registry.
    pub contract_hash: [u8; 32],
}

impl SourceContext {
    pub fn from_code(code: impl Into<String>, path: Option<String>) -> Self {
        let code = code.into();
        Self {
            path,
            size_bytes: code.len() as u64,
            contract_hash: contract_hash(&code),
            code,
        }
    }

    /// `0x`-prefixed lowercase hex of the contract hash.
    pub fn contract_hash_hex(&self) -> String {
        format!("0x{}", hex::encode(self.contract_hash))
    }

    /// Report-facing metadata. Drops the source text itself.
    pub fn source_info(&self) -> SourceInfo {
        SourceInfo {
            path: self.path.clone(),
            size_bytes: self.size_bytes,
            hash_algorithm: "keccak256".to_string(),
            contract_hash: self.contract_hash_hex(),
        }
    }
}

/// Deterministic registry identity of a contract: keccak-256 over the UTF-8 bytes.
pub fn contract_hash(code: &str) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(code.as_bytes());
    hasher.finalize().into()
}

/// Read a Solidity source file.
///
/// The identity depends **only** on the file contents; filesystem metadata
/// is ignored.
pub fn read_source(path: &Path) -> Result<SourceContext> {
    let code = fs::read_to_string(path)
        .with_context(|| format!("failed to read source: {}", path.display()))?;

    Ok(SourceContext::from_code(code, Some(path.display().to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn temp_source(data: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(data.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn reads_text_and_computes_keccak_hash() {
        let file = temp_source("hello");

        let ctx = read_source(file.path()).expect("source read succeeds");

        assert_eq!(ctx.code, "hello");
        assert_eq!(ctx.size_bytes, 5);
        assert_eq!(
            ctx.contract_hash_hex(),
            "0x1c8aff950685c2ed4bc3174f3472287b56d9517b9c948127319a09a7a36deac8"
        );
    }

    #[test]
    fn empty_source_hashes_to_keccak_of_nothing() {
        assert_eq!(
            hex::encode(contract_hash("")),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn different_sources_produce_different_hashes() {
        let a = read_source(temp_source("contract A {}").path()).unwrap();
        let b = read_source(temp_source("contract B {}").path()).unwrap();

        assert_ne!(a.contract_hash, b.contract_hash);
    }

    #[test]
    fn missing_file_returns_error() {
        let result = read_source(Path::new("non_existent.sol"));
        assert!(result.is_err());
    }

    #[test]
    fn converts_to_report_source_info() {
        let ctx = SourceContext::from_code("abc", Some("Token.sol".into()));

        let info = ctx.source_info();
        assert_eq!(info.path, Some("Token.sol".into()));
        assert_eq!(info.size_bytes, 3);
        assert_eq!(info.hash_algorithm, "keccak256");
        assert!(info.contract_hash.starts_with("0x"));
        assert_eq!(info.contract_hash.len(), 66);
    }
}
