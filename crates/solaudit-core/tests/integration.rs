use chrono::{TimeZone, Utc};
use solaudit_core::ai::{GenerationError, GenerationResult, Generator};
use solaudit_core::chain::abi;
use solaudit_core::chain::registry::{AuditRegistryReader, RegistryEntry};
use solaudit_core::chain::reports::{self, ReportFilter};
use solaudit_core::chain::{ChainKey, ChainResult};
use solaudit_core::docs;
use solaudit_core::generate;
use solaudit_core::report::model::{AuditReport, ToolInfo};
use solaudit_core::report::render;
use solaudit_core::rules::catalog::RuleId;
use solaudit_core::source::read_source;
use solaudit_core::{AnalysisError, TOOL_NAME, analyze};
use std::cell::RefCell;
use std::path::PathBuf;

/// Path to the fixtures directory relative to the crate root.
fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

fn fixture(name: &str) -> String {
    std::fs::read_to_string(fixtures_dir().join(name))
        .unwrap_or_else(|e| panic!("failed to read {name}: {e}"))
}

/// Generator replaying a fixed reply and recording prompts.
struct Replay {
    reply: String,
    prompts: RefCell<Vec<String>>,
}

impl Replay {
    fn fixture(name: &str) -> Self {
        Self {
            reply: fixture(name),
            prompts: RefCell::new(vec![]),
        }
    }
}

impl Generator for Replay {
    fn generate(&self, prompt: &str) -> GenerationResult<String> {
        self.prompts.borrow_mut().push(prompt.to_string());
        Ok(self.reply.clone())
    }

    fn model_name(&self) -> Option<&str> {
        Some("replay")
    }
}

struct Offline;

impl Generator for Offline {
    fn generate(&self, _: &str) -> GenerationResult<String> {
        Err(GenerationError::RequestFailed("network unreachable".into()))
    }
}

#[test]
fn vault_audit_is_sanitized_and_capped() {
    let source = read_source(&fixtures_dir().join("vault.sol")).unwrap();
    let generator = Replay::fixture("audit_response.txt");

    let outcome = analyze(&generator, &source.code).unwrap();

    let result = &outcome.result;
    assert_eq!(result.vulnerabilities.critical, vec!["Reentrancy in withdraw()"]);
    assert_eq!(result.vulnerabilities.medium, vec!["No pause mechanism"]);
    assert!(result.vulnerabilities.low.is_empty());
    assert_eq!(result.stars, 2);
    assert_eq!(outcome.policy.model_stars, 4);
    assert_eq!(outcome.policy.applied[0].rule_id, RuleId::CriticalCap);

    let prompts = generator.prompts.borrow();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("contract Vault"));
}

#[test]
fn exported_report_carries_hash_and_policy() {
    let source = read_source(&fixtures_dir().join("vault.sol")).unwrap();
    let generator = Replay::fixture("audit_response.txt");
    let outcome = analyze(&generator, &source.code).unwrap();

    let report = AuditReport::new(
        ToolInfo {
            name: TOOL_NAME.into(),
            version: "0.1.0-test".into(),
            model: generator.model_name().map(str::to_string),
        },
        source.source_info(),
        outcome.result,
        outcome.policy,
    );

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["source"]["hash_algorithm"], "keccak256");
    assert_eq!(json["source"]["contract_hash"], source.contract_hash_hex());
    assert_eq!(json["result"]["stars"], 2);
    assert_eq!(json["policy"]["applied"][0]["rule_id"], "R-CRIT-01");

    let text = render::render_text(&report);
    assert!(text.contains("Critical:\n  - Reentrancy in withdraw()"));
    assert!(text.contains("Rating lowered from 4 to 2"));
}

#[test]
fn identical_inputs_produce_identical_reports() {
    let source = read_source(&fixtures_dir().join("vault.sol")).unwrap();
    let first = analyze(&Replay::fixture("audit_response.txt"), &source.code).unwrap();
    let second = analyze(&Replay::fixture("audit_response.txt"), &source.code).unwrap();

    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn offline_generator_fails_with_retryable_error() {
    let source = read_source(&fixtures_dir().join("vault.sol")).unwrap();
    let err = analyze(&Offline, &source.code).unwrap_err();

    assert!(matches!(err, AnalysisError::Generation(_)));
    assert!(err.to_string().contains("try again"));
}

#[test]
fn documentation_pipeline_exports_markdown() {
    let source = fixture("vault.sol");
    let generator = Replay::fixture("docs_response.txt");

    let documentation = generate::generate_documentation(&generator, &source).unwrap();
    let markdown = docs::render_markdown(&documentation);

    assert_eq!(docs::export_file_name(&documentation), "vault-documentation.md");
    assert!(markdown.starts_with("# Vault\n"));
    assert!(markdown.contains("  * `who` (address) - indexed"));
    assert!(markdown.contains("### balances\n* **Type:** mapping(address => uint256)"));
}

/// Registry backed by an ABI-encoded page, as a node would return it.
struct EncodedRegistry {
    rows: Vec<RegistryEntry>,
}

impl AuditRegistryReader for EncodedRegistry {
    fn total_contracts(&self) -> ChainResult<u64> {
        Ok(self.rows.len() as u64)
    }

    fn audits_page(&self, start: u64, limit: u64) -> ChainResult<Vec<RegistryEntry>> {
        let page: Vec<RegistryEntry> = self
            .rows
            .iter()
            .skip(start as usize)
            .take(limit as usize)
            .cloned()
            .collect();
        abi::decode_audit_page(&abi::encode_audit_page(&page)?)
    }

    fn registration_tx(&self, _: &str) -> ChainResult<Option<String>> {
        Ok(None)
    }
}

fn row(n: u64, stars: u8, auditor: u8) -> RegistryEntry {
    RegistryEntry {
        contract_hash: format!("0x{n:064x}"),
        stars,
        summary: format!("audit #{n}"),
        auditor: abi::to_hex(&[auditor; 20]),
        timestamp: 1_700_000_000 - n * 3_600,
    }
}

#[test]
fn reports_span_chains_and_feed_profiles() {
    let linea = EncodedRegistry {
        rows: (0..75).map(|n| row(n * 2, (n % 6) as u8, 0xaa)).collect(),
    };
    let telos = EncodedRegistry {
        rows: (0..10).map(|n| row(n * 2 + 1, 5, 0xbb)).collect(),
    };

    let records = reports::collect_records(
        &[
            (ChainKey::LineaSepolia, &linea as &dyn AuditRegistryReader),
            (ChainKey::TelosTestnet, &telos),
        ],
        50,
        false,
    );
    assert_eq!(records.len(), 85);
    assert!(records.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));

    let now = Utc.timestamp_opt(1_700_000_000, 0).single().unwrap();
    let recent_five_star = ReportFilter {
        min_stars: Some(5),
        date_range: Some(reports::DateRange::Day),
        ..Default::default()
    };
    let hits = recent_five_star.apply(&records, now);
    assert!(hits.iter().all(|r| r.stars == 5 && r.timestamp + 86_400 >= 1_700_000_000));
    assert!(hits.iter().any(|r| r.chain == ChainKey::TelosTestnet));

    let profile = reports::auditor_stats(&records, &format!("0x{}", "BB".repeat(20)));
    assert_eq!(profile.total_audits, 10);
    assert_eq!(profile.average_stars, 5.0);
    assert_eq!(profile.recent_audits[0].contract_hash, format!("0x{:064x}", 1));
}
