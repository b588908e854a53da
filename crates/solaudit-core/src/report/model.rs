use serde::{Deserialize, Serialize};

use crate::SCHEMA_VERSION;
use crate::rules::eval::PolicyOutcome;

/// Summary used when the model gives none.
pub const FALLBACK_SUMMARY: &str = "Analysis completed.";

/// Highest rating an audit can carry.
pub const MAX_STARS: u8 = 5;

/// Validated result of one audit run.
///
/// Every instance leaving the sanitizer has `stars <= MAX_STARS`, a non-empty
/// summary, no empty list entries, and satisfies the strict rating policy.
/// Wire names follow the JSON schema the model is asked to produce.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuditResult {
    pub stars: u8,
    pub summary: String,
    pub vulnerabilities: Vulnerabilities,
    pub recommendations: Vec<String>,
    pub gas_optimizations: Vec<String>,
}

/// Findings grouped into the four fixed severity buckets.
///
/// Each bucket keeps the model's emission order; duplicates are kept.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Vulnerabilities {
    pub critical: Vec<String>,
    pub high: Vec<String>,
    pub medium: Vec<String>,
    pub low: Vec<String>,
}

impl Vulnerabilities {
    pub fn bucket(&self, severity: Severity) -> &[String] {
        match severity {
            Severity::Critical => &self.critical,
            Severity::High => &self.high,
            Severity::Medium => &self.medium,
            Severity::Low => &self.low,
        }
    }

    /// Non-empty buckets, most severe first.
    pub fn non_empty(&self) -> impl Iterator<Item = (Severity, &[String])> {
        Severity::ALL
            .into_iter()
            .map(|s| (s, self.bucket(s)))
            .filter(|(_, issues)| !issues.is_empty())
    }

    pub fn total(&self) -> usize {
        self.critical.len() + self.high.len() + self.medium.len() + self.low.len()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High Risk",
            Severity::Medium => "Medium Risk",
            Severity::Low => "Low Risk",
        }
    }
}

/// Exported audit report.
///
/// This is the local JSON document written by `audit --out`. It must remain
/// deterministic for identical source and model output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditReport {
    pub schema_version: String,
    pub tool: ToolInfo,
    pub source: SourceInfo,
    pub result: AuditResult,
    pub policy: PolicyOutcome,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub registration: Option<RegistrationInfo>,
}

impl AuditReport {
    pub fn new(
        tool: ToolInfo,
        source: SourceInfo,
        result: AuditResult,
        policy: PolicyOutcome,
    ) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            tool,
            source,
            result,
            policy,
            registration: None,
        }
    }

    pub fn with_registration(mut self, registration: RegistrationInfo) -> Self {
        self.registration = Some(registration);
        self
    }
}

/// Tool metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolInfo {
    pub name: String,
    pub version: String,
    pub model: Option<String>,
}

/// Metadata of the analyzed source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceInfo {
    pub path: Option<String>,
    pub size_bytes: u64,
    pub hash_algorithm: String,
    pub contract_hash: String,
}

/// On-chain registration of an audit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegistrationInfo {
    pub chain: String,
    pub chain_id: String,
    pub registry_address: String,
    pub transaction_hash: String,
    pub explorer_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::eval::PolicyOutcome;

    fn result_with(critical: &[&str], high: &[&str]) -> AuditResult {
        AuditResult {
            stars: 2,
            summary: "Reentrancy risk".into(),
            vulnerabilities: Vulnerabilities {
                critical: critical.iter().map(|s| s.to_string()).collect(),
                high: high.iter().map(|s| s.to_string()).collect(),
                ..Default::default()
            },
            recommendations: vec![],
            gas_optimizations: vec!["pack storage".into()],
        }
    }

    #[test]
    fn audit_result_uses_camel_case_wire_names() {
        let json = serde_json::to_value(result_with(&["x"], &[])).unwrap();

        assert!(json.get("gasOptimizations").is_some());
        assert!(json.get("gas_optimizations").is_none());
        assert_eq!(json["vulnerabilities"]["critical"][0], "x");
    }

    #[test]
    fn non_empty_buckets_are_ordered_by_severity() {
        let v = Vulnerabilities {
            critical: vec![],
            high: vec!["h".into()],
            medium: vec![],
            low: vec!["l1".into(), "l2".into()],
        };

        let buckets: Vec<Severity> = v.non_empty().map(|(s, _)| s).collect();
        assert_eq!(buckets, vec![Severity::High, Severity::Low]);
        assert_eq!(v.total(), 3);
    }

    #[test]
    fn report_omits_missing_registration() {
        let report = AuditReport::new(
            ToolInfo {
                name: "solaudit".into(),
                version: "0.1.0".into(),
                model: None,
            },
            SourceInfo {
                path: None,
                size_bytes: 10,
                hash_algorithm: "keccak256".into(),
                contract_hash: "0xabc".into(),
            },
            result_with(&[], &[]),
            PolicyOutcome::unchanged(2),
        );

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["schema_version"], SCHEMA_VERSION);
        assert!(json.get("registration").is_none());
    }

    #[test]
    fn severity_serializes_lowercase() {
        let serialized = serde_json::to_string(&Severity::Critical).unwrap();
        assert_eq!(serialized, "\"critical\"");
        assert_eq!(Severity::High.label(), "High Risk");
    }
}
