//! Cross-chain audit reports, filters and auditor profiles.

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::chain::ChainKey;
use crate::chain::registry::{AuditRegistryReader, RegistryEntry, fetch_all_audits};
use crate::util::deterministic::sort_records_newest_first;

/// Most recent audits shown on an auditor profile.
pub const RECENT_AUDITS: usize = 5;

/// A registry row together with the chain it was read from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    pub contract_hash: String,
    pub stars: u8,
    pub summary: String,
    pub auditor: String,
    pub timestamp: u64,
    pub chain: ChainKey,
    pub chain_name: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub transaction_hash: Option<String>,
}

impl AuditRecord {
    pub fn from_entry(chain: ChainKey, entry: RegistryEntry) -> Self {
        Self {
            contract_hash: entry.contract_hash,
            stars: entry.stars,
            summary: entry.summary,
            auditor: entry.auditor,
            timestamp: entry.timestamp,
            chain,
            chain_name: chain.config().chain_name.to_string(),
            transaction_hash: None,
        }
    }

    pub fn audited_at(&self) -> Option<DateTime<Utc>> {
        i64::try_from(self.timestamp)
            .ok()
            .and_then(|ts| Utc.timestamp_opt(ts, 0).single())
    }

    pub fn explorer_url(&self) -> Option<String> {
        self.transaction_hash
            .as_deref()
            .map(|tx| self.chain.config().tx_url(tx))
    }
}

/// Read every chain's registry into one list, newest first.
///
/// A chain that cannot be read is logged and skipped. With `lookup_tx`, each
/// record also gets the hash of its registration transaction.
pub fn collect_records(
    registries: &[(ChainKey, &dyn AuditRegistryReader)],
    page_size: u64,
    lookup_tx: bool,
) -> Vec<AuditRecord> {
    let mut records = Vec::new();

    for (chain, reader) in registries {
        let entries = match fetch_all_audits(*reader, page_size) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(%chain, error = %e, "skipping chain");
                continue;
            }
        };
        tracing::info!(%chain, audits = entries.len(), "chain read");

        for entry in entries {
            let mut record = AuditRecord::from_entry(*chain, entry);
            if lookup_tx {
                record.transaction_hash = reader
                    .registration_tx(&record.contract_hash)
                    .unwrap_or_else(|e| {
                        tracing::warn!(%chain, hash = %record.contract_hash, error = %e, "registration lookup failed");
                        None
                    });
            }
            records.push(record);
        }
    }

    sort_records_newest_first(&mut records);
    records
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateRange {
    Day,
    Week,
    Month,
}

impl DateRange {
    pub fn seconds(&self) -> u64 {
        match self {
            DateRange::Day => 86_400,
            DateRange::Week => 604_800,
            DateRange::Month => 2_592_000,
        }
    }
}

/// Report list filters. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportFilter {
    /// Case-insensitive substring of the contract hash or auditor.
    pub search: Option<String>,
    pub chain: Option<ChainKey>,
    pub min_stars: Option<u8>,
    pub date_range: Option<DateRange>,
}

impl ReportFilter {
    pub fn matches(&self, record: &AuditRecord, now: DateTime<Utc>) -> bool {
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            let needle = search.to_lowercase();
            if !record.contract_hash.to_lowercase().contains(&needle)
                && !record.auditor.to_lowercase().contains(&needle)
            {
                return false;
            }
        }
        if self.chain.is_some_and(|c| c != record.chain) {
            return false;
        }
        if self.min_stars.is_some_and(|min| record.stars < min) {
            return false;
        }
        if let Some(range) = self.date_range {
            let now = u64::try_from(now.timestamp()).unwrap_or_default();
            if now.saturating_sub(record.timestamp) > range.seconds() {
                return false;
            }
        }
        true
    }

    pub fn apply<'a>(&self, records: &'a [AuditRecord], now: DateTime<Utc>) -> Vec<&'a AuditRecord> {
        records.iter().filter(|r| self.matches(r, now)).collect()
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuditorStats {
    pub auditor: String,
    pub total_audits: usize,
    pub average_stars: f64,
    pub chain_breakdown: BTreeMap<ChainKey, usize>,
    pub recent_audits: Vec<AuditRecord>,
}

/// Profile of one auditor over newest-first `records`.
pub fn auditor_stats(records: &[AuditRecord], auditor: &str) -> AuditorStats {
    let mine: Vec<&AuditRecord> = records
        .iter()
        .filter(|r| r.auditor.eq_ignore_ascii_case(auditor))
        .collect();

    let mut chain_breakdown = BTreeMap::new();
    for record in &mine {
        *chain_breakdown.entry(record.chain).or_insert(0) += 1;
    }
    let total_stars: u64 = mine.iter().map(|r| r.stars as u64).sum();

    AuditorStats {
        auditor: auditor.to_string(),
        total_audits: mine.len(),
        average_stars: if mine.is_empty() {
            0.0
        } else {
            total_stars as f64 / mine.len() as f64
        },
        chain_breakdown,
        recent_audits: mine.into_iter().take(RECENT_AUDITS).cloned().collect(),
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInfo {
    pub name: String,
    pub chain_id: String,
    pub contract_address: String,
}

/// Downloadable JSON form of one registry record.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RecordExport {
    pub contract_hash: String,
    pub stars: u8,
    pub summary: String,
    pub auditor: String,
    pub timestamp: u64,
    pub chain: ChainKey,
    pub chain_name: String,
    pub export_date: String,
    pub network: NetworkInfo,
    pub audit_date: String,
}

pub fn export_record(record: &AuditRecord, now: DateTime<Utc>) -> RecordExport {
    let chain = record.chain.config();
    RecordExport {
        contract_hash: record.contract_hash.clone(),
        stars: record.stars,
        summary: record.summary.clone(),
        auditor: record.auditor.clone(),
        timestamp: record.timestamp,
        chain: record.chain,
        chain_name: record.chain_name.clone(),
        export_date: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        network: NetworkInfo {
            name: chain.chain_name.to_string(),
            chain_id: chain.chain_id.to_string(),
            contract_address: chain.registry_address.to_string(),
        },
        audit_date: record
            .audited_at()
            .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
            .unwrap_or_default(),
    }
}

/// File name of a record export: `audit-` plus the first 8 characters of the hash.
pub fn export_file_name(record: &AuditRecord) -> String {
    let prefix: String = record.contract_hash.chars().take(8).collect();
    format!("audit-{prefix}.json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{ChainError, ChainResult};

    const NOW: i64 = 1_700_000_000;

    fn now() -> DateTime<Utc> {
        Utc.timestamp_opt(NOW, 0).single().unwrap()
    }

    fn record(chain: ChainKey, hash: &str, auditor: &str, stars: u8, age: u64) -> AuditRecord {
        AuditRecord::from_entry(
            chain,
            RegistryEntry {
                contract_hash: hash.into(),
                stars,
                summary: "s".into(),
                auditor: auditor.into(),
                timestamp: NOW as u64 - age,
            },
        )
    }

    struct Fixed(Result<Vec<RegistryEntry>, ()>);

    impl AuditRegistryReader for Fixed {
        fn total_contracts(&self) -> ChainResult<u64> {
            match &self.0 {
                Ok(rows) => Ok(rows.len() as u64),
                Err(()) => Err(ChainError::Transport("unreachable node".into())),
            }
        }

        fn audits_page(&self, start: u64, limit: u64) -> ChainResult<Vec<RegistryEntry>> {
            let rows = self.0.as_ref().map_err(|_| ChainError::Transport("down".into()))?;
            Ok(rows.iter().skip(start as usize).take(limit as usize).cloned().collect())
        }

        fn registration_tx(&self, hash: &str) -> ChainResult<Option<String>> {
            Ok(Some(format!("tx-{hash}")))
        }
    }

    fn row(hash: &str, timestamp: u64) -> RegistryEntry {
        RegistryEntry {
            contract_hash: hash.into(),
            stars: 4,
            summary: "fine".into(),
            auditor: "0xaaa".into(),
            timestamp,
        }
    }

    #[test]
    fn collect_merges_chains_and_skips_failures() {
        let linea = Fixed(Ok(vec![row("0x01", 10), row("0x02", 30)]));
        let neox = Fixed(Err(()));
        let kaia = Fixed(Ok(vec![row("0x03", 20)]));

        let records = collect_records(
            &[
                (ChainKey::LineaSepolia, &linea as &dyn AuditRegistryReader),
                (ChainKey::NeoX, &neox),
                (ChainKey::KaiaTestnet, &kaia),
            ],
            50,
            true,
        );

        let hashes: Vec<&str> = records.iter().map(|r| r.contract_hash.as_str()).collect();
        assert_eq!(hashes, vec!["0x02", "0x03", "0x01"]);
        assert_eq!(records[1].chain_name, "Kaia Testnet");
        assert_eq!(records[0].transaction_hash.as_deref(), Some("tx-0x02"));
    }

    #[test]
    fn search_matches_hash_or_auditor_ignoring_case() {
        let records = vec![
            record(ChainKey::NeoX, "0xABCdef", "0x111", 3, 0),
            record(ChainKey::NeoX, "0x999", "0xBeEf", 3, 0),
            record(ChainKey::NeoX, "0x555", "0x222", 3, 0),
        ];
        let by_hash = ReportFilter {
            search: Some("abcDEF".into()),
            ..Default::default()
        };
        let by_auditor = ReportFilter {
            search: Some("BEEF".into()),
            ..Default::default()
        };

        assert_eq!(by_hash.apply(&records, now()).len(), 1);
        assert_eq!(by_auditor.apply(&records, now())[0].contract_hash, "0x999");
    }

    #[test]
    fn chain_stars_and_date_filters_combine() {
        let records = vec![
            record(ChainKey::NeoX, "0x1", "a", 5, 3_600),
            record(ChainKey::NeoX, "0x2", "a", 2, 3_600),
            record(ChainKey::NeoX, "0x3", "a", 5, 2 * 86_400),
            record(ChainKey::FlowTestnet, "0x4", "a", 5, 3_600),
        ];
        let filter = ReportFilter {
            chain: Some(ChainKey::NeoX),
            min_stars: Some(3),
            date_range: Some(DateRange::Day),
            ..Default::default()
        };

        let hits: Vec<&str> = filter
            .apply(&records, now())
            .into_iter()
            .map(|r| r.contract_hash.as_str())
            .collect();
        assert_eq!(hits, vec!["0x1"]);

        let week = ReportFilter {
            date_range: Some(DateRange::Week),
            ..Default::default()
        };
        assert_eq!(week.apply(&records, now()).len(), 4);
    }

    #[test]
    fn auditor_profile_counts_and_averages() {
        let records = vec![
            record(ChainKey::NeoX, "0x1", "0xAbC", 5, 1),
            record(ChainKey::NeoX, "0x2", "0xabc", 2, 2),
            record(ChainKey::TelosTestnet, "0x3", "0xABC", 2, 3),
            record(ChainKey::TelosTestnet, "0x4", "0xother", 0, 4),
            record(ChainKey::NeoX, "0x5", "0xabc", 3, 5),
            record(ChainKey::NeoX, "0x6", "0xabc", 3, 6),
            record(ChainKey::NeoX, "0x7", "0xabc", 0, 7),
        ];

        let stats = auditor_stats(&records, "0xabc");

        assert_eq!(stats.total_audits, 6);
        assert!((stats.average_stars - 2.5).abs() < f64::EPSILON);
        assert_eq!(stats.chain_breakdown[&ChainKey::NeoX], 5);
        assert_eq!(stats.chain_breakdown[&ChainKey::TelosTestnet], 1);
        assert_eq!(stats.recent_audits.len(), RECENT_AUDITS);
        assert_eq!(stats.recent_audits[0].contract_hash, "0x1");
    }

    #[test]
    fn unknown_auditor_has_zero_average() {
        let stats = auditor_stats(&[], "0xabc");
        assert_eq!(stats.total_audits, 0);
        assert_eq!(stats.average_stars, 0.0);
    }

    #[test]
    fn export_carries_network_and_dates() {
        let rec = record(ChainKey::EduchainTestnet, "0x1234567890", "0xabc", 4, 0);
        let export = serde_json::to_value(export_record(&rec, now())).unwrap();

        assert_eq!(export["chain"], "educhainTestnet");
        assert_eq!(export["network"]["chainId"], "0xA045C");
        assert_eq!(
            export["network"]["contractAddress"],
            "0x1AE7ED8C5Cc87E84b91eD8627Ac18540cB7a744F"
        );
        assert_eq!(export["exportDate"], "2023-11-14T22:13:20.000Z");
        assert_eq!(export["auditDate"], "2023-11-14T22:13:20Z");
        assert_eq!(export_file_name(&rec), "audit-0x123456.json");
    }
}
