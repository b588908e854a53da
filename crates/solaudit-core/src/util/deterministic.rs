//! Deterministic ordering helpers.
//!
//! Registry reads arrive in per-chain, per-page order. Everything shown or
//! exported goes through these helpers so identical registry state always
//! produces identical output.

use crate::chain::reports::AuditRecord;

/// Sort records newest first.
///
/// Ties on timestamp are broken by `(chain, contract_hash, auditor)` so the
/// order does not depend on which chain answered first.
pub fn sort_records_newest_first(records: &mut [AuditRecord]) {
    records.sort_by(|a, b| {
        b.timestamp
            .cmp(&a.timestamp)
            .then_with(|| a.chain.cmp(&b.chain))
            .then_with(|| a.contract_hash.cmp(&b.contract_hash))
            .then_with(|| a.auditor.cmp(&b.auditor))
    });
}
