//! Minimal ABI codec for the audit registry contract.
//!
//! Responsibilities:
//! - Function selectors and event topics from their signatures
//! - Calldata for `registerAudit`, `getAllAudits` and `getTotalContracts`
//! - Decoding `uint256` returns and the five parallel arrays of an audit page
//!
//! Non-responsibilities:
//! - Generic ABI support (only the shapes the registry uses are handled)
//! - Transport (see `chain::rpc`)

use sha3::{Digest, Keccak256};

use crate::chain::registry::RegistryEntry;
use crate::chain::{ChainError, ChainResult};

pub const REGISTER_AUDIT: &str = "registerAudit(bytes32,uint8,string)";
pub const GET_ALL_AUDITS: &str = "getAllAudits(uint256,uint256)";
pub const GET_TOTAL_CONTRACTS: &str = "getTotalContracts()";
pub const AUDIT_REGISTERED: &str = "AuditRegistered(bytes32,uint8,string,address,uint256)";

const WORD: usize = 32;

fn keccak(bytes: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(bytes);
    hasher.finalize().into()
}

pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

pub fn event_topic(signature: &str) -> [u8; 32] {
    keccak(signature.as_bytes())
}

/// `0x`-prefixed lowercase hex.
pub fn to_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

pub fn from_hex(value: &str) -> ChainResult<Vec<u8>> {
    let digits = value.strip_prefix("0x").unwrap_or(value);
    hex::decode(digits).map_err(|e| ChainError::Abi(format!("invalid hex {value:?}: {e}")))
}

/// Decode exactly 32 bytes of hex, e.g. a contract hash.
pub fn bytes32_from_hex(value: &str) -> ChainResult<[u8; 32]> {
    from_hex(value)?
        .try_into()
        .map_err(|_| ChainError::Abi(format!("expected 32 bytes: {value}")))
}

fn uint_word(value: u64) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[WORD - 8..].copy_from_slice(&value.to_be_bytes());
    word
}

fn push_bytes(out: &mut Vec<u8>, bytes: &[u8]) {
    out.extend_from_slice(&uint_word(bytes.len() as u64));
    out.extend_from_slice(bytes);
    let padding = (WORD - bytes.len() % WORD) % WORD;
    out.extend(std::iter::repeat_n(0u8, padding));
}

pub fn encode_register_audit(contract_hash: &[u8; 32], stars: u8, summary: &str) -> Vec<u8> {
    let mut out = selector(REGISTER_AUDIT).to_vec();
    out.extend_from_slice(contract_hash);
    out.extend_from_slice(&uint_word(stars as u64));
    out.extend_from_slice(&uint_word(3 * WORD as u64));
    push_bytes(&mut out, summary.as_bytes());
    out
}

pub fn encode_get_all_audits(start_index: u64, limit: u64) -> Vec<u8> {
    let mut out = selector(GET_ALL_AUDITS).to_vec();
    out.extend_from_slice(&uint_word(start_index));
    out.extend_from_slice(&uint_word(limit));
    out
}

pub fn encode_get_total_contracts() -> Vec<u8> {
    selector(GET_TOTAL_CONTRACTS).to_vec()
}

/// Bounds-checked view over ABI return data.
struct Reader<'a> {
    data: &'a [u8],
}

impl<'a> Reader<'a> {
    fn word(&self, offset: usize) -> ChainResult<&'a [u8]> {
        offset
            .checked_add(WORD)
            .and_then(|end| self.data.get(offset..end))
            .ok_or_else(|| ChainError::Abi(format!("word at {offset} out of bounds")))
    }

    fn uint(&self, offset: usize) -> ChainResult<u64> {
        let word = self.word(offset)?;
        if word[..WORD - 8].iter().any(|b| *b != 0) {
            return Err(ChainError::Abi(format!("integer at {offset} exceeds 64 bits")));
        }
        let mut tail = [0u8; 8];
        tail.copy_from_slice(&word[WORD - 8..]);
        Ok(u64::from_be_bytes(tail))
    }

    fn offset(&self, at: usize) -> ChainResult<usize> {
        usize::try_from(self.uint(at)?).map_err(|e| ChainError::Abi(e.to_string()))
    }

    /// Length of the dynamic array at `base`, checked against the data size.
    fn array_len(&self, base: usize) -> ChainResult<usize> {
        let len = self.offset(base)?;
        if len > self.data.len() / WORD {
            return Err(ChainError::Abi(format!("array length {len} exceeds data")));
        }
        Ok(len)
    }

    fn words(&self, base: usize) -> ChainResult<Vec<&'a [u8]>> {
        let len = self.array_len(base)?;
        (0..len).map(|i| self.word(base + WORD * (i + 1))).collect()
    }

    fn string(&self, at: usize) -> ChainResult<String> {
        let len = self.offset(at)?;
        let bytes = at
            .checked_add(WORD)
            .and_then(|start| Some(start..start.checked_add(len)?))
            .and_then(|range| self.data.get(range))
            .ok_or_else(|| ChainError::Abi(format!("string at {at} out of bounds")))?;
        String::from_utf8(bytes.to_vec()).map_err(|e| ChainError::Abi(e.to_string()))
    }

    fn strings(&self, base: usize) -> ChainResult<Vec<String>> {
        let len = self.array_len(base)?;
        let elements = base + WORD;
        (0..len)
            .map(|i| {
                let rel = self.offset(elements + WORD * i)?;
                let at = elements.checked_add(rel).ok_or_else(|| {
                    ChainError::Abi(format!("string offset {rel} overflows"))
                })?;
                self.string(at)
            })
            .collect()
    }
}

pub fn decode_uint(data: &[u8]) -> ChainResult<u64> {
    Reader { data }.uint(0)
}

/// Decode the `(bytes32[], uint8[], string[], address[], uint256[])` return
/// of `getAllAudits` into rows. All five arrays must have the same length.
pub fn decode_audit_page(data: &[u8]) -> ChainResult<Vec<RegistryEntry>> {
    let r = Reader { data };
    let hashes = r.words(r.offset(0)?)?;
    let stars = r.words(r.offset(WORD)?)?;
    let summaries = r.strings(r.offset(2 * WORD)?)?;
    let auditors = r.words(r.offset(3 * WORD)?)?;
    let timestamps_at = r.offset(4 * WORD)?;
    let count = r.array_len(timestamps_at)?;

    let lengths = [stars.len(), summaries.len(), auditors.len(), count];
    if lengths.iter().any(|len| *len != hashes.len()) {
        return Err(ChainError::Abi(format!(
            "mismatched array lengths: {} vs {lengths:?}",
            hashes.len()
        )));
    }

    hashes
        .into_iter()
        .zip(stars)
        .zip(summaries)
        .zip(auditors)
        .enumerate()
        .map(|(i, (((hash, stars), summary), auditor))| {
            Ok(RegistryEntry {
                contract_hash: to_hex(hash),
                stars: stars[WORD - 1],
                summary,
                auditor: to_hex(&auditor[WORD - 20..]),
                timestamp: r.uint(timestamps_at + WORD * (i + 1))?,
            })
        })
        .collect()
}

/// Encode rows as a `getAllAudits` return value.
///
/// Used by in-memory registries that stand in for a node.
pub fn encode_audit_page(entries: &[RegistryEntry]) -> ChainResult<Vec<u8>> {
    let count = entries.len() as u64;

    let mut hashes = uint_word(count).to_vec();
    let mut stars = uint_word(count).to_vec();
    let mut auditors = uint_word(count).to_vec();
    let mut timestamps = uint_word(count).to_vec();
    let mut summary_offsets = uint_word(count).to_vec();
    let mut summary_bodies = Vec::new();

    for entry in entries {
        hashes.extend_from_slice(&bytes32_from_hex(&entry.contract_hash)?);
        stars.extend_from_slice(&uint_word(entry.stars as u64));

        let address = from_hex(&entry.auditor)?;
        if address.len() != 20 {
            return Err(ChainError::Abi(format!("invalid address {}", entry.auditor)));
        }
        auditors.extend_from_slice(&[0u8; WORD - 20]);
        auditors.extend_from_slice(&address);

        timestamps.extend_from_slice(&uint_word(entry.timestamp));

        summary_offsets
            .extend_from_slice(&uint_word((WORD * entries.len() + summary_bodies.len()) as u64));
        push_bytes(&mut summary_bodies, entry.summary.as_bytes());
    }
    summary_offsets.extend_from_slice(&summary_bodies);

    let tails = [hashes, stars, summary_offsets, auditors, timestamps];
    let mut out = Vec::new();
    let mut next = tails.len() * WORD;
    for tail in &tails {
        out.extend_from_slice(&uint_word(next as u64));
        next += tail.len();
    }
    for tail in tails {
        out.extend(tail);
    }
    Ok(out)
}
