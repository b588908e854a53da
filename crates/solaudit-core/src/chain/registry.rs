//! Reading and writing the audit registry contract.

use serde::{Deserialize, Serialize};

use crate::chain::abi::{self, to_hex};
use crate::chain::rpc::{self, HttpTransport, RpcTransport};
use crate::chain::wallet::{TransactionRequest, WalletProvider};
use crate::chain::{ChainConfig, ChainKey, ChainResult};
use crate::report::model::{AuditResult, RegistrationInfo};
use crate::source::SourceContext;

/// Rows requested per `getAllAudits` call.
pub const DEFAULT_PAGE_SIZE: u64 = 50;

/// One row of the registry's append log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RegistryEntry {
    pub contract_hash: String,
    pub stars: u8,
    pub summary: String,
    pub auditor: String,
    /// Unix seconds.
    pub timestamp: u64,
}

/// Read side of the registry.
pub trait AuditRegistryReader {
    fn total_contracts(&self) -> ChainResult<u64>;

    fn audits_page(&self, start_index: u64, limit: u64) -> ChainResult<Vec<RegistryEntry>>;

    /// Hash of the transaction that registered `contract_hash`, if any.
    fn registration_tx(&self, contract_hash: &str) -> ChainResult<Option<String>>;
}

/// Registry deployment on one chain, read through JSON-RPC.
pub struct RpcRegistry<T> {
    chain: &'static ChainConfig,
    transport: T,
}

impl RpcRegistry<HttpTransport> {
    /// Registry on `key` through the chain's public RPC endpoint.
    pub fn public(key: ChainKey, timeout_secs: u64) -> Self {
        let chain = key.config();
        Self::new(chain, HttpTransport::new(chain.rpc_url(), timeout_secs))
    }
}

impl<T: RpcTransport> RpcRegistry<T> {
    pub fn new(chain: &'static ChainConfig, transport: T) -> Self {
        Self { chain, transport }
    }

    pub fn chain(&self) -> &'static ChainConfig {
        self.chain
    }

    fn call(&self, data: &[u8]) -> ChainResult<Vec<u8>> {
        rpc::eth_call(&self.transport, self.chain.registry_address, data)
    }
}

impl<T: RpcTransport> AuditRegistryReader for RpcRegistry<T> {
    fn total_contracts(&self) -> ChainResult<u64> {
        abi::decode_uint(&self.call(&abi::encode_get_total_contracts())?)
    }

    fn audits_page(&self, start_index: u64, limit: u64) -> ChainResult<Vec<RegistryEntry>> {
        abi::decode_audit_page(&self.call(&abi::encode_get_all_audits(start_index, limit))?)
    }

    fn registration_tx(&self, contract_hash: &str) -> ChainResult<Option<String>> {
        let topics = [
            Some(to_hex(&abi::event_topic(abi::AUDIT_REGISTERED))),
            Some(contract_hash.to_lowercase()),
        ];
        let logs = rpc::eth_get_logs(&self.transport, self.chain.registry_address, &topics)?;
        Ok(logs.into_iter().rev().find_map(|log| log.transaction_hash))
    }
}

/// Read every row of the registry, `page_size` rows at a time.
///
/// Pages are requested at the number of rows received so far, so a short
/// page never leaves a gap. A failing page stops the walk and keeps what
/// was already read; an empty page ends it early.
pub fn fetch_all_audits(
    reader: &dyn AuditRegistryReader,
    page_size: u64,
) -> ChainResult<Vec<RegistryEntry>> {
    let total = reader.total_contracts()?;
    let page_size = page_size.max(1);
    let mut entries = Vec::new();
    let mut processed = 0u64;

    while processed < total {
        let limit = page_size.min(total - processed);
        let page = match reader.audits_page(processed, limit) {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!(start = processed, error = %e, "failed to fetch audit page");
                break;
            }
        };
        if page.is_empty() {
            break;
        }
        processed += page.len() as u64;
        entries.extend(page);
    }

    tracing::debug!(total, fetched = entries.len(), "registry read");
    Ok(entries)
}

/// Register a sanitized audit on the wallet's current network.
///
/// The wallet must be on a supported chain. Nothing is persisted when the
/// transaction is rejected or reverts.
pub fn register_audit(
    wallet: &dyn WalletProvider,
    source: &SourceContext,
    result: &AuditResult,
) -> ChainResult<RegistrationInfo> {
    let chain_id = wallet.chain_id()?;
    let chain = ChainKey::from_chain_id(&chain_id)?.config();
    if wallet.account().is_none() {
        wallet.connect()?;
    }

    let tx = TransactionRequest {
        to: chain.registry_address.to_string(),
        data: abi::encode_register_audit(&source.contract_hash, result.stars, &result.summary),
    };
    let tx_hash = wallet.send_transaction(&tx)?;
    tracing::info!(chain = %chain.key, %tx_hash, "registration submitted");
    let receipt = wallet.wait_for_receipt(&tx_hash)?;

    Ok(RegistrationInfo {
        chain: chain.chain_name.to_string(),
        chain_id: chain.chain_id.to_string(),
        registry_address: chain.registry_address.to_string(),
        explorer_url: chain.tx_url(&receipt.transaction_hash),
        transaction_hash: receipt.transaction_hash,
    })
}
