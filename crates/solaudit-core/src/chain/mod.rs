//! On-chain audit registry access.
//!
//! Everything here sits behind two seams: [`rpc::RpcTransport`] for read-only
//! JSON-RPC and [`wallet::WalletProvider`] for anything that needs the user's
//! account. The sanitizer and rating policy never depend on this module.

pub mod abi;
pub mod chains;
pub mod registry;
pub mod reports;
pub mod rpc;
pub mod wallet;

pub use chains::{CHAINS, ChainConfig, ChainKey, NativeCurrency};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("unsupported network {chain_id}, please switch to a supported network")]
    UnsupportedNetwork { chain_id: String },

    #[error("unknown chain: {0}")]
    UnknownChain(String),

    #[error("no wallet account connected")]
    NoAccount,

    #[error("{0}")]
    Transaction(String),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("RPC transport failed: {0}")]
    Transport(String),

    #[error("ABI decoding failed: {0}")]
    Abi(String),
}

impl ChainError {
    /// JSON-RPC error code, when the node returned one.
    pub fn rpc_code(&self) -> Option<i64> {
        match self {
            ChainError::Rpc { code, .. } => Some(*code),
            _ => None,
        }
    }
}

pub type ChainResult<T> = Result<T, ChainError>;
