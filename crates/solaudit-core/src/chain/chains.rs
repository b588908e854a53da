//! Supported networks and their registry deployments.

use serde::{Deserialize, Serialize};

use crate::chain::{ChainError, ChainResult};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "camelCase")]
pub enum ChainKey {
    LineaSepolia,
    NeoX,
    NeoXTestnet,
    KaiaTestnet,
    FlowTestnet,
    TelosTestnet,
    Ancient8Testnet,
    EduchainTestnet,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct NativeCurrency {
    pub name: &'static str,
    pub symbol: &'static str,
    pub decimals: u8,
}

const fn currency(symbol: &'static str) -> NativeCurrency {
    NativeCurrency {
        name: symbol,
        symbol,
        decimals: 18,
    }
}

/// Static description of one network.
///
/// `chain_id` is the `0x`-prefixed hex form wallets report; compare it with
/// [`ChainConfig::matches_chain_id`], never as a raw string.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChainConfig {
    pub key: ChainKey,
    pub chain_id: &'static str,
    pub chain_name: &'static str,
    pub native_currency: NativeCurrency,
    pub rpc_urls: &'static [&'static str],
    pub block_explorer_urls: &'static [&'static str],
    pub registry_address: &'static str,
}

pub const CHAINS: [ChainConfig; 8] = [
    ChainConfig {
        key: ChainKey::LineaSepolia,
        chain_id: "0xE705",
        chain_name: "Linea Sepolia",
        native_currency: currency("ETH"),
        rpc_urls: &["https://rpc.sepolia.linea.build"],
        block_explorer_urls: &["https://sepolia.lineascan.build"],
        registry_address: "0x03c4fb7563e593ca0625C1c64959AC56081785cE",
    },
    ChainConfig {
        key: ChainKey::NeoX,
        chain_id: "0xBA93",
        chain_name: "Neo X Mainnet",
        native_currency: currency("GAS"),
        rpc_urls: &["https://mainnet-1.rpc.banelabs.org/"],
        block_explorer_urls: &["https://xexplorer.neo.org/"],
        registry_address: "0xF859EB9658b52E29232f2a308920D4c04Df24D2F",
    },
    ChainConfig {
        key: ChainKey::NeoXTestnet,
        chain_id: "0xBA9304",
        chain_name: "Neo X TestNet",
        native_currency: currency("GAS"),
        rpc_urls: &["https://neoxt4seed1.ngd.network"],
        block_explorer_urls: &["https://xt4scan.ngd.network/"],
        registry_address: "0x57fe5FC224a4609b0672bAd2563E5F2BF7c40E7B",
    },
    ChainConfig {
        key: ChainKey::KaiaTestnet,
        chain_id: "0x3E9",
        chain_name: "Kaia Testnet",
        native_currency: currency("KAIA"),
        rpc_urls: &["https://kaia-kairos.blockpi.network/v1/rpc/public"],
        block_explorer_urls: &["https://kairos.kaiascope.com"],
        registry_address: "0xAC89706b3D307D5d2aC740Afad7eF95F5bA7224c",
    },
    ChainConfig {
        key: ChainKey::FlowTestnet,
        chain_id: "0x221",
        chain_name: "Flow Testnet",
        native_currency: currency("FLOW"),
        rpc_urls: &["https://testnet.evm.nodes.onflow.org"],
        block_explorer_urls: &["https://evm-testnet.flowscan.io"],
        registry_address: "0xCa36dD890F987EDcE1D6D7C74Fb9df627c216BF6",
    },
    ChainConfig {
        key: ChainKey::TelosTestnet,
        chain_id: "0x29",
        chain_name: "Telos Testnet",
        native_currency: currency("TLOS"),
        rpc_urls: &["https://testnet.telos.net/evm"],
        block_explorer_urls: &["https://testnet.teloscan.io"],
        registry_address: "0xF887B4D3b17C12C86cc917cF72fb8881f866a847",
    },
    ChainConfig {
        key: ChainKey::Ancient8Testnet,
        chain_id: "0x1AD1BA8",
        chain_name: "Ancient8 Testnet",
        native_currency: currency("ETH"),
        rpc_urls: &["https://rpcv2-testnet.ancient8.gg"],
        block_explorer_urls: &[
            "https://ancient8.testnet.routescan.io",
            "https://scanv2-testnet.ancient8.gg",
        ],
        registry_address: "0xF887B4D3b17C12C86cc917cF72fb8881f866a847",
    },
    ChainConfig {
        key: ChainKey::EduchainTestnet,
        chain_id: "0xA045C",
        chain_name: "EDU Chain Testnet",
        native_currency: currency("EDU"),
        rpc_urls: &["https://open-campus-codex-sepolia.drpc.org"],
        block_explorer_urls: &["https://opencampus-codex.blockscout.com"],
        registry_address: "0x1AE7ED8C5Cc87E84b91eD8627Ac18540cB7a744F",
    },
];

/// Parse a `0x`-prefixed (or bare) hex chain id.
pub fn parse_chain_id(chain_id: &str) -> Option<u64> {
    let trimmed = chain_id.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    u64::from_str_radix(digits, 16).ok()
}

impl ChainKey {
    pub const ALL: [ChainKey; 8] = [
        ChainKey::LineaSepolia,
        ChainKey::NeoX,
        ChainKey::NeoXTestnet,
        ChainKey::KaiaTestnet,
        ChainKey::FlowTestnet,
        ChainKey::TelosTestnet,
        ChainKey::Ancient8Testnet,
        ChainKey::EduchainTestnet,
    ];

    pub fn config(&self) -> &'static ChainConfig {
        // CHAINS is laid out in declaration order.
        &CHAINS[*self as usize]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChainKey::LineaSepolia => "lineaSepolia",
            ChainKey::NeoX => "neoX",
            ChainKey::NeoXTestnet => "neoXTestnet",
            ChainKey::KaiaTestnet => "kaiaTestnet",
            ChainKey::FlowTestnet => "flowTestnet",
            ChainKey::TelosTestnet => "telosTestnet",
            ChainKey::Ancient8Testnet => "ancient8Testnet",
            ChainKey::EduchainTestnet => "educhainTestnet",
        }
    }

    /// Look up the network a wallet reports, comparing ids case-insensitively.
    pub fn from_chain_id(chain_id: &str) -> ChainResult<ChainKey> {
        let wanted = parse_chain_id(chain_id);
        ChainKey::ALL
            .into_iter()
            .find(|k| wanted.is_some() && parse_chain_id(k.config().chain_id) == wanted)
            .ok_or_else(|| ChainError::UnsupportedNetwork {
                chain_id: chain_id.to_string(),
            })
    }
}

impl std::fmt::Display for ChainKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ChainKey {
    type Err = ChainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChainKey::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ChainError::UnknownChain(s.to_string()))
    }
}

impl ChainConfig {
    pub fn matches_chain_id(&self, chain_id: &str) -> bool {
        parse_chain_id(chain_id).is_some() && parse_chain_id(chain_id) == parse_chain_id(self.chain_id)
    }

    pub fn explorer_url(&self) -> &'static str {
        self.block_explorer_urls.first().copied().unwrap_or_default()
    }

    pub fn rpc_url(&self) -> &'static str {
        self.rpc_urls.first().copied().unwrap_or_default()
    }

    /// Explorer link for a transaction hash.
    pub fn tx_url(&self, tx_hash: &str) -> String {
        format!("{}/tx/{tx_hash}", self.explorer_url().trim_end_matches('/'))
    }
}

/// Whether `chain_id` belongs to any supported network.
pub fn is_supported_network(chain_id: &str) -> bool {
    ChainKey::from_chain_id(chain_id).is_ok()
}
