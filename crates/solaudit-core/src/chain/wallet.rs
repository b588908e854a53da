//! Wallet capability.
//!
//! Anything that needs the user's account goes through [`WalletProvider`].
//! [`RpcWallet`] talks to an EIP-1193-style JSON-RPC endpoint (a local
//! signer such as Frame, or a dev node with unlocked accounts).

use serde_json::{Value, json};
use std::cell::RefCell;
use std::time::Duration;

use crate::chain::abi::to_hex;
use crate::chain::rpc::{self, Receipt, RpcTransport};
use crate::chain::{ChainConfig, ChainError, ChainResult};

/// Error code wallets return when a chain has not been added yet.
pub const UNRECOGNIZED_CHAIN: i64 = 4902;

/// Error code for a request the user rejected.
pub const USER_REJECTED: i64 = 4001;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WalletEventKind {
    AccountsChanged,
    ChainChanged,
    Connect,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletEvent {
    AccountsChanged(Vec<String>),
    ChainChanged(String),
    Connect { chain_id: String },
}

impl WalletEvent {
    pub fn kind(&self) -> WalletEventKind {
        match self {
            WalletEvent::AccountsChanged(_) => WalletEventKind::AccountsChanged,
            WalletEvent::ChainChanged(_) => WalletEventKind::ChainChanged,
            WalletEvent::Connect { .. } => WalletEventKind::Connect,
        }
    }
}

pub type WalletListener = Box<dyn Fn(&WalletEvent)>;

/// A transaction for the wallet to sign and send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRequest {
    pub to: String,
    pub data: Vec<u8>,
}

pub trait WalletProvider {
    /// Request account access and return the selected account.
    fn connect(&self) -> ChainResult<String>;

    /// Currently connected account, if any.
    fn account(&self) -> Option<String>;

    /// `0x`-prefixed hex chain id of the active network.
    fn chain_id(&self) -> ChainResult<String>;

    /// Switch the wallet to `chain`, adding it first when the wallet does not know it.
    fn switch_chain(&self, chain: &ChainConfig) -> ChainResult<()>;

    fn on(&self, kind: WalletEventKind, listener: WalletListener);

    /// Submit a transaction and return its hash.
    fn send_transaction(&self, tx: &TransactionRequest) -> ChainResult<String>;

    /// Block until the transaction is mined.
    fn wait_for_receipt(&self, tx_hash: &str) -> ChainResult<Receipt>;
}

pub struct RpcWallet<T> {
    transport: T,
    account: RefCell<Option<String>>,
    chain_id: RefCell<Option<String>>,
    listeners: RefCell<Vec<(WalletEventKind, WalletListener)>>,
    poll_interval: Duration,
    max_polls: Option<u32>,
}

impl<T: RpcTransport> RpcWallet<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            account: RefCell::new(None),
            chain_id: RefCell::new(None),
            listeners: RefCell::new(vec![]),
            poll_interval: Duration::from_secs(2),
            max_polls: None,
        }
    }

    pub fn with_polling(mut self, interval: Duration, max_polls: Option<u32>) -> Self {
        self.poll_interval = interval;
        self.max_polls = max_polls;
        self
    }

    fn emit(&self, event: WalletEvent) {
        tracing::debug!(?event, "wallet event");
        for (kind, listener) in self.listeners.borrow().iter() {
            if *kind == event.kind() {
                listener(&event);
            }
        }
    }

    fn add_chain(&self, chain: &ChainConfig) -> ChainResult<()> {
        self.transport.request(
            "wallet_addEthereumChain",
            json!([{
                "chainId": chain.chain_id,
                "chainName": chain.chain_name,
                "nativeCurrency": chain.native_currency,
                "rpcUrls": chain.rpc_urls,
                "blockExplorerUrls": chain.block_explorer_urls,
            }]),
        )?;
        Ok(())
    }
}

impl<T: RpcTransport> WalletProvider for RpcWallet<T> {
    fn connect(&self) -> ChainResult<String> {
        let accounts: Vec<String> = serde_json::from_value(
            self.transport.request("eth_requestAccounts", json!([]))?,
        )
        .map_err(|e| ChainError::Transport(e.to_string()))?;
        let account = accounts.first().cloned().ok_or(ChainError::NoAccount)?;

        let changed = self.account.borrow().as_deref() != Some(account.as_str());
        *self.account.borrow_mut() = Some(account.clone());
        if changed {
            self.emit(WalletEvent::AccountsChanged(accounts));
        }

        let chain_id = self.chain_id()?;
        self.emit(WalletEvent::Connect { chain_id });
        tracing::info!(%account, "wallet connected");
        Ok(account)
    }

    fn account(&self) -> Option<String> {
        self.account.borrow().clone()
    }

    fn chain_id(&self) -> ChainResult<String> {
        let chain_id = rpc::eth_chain_id(&self.transport)?;
        let previous = self.chain_id.replace(Some(chain_id.clone()));
        if previous.is_some_and(|p| !p.eq_ignore_ascii_case(&chain_id)) {
            self.emit(WalletEvent::ChainChanged(chain_id.clone()));
        }
        Ok(chain_id)
    }

    fn switch_chain(&self, chain: &ChainConfig) -> ChainResult<()> {
        let switched = self.transport.request(
            "wallet_switchEthereumChain",
            json!([{ "chainId": chain.chain_id }]),
        );
        match switched {
            Ok(_) => {}
            Err(e) if e.rpc_code() == Some(UNRECOGNIZED_CHAIN) => {
                tracing::info!(chain = %chain.key, "chain unknown to wallet, adding it");
                self.add_chain(chain)?;
            }
            Err(e) => {
                tracing::error!(chain = %chain.key, error = %e, "failed to switch chain");
                return Err(e);
            }
        }
        self.chain_id()?;
        Ok(())
    }

    fn on(&self, kind: WalletEventKind, listener: WalletListener) {
        self.listeners.borrow_mut().push((kind, listener));
    }

    fn send_transaction(&self, tx: &TransactionRequest) -> ChainResult<String> {
        let from = self.account().ok_or(ChainError::NoAccount)?;
        let result = self
            .transport
            .request(
                "eth_sendTransaction",
                json!([{ "from": from, "to": tx.to, "data": to_hex(&tx.data) }]),
            )
            .map_err(|e| match e {
                ChainError::Rpc { message, .. } => ChainError::Transaction(message),
                other => other,
            })?;
        match result {
            Value::String(hash) => Ok(hash),
            other => Err(ChainError::Transport(format!(
                "expected transaction hash, got {other}"
            ))),
        }
    }

    fn wait_for_receipt(&self, tx_hash: &str) -> ChainResult<Receipt> {
        let mut polls = 0u32;
        loop {
            if let Some(receipt) = rpc::eth_get_transaction_receipt(&self.transport, tx_hash)? {
                if !receipt.succeeded() {
                    return Err(ChainError::Transaction(format!(
                        "transaction {tx_hash} reverted"
                    )));
                }
                return Ok(receipt);
            }
            polls += 1;
            if self.max_polls.is_some_and(|max| polls >= max) {
                return Err(ChainError::Transaction(format!(
                    "no receipt for {tx_hash} after {polls} polls"
                )));
            }
            std::thread::sleep(self.poll_interval);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::ChainKey;
    use crate::chain::rpc::testing::ScriptedTransport;
    use std::cell::Cell;
    use std::rc::Rc;

    fn rpc_error(code: i64, message: &str) -> ChainError {
        ChainError::Rpc {
            code,
            message: message.into(),
        }
    }

    fn fast<T: RpcTransport>(wallet: RpcWallet<T>) -> RpcWallet<T> {
        wallet.with_polling(Duration::ZERO, Some(5))
    }

    #[test]
    fn connect_selects_first_account_and_notifies() {
        let wallet = RpcWallet::new(ScriptedTransport::new(|method, _| match method {
            "eth_requestAccounts" => Ok(json!(["0xaaa", "0xbbb"])),
            "eth_chainId" => Ok(json!("0xe705")),
            _ => unreachable!(),
        }));
        let seen = Rc::new(RefCell::new(vec![]));
        let sink = Rc::clone(&seen);
        wallet.on(
            WalletEventKind::Connect,
            Box::new(move |e: &WalletEvent| sink.borrow_mut().push(e.clone())),
        );

        assert_eq!(wallet.connect().unwrap(), "0xaaa");
        assert_eq!(wallet.account().as_deref(), Some("0xaaa"));
        assert_eq!(
            *seen.borrow(),
            vec![WalletEvent::Connect {
                chain_id: "0xe705".into()
            }]
        );
    }

    #[test]
    fn connect_without_accounts_fails() {
        let wallet = RpcWallet::new(ScriptedTransport::new(|_, _| Ok(json!([]))));
        assert!(matches!(wallet.connect(), Err(ChainError::NoAccount)));
    }

    #[test]
    fn switch_adds_unknown_chain() {
        let current = Rc::new(RefCell::new("0x1".to_string()));
        let state = Rc::clone(&current);
        let transport = ScriptedTransport::new(move |method, params| match method {
            "wallet_switchEthereumChain" => Err(rpc_error(UNRECOGNIZED_CHAIN, "Unrecognized chain")),
            "wallet_addEthereumChain" => {
                assert_eq!(params[0]["chainName"], "Kaia Testnet");
                assert_eq!(params[0]["nativeCurrency"]["symbol"], "KAIA");
                *state.borrow_mut() = params[0]["chainId"].as_str().unwrap().to_string();
                Ok(Value::Null)
            }
            "eth_chainId" => Ok(json!(state.borrow().clone())),
            _ => unreachable!(),
        });
        let wallet = RpcWallet::new(&transport);
        let changes = Rc::new(Cell::new(0));
        let counter = Rc::clone(&changes);
        wallet.chain_id().unwrap();
        wallet.on(
            WalletEventKind::ChainChanged,
            Box::new(move |_: &WalletEvent| counter.set(counter.get() + 1)),
        );

        wallet.switch_chain(ChainKey::KaiaTestnet.config()).unwrap();

        assert_eq!(
            transport.methods(),
            vec![
                "eth_chainId",
                "wallet_switchEthereumChain",
                "wallet_addEthereumChain",
                "eth_chainId"
            ]
        );
        assert_eq!(*current.borrow(), "0x3E9");
        assert_eq!(changes.get(), 1);
    }

    #[test]
    fn other_switch_errors_propagate() {
        let transport = ScriptedTransport::new(|_, _| Err(rpc_error(USER_REJECTED, "User rejected")));
        let wallet = RpcWallet::new(&transport);

        let err = wallet.switch_chain(ChainKey::NeoX.config()).unwrap_err();
        assert_eq!(err.rpc_code(), Some(USER_REJECTED));
        assert_eq!(transport.methods(), vec!["wallet_switchEthereumChain"]);
    }

    #[test]
    fn send_requires_account() {
        let wallet = RpcWallet::new(ScriptedTransport::new(|_, _| Ok(json!("0x1"))));
        let tx = TransactionRequest {
            to: "0xdead".into(),
            data: vec![1],
        };
        assert!(matches!(wallet.send_transaction(&tx), Err(ChainError::NoAccount)));
    }

    #[test]
    fn rejected_send_surfaces_wallet_message() {
        let wallet = RpcWallet::new(ScriptedTransport::new(|method, _| match method {
            "eth_requestAccounts" => Ok(json!(["0xaaa"])),
            "eth_chainId" => Ok(json!("0x29")),
            _ => Err(rpc_error(USER_REJECTED, "User denied transaction signature")),
        }));
        wallet.connect().unwrap();

        let err = wallet
            .send_transaction(&TransactionRequest {
                to: "0xdead".into(),
                data: vec![],
            })
            .unwrap_err();
        assert_eq!(err.to_string(), "User denied transaction signature");
    }

    #[test]
    fn receipt_is_polled_until_mined() {
        let polls = Rc::new(Cell::new(0));
        let count = Rc::clone(&polls);
        let wallet = fast(RpcWallet::new(ScriptedTransport::new(move |_, _| {
            count.set(count.get() + 1);
            if count.get() < 3 {
                Ok(Value::Null)
            } else {
                Ok(json!({"transactionHash": "0xfeed", "status": "0x1"}))
            }
        })));

        let receipt = wallet.wait_for_receipt("0xfeed").unwrap();
        assert_eq!(receipt.transaction_hash, "0xfeed");
        assert_eq!(polls.get(), 3);
    }

    #[test]
    fn reverted_receipt_is_a_transaction_error() {
        let wallet = fast(RpcWallet::new(ScriptedTransport::new(|_, _| {
            Ok(json!({"transactionHash": "0xfeed", "status": "0x0"}))
        })));
        assert!(matches!(
            wallet.wait_for_receipt("0xfeed"),
            Err(ChainError::Transaction(_))
        ));
    }

    #[test]
    fn polling_gives_up_after_limit() {
        let wallet = fast(RpcWallet::new(ScriptedTransport::new(|_, _| Ok(Value::Null))));
        let err = wallet.wait_for_receipt("0xfeed").unwrap_err();
        assert!(err.to_string().contains("after 5 polls"));
    }
}
