//! JSON-RPC plumbing shared by the registry reader and the wallet.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::chain::abi::{from_hex, to_hex};
use crate::chain::{ChainError, ChainResult};

/// A JSON-RPC 2.0 endpoint.
pub trait RpcTransport {
    fn request(&self, method: &str, params: Value) -> ChainResult<Value>;
}

impl<T: RpcTransport + ?Sized> RpcTransport for &T {
    fn request(&self, method: &str, params: Value) -> ChainResult<Value> {
        (**self).request(method, params)
    }
}

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorBody>,
}

#[derive(Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

/// JSON-RPC over HTTP POST.
pub struct HttpTransport {
    url: String,
    agent: ureq::Agent,
    next_id: AtomicU64,
}

impl HttpTransport {
    pub fn new(url: impl Into<String>, timeout_secs: u64) -> Self {
        let agent = ureq::config::Config::builder()
            .http_status_as_error(false)
            .timeout_global(Some(Duration::from_secs(timeout_secs)))
            .build()
            .new_agent();
        Self {
            url: url.into(),
            agent,
            next_id: AtomicU64::new(1),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl RpcTransport for HttpTransport {
    fn request(&self, method: &str, params: Value) -> ChainResult<Value> {
        let body = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };
        tracing::debug!(url = %self.url, method, "json-rpc request");

        let response = self
            .agent
            .post(&self.url)
            .header("Content-Type", "application/json")
            .send_json(&body)
            .map_err(|e| ChainError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        if status >= 400 {
            let text = response.into_body().read_to_string().unwrap_or_default();
            return Err(ChainError::Transport(format!("HTTP {status}: {text}")));
        }

        let parsed: RpcResponse = response
            .into_body()
            .read_json()
            .map_err(|e| ChainError::Transport(e.to_string()))?;
        unwrap_response(parsed)
    }
}

fn unwrap_response(response: RpcResponse) -> ChainResult<Value> {
    if let Some(err) = response.error {
        return Err(ChainError::Rpc {
            code: err.code,
            message: err.message,
        });
    }
    Ok(response.result.unwrap_or(Value::Null))
}

/// A log entry as returned by `eth_getLogs`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Log {
    pub address: String,
    pub topics: Vec<String>,
    #[serde(default)]
    pub data: String,
    #[serde(default)]
    pub block_number: Option<String>,
    #[serde(default)]
    pub transaction_hash: Option<String>,
}

/// A transaction receipt; `status` is `0x1` on success.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub transaction_hash: String,
    #[serde(default)]
    pub block_number: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl Receipt {
    pub fn succeeded(&self) -> bool {
        self.status
            .as_deref()
            .is_none_or(|s| u64::from_str_radix(s.trim_start_matches("0x"), 16) == Ok(1))
    }
}

fn expect_str(value: &Value, what: &str) -> ChainResult<String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| ChainError::Transport(format!("expected {what} string, got {value}")))
}

/// Read-only `eth_call` against `to` at the latest block.
pub fn eth_call(transport: &dyn RpcTransport, to: &str, data: &[u8]) -> ChainResult<Vec<u8>> {
    let result = transport.request(
        "eth_call",
        json!([{ "to": to, "data": to_hex(data) }, "latest"]),
    )?;
    from_hex(&expect_str(&result, "call result")?)
}

pub fn eth_get_logs(
    transport: &dyn RpcTransport,
    address: &str,
    topics: &[Option<String>],
) -> ChainResult<Vec<Log>> {
    let result = transport.request(
        "eth_getLogs",
        json!([{ "address": address, "fromBlock": "earliest", "toBlock": "latest", "topics": topics }]),
    )?;
    serde_json::from_value(result).map_err(|e| ChainError::Transport(e.to_string()))
}

pub fn eth_chain_id(transport: &dyn RpcTransport) -> ChainResult<String> {
    let result = transport.request("eth_chainId", json!([]))?;
    expect_str(&result, "chain id")
}

pub fn eth_get_transaction_receipt(
    transport: &dyn RpcTransport,
    tx_hash: &str,
) -> ChainResult<Option<Receipt>> {
    let result = transport.request("eth_getTransactionReceipt", json!([tx_hash]))?;
    if result.is_null() {
        return Ok(None);
    }
    serde_json::from_value(result)
        .map(Some)
        .map_err(|e| ChainError::Transport(e.to_string()))
}
