//! JSON-RPC 2.0 plumbing: the transport trait, the HTTP implementation,
//! and typed wrappers for every method the SDK consumes.

use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use alloy_primitives::{Address, B256, U256};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as Json};
use tracing::debug;

use crate::error::RpcError;

/// How requests reach a node. Implemented by [`HttpTransport`] in
/// production and by scripted mocks in tests.
#[async_trait]
pub trait Transport: Send + Sync + Debug {
    /// Sends one request and returns the `result` member of the response.
    async fn request(&self, method: &str, params: Json) -> Result<Json, RpcError>;
}

#[derive(Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
    next_id: AtomicU64,
}

impl HttpTransport {
    pub fn new(url: impl Into<String>) -> Self {
        let mut url = url.into();
        if !url.starts_with("http://") && !url.starts_with("https://") {
            url = format!("http://{url}");
        }
        Self {
            client: reqwest::Client::new(),
            url,
            next_id: AtomicU64::new(1),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn request(&self, method: &str, params: Json) -> Result<Json, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let envelope = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": id,
        });

        debug!(method, id, "sending rpc request");
        let response: JsonRpcResponse = self
            .client
            .post(&self.url)
            .json(&envelope)
            .send()
            .await?
            .json()
            .await?;
        response.into_result()
    }
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<Json>,
    #[serde(default)]
    error: Option<JsonRpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcErrorObject {
    code: i64,
    message: String,
}

impl JsonRpcResponse {
    fn into_result(self) -> Result<Json, RpcError> {
        if let Some(error) = self.error {
            return Err(RpcError::Rpc {
                code: error.code,
                message: error.message,
            });
        }
        // `result: null` is a valid answer (e.g. a receipt not yet mined).
        Ok(self.result.unwrap_or(Json::Null))
    }
}

/// Typed method surface over any [`Transport`].
#[derive(Debug, Clone)]
pub struct RpcClient {
    transport: Arc<dyn Transport>,
}

impl RpcClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub fn http(url: impl Into<String>) -> Self {
        Self::new(Arc::new(HttpTransport::new(url)))
    }

    async fn request_typed<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Json,
    ) -> Result<T, RpcError> {
        let raw = self.transport.request(method, params).await?;
        serde_json::from_value(raw)
            .map_err(|e| RpcError::MalformedResponse(format!("{method}: {e}")))
    }

    /// `eth_call` against a block tag, returning the raw result bytes.
    pub async fn call(&self, request: &CallRequest, block: &str) -> Result<Vec<u8>, RpcError> {
        let hex: String = self
            .request_typed("eth_call", json!([request, block]))
            .await?;
        from_hex(&hex)
    }

    pub async fn send_transaction(&self, request: &CallRequest) -> Result<B256, RpcError> {
        self.request_typed("eth_sendTransaction", json!([request]))
            .await
    }

    pub async fn send_raw_transaction(&self, raw: &str) -> Result<B256, RpcError> {
        self.request_typed("eth_sendRawTransaction", json!([raw]))
            .await
    }

    /// `None` while the transaction is still pending.
    pub async fn transaction_receipt(&self, hash: &B256) -> Result<Option<Receipt>, RpcError> {
        self.request_typed("eth_getTransactionReceipt", json!([hash]))
            .await
    }

    pub async fn block_by_hash(&self, hash: &B256, full: bool) -> Result<Option<Block>, RpcError> {
        self.request_typed("eth_getBlockByHash", json!([hash, full]))
            .await
    }

    /// `number` is a hex quantity or one of the `latest`/`earliest`/
    /// `pending` tags.
    pub async fn block_by_number(
        &self,
        number: &str,
        full: bool,
    ) -> Result<Option<Block>, RpcError> {
        self.request_typed("eth_getBlockByNumber", json!([number, full]))
            .await
    }

    pub async fn transaction_by_hash(
        &self,
        hash: &B256,
    ) -> Result<Option<TransactionInfo>, RpcError> {
        self.request_typed("eth_getTransactionByHash", json!([hash]))
            .await
    }

    pub async fn new_account(&self, passphrase: &str) -> Result<Address, RpcError> {
        self.request_typed("personal_newAccount", json!([passphrase]))
            .await
    }

    pub async fn lock_account(&self, account: Address) -> Result<bool, RpcError> {
        self.request_typed("personal_lockAccount", json!([account]))
            .await
    }

    pub async fn unlock_account(
        &self,
        account: Address,
        passphrase: &str,
        duration_secs: u64,
    ) -> Result<bool, RpcError> {
        self.request_typed(
            "personal_unlockAccount",
            json!([account, passphrase, duration_secs]),
        )
        .await
    }

    pub async fn list_accounts(&self) -> Result<Vec<Address>, RpcError> {
        self.request_typed("personal_listAccounts", json!([])).await
    }
}

/// Call object for `eth_call` and node-signed `eth_sendTransaction`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CallRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_type: Option<u64>,
}

/// Mined-transaction receipt as the node reports it. Quantities stay in
/// their hex-string wire form; use the quantity parsers to read them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    #[serde(default)]
    pub block_hash: Option<B256>,
    pub block_number: String,
    #[serde(default)]
    pub contract_address: Option<Address>,
    #[serde(default)]
    pub cumulative_gas_used: Option<String>,
    #[serde(default)]
    pub from: Option<Address>,
    pub gas_used: String,
    #[serde(default)]
    pub root: Option<String>,
    #[serde(default)]
    pub to: Option<Address>,
    pub transaction_hash: B256,
    #[serde(default)]
    pub transaction_index: Option<String>,
    #[serde(default)]
    pub logs: Vec<Log>,
    pub status: String,
}

/// One event log entry inside a receipt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Log {
    pub address: Address,
    #[serde(default)]
    pub topics: Vec<B256>,
    #[serde(default)]
    pub data: String,
    #[serde(default)]
    pub block_number: Option<String>,
    #[serde(default)]
    pub transaction_hash: Option<B256>,
    #[serde(default)]
    pub log_index: Option<String>,
}

impl Log {
    pub fn data_bytes(&self) -> Result<Vec<u8>, RpcError> {
        from_hex(&self.data)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    #[serde(default)]
    pub hash: Option<B256>,
    pub parent_hash: B256,
    pub number: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub gas_limit: Option<String>,
    #[serde(default)]
    pub gas_used: Option<String>,
    #[serde(default)]
    pub miner: Option<Address>,
    #[serde(default)]
    pub transactions: BlockTransactions,
}

/// `eth_getBlockBy*` returns hashes or full objects depending on the
/// `full` flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BlockTransactions {
    Hashes(Vec<B256>),
    Full(Vec<TransactionInfo>),
}

impl Default for BlockTransactions {
    fn default() -> Self {
        BlockTransactions::Hashes(Vec::new())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionInfo {
    pub hash: B256,
    #[serde(default)]
    pub nonce: Option<String>,
    #[serde(default)]
    pub block_hash: Option<B256>,
    #[serde(default)]
    pub block_number: Option<String>,
    #[serde(default)]
    pub transaction_index: Option<String>,
    pub from: Address,
    #[serde(default)]
    pub to: Option<Address>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub gas: Option<String>,
    #[serde(default)]
    pub gas_price: Option<String>,
    #[serde(default)]
    pub input: Option<String>,
}

/// Formats an integer as a `0x`-prefixed hex quantity.
pub fn to_quantity<T>(value: T) -> String
where
    U256: alloy_primitives::ruint::UintTryFrom<T>,
{
    format!("0x{:x}", U256::from(value))
}

pub fn parse_quantity_u64(quantity: &str) -> Result<u64, RpcError> {
    let digits = quantity.strip_prefix("0x").unwrap_or(quantity);
    u64::from_str_radix(digits, 16)
        .map_err(|e| RpcError::MalformedResponse(format!("bad hex quantity {quantity:?}: {e}")))
}

pub fn parse_quantity_u256(quantity: &str) -> Result<U256, RpcError> {
    let digits = quantity.strip_prefix("0x").unwrap_or(quantity);
    U256::from_str_radix(digits, 16)
        .map_err(|e| RpcError::MalformedResponse(format!("bad hex quantity {quantity:?}: {e}")))
}

pub fn from_hex(data: &str) -> Result<Vec<u8>, RpcError> {
    let digits = data.strip_prefix("0x").unwrap_or(data);
    hex::decode(digits)
        .map_err(|e| RpcError::MalformedResponse(format!("bad hex data {data:?}: {e}")))
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;

    /// Scripted transport: responses are queued per method; the last queued
    /// response for a method is sticky and repeats forever.
    #[derive(Debug, Default)]
    pub(crate) struct MockTransport {
        responses: Mutex<HashMap<String, VecDeque<Json>>>,
        pub calls: Mutex<Vec<(String, Json)>>,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn push(&self, method: &str, response: Json) {
            self.responses
                .lock()
                .unwrap()
                .entry(method.to_string())
                .or_default()
                .push_back(response);
        }

        pub fn calls_to(&self, method: &str) -> usize {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|(m, _)| m == method)
                .count()
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn request(&self, method: &str, params: Json) -> Result<Json, RpcError> {
            self.calls
                .lock()
                .unwrap()
                .push((method.to_string(), params));
            let mut responses = self.responses.lock().unwrap();
            let queue = responses.get_mut(method).ok_or_else(|| {
                RpcError::MalformedResponse(format!("no scripted response for {method}"))
            })?;
            if queue.len() > 1 {
                Ok(queue.pop_front().unwrap_or(Json::Null))
            } else {
                Ok(queue.front().cloned().unwrap_or(Json::Null))
            }
        }
    }
}
