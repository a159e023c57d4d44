//! The contract client: builds call data, signs and submits transactions,
//! polls for receipts, and renders the outcome.
//!
//! A write moves through `Built -> Submitted -> {Confirmed | Reverted |
//! TimedOut}`. Reads never enter the state machine; they run `eth_call`
//! against `latest` and decode synchronously.

use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{Address, B256, U256};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::abi::{evm, Abi, Value};
use crate::call::{build_call, build_deploy, CallDescriptor, VmDialect};
use crate::config::{GasConfig, PollingConfig};
use crate::crypto::{Algorithm, CryptoSuite, Keypair};
use crate::error::{ChainError, ClientError, CryptoError};
use crate::events;
use crate::rpc::{parse_quantity_u64, to_quantity, Block, Receipt, RpcClient, TransactionInfo};
use crate::tx::{sign_transaction, NonceStrategy, RandomNonce, TransactionParams};

pub const STATUS_SUCCESS: &str = "0x1";
pub const STATUS_FAILED: &str = "0x0";

/// Receipt status to human-readable outcome. Anything outside the two
/// known statuses is reported as such, never as success.
pub fn status_message(status: &str) -> String {
    match status {
        STATUS_SUCCESS => "Operation Succeeded".to_string(),
        STATUS_FAILED => "Operation Failed".to_string(),
        other => format!("undefined status {other}. Something wrong"),
    }
}

/// A contract the client can talk to: where it lives, what it exposes,
/// and which VM hosts it.
#[derive(Debug, Clone)]
pub struct ContractRef {
    pub target: String,
    pub abi: Abi,
    pub dialect: VmDialect,
}

impl ContractRef {
    pub fn new(target: impl Into<String>, abi: Abi, dialect: VmDialect) -> Self {
        Self {
            target: target.into(),
            abi,
            dialect,
        }
    }

    pub fn from_json(
        target: impl Into<String>,
        abi_json: &[u8],
        dialect: Option<&str>,
    ) -> Result<Self, ClientError> {
        Ok(Self {
            target: target.into(),
            abi: Abi::parse(abi_json)?,
            dialect: VmDialect::parse(dialect).map_err(ClientError::Call)?,
        })
    }
}

/// What an `execute` produced.
#[derive(Debug, Clone)]
pub enum CallOutcome {
    /// Decoded return values of a read-only call.
    Values(Vec<Value>),
    /// Resolved receipt of a mined write.
    Receipt(ParsedReceipt),
}

/// A mined receipt, resolved into displayable form.
#[derive(Debug, Clone)]
pub struct ParsedReceipt {
    pub transaction_hash: B256,
    pub block_number: u64,
    pub gas_used: u64,
    pub from: Option<Address>,
    pub to: Option<Address>,
    pub contract_address: Option<Address>,
    /// Raw wire status, e.g. `0x1`.
    pub status: String,
    pub status_message: String,
    /// Rendered event lines.
    pub logs: Vec<String>,
    /// Revert reason, when the chain replay yielded one.
    pub error: Option<String>,
}

impl ParsedReceipt {
    pub fn succeeded(&self) -> bool {
        self.status == STATUS_SUCCESS
    }
}

/// Client for one chain endpoint. Algorithm and transport are fixed at
/// construction.
#[derive(Debug)]
pub struct ContractClient {
    rpc: RpcClient,
    crypto: CryptoSuite,
    keypair: Option<Keypair>,
    sender: Option<Address>,
    nonce: Arc<dyn NonceStrategy>,
    gas: GasConfig,
    polling: PollingConfig,
}

impl ContractClient {
    pub fn new(rpc: RpcClient, algorithm: Algorithm) -> Self {
        Self {
            rpc,
            crypto: CryptoSuite::new(algorithm),
            keypair: None,
            sender: None,
            nonce: Arc::new(RandomNonce),
            gas: GasConfig::default(),
            polling: PollingConfig::default(),
        }
    }

    /// Attaches a signing key; transactions go out pre-signed through
    /// `eth_sendRawTransaction`. Fails if the key belongs to the other
    /// algorithm.
    pub fn with_keypair(mut self, keypair: Keypair) -> Result<Self, CryptoError> {
        if keypair.algorithm() != self.crypto.algorithm() {
            return Err(CryptoError::AlgorithmMismatch {
                expected: self.crypto.algorithm().to_string(),
                actual: keypair.algorithm().to_string(),
            });
        }
        self.keypair = Some(keypair);
        Ok(self)
    }

    /// Uses a node-managed account; transactions go out unsigned through
    /// `eth_sendTransaction`.
    pub fn with_sender(mut self, sender: Address) -> Self {
        self.sender = Some(sender);
        self
    }

    pub fn with_nonce_strategy(mut self, nonce: Arc<dyn NonceStrategy>) -> Self {
        self.nonce = nonce;
        self
    }

    pub fn with_gas(mut self, gas: GasConfig) -> Self {
        self.gas = gas;
        self
    }

    pub fn with_polling(mut self, polling: PollingConfig) -> Self {
        self.polling = polling;
        self
    }

    pub fn crypto(&self) -> &CryptoSuite {
        &self.crypto
    }

    pub fn rpc(&self) -> &RpcClient {
        &self.rpc
    }

    /// Invokes a contract function. Reads return decoded values; writes
    /// are signed, submitted, and resolved to a receipt.
    pub async fn execute(
        &self,
        contract: &ContractRef,
        func: &str,
        args: &[String],
    ) -> Result<CallOutcome, ClientError> {
        let descriptor = build_call(&contract.abi, contract.dialect, &contract.target, func, args)?;

        if !descriptor.is_write {
            let request = TransactionParams::new(descriptor.to, descriptor.data.clone())
                .to_call_request(self.from_address());
            let bytes = self.rpc.call(&request, "latest").await?;
            let values = if descriptor.outputs.is_empty() {
                Vec::new()
            } else {
                descriptor
                    .dialect
                    .codec()
                    .parse_response(&descriptor.outputs, &bytes)?
            };
            return Ok(CallOutcome::Values(values));
        }

        let receipt = self.submit(&contract.abi, &descriptor).await?;
        Ok(CallOutcome::Receipt(receipt))
    }

    /// Deploys a contract and waits for its receipt. The receipt carries
    /// the new contract address on success.
    pub async fn deploy(
        &self,
        dialect: Option<&str>,
        abi_json: &[u8],
        bytecode: &[u8],
        cons_args: &[String],
    ) -> Result<ParsedReceipt, ClientError> {
        let descriptor = build_deploy(dialect, abi_json, bytecode, cons_args)?;
        let abi = Abi::parse(abi_json)?;
        self.submit(&abi, &descriptor).await
    }

    /// Reads interface and bytecode from disk and deploys. EVM bytecode
    /// files are commonly hex text; those are decoded transparently.
    pub async fn deploy_files(
        &self,
        dialect: Option<&str>,
        abi_path: &std::path::Path,
        code_path: &std::path::Path,
        cons_args: &[String],
    ) -> Result<ParsedReceipt, ClientError> {
        let abi_json = tokio::fs::read(abi_path)
            .await
            .map_err(|e| ClientError::MalformedReceipt(format!("read {abi_path:?}: {e}")))?;
        let raw_code = tokio::fs::read(code_path)
            .await
            .map_err(|e| ClientError::MalformedReceipt(format!("read {code_path:?}: {e}")))?;
        let bytecode = decode_code_file(&raw_code);
        self.deploy(dialect, &abi_json, &bytecode, cons_args).await
    }

    /// Declared function signatures of a contract.
    pub fn list_functions(&self, contract: &ContractRef) -> Vec<String> {
        contract
            .abi
            .functions()
            .map(|entry| {
                entry
                    .signature()
                    .unwrap_or_else(|_| format!("{}(?)", entry.name))
            })
            .collect()
    }

    /// One-shot receipt fetch without polling. Logs decode against the
    /// system events only.
    pub async fn get_receipt(&self, tx_hash: &B256) -> Result<Option<ParsedReceipt>, ClientError> {
        match self.rpc.transaction_receipt(tx_hash).await? {
            None => Ok(None),
            Some(receipt) => {
                let logs = events::decode_wasm_logs(&Abi::default(), &receipt.logs);
                Ok(Some(shape_receipt(receipt, logs, None)?))
            }
        }
    }

    pub async fn block_by_hash(&self, hash: &B256, full: bool) -> Result<Option<Block>, ClientError> {
        Ok(self.rpc.block_by_hash(hash, full).await?)
    }

    pub async fn block_by_number(
        &self,
        number: &str,
        full: bool,
    ) -> Result<Option<Block>, ClientError> {
        Ok(self.rpc.block_by_number(number, full).await?)
    }

    pub async fn transaction_by_hash(
        &self,
        hash: &B256,
    ) -> Result<Option<TransactionInfo>, ClientError> {
        Ok(self.rpc.transaction_by_hash(hash).await?)
    }

    pub async fn new_account(&self, passphrase: &str) -> Result<Address, ClientError> {
        Ok(self.rpc.new_account(passphrase).await?)
    }

    pub async fn lock_account(&self, account: Address) -> Result<bool, ClientError> {
        Ok(self.rpc.lock_account(account).await?)
    }

    pub async fn unlock_account(
        &self,
        account: Address,
        passphrase: &str,
        duration_secs: u64,
    ) -> Result<bool, ClientError> {
        Ok(self
            .rpc
            .unlock_account(account, passphrase, duration_secs)
            .await?)
    }

    pub async fn list_accounts(&self) -> Result<Vec<Address>, ClientError> {
        Ok(self.rpc.list_accounts().await?)
    }

    async fn submit(
        &self,
        abi: &Abi,
        descriptor: &CallDescriptor,
    ) -> Result<ParsedReceipt, ClientError> {
        let params = self.transaction_params(descriptor);
        debug!(
            function = descriptor.function.as_deref().unwrap_or("(deploy)"),
            cns_name = descriptor.cns_name.as_deref().unwrap_or(""),
            nonce = params.nonce,
            dialect = %descriptor.dialect,
            "built transaction"
        );

        let tx_hash = self.send(&params).await?;
        info!(%tx_hash, "transaction submitted");

        let receipt = self.wait_for_receipt(tx_hash).await?;
        self.resolve_receipt(abi, descriptor, &params, receipt).await
    }

    fn transaction_params(&self, descriptor: &CallDescriptor) -> TransactionParams {
        let mut params = TransactionParams::new(descriptor.to, descriptor.data.clone());
        params.nonce = self.nonce.next_nonce();
        params.gas = self.gas.gas;
        params.gas_price = U256::from(self.gas.gas_price);
        params
    }

    async fn send(&self, params: &TransactionParams) -> Result<B256, ClientError> {
        match &self.keypair {
            Some(keypair) => {
                let raw = sign_transaction(&self.crypto, keypair, params)?;
                self.rpc
                    .send_raw_transaction(&raw)
                    .await
                    .map_err(ClientError::SendFailed)
            }
            None => {
                let from = self.sender.ok_or(ClientError::MissingSender)?;
                let request = params.to_call_request(Some(from));
                self.rpc
                    .send_transaction(&request)
                    .await
                    .map_err(ClientError::SendFailed)
            }
        }
    }

    /// Polls for the receipt on a background task and rendezvouses through
    /// a one-shot channel under the overall budget. On timeout the poller
    /// is aborted; the transaction itself may still land later.
    async fn wait_for_receipt(&self, tx_hash: B256) -> Result<Receipt, ClientError> {
        let (found_tx, found_rx) = oneshot::channel();
        let rpc = self.rpc.clone();
        let interval = Duration::from_millis(self.polling.interval_ms);

        let poller = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                match rpc.transaction_receipt(&tx_hash).await {
                    Ok(Some(receipt)) => {
                        let _ = found_tx.send(receipt);
                        return;
                    }
                    Ok(None) => debug!(%tx_hash, "receipt not ready"),
                    Err(e) => debug!(%tx_hash, error = %e, "receipt poll failed, retrying"),
                }
            }
        });

        let budget = Duration::from_secs(self.polling.budget_secs);
        match tokio::time::timeout(budget, found_rx).await {
            Ok(Ok(receipt)) => Ok(receipt),
            Ok(Err(_)) => {
                poller.abort();
                Err(ClientError::MalformedReceipt(
                    "receipt poller stopped unexpectedly".to_string(),
                ))
            }
            Err(_) => {
                poller.abort();
                warn!(%tx_hash, budget_secs = self.polling.budget_secs, "no receipt within budget");
                Err(ClientError::ReceiptTimeout {
                    tx_hash,
                    budget_secs: self.polling.budget_secs,
                })
            }
        }
    }

    async fn resolve_receipt(
        &self,
        abi: &Abi,
        descriptor: &CallDescriptor,
        params: &TransactionParams,
        receipt: Receipt,
    ) -> Result<ParsedReceipt, ClientError> {
        let logs = descriptor
            .dialect
            .codec()
            .parse_receipt_logs(abi, &receipt.logs);

        if receipt.status == STATUS_SUCCESS {
            let parsed = shape_receipt(receipt, logs, None)?;
            info!(
                tx_hash = %parsed.transaction_hash,
                block = parsed.block_number,
                gas_used = parsed.gas_used,
                "transaction confirmed"
            );
            return Ok(parsed);
        }

        let block_number = parse_quantity_u64(&receipt.block_number)
            .map_err(|e| ClientError::MalformedReceipt(e.to_string()))?;
        let reason = self.fetch_revert_reason(params, block_number).await;
        let parsed = shape_receipt(receipt, logs, reason)?;
        warn!(
            tx_hash = %parsed.transaction_hash,
            status = %parsed.status,
            reason = parsed.error.as_deref().unwrap_or("none"),
            "transaction did not succeed"
        );
        Err(ClientError::Execution(ChainError::Reverted {
            tx_hash: parsed.transaction_hash,
            status: parsed.status_message,
            reason: parsed.error,
        }))
    }

    /// Replays the call at the failing block; a returned `Error(string)`
    /// payload yields the reason. Anything else yields nothing.
    async fn fetch_revert_reason(
        &self,
        params: &TransactionParams,
        block_number: u64,
    ) -> Option<String> {
        let request = params.to_call_request(self.from_address());
        let block = to_quantity(block_number);
        match self.rpc.call(&request, &block).await {
            Ok(bytes) => evm::decode_revert_reason(&bytes),
            Err(e) => {
                debug!(error = %e, "revert reason replay failed");
                None
            }
        }
    }

    fn from_address(&self) -> Option<Address> {
        self.sender
            .or_else(|| self.keypair.as_ref().map(Keypair::address))
    }
}

fn shape_receipt(
    receipt: Receipt,
    logs: Vec<String>,
    error: Option<String>,
) -> Result<ParsedReceipt, ClientError> {
    let block_number = parse_quantity_u64(&receipt.block_number)
        .map_err(|e| ClientError::MalformedReceipt(e.to_string()))?;
    let gas_used = parse_quantity_u64(&receipt.gas_used)
        .map_err(|e| ClientError::MalformedReceipt(e.to_string()))?;
    Ok(ParsedReceipt {
        transaction_hash: receipt.transaction_hash,
        block_number,
        gas_used,
        from: receipt.from,
        to: receipt.to,
        contract_address: receipt.contract_address,
        status_message: status_message(&receipt.status),
        status: receipt.status,
        logs,
        error,
    })
}

/// EVM toolchains usually emit bytecode as hex text; WASM toolchains emit
/// raw binary. Hex text is decoded, everything else passes through.
fn decode_code_file(raw: &[u8]) -> Vec<u8> {
    let Ok(text) = std::str::from_utf8(raw) else {
        return raw.to_vec();
    };
    let trimmed = text.trim();
    let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    if !digits.is_empty() && digits.len() % 2 == 0 && digits.chars().all(|c| c.is_ascii_hexdigit())
    {
        if let Ok(bytes) = hex::decode(digits) {
            return bytes;
        }
    }
    raw.to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::ParamType;
    use crate::rpc::testing::MockTransport;
    use serde_json::json;

    const COUNTER_ABI: &str = r#"[
        {
            "type": "function",
            "name": "setValue",
            "inputs": [{"name": "value", "type": "uint256"}],
            "outputs": []
        },
        {
            "type": "function",
            "name": "getValue",
            "inputs": [],
            "outputs": [{"name": "", "type": "uint256"}],
            "constant": true
        },
        {
            "type": "event",
            "name": "Transfer",
            "inputs": [
                {"name": "to", "type": "address", "indexed": true},
                {"name": "value", "type": "uint256"}
            ]
        }
    ]"#;

    const TARGET: &str = "0x00000000000000000000000000000000000000aa";

    fn contract() -> ContractRef {
        ContractRef::from_json(TARGET, COUNTER_ABI.as_bytes(), Some("evm")).unwrap()
    }

    fn client_with(transport: Arc<MockTransport>) -> ContractClient {
        let suite = CryptoSuite::new(Algorithm::Homestead);
        let keypair = suite.generate().unwrap();
        ContractClient::new(RpcClient::new(transport), Algorithm::Homestead)
            .with_keypair(keypair)
            .unwrap()
            .with_polling(PollingConfig {
                interval_ms: 10,
                budget_secs: 5,
            })
    }

    fn receipt_json(status: &str) -> serde_json::Value {
        json!({
            "blockHash": format!("0x{}", "11".repeat(32)),
            "blockNumber": "0x10",
            "contractAddress": null,
            "gasUsed": "0x5208",
            "transactionHash": format!("0x{}", "22".repeat(32)),
            "logs": [],
            "status": status
        })
    }

    #[test]
    fn test_status_messages() {
        assert_eq!(status_message("0x1"), "Operation Succeeded");
        assert_eq!(status_message("0x0"), "Operation Failed");
        let odd = status_message("0x7");
        assert!(odd.contains("undefined status"));
        assert!(odd.contains("0x7"));
        assert_ne!(odd, "Operation Succeeded");
    }

    #[test]
    fn test_code_file_detection() {
        assert_eq!(decode_code_file(b"0xcafe"), vec![0xca, 0xfe]);
        assert_eq!(decode_code_file(b"cafe\n"), vec![0xca, 0xfe]);
        assert_eq!(decode_code_file(b"\0asm\x01"), b"\0asm\x01".to_vec());
    }

    #[tokio::test]
    async fn test_read_only_call_skips_submission() {
        let transport = Arc::new(MockTransport::new());
        let expected = format!("0x{}", "00".repeat(31) + "2a");
        transport.push("eth_call", json!(expected));

        let client = client_with(transport.clone());
        let outcome = client.execute(&contract(), "getValue", &[]).await.unwrap();

        match outcome {
            CallOutcome::Values(values) => {
                assert_eq!(values.len(), 1);
                assert_eq!(
                    values[0],
                    Value::from_string(&ParamType::Uint(256), "42").unwrap()
                );
            }
            other => panic!("expected values, got {other:?}"),
        }
        assert_eq!(transport.calls_to("eth_call"), 1);
        assert_eq!(transport.calls_to("eth_sendRawTransaction"), 0);
    }

    #[tokio::test]
    async fn test_write_confirms_on_success_status() {
        let transport = Arc::new(MockTransport::new());
        transport.push(
            "eth_sendRawTransaction",
            json!(format!("0x{}", "22".repeat(32))),
        );
        transport.push("eth_getTransactionReceipt", receipt_json("0x1"));

        let client = client_with(transport.clone());
        let outcome = client
            .execute(&contract(), "setValue", &["42".to_string()])
            .await
            .unwrap();

        match outcome {
            CallOutcome::Receipt(receipt) => {
                assert!(receipt.succeeded());
                assert_eq!(receipt.status_message, "Operation Succeeded");
                assert_eq!(receipt.block_number, 16);
                assert_eq!(receipt.gas_used, 21_000);
            }
            other => panic!("expected receipt, got {other:?}"),
        }
        assert_eq!(transport.calls_to("eth_sendRawTransaction"), 1);
    }

    #[tokio::test]
    async fn test_reverted_write_carries_decoded_reason() {
        let transport = Arc::new(MockTransport::new());
        transport.push(
            "eth_sendRawTransaction",
            json!(format!("0x{}", "22".repeat(32))),
        );
        transport.push("eth_getTransactionReceipt", receipt_json("0x0"));

        // the replay at the failing block answers with Error(string)
        let mut revert = evm::selector("Error(string)").to_vec();
        revert.extend(evm::encode_values(&[Value::String(
            "insufficient balance".to_string(),
        )]));
        transport.push("eth_call", json!(format!("0x{}", hex::encode(revert))));

        let client = client_with(transport.clone());
        let err = client
            .execute(&contract(), "setValue", &["42".to_string()])
            .await
            .unwrap_err();

        match err {
            ClientError::Execution(ChainError::Reverted {
                status, reason, ..
            }) => {
                assert_eq!(status, "Operation Failed");
                assert_eq!(reason.as_deref(), Some("insufficient balance"));
            }
            other => panic!("expected revert, got {other}"),
        }
    }

    #[tokio::test]
    async fn test_receipt_timeout_when_never_mined() {
        let transport = Arc::new(MockTransport::new());
        transport.push(
            "eth_sendRawTransaction",
            json!(format!("0x{}", "22".repeat(32))),
        );
        transport.push("eth_getTransactionReceipt", serde_json::Value::Null);

        let client = client_with(transport.clone()).with_polling(PollingConfig {
            interval_ms: 20,
            budget_secs: 1,
        });
        let err = client
            .execute(&contract(), "setValue", &["42".to_string()])
            .await
            .unwrap_err();

        match err {
            ClientError::ReceiptTimeout {
                tx_hash,
                budget_secs,
            } => {
                assert_eq!(tx_hash, B256::repeat_byte(0x22));
                assert_eq!(budget_secs, 1);
            }
            other => panic!("expected timeout, got {other}"),
        }
        // the poller ran more than once before the budget expired
        assert!(transport.calls_to("eth_getTransactionReceipt") > 1);
    }

    #[tokio::test]
    async fn test_node_signed_path_needs_a_sender() {
        let transport = Arc::new(MockTransport::new());
        let client = ContractClient::new(RpcClient::new(transport), Algorithm::Homestead);

        let err = client
            .execute(&contract(), "setValue", &["42".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::MissingSender));
    }

    #[tokio::test]
    async fn test_node_signed_path_uses_send_transaction() {
        let transport = Arc::new(MockTransport::new());
        transport.push(
            "eth_sendTransaction",
            json!(format!("0x{}", "22".repeat(32))),
        );
        transport.push("eth_getTransactionReceipt", receipt_json("0x1"));

        let client = ContractClient::new(RpcClient::new(transport.clone()), Algorithm::Homestead)
            .with_sender(Address::repeat_byte(0x44))
            .with_polling(PollingConfig {
                interval_ms: 10,
                budget_secs: 5,
            });

        client
            .execute(&contract(), "setValue", &["42".to_string()])
            .await
            .unwrap();

        assert_eq!(transport.calls_to("eth_sendTransaction"), 1);
        assert_eq!(transport.calls_to("eth_sendRawTransaction"), 0);

        // the request carries the configured sender
        let calls = transport.calls.lock().unwrap();
        let (_, params) = calls
            .iter()
            .find(|(m, _)| m == "eth_sendTransaction")
            .unwrap();
        let from = params[0]["from"].as_str().unwrap().to_lowercase();
        assert_eq!(from, format!("0x{}", "44".repeat(20)));
    }

    #[tokio::test]
    async fn test_deploy_reports_contract_address() {
        let transport = Arc::new(MockTransport::new());
        transport.push(
            "eth_sendRawTransaction",
            json!(format!("0x{}", "22".repeat(32))),
        );
        let mut mined = receipt_json("0x1");
        mined["contractAddress"] = json!(format!("0x{}", "55".repeat(20)));
        transport.push("eth_getTransactionReceipt", mined);

        let client = client_with(transport);
        let receipt = client
            .deploy(None, b"[]", b"\0asm\x01\x00\x00\x00", &[])
            .await
            .unwrap();

        assert!(receipt.succeeded());
        assert_eq!(receipt.contract_address, Some(Address::repeat_byte(0x55)));
    }

    #[tokio::test]
    async fn test_get_receipt_passthrough() {
        let transport = Arc::new(MockTransport::new());
        transport.push("eth_getTransactionReceipt", receipt_json("0x1"));

        let client = client_with(transport);
        let receipt = client
            .get_receipt(&B256::repeat_byte(0x22))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(receipt.status_message, "Operation Succeeded");
    }

    #[test]
    fn test_list_functions() {
        let transport = Arc::new(MockTransport::new());
        let client = ContractClient::new(RpcClient::new(transport), Algorithm::Homestead);
        let functions = client.list_functions(&contract());
        assert!(functions.contains(&"setValue(uint256)".to_string()));
        assert!(functions.contains(&"getValue()".to_string()));
    }
}
