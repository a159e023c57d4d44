use alloy_primitives::B256;
use thiserror::Error;

/// Errors raised while parsing contract interfaces or converting values,
/// always before any network I/O happens.
#[derive(Debug, Error)]
pub enum AbiError {
    #[error("malformed contract interface: {0}")]
    MalformedInterface(String),

    #[error("function/event {name} is not found in\n{available}")]
    FunctionNotFound { name: String, available: String },

    #[error("argument count mismatch: {expected} input(s) declared, {got} supplied")]
    ArgCountMismatch { expected: usize, got: usize },

    #[error("cannot parse {value:?} as {ty} (argument {index})")]
    TypeParse {
        index: usize,
        ty: String,
        value: String,
    },

    #[error("value {value} is out of range for {ty}")]
    OutOfRange { ty: String, value: String },

    #[error("unknown ABI type {0:?}")]
    UnknownType(String),

    #[error("type {ty} is not supported by the {dialect} dialect")]
    Unsupported { ty: String, dialect: String },

    #[error("invalid ABI-encoded data: {0}")]
    InvalidData(String),
}

/// Errors from target resolution and call/deploy data generation.
#[derive(Debug, Error)]
pub enum CallError {
    #[error("{0:?} is neither a contract address nor a valid contract name")]
    InvalidTarget(String),

    #[error("unknown VM dialect {0:?}, expected \"evm\" or \"wasm\"")]
    UnknownDialect(String),

    #[error("contract deployment requires both bytecode and an interface")]
    MissingBytecodeOrAbi,

    #[error("constructor argument mismatch: {expected} declared, {got} supplied")]
    ConstructorArgMismatch { expected: usize, got: usize },

    #[error("arguments were supplied both inline ({inline}) and as a separate list ({separate})")]
    AmbiguousArguments { inline: usize, separate: usize },

    #[error("malformed function literal {0:?}")]
    MalformedShorthand(String),

    #[error(transparent)]
    Abi(#[from] AbiError),
}

/// Key, signature, and curve failures. Never defaulted; an invalid key or
/// signature fails the whole operation.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("invalid private key: {0}")]
    InvalidKey(String),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    #[error("signature was produced by the {actual} backend, expected {expected}")]
    AlgorithmMismatch { expected: String, actual: String },

    #[error("{0}")]
    Backend(String),
}

/// Transport and JSON-RPC envelope failures, surfaced verbatim.
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("rpc transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("malformed rpc response: {0}")]
    MalformedResponse(String),
}

/// A transaction that landed on-chain but did not succeed.
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("transaction {tx_hash} failed: {status} ({})", .reason.as_deref().unwrap_or("no revert reason"))]
    Reverted {
        tx_hash: B256,
        status: String,
        reason: Option<String>,
    },
}

/// Session-level subscription failures; the manager itself survives them.
#[derive(Debug, Error)]
pub enum SubscriptionError {
    #[error("websocket connect to {url} failed: {source}")]
    Connect {
        url: String,
        #[source]
        source: tokio_tungstenite::tungstenite::Error,
    },

    #[error("unknown subscription topic: {0}")]
    UnknownTopic(String),

    #[error("session {id} in group {group} not found")]
    SessionNotFound { group: String, id: String },

    #[error("outbound channel closed for session {0}")]
    ChannelClosed(String),
}

/// Umbrella error for the client surface.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Abi(#[from] AbiError),

    #[error(transparent)]
    Call(#[from] CallError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error("failed to send transaction: {0}")]
    SendFailed(#[source] RpcError),

    #[error("no receipt for transaction {tx_hash} within {budget_secs}s, it may still be pending")]
    ReceiptTimeout { tx_hash: B256, budget_secs: u64 },

    #[error("malformed receipt: {0}")]
    MalformedReceipt(String),

    #[error(transparent)]
    Execution(#[from] ChainError),

    #[error(transparent)]
    Subscription(#[from] SubscriptionError),

    #[error("no signing key configured and no sender address supplied")]
    MissingSender,
}
