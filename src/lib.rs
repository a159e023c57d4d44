//! Client SDK for permissioned Ethereum-style ledgers that host both EVM
//! and WASM contracts.
//!
//! The crate covers the whole client path: encoding a call for either VM
//! ([`abi`], [`call`]), signing it with secp256k1 or SM2 ([`crypto`],
//! [`tx`]), submitting it and waiting for the receipt ([`client`],
//! [`rpc`]), decoding emitted events ([`events`]), and streaming chain
//! pushes over websockets ([`ws`]).

pub mod abi;
pub mod call;
pub mod client;
pub mod config;
pub mod crypto;
pub mod error;
pub mod events;
pub mod rpc;
pub mod tx;
pub mod ws;

pub use abi::{Abi, ParamType, Value};
pub use call::{build_call, build_deploy, CallDescriptor, VmDialect};
pub use client::{CallOutcome, ContractClient, ContractRef, ParsedReceipt};
pub use config::Config;
pub use crypto::{Algorithm, CryptoSuite, Keypair, Signature};
pub use error::ClientError;
pub use rpc::{HttpTransport, RpcClient, Transport};
pub use tx::{NonceStrategy, TransactionParams};
pub use ws::{SessionKey, SubscribeTopic, SubscriptionManager};
