//! Raw transaction assembly and signing.
//!
//! Transactions follow the Frontier layout: the signing digest is the
//! keccak-256 hash of the 6-field RLP list `[nonce, gas_price, gas, to,
//! value, data]` (no chain id), and the signed form re-serializes as the
//! 9-field list with `v`, `r`, `s` appended.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use alloy_primitives::{keccak256, Address, B256, U256};
use alloy_rlp::{Encodable, Header, EMPTY_STRING_CODE};

use crate::crypto::{Algorithm, CryptoSuite, Keypair, Signature};
use crate::error::CryptoError;
use crate::rpc::{to_quantity, CallRequest};

/// Transaction type tag the chain expects on node-signed submissions.
pub const DEFAULT_TX_TYPE: u64 = 2;

/// Everything needed to serialize one transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionParams {
    pub nonce: u64,
    pub gas_price: U256,
    pub gas: u64,
    /// `None` deploys a contract.
    pub to: Option<Address>,
    pub value: U256,
    pub data: Vec<u8>,
    pub tx_type: u64,
}

impl TransactionParams {
    pub fn new(to: Option<Address>, data: Vec<u8>) -> Self {
        Self {
            nonce: 0,
            gas_price: U256::ZERO,
            gas: 0,
            to,
            value: U256::ZERO,
            data,
            tx_type: DEFAULT_TX_TYPE,
        }
    }

    /// Digest the sender signs: keccak-256 of the unsigned 6-field list.
    pub fn signing_digest(&self) -> B256 {
        let payload_length = self.base_payload_length();
        let mut out = Vec::with_capacity(payload_length + 3);
        Header {
            list: true,
            payload_length,
        }
        .encode(&mut out);
        self.encode_base_fields(&mut out);
        keccak256(&out)
    }

    /// Hex-encoded signed transaction, ready for `eth_sendRawTransaction`.
    pub fn encode_signed(&self, signature: &Signature) -> String {
        let sig = signature.as_bytes();
        let (v, r, s) = match signature.algorithm() {
            Algorithm::Homestead => (
                u64::from(sig[64]) + 27,
                U256::from_be_slice(&sig[..32]),
                U256::from_be_slice(&sig[32..64]),
            ),
            // SM2 has no recovery bit; the slot is pinned to 27.
            Algorithm::Gm => (
                27u64,
                U256::from_be_slice(&sig[..32]),
                U256::from_be_slice(&sig[32..]),
            ),
        };

        let payload_length =
            self.base_payload_length() + v.length() + r.length() + s.length();
        let mut out = Vec::with_capacity(payload_length + 3);
        Header {
            list: true,
            payload_length,
        }
        .encode(&mut out);
        self.encode_base_fields(&mut out);
        v.encode(&mut out);
        r.encode(&mut out);
        s.encode(&mut out);
        format!("0x{}", hex::encode(out))
    }

    /// The same transaction as a JSON-RPC call object, for `eth_call` and
    /// node-signed `eth_sendTransaction`.
    pub fn to_call_request(&self, from: Option<Address>) -> CallRequest {
        CallRequest {
            from,
            to: self.to,
            gas: Some(to_quantity(self.gas)),
            gas_price: Some(to_quantity(self.gas_price)),
            value: Some(to_quantity(self.value)),
            data: Some(format!("0x{}", hex::encode(&self.data))),
            tx_type: Some(self.tx_type),
        }
    }

    /// GM wire convention: the sender's uncompressed public key rides at
    /// the front of the payload, standing in for signature recovery.
    pub fn with_gm_sender(&self, public_key: &[u8]) -> Self {
        let mut data = Vec::with_capacity(public_key.len() + self.data.len());
        data.extend_from_slice(public_key);
        data.extend_from_slice(&self.data);
        Self {
            data,
            ..self.clone()
        }
    }

    fn base_payload_length(&self) -> usize {
        self.nonce.length()
            + self.gas_price.length()
            + self.gas.length()
            + self.to.as_ref().map_or(1, Encodable::length)
            + self.value.length()
            + self.data.as_slice().length()
    }

    fn encode_base_fields(&self, out: &mut Vec<u8>) {
        self.nonce.encode(out);
        self.gas_price.encode(out);
        self.gas.encode(out);
        match &self.to {
            Some(addr) => addr.encode(out),
            None => out.push(EMPTY_STRING_CODE),
        }
        self.value.encode(out);
        self.data.as_slice().encode(out);
    }
}

/// Signs a transaction under the suite's algorithm. For GM the payload is
/// rewritten with the sender's key before the digest is taken, so the
/// signed bytes and the digest always agree.
pub fn sign_transaction(
    suite: &CryptoSuite,
    keypair: &Keypair,
    params: &TransactionParams,
) -> Result<String, CryptoError> {
    let effective = match suite.algorithm() {
        Algorithm::Homestead => params.clone(),
        Algorithm::Gm => params.with_gm_sender(keypair.public_key()),
    };
    let digest = effective.signing_digest();
    let signature = suite.sign(&digest, keypair)?;
    Ok(effective.encode_signed(&signature))
}

/// Source of transaction nonces. The chain treats the nonce as a replay
/// tag rather than an account sequence, so strategies need no chain state.
pub trait NonceStrategy: Send + Sync + fmt::Debug {
    fn next_nonce(&self) -> u64;
}

/// A fresh process-random nonce per transaction.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomNonce;

impl NonceStrategy for RandomNonce {
    fn next_nonce(&self) -> u64 {
        rand::random()
    }
}

/// Monotonic in-process counter, for deterministic test runs and for
/// deployments that audit by nonce order.
#[derive(Debug, Default)]
pub struct SequentialNonce {
    next: AtomicU64,
}

impl SequentialNonce {
    pub fn starting_at(nonce: u64) -> Self {
        Self {
            next: AtomicU64::new(nonce),
        }
    }
}

impl NonceStrategy for SequentialNonce {
    fn next_nonce(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}
