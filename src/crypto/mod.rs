//! Pluggable signing layer. A chain runs one of two profiles: the
//! Ethereum-style secp256k1 stack or the GM stack (SM2 signatures, SM3
//! account addressing). The profile is fixed when a [`CryptoSuite`] is
//! built and never changes afterwards.

pub mod ecdsa;
pub mod sm;

use std::fmt;
use std::str::FromStr;

use alloy_primitives::{keccak256, Address, B256};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::error::CryptoError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    /// secp256k1 ECDSA with keccak-256 account addressing.
    #[serde(alias = "secp256k1", alias = "ecdsa")]
    Homestead,
    /// SM2 with SM3 account addressing.
    #[serde(alias = "sm2")]
    Gm,
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algorithm::Homestead => f.write_str("homestead"),
            Algorithm::Gm => f.write_str("gm"),
        }
    }
}

impl FromStr for Algorithm {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "homestead" | "secp256k1" | "ecdsa" => Ok(Algorithm::Homestead),
            "gm" | "sm2" => Ok(Algorithm::Gm),
            other => Err(CryptoError::Backend(format!(
                "unknown signing algorithm {other:?}, expected \"homestead\" or \"gm\""
            ))),
        }
    }
}

/// A secret/public key pair bound to one algorithm. The secret is wiped
/// from memory when the pair is dropped.
pub struct Keypair {
    algorithm: Algorithm,
    secret: Zeroizing<Vec<u8>>,
    public: Vec<u8>,
}

impl Keypair {
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Uncompressed SEC1 public key, 65 bytes with an `0x04` prefix.
    pub fn public_key(&self) -> &[u8] {
        &self.public
    }

    pub fn address(&self) -> Address {
        // public is always well-formed here, derived by the backend
        address_of(self.algorithm, &self.public)
            .unwrap_or_else(|_| unreachable!("backend produced a malformed public key"))
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("algorithm", &self.algorithm)
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

/// A detached signature. GM signatures carry the signer's public key,
/// since SM2 has no recovery operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    algorithm: Algorithm,
    bytes: Vec<u8>,
    public_key: Option<Vec<u8>>,
}

impl Signature {
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Raw signature bytes: 65 (`r || s || recid`) for homestead, 64
    /// (`r || s`) for GM.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn public_key(&self) -> Option<&[u8]> {
        self.public_key.as_deref()
    }
}

/// Hash used for account addresses under the given algorithm. Transaction
/// digests are keccak-256 under both profiles.
pub fn account_hash(algorithm: Algorithm, data: &[u8]) -> B256 {
    match algorithm {
        Algorithm::Homestead => keccak256(data),
        Algorithm::Gm => B256::from(sm::sm3(data)),
    }
}

/// Account address: last 20 bytes of the account hash of the public key
/// body (the 64 bytes after the `0x04` prefix).
pub fn address_of(algorithm: Algorithm, public_key: &[u8]) -> Result<Address, CryptoError> {
    if public_key.len() != 65 || public_key[0] != 0x04 {
        return Err(CryptoError::InvalidPublicKey(format!(
            "expected a 65-byte uncompressed key, got {} bytes",
            public_key.len()
        )));
    }
    let hash = account_hash(algorithm, &public_key[1..]);
    Ok(Address::from_slice(&hash[12..]))
}

/// The signing profile of a chain. Construct one per client; there is no
/// way to switch algorithms after construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CryptoSuite {
    algorithm: Algorithm,
}

impl CryptoSuite {
    pub fn new(algorithm: Algorithm) -> Self {
        Self { algorithm }
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn generate(&self) -> Result<Keypair, CryptoError> {
        let (secret, public) = match self.algorithm {
            Algorithm::Homestead => ecdsa::generate(),
            Algorithm::Gm => sm::generate()?,
        };
        Ok(Keypair {
            algorithm: self.algorithm,
            secret,
            public,
        })
    }

    pub fn keypair_from_secret(&self, secret: &[u8]) -> Result<Keypair, CryptoError> {
        let public = match self.algorithm {
            Algorithm::Homestead => ecdsa::public_from_secret(secret)?,
            Algorithm::Gm => sm::public_from_secret(secret)?,
        };
        Ok(Keypair {
            algorithm: self.algorithm,
            secret: Zeroizing::new(secret.to_vec()),
            public,
        })
    }

    pub fn keypair_from_secret_hex(&self, secret: &str) -> Result<Keypair, CryptoError> {
        let digits = secret.strip_prefix("0x").unwrap_or(secret);
        let bytes = hex::decode(digits).map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
        self.keypair_from_secret(&bytes)
    }

    pub fn sign(&self, digest: &B256, keypair: &Keypair) -> Result<Signature, CryptoError> {
        self.check(keypair.algorithm)?;
        match self.algorithm {
            Algorithm::Homestead => {
                let bytes = ecdsa::sign(&digest.0, &keypair.secret)?;
                Ok(Signature {
                    algorithm: self.algorithm,
                    bytes: bytes.to_vec(),
                    public_key: None,
                })
            }
            Algorithm::Gm => {
                let bytes = sm::sign(&digest.0, &keypair.secret)?;
                Ok(Signature {
                    algorithm: self.algorithm,
                    bytes: bytes.to_vec(),
                    public_key: Some(keypair.public.clone()),
                })
            }
        }
    }

    /// Checks a signature against a public key. Any malformed or altered
    /// input verifies as `false` rather than erroring.
    pub fn verify(
        &self,
        digest: &B256,
        signature: &Signature,
        public_key: &[u8],
    ) -> Result<bool, CryptoError> {
        self.check(signature.algorithm)?;
        Ok(match self.algorithm {
            Algorithm::Homestead => ecdsa::verify(&digest.0, &signature.bytes, public_key),
            Algorithm::Gm => sm::verify(&digest.0, &signature.bytes, public_key),
        })
    }

    /// Returns the public key that produced a signature. Homestead keys are
    /// recovered from the curve; GM signatures hand back the key they carry.
    pub fn recover_public_key(
        &self,
        digest: &B256,
        signature: &Signature,
    ) -> Result<Vec<u8>, CryptoError> {
        self.check(signature.algorithm)?;
        match self.algorithm {
            Algorithm::Homestead => ecdsa::recover(&digest.0, &signature.bytes),
            Algorithm::Gm => signature
                .public_key
                .clone()
                .ok_or_else(|| {
                    CryptoError::InvalidSignature(
                        "gm signature does not carry its public key".to_string(),
                    )
                }),
        }
    }

    pub fn address_of(&self, public_key: &[u8]) -> Result<Address, CryptoError> {
        address_of(self.algorithm, public_key)
    }

    fn check(&self, other: Algorithm) -> Result<(), CryptoError> {
        if self.algorithm != other {
            return Err(CryptoError::AlgorithmMismatch {
                expected: self.algorithm.to_string(),
                actual: other.to_string(),
            });
        }
        Ok(())
    }
}
