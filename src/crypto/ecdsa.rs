//! secp256k1 backend. Signatures are 65 bytes, `r || s || recovery_id`
//! with the recovery id still in its raw 0/1 form; the transaction layer
//! shifts it to 27/28 on the wire.

use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use zeroize::Zeroizing;

use crate::error::CryptoError;

pub const SIGNATURE_LEN: usize = 65;

pub fn generate() -> (Zeroizing<Vec<u8>>, Vec<u8>) {
    let signing = SigningKey::random(&mut rand::thread_rng());
    let secret = Zeroizing::new(signing.to_bytes().to_vec());
    let public = uncompressed(signing.verifying_key());
    (secret, public)
}

pub fn public_from_secret(secret: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let signing =
        SigningKey::from_slice(secret).map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
    Ok(uncompressed(signing.verifying_key()))
}

pub fn sign(digest: &[u8; 32], secret: &[u8]) -> Result<[u8; SIGNATURE_LEN], CryptoError> {
    let signing =
        SigningKey::from_slice(secret).map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
    let (signature, recovery_id) = signing
        .sign_prehash_recoverable(digest)
        .map_err(|e| CryptoError::Backend(format!("ecdsa sign: {e}")))?;

    let mut out = [0u8; SIGNATURE_LEN];
    out[..64].copy_from_slice(&signature.to_bytes());
    out[64] = recovery_id.to_byte();
    Ok(out)
}

pub fn recover(digest: &[u8; 32], sig: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if sig.len() != SIGNATURE_LEN {
        return Err(CryptoError::InvalidSignature(format!(
            "expected {SIGNATURE_LEN} bytes, got {}",
            sig.len()
        )));
    }
    let recovery_id = RecoveryId::from_byte(sig[64]).ok_or_else(|| {
        CryptoError::InvalidSignature(format!("recovery id {} out of range", sig[64]))
    })?;
    let signature = Signature::from_slice(&sig[..64])
        .map_err(|e| CryptoError::InvalidSignature(e.to_string()))?;
    let key = VerifyingKey::recover_from_prehash(digest, &signature, recovery_id)
        .map_err(|e| CryptoError::InvalidSignature(e.to_string()))?;
    Ok(uncompressed(&key))
}

/// Recover-and-compare. This rejects a signature if any byte of it was
/// altered, the recovery id included.
pub fn verify(digest: &[u8; 32], sig: &[u8], public: &[u8]) -> bool {
    match recover(digest, sig) {
        Ok(recovered) => recovered == public,
        Err(_) => false,
    }
}

fn uncompressed(key: &VerifyingKey) -> Vec<u8> {
    key.to_encoded_point(false).as_bytes().to_vec()
}
