//! SM2/SM3 backend for GM-profile chains. Signatures travel as 64 raw
//! bytes, `r || s`, each zero-padded to 32. SM2 offers no public-key
//! recovery, so the signer's key rides alongside the signature.

use libsm::sm2::signature::{SigCtx, Signature as Sm2Signature};
use libsm::sm3::hash::Sm3Hash;
use zeroize::Zeroizing;

use crate::error::CryptoError;

pub const SIGNATURE_LEN: usize = 64;

pub fn generate() -> Result<(Zeroizing<Vec<u8>>, Vec<u8>), CryptoError> {
    let ctx = SigCtx::new();
    let (public, secret) = ctx
        .new_keypair()
        .map_err(|e| CryptoError::Backend(format!("sm2 keygen: {e:?}")))?;
    let secret = ctx
        .serialize_seckey(&secret)
        .map_err(|e| CryptoError::Backend(format!("sm2 keygen: {e:?}")))?;
    let public = ctx
        .serialize_pubkey(&public, false)
        .map_err(|e| CryptoError::Backend(format!("sm2 keygen: {e:?}")))?;
    Ok((Zeroizing::new(secret), public))
}

pub fn public_from_secret(secret: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let ctx = SigCtx::new();
    let sk = ctx
        .load_seckey(secret)
        .map_err(|e| CryptoError::InvalidKey(format!("{e:?}")))?;
    let pk = ctx
        .pk_from_sk(&sk)
        .map_err(|e| CryptoError::InvalidKey(format!("{e:?}")))?;
    ctx.serialize_pubkey(&pk, false)
        .map_err(|e| CryptoError::Backend(format!("sm2 pubkey: {e:?}")))
}

pub fn sign(digest: &[u8; 32], secret: &[u8]) -> Result<[u8; SIGNATURE_LEN], CryptoError> {
    let ctx = SigCtx::new();
    let sk = ctx
        .load_seckey(secret)
        .map_err(|e| CryptoError::InvalidKey(format!("{e:?}")))?;
    let pk = ctx
        .pk_from_sk(&sk)
        .map_err(|e| CryptoError::InvalidKey(format!("{e:?}")))?;
    let signature = ctx
        .sign(digest, &sk, &pk)
        .map_err(|e| CryptoError::Backend(format!("sm2 sign: {e:?}")))?;

    let mut out = [0u8; SIGNATURE_LEN];
    write_padded(&signature.get_r().to_bytes_be(), &mut out[..32])?;
    write_padded(&signature.get_s().to_bytes_be(), &mut out[32..])?;
    Ok(out)
}

pub fn verify(digest: &[u8; 32], sig: &[u8], public: &[u8]) -> bool {
    if sig.len() != SIGNATURE_LEN {
        return false;
    }
    let ctx = SigCtx::new();
    let Ok(pk) = ctx.load_pubkey(public) else {
        return false;
    };
    let signature = Sm2Signature::new(&sig[..32], &sig[32..]);
    ctx.verify(digest, &pk, &signature).unwrap_or(false)
}

pub fn sm3(data: &[u8]) -> [u8; 32] {
    let mut hash = Sm3Hash::new(data);
    hash.get_hash()
}

fn write_padded(src: &[u8], dst: &mut [u8]) -> Result<(), CryptoError> {
    if src.len() > dst.len() {
        return Err(CryptoError::Backend(format!(
            "sm2 scalar is {} bytes, expected at most {}",
            src.len(),
            dst.len()
        )));
    }
    let offset = dst.len() - src.len();
    dst[offset..].copy_from_slice(src);
    Ok(())
}
