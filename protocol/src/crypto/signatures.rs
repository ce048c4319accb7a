//! # Signature Recovery
//!
//! ECDSA over secp256k1 with public-key recovery, the primitive behind
//! `ecrecover`. A permit carries no public key; the signer's account is
//! recovered from `(digest, v, r, s)` and compared against the claimed
//! owner.
//!
//! ## Acceptance rules
//!
//! Recovery matches `ecrecover`:
//!
//! - `v` must be `27` or `28`. The raw recovery ids `0`/`1` recover nothing.
//! - A high `s` is accepted. For every signature `(v, r, s)` its twin
//!   `(v ^ 1, r, n - s)` recovers the same account, and both are valid.
//!
//! Replay protection comes from the permit nonce, not from signature
//! uniqueness.

use alloy_primitives::Address;
use k256::ecdsa::{RecoveryId, Signature as K256Signature, VerifyingKey};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::keys::address_from_verifying_key;
use crate::config::SIGNATURE_LENGTH;

/// Errors during signature parsing or recovery.
///
/// The permit engine maps all of these to a single "invalid signature"
/// rejection. They are distinct here for tooling and tests.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("invalid signature bytes: expected 65 bytes")]
    InvalidSignatureBytes,

    #[error("invalid recovery id: {0}")]
    InvalidRecoveryId(u8),

    #[error("malformed signature scalars")]
    MalformedScalars,

    #[error("public key recovery failed")]
    RecoveryFailed,
}

/// An ECDSA signature in the `(v, r, s)` form wallets hand out.
///
/// `v` is the Ethereum-style `27`/`28`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub v: u8,
    pub r: [u8; 32],
    pub s: [u8; 32],
}

impl Signature {
    pub fn new(v: u8, r: [u8; 32], s: [u8; 32]) -> Self {
        Self { v, r, s }
    }

    /// Parses the 65-byte RPC form `r || s || v`.
    pub fn from_rpc_bytes(bytes: &[u8]) -> Result<Self, SignatureError> {
        if bytes.len() != SIGNATURE_LENGTH {
            return Err(SignatureError::InvalidSignatureBytes);
        }
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..64]);
        Ok(Self { v: bytes[64], r, s })
    }

    /// Parses a hex RPC signature (`0x` optional).
    pub fn from_hex(s: &str) -> Result<Self, SignatureError> {
        let trimmed = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(trimmed).map_err(|_| SignatureError::InvalidSignatureBytes)?;
        Self::from_rpc_bytes(&bytes)
    }

    /// Serializes to the 65-byte RPC form `r || s || v`.
    pub fn to_rpc_bytes(&self) -> [u8; SIGNATURE_LENGTH] {
        let mut out = [0u8; SIGNATURE_LENGTH];
        out[..32].copy_from_slice(&self.r);
        out[32..64].copy_from_slice(&self.s);
        out[64] = self.v;
        out
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.to_rpc_bytes()))
    }

    /// The raw recovery id (0 or 1) encoded in `v`.
    pub fn recovery_id(&self) -> Result<RecoveryId, SignatureError> {
        match self.v {
            27 | 28 => RecoveryId::from_byte(self.v - 27)
                .ok_or(SignatureError::InvalidRecoveryId(self.v)),
            other => Err(SignatureError::InvalidRecoveryId(other)),
        }
    }
}

/// Recovers the account that produced `signature` over `digest`.
///
/// Fails if `v` is not `27`/`28`, if `r`/`s` are zero or out of range, or if
/// no point corresponds to `r`.
pub fn recover_signer(digest: &[u8; 32], signature: &Signature) -> Result<Address, SignatureError> {
    let mut recovery_id = signature.recovery_id()?;

    let mut rs = [0u8; 64];
    rs[..32].copy_from_slice(&signature.r);
    rs[32..].copy_from_slice(&signature.s);
    let mut sig = K256Signature::from_slice(&rs).map_err(|_| SignatureError::MalformedScalars)?;

    // k256 only verifies low-s signatures. A high-s signature recovers the
    // same key as its low-s twin with the y parity flipped.
    if let Some(low) = sig.normalize_s() {
        sig = low;
        recovery_id = RecoveryId::new(!recovery_id.is_y_odd(), recovery_id.is_x_reduced());
    }

    let key = VerifyingKey::recover_from_prehash(digest, &sig, recovery_id)
        .map_err(|_| SignatureError::RecoveryFailed)?;
    Ok(address_from_verifying_key(&key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::AsetKeypair;
    use alloy_primitives::U256;

    #[test]
    fn test_sign_and_recover() {
        let kp = AsetKeypair::generate();
        let digest = [42u8; 32];
        let sig = kp.sign_digest(&digest).unwrap();
        assert_eq!(recover_signer(&digest, &sig).unwrap(), kp.address());
    }

    #[test]
    fn test_wrong_digest_recovers_other_account() {
        let kp = AsetKeypair::generate();
        let sig = kp.sign_digest(&[1u8; 32]).unwrap();
        // Recovery on a different digest either fails or yields a stranger.
        match recover_signer(&[2u8; 32], &sig) {
            Ok(addr) => assert_ne!(addr, kp.address()),
            Err(e) => assert_eq!(e, SignatureError::RecoveryFailed),
        }
    }

    #[test]
    fn test_raw_recovery_id_rejected() {
        let kp = AsetKeypair::generate();
        let digest = [9u8; 32];
        let mut sig = kp.sign_digest(&digest).unwrap();
        let raw = sig.v - 27;
        sig.v = raw;
        assert_eq!(
            recover_signer(&digest, &sig),
            Err(SignatureError::InvalidRecoveryId(raw))
        );
    }

    #[test]
    fn test_bad_recovery_id_rejected() {
        let kp = AsetKeypair::generate();
        let mut sig = kp.sign_digest(&[3u8; 32]).unwrap();
        sig.v = 29;
        assert_eq!(
            recover_signer(&[3u8; 32], &sig),
            Err(SignatureError::InvalidRecoveryId(29))
        );
    }

    #[test]
    fn test_zero_scalars_rejected() {
        let sig = Signature::new(27, [0u8; 32], [0u8; 32]);
        assert_eq!(
            recover_signer(&[3u8; 32], &sig),
            Err(SignatureError::MalformedScalars)
        );
    }

    #[test]
    fn test_high_s_twin_recovers_same_account() {
        let kp = AsetKeypair::generate();
        let digest = [5u8; 32];
        let sig = kp.sign_digest(&digest).unwrap();

        // s' = n - s is the malleable twin of a valid signature.
        let n: U256 = "0xfffffffffffffffffffffffffffffffebaaedce6af48a03bbfd25e8cd0364141"
            .parse()
            .unwrap();
        let high_s = n - U256::from_be_bytes(sig.s);
        let flipped_v = if sig.v == 27 { 28 } else { 27 };
        let twin = Signature::new(flipped_v, sig.r, high_s.to_be_bytes::<32>());

        assert_ne!(twin, sig);
        assert_eq!(recover_signer(&digest, &twin).unwrap(), kp.address());
    }

    #[test]
    fn test_rpc_bytes_roundtrip() {
        let kp = AsetKeypair::generate();
        let sig = kp.sign_digest(&[8u8; 32]).unwrap();
        let parsed = Signature::from_hex(&sig.to_hex()).unwrap();
        assert_eq!(parsed, sig);
        assert_eq!(
            Signature::from_rpc_bytes(&[0u8; 64]),
            Err(SignatureError::InvalidSignatureBytes)
        );
    }
}
