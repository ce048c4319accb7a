//! # Key Management
//!
//! secp256k1 keypairs for permit signers.
//!
//! Accounts are not public keys here: an account is the last 20 bytes of
//! `keccak256(uncompressed_pubkey[1..])`, exactly as on any EVM chain. The
//! ledger itself never needs a private key; keypairs exist so tooling (the
//! node's `sign-permit` command, tests, benches) can produce signatures the
//! permit engine will accept.
//!
//! ## Security considerations
//!
//! - Secret keys are zeroized on drop (k256 does this for us).
//! - Key generation uses `OsRng`.
//! - Key bytes are never logged, and `Debug` only prints the address.

use std::fmt;

use alloy_primitives::Address;
use k256::ecdsa::{SigningKey, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use rand::rngs::OsRng;
use thiserror::Error;

use super::hash::keccak256;
use super::signatures::Signature;

/// Errors that can occur during key operations.
///
/// Intentionally vague about *why* a key was rejected.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("invalid secret key bytes: wrong length or not a valid scalar")]
    InvalidSecretKey,

    #[error("signing failed")]
    SigningFailed,
}

/// A secp256k1 keypair that signs 32-byte digests.
pub struct AsetKeypair {
    signing_key: SigningKey,
}

impl AsetKeypair {
    /// Generate a fresh keypair using the OS cryptographic RNG.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::random(&mut OsRng),
        }
    }

    /// Reconstruct a keypair from a raw 32-byte secret scalar.
    pub fn from_bytes(secret: &[u8; 32]) -> Result<Self, KeyError> {
        let signing_key =
            SigningKey::from_slice(secret).map_err(|_| KeyError::InvalidSecretKey)?;
        Ok(Self { signing_key })
    }

    /// Reconstruct a keypair from a hex secret, with or without `0x`.
    pub fn from_hex(hex_str: &str) -> Result<Self, KeyError> {
        let trimmed = hex_str.strip_prefix("0x").unwrap_or(hex_str);
        let bytes = hex::decode(trimmed).map_err(|_| KeyError::InvalidSecretKey)?;
        let arr: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| KeyError::InvalidSecretKey)?;
        Self::from_bytes(&arr)
    }

    /// The account this key controls.
    pub fn address(&self) -> Address {
        address_from_verifying_key(self.signing_key.verifying_key())
    }

    /// Exports the raw secret scalar. Handle with care.
    pub fn secret_key_bytes(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        out.copy_from_slice(&self.signing_key.to_bytes());
        out
    }

    /// Hex-encoded secret, `0x`-prefixed, for the keygen command.
    pub fn secret_key_hex(&self) -> String {
        format!("0x{}", hex::encode(self.secret_key_bytes()))
    }

    /// Signs a 32-byte digest and returns an `(r, s, v)` signature with
    /// `v ∈ {27, 28}`.
    ///
    /// The digest is signed as-is. Callers pass an EIP-712 signing hash, not
    /// a message.
    pub fn sign_digest(&self, digest: &[u8; 32]) -> Result<Signature, KeyError> {
        let (sig, recovery_id) = self
            .signing_key
            .sign_prehash_recoverable(digest)
            .map_err(|_| KeyError::SigningFailed)?;
        let bytes = sig.to_bytes();
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..]);
        Ok(Signature::new(27 + recovery_id.to_byte(), r, s))
    }
}

impl Clone for AsetKeypair {
    fn clone(&self) -> Self {
        Self {
            signing_key: self.signing_key.clone(),
        }
    }
}

impl fmt::Debug for AsetKeypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AsetKeypair(address={})", self.address())
    }
}

/// Derives the account address of a secp256k1 public key.
pub fn address_from_verifying_key(key: &VerifyingKey) -> Address {
    let point = key.to_encoded_point(false);
    // Uncompressed SEC1: 0x04 || X || Y. The address hashes X || Y.
    let hash = keccak256(&point.as_bytes()[1..]);
    Address::from_slice(&hash[12..])
}
