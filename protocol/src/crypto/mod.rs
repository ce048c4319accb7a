//! # Cryptographic Primitives for ASET
//!
//! Keccak-256, secp256k1 keys, and `ecrecover`-style signature recovery.
//! Everything a permit needs and nothing more.
//!
//! These are thin, type-safe wrappers around audited implementations
//! (`alloy-primitives` for Keccak, `k256` for the curve). The ledger only
//! ever calls [`recover_signer`]; keypairs exist for tooling and tests.

pub mod hash;
pub mod keys;
pub mod signatures;

pub use hash::{hash_words, keccak256, keccak256_concat, word_from_address, word_from_u256};
pub use keys::{address_from_verifying_key, AsetKeypair, KeyError};
pub use signatures::{recover_signer, Signature, SignatureError};
