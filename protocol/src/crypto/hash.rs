//! # Hashing Utilities
//!
//! Keccak-256 and the handful of ABI encoding rules the EIP-712 hasher
//! needs. Only static types appear in a permit (addresses and `uint256`s),
//! so "ABI-encode" reduces to concatenating 32-byte big-endian words.
//!
//! Keccak-256 is the pre-standard SHA-3 variant with the original padding.
//! It is *not* interchangeable with `SHA3-256`, and every signer in the EVM
//! world uses Keccak, so that is what we use.

use alloy_primitives::{Address, B256, U256};

/// Compute the Keccak-256 hash of the input data.
///
/// # Example
///
/// ```
/// use aset_protocol::crypto::keccak256;
///
/// let hash = keccak256(b"");
/// assert_eq!(
///     hex::encode(hash),
///     "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
/// );
/// ```
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    alloy_primitives::keccak256(data).0
}

/// Keccak-256 over the concatenation of several byte slices, without
/// building the concatenation first.
pub fn keccak256_concat(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = alloy_primitives::Keccak256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().0
}

/// ABI word for a `uint256`: 32 bytes, big-endian.
pub fn word_from_u256(value: &U256) -> [u8; 32] {
    value.to_be_bytes::<32>()
}

/// ABI word for an `address`: 12 zero bytes followed by the 20 address bytes.
pub fn word_from_address(address: &Address) -> [u8; 32] {
    address.into_word().0
}

/// ABI-encodes a sequence of static words and hashes the result.
///
/// This is `keccak256(abi.encode(w0, w1, ...))` for callers that have
/// already turned every field into its 32-byte word.
pub fn hash_words(words: &[[u8; 32]]) -> B256 {
    let mut hasher = alloy_primitives::Keccak256::new();
    for word in words {
        hasher.update(word);
    }
    hasher.finalize()
}
