//! # EIP-712 Typed-Message Hashing
//!
//! Builds the three hashes behind a permit signature:
//!
//! ```text
//! domainSeparator = keccak256(abi.encode(
//!     DOMAIN_TYPEHASH, keccak256(name), keccak256(version), chainId, verifyingContract))
//! structHash      = keccak256(abi.encode(
//!     PERMIT_TYPEHASH, owner, spender, value, nonce, deadline))
//! signingHash     = keccak256(0x19 || 0x01 || domainSeparator || structHash)
//! ```
//!
//! The domain binds a signature to one contract on one chain. Change the
//! chain id, the contract address, the name or the version string and the
//! signing hash changes with it, so a signature can never be replayed on
//! another deployment.
//!
//! Off-chain signers (`eth_signTypedData_v4`) compute the same bytes, which
//! is why none of this may drift from the EIP.

use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};

use crate::crypto::hash::{hash_words, keccak256, keccak256_concat, word_from_address, word_from_u256};
use crate::crypto::keys::{AsetKeypair, KeyError};
use crate::crypto::signatures::Signature;

/// Canonical encoding of the domain struct type.
pub const DOMAIN_TYPE: &str =
    "EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)";

/// Canonical encoding of the permit struct type.
pub const PERMIT_TYPE: &str =
    "Permit(address owner,address spender,uint256 value,uint256 nonce,uint256 deadline)";

/// The two-byte prefix that makes typed-data digests distinct from
/// transactions and `personal_sign` messages.
pub const SIGNING_PREFIX: [u8; 2] = [0x19, 0x01];

/// `keccak256(DOMAIN_TYPE)`.
pub fn domain_typehash() -> B256 {
    B256::from(keccak256(DOMAIN_TYPE.as_bytes()))
}

/// `keccak256(PERMIT_TYPE)`.
pub fn permit_typehash() -> B256 {
    B256::from(keccak256(PERMIT_TYPE.as_bytes()))
}

/// The fields of the EIP-712 domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Eip712Domain {
    pub name: String,
    pub version: String,
    pub chain_id: u64,
    pub verifying_contract: Address,
}

impl Eip712Domain {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        chain_id: u64,
        verifying_contract: Address,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            chain_id,
            verifying_contract,
        }
    }

    /// The domain separator of this domain.
    pub fn separator(&self) -> B256 {
        hash_domain(self)
    }
}

/// An off-chain allowance grant. Never stored; consumed exactly once
/// because the nonce inside it is consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermitMessage {
    pub owner: Address,
    pub spender: Address,
    pub value: U256,
    pub nonce: U256,
    pub deadline: U256,
}

/// Hashes the domain into its separator.
pub fn hash_domain(domain: &Eip712Domain) -> B256 {
    hash_words(&[
        domain_typehash().0,
        keccak256(domain.name.as_bytes()),
        keccak256(domain.version.as_bytes()),
        word_from_u256(&U256::from(domain.chain_id)),
        word_from_address(&domain.verifying_contract),
    ])
}

/// Hashes a permit into its struct hash.
pub fn hash_message(permit: &PermitMessage) -> B256 {
    hash_words(&[
        permit_typehash().0,
        word_from_address(&permit.owner),
        word_from_address(&permit.spender),
        word_from_u256(&permit.value),
        word_from_u256(&permit.nonce),
        word_from_u256(&permit.deadline),
    ])
}

/// Combines a domain separator and a struct hash into the digest that is
/// actually signed.
pub fn signing_hash(domain_separator: &B256, struct_hash: &B256) -> [u8; 32] {
    keccak256_concat(&[
        &SIGNING_PREFIX,
        domain_separator.as_slice(),
        struct_hash.as_slice(),
    ])
}

/// Convenience: the digest for `permit` under `domain_separator`.
pub fn permit_digest(domain_separator: &B256, permit: &PermitMessage) -> [u8; 32] {
    signing_hash(domain_separator, &hash_message(permit))
}

/// Signs `permit` for the domain behind `domain_separator`.
///
/// This is what a wallet does on `eth_signTypedData_v4`. The keypair must
/// belong to `permit.owner` for the ledger to accept the result.
pub fn sign_permit(
    keypair: &AsetKeypair,
    domain_separator: &B256,
    permit: &PermitMessage,
) -> Result<Signature, KeyError> {
    keypair.sign_digest(&permit_digest(domain_separator, permit))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_domain() -> Eip712Domain {
        Eip712Domain::new("Aset Token", "1", 31_337, Address::repeat_byte(0x42))
    }

    fn sample_permit() -> PermitMessage {
        PermitMessage {
            owner: Address::repeat_byte(0x01),
            spender: Address::repeat_byte(0x02),
            value: U256::from(2_000u64),
            nonce: U256::ZERO,
            deadline: U256::MAX,
        }
    }

    #[test]
    fn test_domain_typehash_matches_eip() {
        assert_eq!(
            hex::encode(domain_typehash()),
            "8b73c3c69bb8fe3d512ecc4cf759cc79239f7b179b0ffacaa9a75d522b39400f"
        );
    }

    #[test]
    fn test_permit_typehash_matches_eip2612() {
        assert_eq!(
            hex::encode(permit_typehash()),
            "6e71edae12b1b97f4d1f60370fef10105fa2faae0126114a169c64845d6126c9"
        );
    }

    #[test]
    fn test_separator_is_deterministic() {
        assert_eq!(sample_domain().separator(), sample_domain().separator());
    }

    #[test]
    fn test_separator_binds_every_domain_field() {
        let base = sample_domain().separator();

        let mut other_chain = sample_domain();
        other_chain.chain_id = 56;
        assert_ne!(other_chain.separator(), base);

        let mut other_contract = sample_domain();
        other_contract.verifying_contract = Address::repeat_byte(0x43);
        assert_ne!(other_contract.separator(), base);

        let mut other_name = sample_domain();
        other_name.name = "Aset".into();
        assert_ne!(other_name.separator(), base);

        let mut other_version = sample_domain();
        other_version.version = "2".into();
        assert_ne!(other_version.separator(), base);
    }

    #[test]
    fn test_message_hash_binds_nonce_and_deadline() {
        let base = hash_message(&sample_permit());

        let mut bumped = sample_permit();
        bumped.nonce = U256::from(1);
        assert_ne!(hash_message(&bumped), base);

        let mut expiring = sample_permit();
        expiring.deadline = U256::from(1_700_000_000u64);
        assert_ne!(hash_message(&expiring), base);
    }

    #[test]
    fn test_signing_hash_layout() {
        let sep = sample_domain().separator();
        let msg = hash_message(&sample_permit());

        let mut buf = vec![0x19, 0x01];
        buf.extend_from_slice(sep.as_slice());
        buf.extend_from_slice(msg.as_slice());
        assert_eq!(signing_hash(&sep, &msg), keccak256(&buf));
        assert_eq!(permit_digest(&sep, &sample_permit()), keccak256(&buf));
    }

    /// `eth_signTypedData_v4` of a permit from the hardhat fixture key on BSC
    /// testnet, computed outside this crate.
    #[test]
    fn test_permit_digest_matches_wallet_vector() {
        let keypair = AsetKeypair::from_hex(
            "0x5f35dcec86fc6944a9fede6e976bf6a883a29fafabd1ec19862a6b409f8d944a",
        )
        .unwrap();
        let contract: Address = "0xcccccccccccccccccccccccccccccccccccccccc".parse().unwrap();
        let domain = Eip712Domain::new("Aset Token", "1", 97, contract);
        let permit = PermitMessage {
            owner: keypair.address(),
            spender: "0x70997970C51812dc3A010C7d01b50e0d17dc79C8".parse().unwrap(),
            value: U256::from(2_000_000_000_000_000_000u128),
            nonce: U256::ZERO,
            deadline: U256::MAX,
        };

        let sep = domain.separator();
        assert_eq!(
            hex::encode(sep),
            "55592449b4cd3452d073e27d4365460f279cc83d6d694a7d13b177f33b6cd34b"
        );
        let digest = permit_digest(&sep, &permit);
        assert_eq!(
            hex::encode(digest),
            "19db966e89bf8ff253393fa1d41eafcbf6cf2454e7dbb7a1034b7793f1110f1e"
        );

        // RFC 6979 nonces make the signature deterministic.
        let sig = sign_permit(&keypair, &sep, &permit).unwrap();
        assert_eq!(
            sig.to_hex(),
            "0x4975c19220afb15e0edcdba9552989753a5b39a86612e87a7cc5f2a8dca8dc12\
             09242c81eec769f286025a44791a37536d487365cf499b5cdd9e5109e01d0a5f1c"
        );
        assert_eq!(
            crate::crypto::recover_signer(&digest, &sig).unwrap(),
            keypair.address()
        );
    }

    #[test]
    fn test_signed_permit_recovers_owner() {
        let keypair = AsetKeypair::generate();
        let sep = sample_domain().separator();
        let mut permit = sample_permit();
        permit.owner = keypair.address();

        let sig = sign_permit(&keypair, &sep, &permit).unwrap();
        let digest = permit_digest(&sep, &permit);
        assert_eq!(crate::crypto::recover_signer(&digest, &sig).unwrap(), keypair.address());

        // Same signature, different chain: somebody else "signed" it.
        let other = Eip712Domain::new("Aset Token", "1", 56, Address::repeat_byte(0x42)).separator();
        let moved = permit_digest(&other, &permit);
        assert_ne!(
            crate::crypto::recover_signer(&moved, &sig).ok(),
            Some(keypair.address())
        );
    }
}
