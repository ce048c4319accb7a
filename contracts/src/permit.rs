//! # Permit Engine
//!
//! Gasless approvals (EIP-2612). An owner signs an EIP-712 `Permit` message
//! off-chain and anyone may submit it; if the signature checks out, the
//! allowance is set exactly as if the owner had called `approve`.
//!
//! ## Checks, in order
//!
//! 1. The owner is not the zero address.
//! 2. The deadline is not zero and not before the current block timestamp.
//!    `U256::MAX` never expires.
//! 3. The signing hash is built with the owner's *current* nonce.
//! 4. The recovered signer equals the owner and is not the zero address.
//!
//! Only then is the nonce consumed and the allowance written. A rejected
//! permit changes nothing, so the same nonce stays usable.
//!
//! ## Replay
//!
//! The nonce is part of the signed message, so once it is consumed the
//! signature no longer recovers to the owner. Submitting it again fails with
//! [`TokenError::InvalidSignature`]. Signatures for another chain or another
//! deployment fail the same way, through the domain separator.

use std::collections::HashMap;

use aset_protocol::crypto::{recover_signer, Signature};
use aset_protocol::eip712::{permit_digest, PermitMessage};
use aset_protocol::types::{checked_add, is_zero_address, Address, B256, U256};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Result, TokenError};
use crate::ledger::Ledger;

/// A permit as submitted by a relayer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermitRequest {
    pub owner: Address,
    pub spender: Address,
    pub value: U256,
    pub deadline: U256,
    pub signature: Signature,
}

/// Per-owner permit nonces plus the domain they are signed under.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermitEngine {
    domain_separator: B256,
    nonces: HashMap<Address, U256>,
}

impl PermitEngine {
    pub fn new(domain_separator: B256) -> Self {
        Self {
            domain_separator,
            nonces: HashMap::new(),
        }
    }

    pub fn domain_separator(&self) -> B256 {
        self.domain_separator
    }

    /// Number of permits `owner` has had accepted.
    pub fn nonce_of(&self, owner: &Address) -> U256 {
        self.nonces.get(owner).copied().unwrap_or(U256::ZERO)
    }

    /// The message `owner` must sign for their next permit.
    pub fn message_for(
        &self,
        owner: Address,
        spender: Address,
        value: U256,
        deadline: U256,
    ) -> PermitMessage {
        PermitMessage {
            owner,
            spender,
            value,
            nonce: self.nonce_of(&owner),
            deadline,
        }
    }

    /// Validates `request` against the block at `now` and, if it is valid,
    /// consumes the owner's nonce and approves the spender on `ledger`.
    ///
    /// # Errors
    ///
    /// [`TokenError::InvalidOwner`], [`TokenError::InvalidExpiration`] or
    /// [`TokenError::InvalidSignature`], checked in that order. A correctly
    /// signed permit for the zero spender fails with
    /// [`TokenError::InvalidSpender`] and leaves the nonce unspent.
    pub fn permit(&mut self, ledger: &mut Ledger, now: u64, request: &PermitRequest) -> Result<()> {
        let PermitRequest {
            owner,
            spender,
            value,
            deadline,
            signature,
        } = *request;

        if is_zero_address(&owner) {
            warn!(%spender, "permit rejected: zero owner");
            return Err(TokenError::InvalidOwner);
        }

        if deadline.is_zero() || deadline < U256::from(now) {
            warn!(%owner, %deadline, now, "permit rejected: expired");
            return Err(TokenError::InvalidExpiration { deadline, now });
        }

        let message = self.message_for(owner, spender, value, deadline);
        let digest = permit_digest(&self.domain_separator, &message);

        let signer = match recover_signer(&digest, &signature) {
            Ok(signer) => signer,
            Err(e) => {
                warn!(%owner, error = %e, "permit rejected: unrecoverable signature");
                return Err(TokenError::InvalidSignature);
            }
        };
        if is_zero_address(&signer) || signer != owner {
            warn!(%owner, %signer, nonce = %message.nonce, "permit rejected: signer mismatch");
            return Err(TokenError::InvalidSignature);
        }

        let next = checked_add(message.nonce, U256::from(1))?;
        if let Err(e) = ledger.approve(owner, spender, value) {
            warn!(%owner, %spender, error = %e, "permit rejected: approval refused");
            return Err(e);
        }
        self.nonces.insert(owner, next);

        debug!(%owner, %spender, %value, nonce = %message.nonce, "permit accepted");
        Ok(())
    }
}
