//! # ASET Token
//!
//! The deployed token: ledger, snapshot histories, permit nonces and the
//! block context, behind one object with ERC-20 style entry points.
//!
//! ## Lifecycle
//!
//! 1. The host describes the deployment ([`TokenDeployment`]): chain id,
//!    contract address and the block it lands in.
//! 2. [`TokenDeployment::initialize`] consumes that description, computes
//!    the domain separator and mints the genesis supply to the distributor.
//!    Because it takes `self` by value, a deployment can be initialized
//!    exactly once.
//! 3. The host feeds new blocks with [`AsetToken::advance_block`] and calls
//!    the mutations on behalf of authenticated callers.
//!
//! There is no mint after genesis, no burn, no pause and no owner role.

use aset_protocol::config::{
    genesis_supply, EIP712_REVISION, REVISION, TOKEN_DECIMALS, TOKEN_NAME, TOKEN_SYMBOL,
};
use aset_protocol::crypto::Signature;
use aset_protocol::eip712::{Eip712Domain, PermitMessage};
use aset_protocol::types::{is_zero_address, Address, BlockContext, Version, B256, U256};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Result, TokenError};
use crate::events::TokenEvent;
use crate::ledger::Ledger;
use crate::permit::{PermitEngine, PermitRequest};
use crate::snapshot::Snapshot;

/// Where a token is being deployed. Consumed by [`initialize`](Self::initialize).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenDeployment {
    /// Chain id bound into every permit signature.
    pub chain_id: u64,
    /// Contract address bound into every permit signature.
    pub address: Address,
    /// Block the deployment executes in.
    pub block: BlockContext,
}

impl TokenDeployment {
    pub fn new(chain_id: u64, address: Address, block: BlockContext) -> Self {
        Self {
            chain_id,
            address,
            block,
        }
    }

    /// The EIP-712 domain this deployment signs under.
    pub fn domain(&self) -> Eip712Domain {
        Eip712Domain::new(TOKEN_NAME, EIP712_REVISION, self.chain_id, self.address)
    }

    /// Initializes the token and mints the full genesis supply to
    /// `distributor`. `governance` is recorded as-is; pass
    /// `Address::ZERO` when there is none.
    ///
    /// # Errors
    ///
    /// [`TokenError::InvalidRecipient`] if `distributor` is the zero address.
    pub fn initialize(self, distributor: Address, governance: Address) -> Result<AsetToken> {
        if is_zero_address(&distributor) {
            return Err(TokenError::InvalidRecipient(distributor));
        }

        let domain = self.domain();
        let separator = domain.separator();
        let mut ledger = Ledger::new(self.block.number);
        ledger.mint_genesis(distributor, genesis_supply())?;

        info!(
            chain_id = self.chain_id,
            address = %self.address,
            %distributor,
            block = self.block.number,
            "token initialized"
        );

        Ok(AsetToken {
            chain_id: self.chain_id,
            address: self.address,
            governance,
            block: self.block,
            domain,
            permits: PermitEngine::new(separator),
            ledger,
        })
    }
}

/// An initialized ASET token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AsetToken {
    chain_id: u64,
    address: Address,
    governance: Address,
    block: BlockContext,
    domain: Eip712Domain,
    permits: PermitEngine,
    ledger: Ledger,
}

impl AsetToken {
    // -----------------------------------------------------------------------
    // Metadata
    // -----------------------------------------------------------------------

    pub fn name(&self) -> &'static str {
        TOKEN_NAME
    }

    pub fn symbol(&self) -> &'static str {
        TOKEN_SYMBOL
    }

    pub fn decimals(&self) -> u8 {
        TOKEN_DECIMALS
    }

    /// Implementation revision of the token logic.
    pub fn revision(&self) -> u64 {
        REVISION
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Governance address recorded at initialization (zero if none).
    pub fn governance(&self) -> Address {
        self.governance
    }

    /// The block the token currently executes in.
    pub fn block(&self) -> BlockContext {
        self.block
    }

    pub fn domain(&self) -> &Eip712Domain {
        &self.domain
    }

    pub fn domain_separator(&self) -> B256 {
        self.permits.domain_separator()
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn total_supply(&self) -> U256 {
        self.ledger.total_supply()
    }

    pub fn balance_of(&self, account: &Address) -> U256 {
        self.ledger.balance_of(account)
    }

    /// Balance of `account` as of block `version`.
    pub fn balance_at(&self, account: &Address, version: Version) -> U256 {
        self.ledger.balance_at(account, version)
    }

    pub fn snapshot_count(&self, account: &Address) -> usize {
        self.ledger.snapshot_count(account)
    }

    pub fn snapshot(&self, account: &Address, index: usize) -> Option<Snapshot> {
        self.ledger.snapshot(account, index)
    }

    /// Full balance history of `account`, oldest first.
    pub fn snapshots(&self, account: &Address) -> &[Snapshot] {
        self.ledger.snapshots().history(account)
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> U256 {
        self.ledger.allowance(owner, spender)
    }

    pub fn nonce_of(&self, owner: &Address) -> U256 {
        self.permits.nonce_of(owner)
    }

    /// The message `owner` has to sign to grant `spender` an allowance of
    /// `value` through a permit.
    pub fn permit_message(
        &self,
        owner: Address,
        spender: Address,
        value: U256,
        deadline: U256,
    ) -> PermitMessage {
        self.permits.message_for(owner, spender, value, deadline)
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Moves the token to a new block.
    ///
    /// # Errors
    ///
    /// [`TokenError::StaleBlock`] if the block number or the timestamp goes
    /// backwards.
    pub fn advance_block(&mut self, block: BlockContext) -> Result<()> {
        if !self.block.precedes_or_equals(&block) {
            return Err(TokenError::StaleBlock {
                current: self.block.number,
                attempted: block.number,
            });
        }
        self.ledger.advance_to(block.number)?;
        self.block = block;
        Ok(())
    }

    /// `caller` sends `amount` to `to`.
    pub fn transfer(&mut self, caller: Address, to: Address, amount: U256) -> Result<()> {
        self.ledger.transfer(caller, to, amount)
    }

    /// `caller` allows `spender` to move up to `amount` of its tokens.
    pub fn approve(&mut self, caller: Address, spender: Address, amount: U256) -> Result<()> {
        self.ledger.approve(caller, spender, amount)
    }

    /// `caller` moves `amount` from `from` to `to` out of its allowance.
    pub fn transfer_from(
        &mut self,
        caller: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<()> {
        self.ledger.transfer_from(caller, from, to, amount)
    }

    pub fn increase_allowance(&mut self, caller: Address, spender: Address, added: U256) -> Result<()> {
        self.ledger.increase_allowance(caller, spender, added)
    }

    pub fn decrease_allowance(
        &mut self,
        caller: Address,
        spender: Address,
        subtracted: U256,
    ) -> Result<()> {
        self.ledger.decrease_allowance(caller, spender, subtracted)
    }

    /// Applies a signed permit. Anyone may submit it.
    pub fn permit(
        &mut self,
        owner: Address,
        spender: Address,
        value: U256,
        deadline: U256,
        signature: Signature,
    ) -> Result<()> {
        self.submit_permit(&PermitRequest {
            owner,
            spender,
            value,
            deadline,
            signature,
        })
    }

    /// [`permit`](Self::permit), taking the request as one value.
    pub fn submit_permit(&mut self, request: &PermitRequest) -> Result<()> {
        self.permits.permit(&mut self.ledger, self.block.timestamp, request)
    }

    /// Returns and clears the events emitted since the last call.
    pub fn drain_events(&mut self) -> Vec<TokenEvent> {
        self.ledger.drain_events()
    }
}
