//! Integration tests for the ASET token ledger and its snapshot histories.
//!
//! These drive the token the way a host does: initialize, advance blocks,
//! submit calls, and read balances back both now and at past blocks.

use aset_contracts::{AsetToken, Snapshot, TokenDeployment, TokenError, TokenEvent};
use aset_protocol::config::{genesis_supply, to_base_units, CHAIN_ID_BSC_TESTNET};
use aset_protocol::types::{Address, BlockContext, U256};

const DISTRIBUTOR: Address = Address::new([0xd1; 20]);
const USER1: Address = Address::new([0x11; 20]);
const USER2: Address = Address::new([0x22; 20]);

/// Helper: a token deployed at block 1 with the genesis supply on `DISTRIBUTOR`.
fn deploy() -> AsetToken {
    TokenDeployment::new(
        CHAIN_ID_BSC_TESTNET,
        Address::repeat_byte(0x42),
        BlockContext::new(1, 1_700_000_000),
    )
    .initialize(DISTRIBUTOR, Address::ZERO)
    .unwrap()
}

/// Helper: moves the token one block forward.
fn mine(token: &mut AsetToken) {
    let next = token.block().next(2);
    token.advance_block(next).unwrap();
}

fn tokens(whole: u64) -> U256 {
    to_base_units(whole)
}

// ---------------------------------------------------------------------------
// Genesis
// ---------------------------------------------------------------------------

#[test]
fn genesis_mint_produces_one_snapshot() {
    let token = deploy();

    assert_eq!(token.name(), "Aset Token");
    assert_eq!(token.symbol(), "ASET");
    assert_eq!(token.decimals(), 18);
    assert_eq!(token.total_supply(), tokens(16_000_000));
    assert_eq!(token.balance_of(&DISTRIBUTOR), genesis_supply());
    assert_eq!(token.snapshot_count(&DISTRIBUTOR), 1);
    assert_eq!(
        token.snapshot(&DISTRIBUTOR, 0),
        Some(Snapshot {
            version: 1,
            value: genesis_supply()
        })
    );
    assert_eq!(token.nonce_of(&DISTRIBUTOR), U256::ZERO);
}

#[test]
fn genesis_emits_mint_event() {
    let mut token = deploy();
    let events = token.drain_events();
    assert_eq!(
        events,
        vec![TokenEvent::Transfer {
            block: 1,
            from: Address::ZERO,
            to: DISTRIBUTOR,
            value: genesis_supply(),
        }]
    );
}

// ---------------------------------------------------------------------------
// Transfers and snapshots
// ---------------------------------------------------------------------------

#[test]
fn chained_transfers_in_separate_blocks() {
    let mut token = deploy();

    // Block 1 is the genesis block; the distributor's first transfer
    // coalesces with the mint.
    token.transfer(DISTRIBUTOR, USER1, tokens(10)).unwrap();
    mine(&mut token);
    token.transfer(USER1, USER2, tokens(10)).unwrap();

    assert_eq!(
        token.snapshots(&DISTRIBUTOR),
        &[Snapshot {
            version: 1,
            value: genesis_supply() - tokens(10)
        }]
    );

    let u1: Vec<U256> = token.snapshots(&USER1).iter().map(|s| s.value).collect();
    assert_eq!(u1, vec![tokens(10), U256::ZERO]);

    let u2 = token.snapshots(&USER2);
    assert_eq!(u2.len(), 1);
    assert_eq!(u2[0].value, tokens(10));
}

#[test]
fn balance_at_answers_for_past_blocks() {
    let mut token = deploy();
    mine(&mut token); // block 2
    token.transfer(DISTRIBUTOR, USER1, tokens(100)).unwrap();
    mine(&mut token); // block 3
    mine(&mut token); // block 4
    token.transfer(USER1, USER2, tokens(40)).unwrap();

    assert_eq!(token.balance_at(&USER1, 1), U256::ZERO);
    assert_eq!(token.balance_at(&USER1, 2), tokens(100));
    assert_eq!(token.balance_at(&USER1, 3), tokens(100));
    assert_eq!(token.balance_at(&USER1, 4), tokens(60));
    assert_eq!(token.balance_at(&USER2, 3), U256::ZERO);
    assert_eq!(token.balance_at(&USER2, 4), tokens(40));
}

#[test]
fn current_balance_matches_latest_snapshot() {
    let mut token = deploy();
    let accounts = [DISTRIBUTOR, USER1, USER2];

    for round in 0..5u64 {
        mine(&mut token);
        token.transfer(DISTRIBUTOR, USER1, tokens(round + 1)).unwrap();
        token.transfer(USER1, USER2, tokens(round)).unwrap();

        let now = token.block().number;
        for account in &accounts {
            assert_eq!(token.balance_of(account), token.balance_at(account, now));
        }
    }
}

#[test]
fn double_action_in_one_block_coalesces() {
    let mut token = deploy();
    mine(&mut token);

    token.transfer(DISTRIBUTOR, USER1, tokens(10)).unwrap();
    token.transfer(USER1, USER2, tokens(10)).unwrap();

    // USER1 went 0 -> 10 -> 0 inside one block: one entry, holding 0.
    assert_eq!(token.snapshot_count(&USER1), 1);
    assert_eq!(token.snapshot(&USER1, 0).unwrap().value, U256::ZERO);
    assert_eq!(token.snapshot_count(&USER2), 1);
    assert_eq!(token.snapshot(&USER2, 0).unwrap().value, tokens(10));
}

#[test]
fn self_transfer_never_touches_history() {
    let mut token = deploy();
    mine(&mut token);
    token.transfer(DISTRIBUTOR, USER1, tokens(50)).unwrap();
    mine(&mut token);

    let before = token.snapshot_count(&USER1);
    for amount in [0u64, 1, 50] {
        token.transfer(USER1, USER1, tokens(amount)).unwrap();
    }
    assert_eq!(token.snapshot_count(&USER1), before);
    assert_eq!(token.balance_of(&USER1), tokens(50));
}

#[test]
fn failed_transfer_changes_nothing() {
    let mut token = deploy();
    mine(&mut token);
    let err = token.transfer(USER1, USER2, U256::from(1)).unwrap_err();

    assert!(matches!(err, TokenError::InsufficientBalance { .. }));
    assert_eq!(token.snapshot_count(&USER1), 0);
    assert_eq!(token.snapshot_count(&USER2), 0);
    assert!(token.drain_events().iter().all(|e| e.block() == 1));
}

#[test]
fn tokens_cannot_be_sent_to_the_null_account() {
    let mut token = deploy();
    mine(&mut token);
    token.drain_events();

    assert_eq!(
        token.transfer(DISTRIBUTOR, Address::ZERO, tokens(1)),
        Err(TokenError::InvalidRecipient(Address::ZERO))
    );
    assert_eq!(
        token.approve(DISTRIBUTOR, Address::ZERO, tokens(1)),
        Err(TokenError::InvalidSpender(Address::ZERO))
    );
    assert_eq!(token.balance_of(&DISTRIBUTOR), genesis_supply());
    assert_eq!(token.total_supply(), genesis_supply());
    assert!(token.drain_events().is_empty());
}

#[test]
fn supply_is_conserved() {
    let mut token = deploy();
    mine(&mut token);
    token.transfer(DISTRIBUTOR, USER1, tokens(1_000)).unwrap();
    token.approve(USER1, USER2, tokens(300)).unwrap();
    token.transfer_from(USER2, USER1, USER2, tokens(300)).unwrap();

    let sum = token.balance_of(&DISTRIBUTOR) + token.balance_of(&USER1) + token.balance_of(&USER2);
    assert_eq!(sum, token.total_supply());
}

// ---------------------------------------------------------------------------
// Allowances
// ---------------------------------------------------------------------------

#[test]
fn transfer_from_spends_allowance() {
    let mut token = deploy();
    token.approve(DISTRIBUTOR, USER1, tokens(25)).unwrap();
    token.transfer_from(USER1, DISTRIBUTOR, USER2, tokens(20)).unwrap();

    assert_eq!(token.allowance(&DISTRIBUTOR, &USER1), tokens(5));
    assert_eq!(token.balance_of(&USER2), tokens(20));
    assert!(matches!(
        token.transfer_from(USER1, DISTRIBUTOR, USER2, tokens(6)),
        Err(TokenError::InsufficientAllowance { .. })
    ));
}

#[test]
fn allowance_helpers() {
    let mut token = deploy();
    token.increase_allowance(DISTRIBUTOR, USER1, tokens(3)).unwrap();
    token.increase_allowance(DISTRIBUTOR, USER1, tokens(4)).unwrap();
    token.decrease_allowance(DISTRIBUTOR, USER1, tokens(2)).unwrap();
    assert_eq!(token.allowance(&DISTRIBUTOR, &USER1), tokens(5));

    assert!(matches!(
        token.decrease_allowance(DISTRIBUTOR, USER1, tokens(6)),
        Err(TokenError::InsufficientAllowance { .. })
    ));
    assert_eq!(token.allowance(&DISTRIBUTOR, &USER1), tokens(5));
}
