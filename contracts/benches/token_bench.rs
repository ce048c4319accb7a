// Ledger benchmarks for the ASET token.
//
// Covers transfers, historical balance lookups over long histories, and
// end-to-end permit application (recovery, nonce bump and approval).

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};

use aset_contracts::snapshot::SnapshotStore;
use aset_contracts::{AsetToken, TokenDeployment};
use aset_protocol::crypto::keys::AsetKeypair;
use aset_protocol::eip712::sign_permit;
use aset_protocol::types::{Address, BlockContext, U256};

fn deploy(distributor: Address) -> AsetToken {
    TokenDeployment::new(56, Address::repeat_byte(0x42), BlockContext::new(1, 1_700_000_000))
        .initialize(distributor, Address::ZERO)
        .unwrap()
}

fn bench_transfer(c: &mut Criterion) {
    let alice = Address::repeat_byte(0x01);
    let bob = Address::repeat_byte(0x02);
    let mut token = deploy(alice);
    let mut block = token.block();

    c.bench_function("ledger/transfer", |b| {
        b.iter(|| {
            block = block.next(2);
            token.advance_block(block).unwrap();
            token.transfer(alice, bob, U256::from(1)).unwrap();
            token.drain_events();
        });
    });
}

fn bench_snapshot_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("snapshot/lookup");
    let account = Address::repeat_byte(0xa1);

    for size in [10u64, 1_000, 100_000] {
        let mut store = SnapshotStore::new();
        for i in 1..=size {
            store.record(account, U256::from(i), i * 2);
        }

        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::from_parameter(size), &store, |b, store| {
            b.iter(|| store.lookup(&account, size + 1));
        });
    }

    group.finish();
}

fn bench_permit(c: &mut Criterion) {
    let owner = AsetKeypair::generate();
    let spender = Address::repeat_byte(0x22);

    c.bench_function("permit/apply", |b| {
        b.iter_batched(
            || {
                let token = deploy(Address::repeat_byte(0x01));
                let message =
                    token.permit_message(owner.address(), spender, U256::from(500), U256::MAX);
                let sig = sign_permit(&owner, &token.domain_separator(), &message).unwrap();
                (token, sig)
            },
            |(mut token, sig)| {
                token
                    .permit(owner.address(), spender, U256::from(500), U256::MAX, sig)
                    .unwrap();
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, bench_transfer, bench_snapshot_lookup, bench_permit);
criterion_main!(benches);
