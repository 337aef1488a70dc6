//! Criterion benchmarks for orbis-core hot paths.
//!
//! Covers: level curve evaluation and in-memory store read-modify-write.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use orbis_core::{Account, AccountId, AccountStore, AccountUpdate, LevelCurve, MemoryAccountStore};

fn bench_level_for(c: &mut Criterion) {
    let curve = LevelCurve::default();
    // ~level 60: representative of a long-lived active account.
    let total = 250_000.0;

    c.bench_function("level_for", |b| b.iter(|| curve.level_for(black_box(total))));
}

fn bench_memory_update(c: &mut Criterion) {
    let store = MemoryAccountStore::new();
    let id = AccountId::from("bench");
    store.create_if_absent(Account::new("bench")).unwrap();

    c.bench_function("memory_store_update", |b| {
        b.iter(|| {
            let current = store.get(&id).unwrap().unwrap();
            store
                .update(
                    &id,
                    current.version,
                    &[AccountUpdate::Balance(black_box(current.balance + 1))],
                )
                .unwrap()
        })
    });
}

criterion_group!(benches, bench_level_for, bench_memory_update);
criterion_main!(benches);
