//! Criterion benchmarks for orbis-economy.
//!
//! Covers: fortune derivation, ranking a large snapshot, and a full
//! message event through the engine.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

use orbis_core::{Account, AccountId, MemoryAccountStore, Participant};
use orbis_economy::{DailyFortune, EconomyConfig, EconomyEngine, RankingService};

fn bench_fortune(c: &mut Criterion) {
    let fortune = DailyFortune::new();
    let id = AccountId::from("123456789012345678");
    let day = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();

    c.bench_function("daily_fortune", |b| {
        b.iter(|| fortune.fortune(black_box(&id), black_box(day)))
    });
}

fn bench_rank(c: &mut Criterion) {
    let service = RankingService::default();
    let accounts: Vec<Account> = (0..10_000)
        .map(|i| {
            let mut a = Account::new(format!("user{i}"));
            a.level = (i % 50) as u32 + 1;
            a
        })
        .collect();

    c.bench_function("rank_10k_accounts", |b| {
        b.iter(|| service.rank(black_box(accounts.clone()), black_box(5)))
    });
}

fn bench_record_message(c: &mut Criterion) {
    let engine = EconomyEngine::new(Arc::new(MemoryAccountStore::new()), EconomyConfig::default());
    let author = Participant::human("chatty");
    let now: DateTime<Utc> = DateTime::from_timestamp(1_750_000_000, 0).unwrap();

    c.bench_function("record_message", |b| {
        b.iter(|| {
            engine
                .record_message(black_box(&author), black_box("hello everyone"), now)
                .unwrap()
        })
    });
}

criterion_group!(benches, bench_fortune, bench_rank, bench_record_message);
criterion_main!(benches);
