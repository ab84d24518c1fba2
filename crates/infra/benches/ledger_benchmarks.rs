use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use std::sync::Arc;

use creditline_accounts::AccountSeed;
use creditline_core::AccountId;
use creditline_infra::{AccountLedger, InMemoryAccountStore};

const BATCH: usize = 256;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .build()
        .unwrap()
}

fn ledger(accounts: i32) -> Arc<AccountLedger<InMemoryAccountStore>> {
    let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
    let ledger = AccountLedger::new(InMemoryAccountStore::new());
    let seeds: Vec<_> = (1..=accounts).map(|id| AccountSeed::new(id, i64::MAX / 2)).collect();
    rt.block_on(ledger.provision(&seeds)).unwrap();
    Arc::new(ledger)
}

/// Concurrent submissions, either all on one account (fully serialized) or
/// spread across several (independent locks).
fn bench_concurrent_submit(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("concurrent_submit");
    group.throughput(Throughput::Elements(BATCH as u64));

    for accounts in [1, 4, 16] {
        let ledger = ledger(accounts);
        group.bench_with_input(BenchmarkId::from_parameter(accounts), &accounts, |b, &accounts| {
            b.iter(|| {
                rt.block_on(async {
                    let handles: Vec<_> = (0..BATCH)
                        .map(|i| {
                            let ledger = ledger.clone();
                            let id = AccountId::new((i as i32 % accounts) + 1);
                            let kind = if i % 2 == 0 { "c" } else { "d" };
                            tokio::spawn(async move { ledger.submit(id, 10, kind, "bench").await })
                        })
                        .collect();
                    for h in handles {
                        black_box(h.await.unwrap().unwrap());
                    }
                })
            })
        });
    }

    group.finish();
}

fn bench_statement(c: &mut Criterion) {
    let rt = runtime();
    let ledger = ledger(1);
    rt.block_on(async {
        for _ in 0..1_000 {
            ledger.submit(AccountId::new(1), 1, "c", "seed").await.unwrap();
        }
    });

    c.bench_function("statement_after_1000_entries", |b| {
        b.iter(|| rt.block_on(ledger.statement(black_box(AccountId::new(1)))).unwrap())
    });
}

criterion_group!(benches, bench_concurrent_submit, bench_statement);
criterion_main!(benches);
