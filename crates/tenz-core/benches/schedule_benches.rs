//! Criterion benchmarks for the emission schedule and ledger hot paths.
//!
//! Covers: closed-form supply ceiling at early/late periods, the mint path
//! through the token aggregate, and a plain transfer.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use tenz_core::constants::{LAST_PERIOD, PERIOD_UNIT, UNIT};
use tenz_core::{Address, Amount, CallContext, EmissionCurve, Token, TokenParams};

const T0: u64 = 1_700_000_000;

fn open_token(owner: Address) -> Token {
    let mut token = Token::deploy(&TokenParams::default(), owner, Address::contract(&owner, 0))
        .expect("deploy");
    let ctx = CallContext::new(owner, T0);
    token.enable_transfers(&ctx).expect("enable");
    token.start_minting_period(&ctx).expect("start");
    token
}

fn bench_max_allowed_supply(c: &mut Criterion) {
    let curve = EmissionCurve::default();

    c.bench_function("max_allowed_supply_early", |b| {
        b.iter(|| curve.max_allowed_supply(black_box(10)))
    });

    c.bench_function("max_allowed_supply_late", |b| {
        b.iter(|| curve.max_allowed_supply(black_box(LAST_PERIOD - 1)))
    });
}

fn bench_mint(c: &mut Criterion) {
    let owner = Address::from_label("owner");
    let to = Address::from_label("recipient");
    let token = open_token(owner);
    let ctx = CallContext::new(owner, T0 + 1_000 * PERIOD_UNIT);

    c.bench_function("mint_capped", |b| {
        b.iter_batched(
            || token.clone(),
            |mut t| t.mint(&ctx, to, black_box(Amount::new(u128::MAX))),
            criterion::BatchSize::SmallInput,
        )
    });
}

fn bench_transfer(c: &mut Criterion) {
    let owner = Address::from_label("owner");
    let to = Address::from_label("recipient");
    let token = open_token(owner);
    let ctx = CallContext::new(owner, T0);

    c.bench_function("transfer", |b| {
        b.iter_batched(
            || token.clone(),
            |mut t| t.transfer(&ctx, to, black_box(Amount::new(UNIT))),
            criterion::BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_max_allowed_supply, bench_mint, bench_transfer);
criterion_main!(benches);
