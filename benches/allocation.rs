//! Benchmarks for book and allocation operations.
//!
//! Run with: `cargo bench`

use aggregated_fill::allocation::{approximate, Objective, DEFAULT_MAX_STATES};
use aggregated_fill::orderbook::OrderBook;
use aggregated_fill::types::{Exchange, Order};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

/// A book with `levels` bids and asks spread across every exchange
fn build_book(levels: usize) -> OrderBook {
    let mut book = OrderBook::new();
    for i in 0..levels {
        let exchange = Exchange::ALL[i % Exchange::ALL.len()];
        let step = i as f64 * 0.5;
        let quantity = 0.05 + (i % 7) as f64 * 0.11;
        book.insert_bid(Order::new(30_000.0 - step, quantity, exchange));
        book.insert_ask(Order::new(30_001.0 + step, quantity, exchange));
    }
    book
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("orderbook_insert");

    for size in [10, 100, 1000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let mut book = build_book(size);

            b.iter(|| {
                book.insert_bid(black_box(Order::new(29_999.5, 0.1, Exchange::Kraken)));
            });
        });
    }

    group.finish();
}

fn bench_snapshot(c: &mut Criterion) {
    let mut group = c.benchmark_group("orderbook_snapshot_rebuild");

    for size in [10, 100, 1000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let mut book = build_book(size);

            b.iter(|| {
                // Insert a new best bid then pop it so every iteration rebuilds the cache
                book.insert_bid(Order::new(1_000_000.0, 0.1, Exchange::Gemini));
                black_box(book.snapshot_bids());
                black_box(book.pop_best_bid().ok());
            });
        });
    }

    group.finish();
}

fn bench_greedy(c: &mut Criterion) {
    let mut group = c.benchmark_group("greedy_sell");

    for size in [10, 100, 1000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let book = build_book(size);

            b.iter(|| {
                black_box(book.greedy_sell(black_box(10.0)).ok());
            });
        });
    }

    group.finish();
}

fn bench_optimal(c: &mut Criterion) {
    let mut group = c.benchmark_group("optimal_buy");
    group.sample_size(20);

    for size in [10, 25, 50].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let book = build_book(size);

            b.iter(|| {
                black_box(book.optimal_buy(black_box(2.0)).ok());
            });
        });
    }

    group.finish();
}

fn bench_approximate(c: &mut Criterion) {
    let mut group = c.benchmark_group("approximate_sell");
    group.sample_size(10);

    for size in [150, 1000, 10_000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let bids = build_book(size).snapshot_bids();

            b.iter(|| {
                black_box(approximate(
                    &bids,
                    black_box(10.0),
                    Objective::Maximize,
                    DEFAULT_MAX_STATES,
                ));
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_insert,
    bench_snapshot,
    bench_greedy,
    bench_optimal,
    bench_approximate
);
criterion_main!(benches);
