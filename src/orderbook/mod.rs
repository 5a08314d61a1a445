//! Aggregated order book.
//!
//! This module provides the [`OrderBook`] that every source feeds into, and the
//! [`ingest`] loop that serializes insertions from concurrent fetches:
//!
//! - Bids yield highest price first, asks lowest price first
//! - O(log n) insertion and removal of the best quote
//! - Cached best-first snapshots, invalidated on every mutation
//!
//! # Example
//!
//! ```rust
//! use aggregated_fill::orderbook::OrderBook;
//! use aggregated_fill::types::{Exchange, Order};
//!
//! let mut book = OrderBook::new();
//! book.insert_bid(Order::new(29_000.0, 0.5, Exchange::Coinbase));
//! book.insert_bid(Order::new(29_010.0, 0.2, Exchange::Kraken));
//!
//! let best = book.best_bid().unwrap();
//! assert_eq!(best.price(), 29_010.0);
//! assert_eq!(book.snapshot_bids().len(), 2);
//! ```

pub mod book;
pub mod ingest;

pub use book::OrderBook;
pub use ingest::{IngestSummary, SourceFailure, SourceReport};
