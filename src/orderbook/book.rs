//! Core aggregated order book.
//!
//! Each side is a `BinaryHeap`, providing:
//!
//! - O(log n) insertion and removal of the best order
//! - O(1) peek at the best bid/ask
//! - A cached best-first snapshot, rebuilt only after the side changes

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::Error;
use crate::types::{Order, Price, Quantity, Side};

/// Heap entry: an order plus its arrival sequence on that side.
///
/// "Greater" means "better": higher price for bids, lower price for asks,
/// and for equal prices the earlier arrival.
#[derive(Debug, Clone, Copy)]
struct Entry {
    order: Order,
    seq: u64,
    side: Side,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        let by_price = match self.side {
            Side::Bid => self.order.cmp(&other.order),
            Side::Ask => other.order.cmp(&self.order),
        };
        by_price.then_with(|| other.seq.cmp(&self.seq))
    }
}

#[derive(Debug)]
struct CachedSnapshot {
    version: u64,
    orders: Arc<[Order]>,
}

/// One side of the book with its snapshot cache.
#[derive(Debug)]
struct HalfBook {
    side: Side,
    heap: BinaryHeap<Entry>,
    next_seq: u64,
    /// Bumped on every insert and pop
    version: u64,
    cache: Mutex<Option<CachedSnapshot>>,
}

impl HalfBook {
    fn new(side: Side) -> Self {
        Self {
            side,
            heap: BinaryHeap::new(),
            next_seq: 0,
            version: 0,
            cache: Mutex::new(None),
        }
    }

    fn touch(&mut self) {
        self.version += 1;
        *self.cache.get_mut() = None;
    }

    fn push(&mut self, order: Order) {
        let entry = Entry {
            order,
            seq: self.next_seq,
            side: self.side,
        };
        self.next_seq += 1;
        self.heap.push(entry);
        self.touch();
    }

    fn pop(&mut self) -> Result<Order, Error> {
        let entry = self.heap.pop().ok_or(Error::EmptyBook(self.side))?;
        self.touch();
        Ok(entry.order)
    }

    fn peek(&self) -> Option<Order> {
        self.heap.peek().map(|entry| entry.order)
    }

    fn snapshot(&self) -> Arc<[Order]> {
        let mut cache = self.cache.lock();
        if let Some(cached) = cache.as_ref() {
            if cached.version == self.version {
                return Arc::clone(&cached.orders);
            }
        }

        let mut entries: Vec<Entry> = self.heap.iter().copied().collect();
        entries.sort_unstable_by(|a, b| b.cmp(a));
        let orders: Arc<[Order]> = entries.into_iter().map(|entry| entry.order).collect();

        *cache = Some(CachedSnapshot {
            version: self.version,
            orders: Arc::clone(&orders),
        });
        orders
    }

    fn total_quantity(&self) -> Quantity {
        self.heap.iter().map(|entry| entry.order.quantity()).sum()
    }
}

impl Clone for HalfBook {
    fn clone(&self) -> Self {
        Self {
            side: self.side,
            heap: self.heap.clone(),
            next_seq: self.next_seq,
            version: self.version,
            cache: Mutex::new(None),
        }
    }
}

/// Order book aggregated across every source.
///
/// # Design Decisions
///
/// 1. **Heaps, not price maps**: several sources can quote the same price, so
///    each quote is kept as its own entry instead of being merged into a level.
///
/// 2. **FIFO among equal prices**: entries carry an arrival sequence, so equal
///    prices come out in insertion order.
///
/// 3. **Versioned snapshots**: [`OrderBook::snapshot_bids`] and
///    [`OrderBook::snapshot_asks`] cache a best-first `Arc<[Order]>` tagged with
///    the side's mutation version. Any insert or pop invalidates it.
///
/// # Thread Safety
///
/// This struct is `Send + Sync` but mutation requires `&mut self`. Concurrent
/// producers must go through a single writer, see [`super::ingest`].
#[derive(Debug, Clone)]
pub struct OrderBook {
    bids: HalfBook,
    asks: HalfBook,
}

impl OrderBook {
    /// Create a new empty order book
    #[must_use]
    pub fn new() -> Self {
        Self {
            bids: HalfBook::new(Side::Bid),
            asks: HalfBook::new(Side::Ask),
        }
    }

    fn half(&self, side: Side) -> &HalfBook {
        match side {
            Side::Bid => &self.bids,
            Side::Ask => &self.asks,
        }
    }

    fn half_mut(&mut self, side: Side) -> &mut HalfBook {
        match side {
            Side::Bid => &mut self.bids,
            Side::Ask => &mut self.asks,
        }
    }

    /// Insert a buy-side quote
    pub fn insert_bid(&mut self, order: Order) {
        self.bids.push(order);
    }

    /// Insert a sell-side quote
    pub fn insert_ask(&mut self, order: Order) {
        self.asks.push(order);
    }

    /// Insert a quote on the given side
    pub fn insert(&mut self, side: Side, order: Order) {
        self.half_mut(side).push(order);
    }

    /// Insert every order on the given side
    pub fn extend<I>(&mut self, side: Side, orders: I)
    where
        I: IntoIterator<Item = Order>,
    {
        let half = self.half_mut(side);
        for order in orders {
            half.push(order);
        }
    }

    /// Number of bids in the book
    #[must_use]
    pub fn bid_count(&self) -> usize {
        self.bids.heap.len()
    }

    /// Number of asks in the book
    #[must_use]
    pub fn ask_count(&self) -> usize {
        self.asks.heap.len()
    }

    /// Remove and return the highest bid
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyBook`] if there are no bids.
    pub fn pop_best_bid(&mut self) -> Result<Order, Error> {
        self.bids.pop()
    }

    /// Remove and return the lowest ask
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyBook`] if there are no asks.
    pub fn pop_best_ask(&mut self) -> Result<Order, Error> {
        self.asks.pop()
    }

    /// Get the best bid (highest price) without removing it
    #[must_use]
    pub fn best_bid(&self) -> Option<Order> {
        self.bids.peek()
    }

    /// Get the best ask (lowest price) without removing it
    #[must_use]
    pub fn best_ask(&self) -> Option<Order> {
        self.asks.peek()
    }

    /// Best ask price minus best bid price
    ///
    /// Negative when sources disagree enough to cross the aggregated book.
    #[must_use]
    pub fn spread(&self) -> Option<Price> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(ask.price() - bid.price()),
            _ => None,
        }
    }

    /// All bids, highest price first
    #[must_use]
    pub fn snapshot_bids(&self) -> Arc<[Order]> {
        self.bids.snapshot()
    }

    /// All asks, lowest price first
    #[must_use]
    pub fn snapshot_asks(&self) -> Arc<[Order]> {
        self.asks.snapshot()
    }

    /// Best-first snapshot of the given side
    #[must_use]
    pub fn snapshot(&self, side: Side) -> Arc<[Order]> {
        self.half(side).snapshot()
    }

    /// Sum of all bid quantities
    #[must_use]
    pub fn total_bid_quantity(&self) -> Quantity {
        self.bids.total_quantity()
    }

    /// Sum of all ask quantities
    #[must_use]
    pub fn total_ask_quantity(&self) -> Quantity {
        self.asks.total_quantity()
    }

    /// Check if both sides are empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bids.heap.is_empty() && self.asks.heap.is_empty()
    }
}

impl Default for OrderBook {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Exchange;

    fn bid_book() -> OrderBook {
        let mut book = OrderBook::new();
        book.insert_bid(Order::new(100.0, 1.0, Exchange::Coinbase));
        book.insert_bid(Order::new(102.5, 0.5, Exchange::Kraken));
        book.insert_bid(Order::new(99.0, 3.0, Exchange::Gemini));
        book.insert_bid(Order::new(101.0, 2.0, Exchange::Coinbase));
        book
    }

    #[test]
    fn test_new_book() {
        let book = OrderBook::new();
        assert!(book.is_empty());
        assert_eq!(book.bid_count(), 0);
        assert_eq!(book.ask_count(), 0);
        assert!(book.snapshot_bids().is_empty());
        assert_eq!(book.spread(), None);
    }

    #[test]
    fn test_bids_best_first() {
        let book = bid_book();
        let prices: Vec<f64> = book.snapshot_bids().iter().map(Order::price).collect();
        assert_eq!(prices, vec![102.5, 101.0, 100.0, 99.0]);
        assert_eq!(book.best_bid().map(|o| o.price()), Some(102.5));
    }

    #[test]
    fn test_asks_best_first() {
        let mut book = OrderBook::new();
        book.insert_ask(Order::new(100.0, 2.0, Exchange::Coinbase));
        book.insert_ask(Order::new(101.0, 3.0, Exchange::Gemini));
        book.insert_ask(Order::new(99.0, 5.0, Exchange::Kraken));

        let snapshot = book.snapshot_asks();
        let prices: Vec<f64> = snapshot.iter().map(Order::price).collect();
        assert_eq!(prices, vec![99.0, 100.0, 101.0]);
        assert!(snapshot.iter().all(|o| snapshot[0].price() <= o.price()));
    }

    #[test]
    fn test_equal_prices_are_fifo() {
        let mut book = OrderBook::new();
        book.insert_ask(Order::new(100.0, 1.0, Exchange::Kraken));
        book.insert_ask(Order::new(100.0, 2.0, Exchange::Coinbase));
        book.insert_ask(Order::new(100.0, 3.0, Exchange::Gemini));

        let sources: Vec<Exchange> = book.snapshot_asks().iter().map(Order::source).collect();
        assert_eq!(
            sources,
            vec![Exchange::Kraken, Exchange::Coinbase, Exchange::Gemini]
        );
        assert_eq!(book.pop_best_ask().unwrap().source(), Exchange::Kraken);
    }

    #[test]
    fn test_snapshot_is_cached_until_insert() {
        let mut book = bid_book();

        let first = book.snapshot_bids();
        let second = book.snapshot_bids();
        assert!(Arc::ptr_eq(&first, &second));

        book.insert_bid(Order::new(103.0, 1.0, Exchange::Gemini));
        let third = book.snapshot_bids();
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(third.len(), 5);
        assert_eq!(third[0].price(), 103.0);

        // The ask side cache is independent
        let asks = book.snapshot_asks();
        book.insert_bid(Order::new(50.0, 1.0, Exchange::Gemini));
        assert!(Arc::ptr_eq(&asks, &book.snapshot_asks()));
    }

    #[test]
    fn test_pop_invalidates_snapshot() {
        let mut book = bid_book();
        let before = book.snapshot_bids();
        assert_eq!(before.len(), 4);

        book.pop_best_bid().unwrap();
        let after = book.snapshot_bids();
        assert_eq!(after.len(), 3);
        assert_eq!(after[0].price(), 101.0);
    }

    #[test]
    fn test_pop_until_empty() {
        let mut book = bid_book();
        let mut last = f64::INFINITY;
        for _ in 0..4 {
            let order = book.pop_best_bid().unwrap();
            assert!(order.price() < last);
            last = order.price();
        }
        assert_eq!(book.bid_count(), 0);
        assert!(matches!(book.pop_best_bid(), Err(Error::EmptyBook(Side::Bid))));
        assert!(matches!(book.pop_best_ask(), Err(Error::EmptyBook(Side::Ask))));
    }

    #[test]
    fn test_spread_and_totals() {
        let mut book = bid_book();
        book.insert_ask(Order::new(103.0, 1.5, Exchange::Kraken));
        book.insert_ask(Order::new(104.0, 1.0, Exchange::Gemini));

        assert_eq!(book.spread(), Some(0.5));
        assert_eq!(book.total_bid_quantity(), 6.5);
        assert_eq!(book.total_ask_quantity(), 2.5);
    }

    #[test]
    fn test_extend_and_clone() {
        let mut book = OrderBook::new();
        book.extend(
            Side::Ask,
            [
                Order::new(10.0, 1.0, Exchange::Gemini),
                Order::new(9.0, 1.0, Exchange::Gemini),
            ],
        );
        let copy = book.clone();
        book.insert(Side::Ask, Order::new(8.0, 1.0, Exchange::Kraken));

        assert_eq!(copy.ask_count(), 2);
        assert_eq!(book.ask_count(), 3);
        assert_eq!(copy.snapshot(Side::Ask)[0].price(), 9.0);
        assert_eq!(book.snapshot(Side::Ask)[0].price(), 8.0);
    }
}
