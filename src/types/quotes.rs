//! Normalized adapter output.

use super::{Price, Quantity};

/// One `(price, quantity)` level as published by a source
pub type QuoteTuple = (Price, Quantity);

/// Both sides of one source's book, before tagging with the source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Quotes {
    /// Buy-side levels
    pub bids: Vec<QuoteTuple>,
    /// Sell-side levels
    pub asks: Vec<QuoteTuple>,
}

impl Quotes {
    /// Create from bid and ask tuples
    pub fn new(bids: Vec<QuoteTuple>, asks: Vec<QuoteTuple>) -> Self {
        Self { bids, asks }
    }

    /// Total number of levels across both sides
    pub fn len(&self) -> usize {
        self.bids.len() + self.asks.len()
    }
}
