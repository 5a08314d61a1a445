//! The order quote primitive.
//!
//! An [`Order`] is one price level as quoted by one [`Exchange`]. Orders are
//! compared by price alone so they can be placed directly in a priority queue.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::{Exchange, Price, Quantity};

/// Side of the book an order rests on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Buy-side quote; best is the highest price
    Bid,
    /// Sell-side quote; best is the lowest price
    Ask,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Bid => f.write_str("bid"),
            Side::Ask => f.write_str("ask"),
        }
    }
}

/// A quoted price level from one exchange.
///
/// # Ordering
///
/// `PartialEq`, `Eq`, `PartialOrd` and `Ord` all look at `price` only, using
/// [`f64::total_cmp`]. Two orders at the same price compare equal even if
/// their quantity or source differ. Use [`Order::same_quote`] when every field
/// matters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Order {
    price: Price,
    quantity: Quantity,
    source: Exchange,
}

impl Order {
    /// Create a new order.
    ///
    /// Negative values are accepted but are a caller error; the allocation
    /// engine assumes non-negative prices and quantities.
    #[must_use]
    pub const fn new(price: Price, quantity: Quantity, source: Exchange) -> Self {
        Self {
            price,
            quantity,
            source,
        }
    }

    /// Create an order from untrusted input.
    ///
    /// Returns `None` if either field is negative, NaN or infinite.
    #[must_use]
    pub fn try_new(price: Price, quantity: Quantity, source: Exchange) -> Option<Self> {
        let valid = |x: f64| x.is_finite() && x >= 0.0;
        (valid(price) && valid(quantity)).then(|| Self::new(price, quantity, source))
    }

    /// Quoted price
    #[must_use]
    pub const fn price(&self) -> Price {
        self.price
    }

    /// Quoted quantity
    #[must_use]
    pub const fn quantity(&self) -> Quantity {
        self.quantity
    }

    /// Exchange that published this quote
    #[must_use]
    pub const fn source(&self) -> Exchange {
        self.source
    }

    /// `price * quantity`
    #[must_use]
    pub fn notional(&self) -> f64 {
        self.price * self.quantity
    }

    /// Field-by-field equality (price, quantity and source).
    #[must_use]
    pub fn same_quote(&self, other: &Order) -> bool {
        self.price.to_bits() == other.price.to_bits()
            && self.quantity.to_bits() == other.quantity.to_bits()
            && self.source == other.source
    }
}

impl PartialEq for Order {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Order {}

impl PartialOrd for Order {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Order {
    fn cmp(&self, other: &Self) -> Ordering {
        self.price.total_cmp(&other.price)
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Order({}, {}, {})", self.price, self.quantity, self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering_is_price_only() {
        let cheap = Order::new(99.0, 5.0, Exchange::Coinbase);
        let dear = Order::new(100.0, 2.0, Exchange::Kraken);
        let dear_other = Order::new(100.0, 7.5, Exchange::Gemini);

        assert!(cheap < dear);
        assert!(cheap <= dear);
        assert!(dear > cheap);
        assert!(dear >= cheap);
        assert_eq!(dear, dear_other);
        assert!(dear <= dear_other && dear >= dear_other);
        assert!(!(dear < dear_other));
        assert!(!dear.same_quote(&dear_other));
    }

    #[test]
    fn test_try_new_rejects_invalid_fields() {
        assert!(Order::try_new(f64::NAN, 1.0, Exchange::Gemini).is_none());
        assert!(Order::try_new(1.0, f64::INFINITY, Exchange::Gemini).is_none());
        assert!(Order::try_new(-1.0, 1.0, Exchange::Gemini).is_none());
        assert!(Order::try_new(1.0, -0.5, Exchange::Gemini).is_none());
        assert!(Order::try_new(1.0, 0.0, Exchange::Gemini).is_some());
        assert!(Order::try_new(1.0, 2.0, Exchange::Gemini).is_some());
    }

    #[test]
    fn test_display() {
        let order = Order::new(100.5, 2.0, Exchange::Kraken);
        assert_eq!(order.to_string(), "Order(100.5, 2, Kraken)");
        assert_eq!(order.notional(), 201.0);
    }

    #[test]
    fn test_serde_side() {
        let json = serde_json::to_string(&Side::Bid).unwrap();
        assert_eq!(json, "\"bid\"");

        let side: Side = serde_json::from_str("\"ask\"").unwrap();
        assert_eq!(side, Side::Ask);
    }
}
