//! Per-exchange response normalization.
//!
//! Every supported [`Exchange`] publishes its book in a different JSON shape.
//! An [`Adapter`] turns one raw response body into [`Quotes`]: plain
//! `(price, quantity)` tuples for each side. The set of adapters is closed and
//! selected by `match` on the exchange.
//!
//! # Example
//!
//! ```rust
//! use aggregated_fill::adapter::Adapter;
//! use aggregated_fill::types::Exchange;
//!
//! let body = br#"{"bids": [["100.5", "0.25", 3]], "asks": [["101", "1.5", 1]]}"#;
//! let quotes = Adapter::for_exchange(Exchange::Coinbase, None)
//!     .normalize(body)
//!     .unwrap();
//!
//! assert_eq!(quotes.bids, vec![(100.5, 0.25)]);
//! assert_eq!(quotes.asks, vec![(101.0, 1.5)]);
//! ```

mod coinbase;
mod gemini;
mod kraken;

use std::fmt;

use serde::de::{self, DeserializeOwned, IgnoredAny, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer};

use crate::error::Error;
use crate::types::{Exchange, Order, Price, QuoteTuple, Quantity, Quotes, Side};

/// Kraken book key used when the sources file does not name one
pub const DEFAULT_KRAKEN_PAIR: &str = "XXBTZUSD";

/// Response normalizer for one exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Adapter {
    /// `{"bids": [[price, size, num_orders]], "asks": [...]}`
    Coinbase,
    /// `{"bids": [{"price", "amount", "timestamp"}], "asks": [...]}`
    Gemini,
    /// `{"error": [], "result": {"<pair>": {"bids": [[price, volume, ts]]}}}`
    Kraken {
        /// Key of the book inside `result`
        pair: String,
    },
}

impl Adapter {
    /// Pick the adapter for an exchange.
    ///
    /// `pair` is only used by Kraken and defaults to [`DEFAULT_KRAKEN_PAIR`].
    pub fn for_exchange(exchange: Exchange, pair: Option<&str>) -> Self {
        match exchange {
            Exchange::Coinbase => Adapter::Coinbase,
            Exchange::Gemini => Adapter::Gemini,
            Exchange::Kraken => Adapter::Kraken {
                pair: pair.unwrap_or(DEFAULT_KRAKEN_PAIR).to_string(),
            },
        }
    }

    /// Exchange this adapter parses
    pub fn exchange(&self) -> Exchange {
        match self {
            Adapter::Coinbase => Exchange::Coinbase,
            Adapter::Gemini => Exchange::Gemini,
            Adapter::Kraken { .. } => Exchange::Kraken,
        }
    }

    /// Parse a raw response body into bid and ask tuples
    ///
    /// # Errors
    ///
    /// - [`Error::MalformedQuote`] if the body is not the expected shape or a
    ///   level holds a non-numeric or non-finite value
    /// - [`Error::Upstream`] if the body is an error report from the exchange
    pub fn normalize(&self, body: &[u8]) -> Result<Quotes, Error> {
        match self {
            Adapter::Coinbase => coinbase::normalize(body),
            Adapter::Gemini => gemini::normalize(body),
            Adapter::Kraken { pair } => kraken::normalize(body, pair),
        }
    }
}

/// Parse a body with the default adapter for `exchange`
pub fn normalize(exchange: Exchange, body: &[u8]) -> Result<Quotes, Error> {
    Adapter::for_exchange(exchange, None).normalize(body)
}

/// Turn normalized tuples into orders tagged with their source.
///
/// Returns bid orders and ask orders.
///
/// # Errors
///
/// Returns [`Error::MalformedQuote`] if a level has a negative price or
/// quantity.
pub fn into_orders(
    exchange: Exchange,
    quotes: Quotes,
) -> Result<(Vec<Order>, Vec<Order>), Error> {
    let tag = |side: Side, levels: Vec<QuoteTuple>| -> Result<Vec<Order>, Error> {
        levels
            .into_iter()
            .map(|(price, quantity)| {
                Order::try_new(price, quantity, exchange).ok_or_else(|| {
                    let reason = format!("{side} level ({price}, {quantity}) is negative");
                    Error::malformed(exchange, reason)
                })
            })
            .collect()
    };
    Ok((tag(Side::Bid, quotes.bids)?, tag(Side::Ask, quotes.asks)?))
}

/// Deserialize a whole response body, blaming `exchange` for any mismatch
fn parse<T: DeserializeOwned>(exchange: Exchange, body: &[u8]) -> Result<T, Error> {
    serde_json::from_slice(body)
        .map_err(|e| Error::malformed(exchange, format!("unexpected response: {e}")))
}

/// A finite number sent either as a JSON string or a JSON number
#[derive(Debug, Clone, Copy, PartialEq)]
struct Decimal(f64);

impl<'de> Deserialize<'de> for Decimal {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f64),
            Text(String),
        }

        let value = match Raw::deserialize(deserializer)? {
            Raw::Number(n) => n,
            Raw::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| de::Error::custom(format!("{s:?} is not a number")))?,
        };
        if value.is_finite() {
            Ok(Decimal(value))
        } else {
            Err(de::Error::custom(format!("{value} is not finite")))
        }
    }
}

/// A `[price, quantity, ...]` level; trailing fields are ignored
#[derive(Debug, Clone, Copy, PartialEq)]
struct ArrayLevel {
    price: Price,
    quantity: Quantity,
}

impl<'de> Deserialize<'de> for ArrayLevel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct LevelVisitor;

        impl<'de> Visitor<'de> for LevelVisitor {
            type Value = ArrayLevel;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a [price, quantity, ...] array")
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<ArrayLevel, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let Decimal(price) = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(0, &self))?;
                let Decimal(quantity) = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(1, &self))?;
                while seq.next_element::<IgnoredAny>()?.is_some() {}
                Ok(ArrayLevel { price, quantity })
            }
        }

        deserializer.deserialize_seq(LevelVisitor)
    }
}

impl From<ArrayLevel> for QuoteTuple {
    fn from(level: ArrayLevel) -> Self {
        (level.price, level.quantity)
    }
}

/// Both sides of a book whose levels are arrays; a missing or null side is empty
#[derive(Debug, Deserialize)]
struct ArrayBook {
    #[serde(default)]
    bids: Option<Vec<ArrayLevel>>,
    #[serde(default)]
    asks: Option<Vec<ArrayLevel>>,
}

impl ArrayBook {
    fn has_levels(&self) -> bool {
        self.bids.is_some() || self.asks.is_some()
    }
}

impl From<ArrayBook> for Quotes {
    fn from(book: ArrayBook) -> Self {
        Quotes::new(tuples(book.bids), tuples(book.asks))
    }
}

fn tuples<L: Into<QuoteTuple>>(levels: Option<Vec<L>>) -> Vec<QuoteTuple> {
    levels
        .unwrap_or_default()
        .into_iter()
        .map(Into::into)
        .collect()
}
