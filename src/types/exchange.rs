//! Quote sources.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// An exchange that publishes an order book we can aggregate.
///
/// The set is closed: each variant has exactly one response adapter in
/// [`crate::adapter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Exchange {
    /// Coinbase level-2 book (`[price, size, num_orders]` arrays)
    Coinbase,
    /// Gemini book (`{price, amount, timestamp}` objects)
    Gemini,
    /// Kraken depth (`result.<PAIR>.bids` arrays, with an `error` list)
    Kraken,
}

impl Exchange {
    /// Every supported exchange
    pub const ALL: [Exchange; 3] = [Exchange::Coinbase, Exchange::Gemini, Exchange::Kraken];

    /// Name as written in the sources file
    pub fn name(self) -> &'static str {
        match self {
            Exchange::Coinbase => "CoinBase",
            Exchange::Gemini => "Gemini",
            Exchange::Kraken => "Kraken",
        }
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Exchange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Exchange::ALL
            .into_iter()
            .find(|exchange| exchange.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::UnsupportedSource(s.to_string()))
    }
}
