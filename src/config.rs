//! Configuration for the quote aggregator.
//!
//! This module provides the [`Config`] struct (sources, request timeout and
//! allocation tunables) and the loader for the JSON sources file:
//!
//! ```json
//! {
//!   "exchanges": [
//!     { "coinbase": { "name": "CoinBase", "url": "https://api.exchange.coinbase.com",
//!                     "endpoint": "/products/BTC-USD/book", "params": "?level=2" } },
//!     { "kraken":   { "name": "Kraken", "url": "https://api.kraken.com",
//!                     "endpoint": "/0/public/Depth", "params": "?pair=XBTUSD",
//!                     "pair": "XXBTZUSD" } }
//!   ]
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::adapter::Adapter;
use crate::allocation::AllocationParams;
use crate::error::Error;
use crate::types::Exchange;

/// Per-request timeout applied to every source
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// One order book endpoint to poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEndpoint {
    exchange: Exchange,
    url: Url,
    pair: Option<String>,
}

impl SourceEndpoint {
    /// Create an endpoint from a full request URL
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `url` does not parse.
    pub fn new(exchange: Exchange, url: &str) -> Result<Self, Error> {
        let url = Url::parse(url)
            .map_err(|e| Error::Config(format!("invalid URL {url:?} for {exchange}: {e}")))?;
        Ok(Self {
            exchange,
            url,
            pair: None,
        })
    }

    /// Set the book key used by the Kraken adapter
    #[must_use]
    pub fn with_pair(mut self, pair: impl Into<String>) -> Self {
        self.pair = Some(pair.into());
        self
    }

    /// Source exchange
    pub fn exchange(&self) -> Exchange {
        self.exchange
    }

    /// Full request URL
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Kraken book key, if set
    pub fn pair(&self) -> Option<&str> {
        self.pair.as_deref()
    }

    /// Response adapter for this endpoint
    pub fn adapter(&self) -> Adapter {
        Adapter::for_exchange(self.exchange, self.pair())
    }
}

#[derive(Debug, Deserialize)]
struct SourcesFile {
    exchanges: Option<Vec<BTreeMap<String, RawEndpoint>>>,
}

#[derive(Debug, Deserialize)]
struct RawEndpoint {
    name: Option<String>,
    url: Option<String>,
    endpoint: Option<String>,
    params: Option<String>,
    pair: Option<String>,
}

impl RawEndpoint {
    fn into_endpoint(self) -> Result<SourceEndpoint, Error> {
        let name = required(self.name, "name")?;
        let url = required(self.url, "url")?;
        let endpoint = required(self.endpoint, "endpoint")?;
        let params = required(self.params, "params")?;

        let exchange: Exchange = name.parse()?;
        let source = SourceEndpoint::new(exchange, &format!("{url}{endpoint}{params}"))?;
        Ok(match self.pair {
            Some(pair) => source.with_pair(pair),
            None => source,
        })
    }
}

fn required(field: Option<String>, key: &str) -> Result<String, Error> {
    field.ok_or_else(|| Error::Config(format!("exchange entry missing \"{key}\"")))
}

/// Configuration for an aggregation run
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use aggregated_fill::config::{Config, SourceEndpoint};
/// use aggregated_fill::types::Exchange;
///
/// let gemini = SourceEndpoint::new(Exchange::Gemini, "https://api.gemini.com/v1/book/btcusd").unwrap();
/// let config = Config::new()
///     .with_source(gemini)
///     .with_timeout(Duration::from_secs(5))
///     .with_tolerances(-0.02, 0.02);
///
/// assert_eq!(config.sources().len(), 1);
/// assert_eq!(config.allocation().buy_tolerance, 0.02);
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Endpoints to fetch, in file order
    sources: Vec<SourceEndpoint>,

    /// HTTP request timeout
    timeout: Duration,

    /// Greedy tolerances and optimal state budget
    allocation: AllocationParams,
}

impl Config {
    /// Create a configuration with no sources and default settings
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
            allocation: AllocationParams::default(),
        }
    }

    /// Load sources from a JSON sources file
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read, and the errors of
    /// [`Config::from_json`] otherwise.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Parse sources from the JSON text of a sources file
    ///
    /// # Errors
    ///
    /// - [`Error::Json`] if the text is not valid JSON of the expected shape
    /// - [`Error::Config`] if `exchanges` or an entry field is missing, or a URL is invalid
    /// - [`Error::UnsupportedSource`] if an entry names an unknown exchange
    pub fn from_json(text: &str) -> Result<Self, Error> {
        let file: SourcesFile = serde_json::from_str(text)?;
        let entries = file
            .exchanges
            .ok_or_else(|| Error::Config("sources file missing \"exchanges\"".to_string()))?;

        let sources = entries
            .into_iter()
            .map(|entry| {
                entry
                    .into_values()
                    .next()
                    .ok_or_else(|| Error::Config("empty exchange entry".to_string()))?
                    .into_endpoint()
            })
            .collect::<Result<Vec<_>, Error>>()?;

        Ok(Self::new().with_sources(sources))
    }

    /// Replace the source list
    #[must_use]
    pub fn with_sources(mut self, sources: Vec<SourceEndpoint>) -> Self {
        self.sources = sources;
        self
    }

    /// Add one source
    #[must_use]
    pub fn with_source(mut self, source: SourceEndpoint) -> Self {
        self.sources.push(source);
        self
    }

    /// Set the HTTP request timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the greedy sell and buy tolerances
    #[must_use]
    pub fn with_tolerances(mut self, sell: f64, buy: f64) -> Self {
        self.allocation.sell_tolerance = sell;
        self.allocation.buy_tolerance = buy;
        self
    }

    /// Set the memo limit for optimal allocation
    #[must_use]
    pub fn with_max_states(mut self, max_states: usize) -> Self {
        self.allocation.max_states = max_states;
        self
    }

    /// Allow or forbid the grid approximation when the exact optimal search
    /// runs out of states
    #[must_use]
    pub fn with_grid_fallback(mut self, enabled: bool) -> Self {
        self.allocation.grid_fallback = enabled;
        self
    }

    /// Get the configured sources
    pub fn sources(&self) -> &[SourceEndpoint] {
        &self.sources
    }

    /// Get the timeout duration
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Get the allocation parameters
    pub fn allocation(&self) -> &AllocationParams {
        &self.allocation
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
