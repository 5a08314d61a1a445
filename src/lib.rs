//! # aggregated-fill
//!
//! Aggregate order books from several crypto exchanges and compute the best
//! achievable fill for a target quantity.
//!
//! ## Features
//!
//! - **Concurrent fetch** - One request per exchange, isolated failures
//! - **Aggregated book** - Bids highest-first, asks lowest-first, across sources
//! - **Greedy fill** - One pass in price order under a tolerance ceiling
//! - **Optimal fill** - Memoized knapsack closest to the target, best value
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use aggregated_fill::{Aggregator, Config, Strategy};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), aggregated_fill::Error> {
//!     let config = Config::from_file("exchanges.json")?;
//!     let aggregator = Aggregator::new(config)?;
//!
//!     let report = aggregator.run(10.0, Strategy::Optimal).await?;
//!     if let Ok(sell) = &report.sell {
//!         println!("Sell 10 for {}", sell.total_value);
//!     }
//!     if let Ok(buy) = &report.buy {
//!         println!("Buy 10 for {}", buy.total_value);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`types`] - [`types::Order`], [`types::Exchange`] and normalized quotes
//! - [`adapter`] - Per-exchange response normalization
//! - [`client`] - HTTP fetch and concurrent fan-out
//! - [`orderbook`] - The aggregated book and its single-writer ingest loop
//! - [`allocation`] - Greedy and optimal fill strategies
//! - [`config`] - Sources file and tunables
//! - [`error`] - Error types for the crate

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

pub mod adapter;
pub mod allocation;
pub mod client;
pub mod config;
pub mod error;
pub mod orderbook;
pub mod types;

// Re-export main types at crate root for convenience
pub use allocation::{Allocation, Objective};
pub use config::Config;
pub use error::Error;
pub use orderbook::OrderBook;

use orderbook::{IngestSummary, SourceFailure};
use types::{Exchange, Quantity};

/// Result type alias using the crate's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Which allocation algorithm to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// Single pass in price order
    #[default]
    Greedy,
    /// Memoized knapsack
    Optimal,
}

/// Sell and buy fills for one target quantity.
///
/// Each side is computed on its own; a failure on one side leaves the other
/// intact.
#[derive(Debug)]
pub struct Report {
    /// Requested quantity
    pub capacity: Quantity,
    /// Fill against the aggregated bids
    pub sell: Result<Allocation>,
    /// Fill against the aggregated asks
    pub buy: Result<Allocation>,
    /// Sources whose quotes made it into the book
    pub sources: Vec<Exchange>,
    /// Sources that contributed no orders
    pub failures: Vec<SourceFailure>,
}

/// Fetches every configured source into one book and allocates against it.
#[derive(Debug)]
pub struct Aggregator {
    config: Config,
    client: client::QuoteClient,
}

impl Aggregator {
    /// Create a new aggregator with the given configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new(config: Config) -> Result<Self> {
        let client = client::QuoteClient::new(&config)?;
        Ok(Self { config, client })
    }

    /// Get a reference to the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Fetch every source concurrently and assemble the book.
    ///
    /// Failed sources are listed in the summary and otherwise ignored.
    pub async fn build_book(&self) -> (OrderBook, IngestSummary) {
        let reports = self.client.fetch_all(self.config.sources());
        orderbook::ingest::collect(reports).await
    }

    /// Build the book, then compute the sell and buy fills for `capacity`.
    ///
    /// Allocation errors are reported per side in the [`Report`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCapacity`] before any request is sent if
    /// `capacity` is not finite and positive.
    pub async fn run(&self, capacity: Quantity, strategy: Strategy) -> Result<Report> {
        allocation::validate_capacity(capacity)?;

        let (book, summary) = self.build_book().await;
        let (sell, buy) = allocate(&book, capacity, strategy, self.config.allocation());

        Ok(Report {
            capacity,
            sell,
            buy,
            sources: summary.succeeded,
            failures: summary.failures,
        })
    }
}

/// Run `strategy` on both sides of `book`.
///
/// Returns `(sell, buy)`, each with the errors of the matching entry point on
/// [`OrderBook`]. Both sides always run.
pub fn allocate(
    book: &OrderBook,
    capacity: Quantity,
    strategy: Strategy,
    params: &allocation::AllocationParams,
) -> (Result<Allocation>, Result<Allocation>) {
    match strategy {
        Strategy::Greedy => (
            book.greedy_sell_with(capacity, params),
            book.greedy_buy_with(capacity, params),
        ),
        Strategy::Optimal => (
            book.optimal_sell_with(capacity, params),
            book.optimal_buy_with(capacity, params),
        ),
    }
}
