//! Serialized ingestion of source results into one book.
//!
//! Fetch tasks never touch the [`OrderBook`]. Each one sends a single
//! [`SourceReport`] down an `mpsc` channel, and [`collect`] is the only writer:
//! it drains the channel, tags quotes with their source and inserts them. A
//! source that failed contributes nothing and is recorded as a
//! [`SourceFailure`]; the remaining sources are unaffected.

use tokio::sync::mpsc;
use tracing::{info, warn};

use super::OrderBook;
use crate::adapter::into_orders;
use crate::error::Error;
use crate::types::{Exchange, Quotes, Side};

/// Outcome of fetching and normalizing one source
#[derive(Debug)]
pub struct SourceReport {
    /// Source the result belongs to
    pub exchange: Exchange,
    /// Normalized quotes, or why none could be produced
    pub result: Result<Quotes, Error>,
}

impl SourceReport {
    /// A successful report
    pub fn ok(exchange: Exchange, quotes: Quotes) -> Self {
        Self {
            exchange,
            result: Ok(quotes),
        }
    }

    /// A failed report
    pub fn failed(exchange: Exchange, error: Error) -> Self {
        Self {
            exchange,
            result: Err(error),
        }
    }
}

/// A source that contributed no orders, and why
#[derive(Debug)]
pub struct SourceFailure {
    /// Failing source
    pub exchange: Exchange,
    /// Failure reason
    pub error: Error,
}

/// What an ingestion run produced besides the book
#[derive(Debug, Default)]
pub struct IngestSummary {
    /// Sources whose quotes made it into the book
    pub succeeded: Vec<Exchange>,
    /// Sources that contributed nothing
    pub failures: Vec<SourceFailure>,
    /// Total orders inserted across both sides
    pub orders: usize,
}

impl IngestSummary {
    /// True if no source contributed any quotes
    pub fn is_empty(&self) -> bool {
        self.orders == 0
    }
}

impl OrderBook {
    /// Insert every quote of one report, tagged with its source.
    ///
    /// Returns the number of orders inserted, or hands the failure back. A
    /// report with any invalid level is rejected whole.
    pub fn ingest(&mut self, report: SourceReport) -> Result<usize, SourceFailure> {
        let SourceReport { exchange, result } = report;
        let (bids, asks) = result
            .and_then(|quotes| into_orders(exchange, quotes))
            .map_err(|error| SourceFailure { exchange, error })?;

        let inserted = bids.len() + asks.len();
        self.extend(Side::Bid, bids);
        self.extend(Side::Ask, asks);
        Ok(inserted)
    }
}

/// Drain `reports` into a fresh book until every sender is dropped.
pub async fn collect(mut reports: mpsc::Receiver<SourceReport>) -> (OrderBook, IngestSummary) {
    let mut book = OrderBook::new();
    let mut summary = IngestSummary::default();

    while let Some(report) = reports.recv().await {
        let exchange = report.exchange;
        match book.ingest(report) {
            Ok(inserted) => {
                info!(%exchange, orders = inserted, "ingested source");
                summary.orders += inserted;
                summary.succeeded.push(exchange);
            }
            Err(failure) => {
                warn!(%exchange, error = %failure.error, "source contributed no orders");
                summary.failures.push(failure);
            }
        }
    }

    if summary.is_empty() {
        warn!(failed = summary.failures.len(), "no source contributed any quotes");
    }
    info!(
        bids = book.bid_count(),
        asks = book.ask_count(),
        failed = summary.failures.len(),
        "order book assembled"
    );

    (book, summary)
}
