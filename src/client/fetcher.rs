//! Concurrent fetch of every configured source.
//!
//! One tokio task per source; each sends exactly one [`SourceReport`] into a
//! bounded channel whose receiver is handed to
//! [`crate::orderbook::ingest::collect`]. Tasks never share the book.

use tokio::sync::mpsc;
use tracing::debug;

use super::QuoteClient;
use crate::config::SourceEndpoint;
use crate::orderbook::SourceReport;

impl QuoteClient {
    /// Start fetching every endpoint and return the report channel.
    ///
    /// The channel closes once every task has reported. Must be called from
    /// within a tokio runtime.
    pub fn fetch_all(&self, sources: &[SourceEndpoint]) -> mpsc::Receiver<SourceReport> {
        let (tx, rx) = mpsc::channel(sources.len().max(1));

        for endpoint in sources.iter().cloned() {
            let client = self.clone();
            let tx = tx.clone();

            tokio::spawn(async move {
                let exchange = endpoint.exchange();
                let result = client.fetch(&endpoint).await;
                if tx.send(SourceReport { exchange, result }).await.is_err() {
                    debug!(%exchange, "ingest loop closed before report");
                }
            });
        }

        rx
    }
}
