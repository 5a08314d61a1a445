//! Error types for the aggregated-fill crate.
//!
//! Errors fall into two groups:
//!
//! - per-source failures ([`Error::MalformedQuote`], [`Error::Upstream`],
//!   [`Error::Http`], [`Error::Timeout`]) which the ingestion loop contains to
//!   the failing source;
//! - caller errors on the book ([`Error::EmptyBook`], [`Error::InvalidCapacity`])
//!   which are returned synchronously.

use thiserror::Error;

use crate::types::{Exchange, Side};

/// The main error type for this crate
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON deserialization error outside of a source adapter
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Reading the sources file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration (missing fields, bad format)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Source name in the configuration has no adapter
    #[error("Unsupported source: {0}")]
    UnsupportedSource(String),

    /// A source's response is missing required structure
    #[error("Malformed quote from {exchange}: {reason}")]
    MalformedQuote {
        /// Source that sent the response
        exchange: Exchange,
        /// What was wrong with it
        reason: String,
    },

    /// The source itself reported an error (error payload, non-2xx status)
    #[error("Upstream error from {exchange}: {message}")]
    Upstream {
        /// Source that reported the error
        exchange: Exchange,
        /// Message reported by the source
        message: String,
    },

    /// Request to a source timed out
    #[error("Request to {exchange} timed out")]
    Timeout {
        /// Source that did not answer in time
        exchange: Exchange,
    },

    /// Extraction requested on an empty side of the book
    #[error("Order book has no {0}s")]
    EmptyBook(Side),

    /// Capacity passed to an allocation call was non-positive or not finite
    #[error("Invalid capacity: {0} (must be finite and > 0)")]
    InvalidCapacity(f64),

    /// The optimal search visited more states than allowed
    #[error("Optimal search exceeded {limit} memoized states")]
    StateBudgetExhausted {
        /// Configured state limit
        limit: usize,
    },
}

impl Error {
    /// Build a [`Error::MalformedQuote`]
    pub fn malformed(exchange: Exchange, reason: impl Into<String>) -> Self {
        Error::MalformedQuote {
            exchange,
            reason: reason.into(),
        }
    }

    /// Build an [`Error::Upstream`]
    pub fn upstream(exchange: Exchange, message: impl Into<String>) -> Self {
        Error::Upstream {
            exchange,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_display() {
        let err = Error::malformed(Exchange::Kraken, "missing \"result\"");
        assert!(err.to_string().contains("Kraken"));
        assert!(err.to_string().contains("result"));
    }

    #[test]
    fn test_empty_book_display() {
        let err = Error::EmptyBook(Side::Bid);
        assert_eq!(err.to_string(), "Order book has no bids");
    }

    #[test]
    fn test_upstream_display() {
        let err = Error::upstream(Exchange::Gemini, "InvalidSymbol");
        assert_eq!(err.to_string(), "Upstream error from Gemini: InvalidSymbol");
    }

    #[test]
    fn test_invalid_capacity() {
        let err = Error::InvalidCapacity(-1.0);
        assert!(err.to_string().contains("-1"));
    }
}
