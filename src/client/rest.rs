//! HTTP client for exchange order book endpoints.
//!
//! This module provides the [`QuoteClient`] for fetching one source's book and
//! normalizing it with that source's adapter.
//!
//! # Example
//!
//! ```rust,no_run
//! use aggregated_fill::client::QuoteClient;
//! use aggregated_fill::config::{Config, SourceEndpoint};
//! use aggregated_fill::types::Exchange;
//!
//! # async fn example() -> aggregated_fill::Result<()> {
//! let client = QuoteClient::new(&Config::new())?;
//! let gemini = SourceEndpoint::new(Exchange::Gemini, "https://api.gemini.com/v1/book/btcusd")?;
//!
//! let quotes = client.fetch(&gemini).await?;
//! println!("{} bids, {} asks", quotes.bids.len(), quotes.asks.len());
//! # Ok(())
//! # }
//! ```

use reqwest::header::{HeaderValue, ACCEPT};
use reqwest::{Client, StatusCode};
use tracing::debug;

use crate::config::{Config, SourceEndpoint};
use crate::error::Error;
use crate::types::{Exchange, Quotes};

const USER_AGENT: &str = concat!("aggregated-fill/", env!("CARGO_PKG_VERSION"));

/// HTTP client for order book endpoints
#[derive(Debug, Clone)]
pub struct QuoteClient {
    client: Client,
}

impl QuoteClient {
    /// Create a new client
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new(config: &Config) -> Result<Self, Error> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { client })
    }

    /// Fetch one endpoint and normalize its book
    ///
    /// # Errors
    ///
    /// - [`Error::Timeout`] if the request exceeds the configured timeout
    /// - [`Error::Http`] for other transport failures
    /// - [`Error::Upstream`] for non-success statuses or error payloads
    /// - [`Error::MalformedQuote`] if the body does not match the adapter
    pub async fn fetch(&self, endpoint: &SourceEndpoint) -> Result<Quotes, Error> {
        let exchange = endpoint.exchange();
        let body = self.get(endpoint).await?;
        let quotes = endpoint.adapter().normalize(&body)?;

        debug!(
            %exchange,
            levels = quotes.len(),
            bids = quotes.bids.len(),
            "normalized book"
        );
        Ok(quotes)
    }

    /// GET the endpoint and return the raw body
    async fn get(&self, endpoint: &SourceEndpoint) -> Result<Vec<u8>, Error> {
        let exchange = endpoint.exchange();
        debug!(%exchange, url = %endpoint.url(), "requesting book");

        let response = self
            .client
            .get(endpoint.url().clone())
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .send()
            .await
            .map_err(|e| transport_error(exchange, e))?;

        self.handle_response(exchange, response).await
    }

    /// Handle the HTTP response, checking for errors
    async fn handle_response(
        &self,
        exchange: Exchange,
        response: reqwest::Response,
    ) -> Result<Vec<u8>, Error> {
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);

            let message = match retry_after {
                Some(after) => format!("rate limited, retry after {after}"),
                None => "rate limited".to_string(),
            };
            return Err(Error::upstream(exchange, message));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();

            // Exchanges report errors as {"message": ...} or {"error": ...}
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|value| {
                    value
                        .get("message")
                        .or_else(|| value.get("error"))
                        .map(|v| v.as_str().map_or_else(|| v.to_string(), str::to_string))
                })
                .unwrap_or(body);

            return Err(Error::upstream(
                exchange,
                format!("HTTP {}: {}", status.as_u16(), message),
            ));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| transport_error(exchange, e))?;
        Ok(body.to_vec())
    }
}

fn transport_error(exchange: Exchange, err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::Timeout { exchange }
    } else {
        Error::Http(err)
    }
}
