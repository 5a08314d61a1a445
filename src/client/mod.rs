//! HTTP client for exchange order book endpoints.
//!
//! This module contains:
//!
//! - [`rest`] - Single-endpoint fetch and normalization
//! - [`fetcher`] - Concurrent fan-out over every configured source

pub mod fetcher;
pub mod rest;

pub use rest::QuoteClient;
