//! Core domain types for quote aggregation.
//!
//! - [`order`] - The [`Order`] quote primitive and book [`Side`]
//! - [`exchange`] - The closed set of quote sources
//! - [`quotes`] - Normalized `(price, quantity)` tuples produced by adapters

pub mod exchange;
pub mod order;
pub mod quotes;

pub use exchange::Exchange;
pub use order::{Order, Side};
pub use quotes::{QuoteTuple, Quotes};

/// Price in quote currency (e.g. USD per BTC)
///
/// Exchanges publish decimal prices with varying precision, so prices are
/// kept as `f64` rather than fixed-point integers.
pub type Price = f64;

/// Quantity in base currency (fractional, e.g. 0.0125 BTC)
pub type Quantity = f64;
