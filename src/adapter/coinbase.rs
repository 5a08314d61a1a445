//! Coinbase level-2 book: `[price, size, num_orders]` arrays.

use serde::Deserialize;

use super::{parse, ArrayBook};
use crate::error::Error;
use crate::types::{Exchange, Quotes};

const EXCHANGE: Exchange = Exchange::Coinbase;

#[derive(Debug, Deserialize)]
struct Response {
    /// Set on errors, which come back without a book
    message: Option<String>,
    #[serde(flatten)]
    book: ArrayBook,
}

pub(super) fn normalize(body: &[u8]) -> Result<Quotes, Error> {
    let response: Response = parse(EXCHANGE, body)?;

    match response.message {
        Some(message) if !response.book.has_levels() => Err(Error::upstream(EXCHANGE, message)),
        _ => Ok(response.book.into()),
    }
}
