//! Kraken depth: `{"error": [...], "result": {"<pair>": {"bids": [...]}}}`.

use std::collections::HashMap;

use serde::Deserialize;

use super::{parse, ArrayBook};
use crate::error::Error;
use crate::types::{Exchange, Quotes};

const EXCHANGE: Exchange = Exchange::Kraken;

#[derive(Debug, Deserialize)]
struct Response {
    #[serde(default)]
    error: Vec<String>,
    /// Books keyed by pair
    result: Option<HashMap<String, ArrayBook>>,
}

pub(super) fn normalize(body: &[u8], pair: &str) -> Result<Quotes, Error> {
    let response: Response = parse(EXCHANGE, body)?;

    if !response.error.is_empty() {
        return Err(Error::upstream(EXCHANGE, response.error.join("; ")));
    }

    let mut result = response
        .result
        .ok_or_else(|| Error::malformed(EXCHANGE, "missing \"result\" key"))?;
    let book = result
        .remove(pair)
        .ok_or_else(|| Error::malformed(EXCHANGE, format!("missing \"{pair}\" key in result")))?;

    Ok(book.into())
}
