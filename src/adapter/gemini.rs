//! Gemini book: `{"price", "amount", "timestamp"}` objects.

use serde::Deserialize;

use super::{parse, tuples, Decimal};
use crate::error::Error;
use crate::types::{Exchange, QuoteTuple, Quotes};

const EXCHANGE: Exchange = Exchange::Gemini;

/// Book levels, or `{"result": "error", "reason", "message"}`
#[derive(Debug, Deserialize)]
struct Response {
    result: Option<String>,
    reason: Option<String>,
    message: Option<String>,
    #[serde(default)]
    bids: Option<Vec<Level>>,
    #[serde(default)]
    asks: Option<Vec<Level>>,
}

#[derive(Debug, Deserialize)]
struct Level {
    price: Decimal,
    amount: Decimal,
}

impl From<Level> for QuoteTuple {
    fn from(level: Level) -> Self {
        (level.price.0, level.amount.0)
    }
}

pub(super) fn normalize(body: &[u8]) -> Result<Quotes, Error> {
    let response: Response = parse(EXCHANGE, body)?;

    if response.result.as_deref() == Some("error") {
        let message = response
            .message
            .or(response.reason)
            .unwrap_or_else(|| "unknown error".to_string());
        return Err(Error::upstream(EXCHANGE, message));
    }

    Ok(Quotes::new(tuples(response.bids), tuples(response.asks)))
}
