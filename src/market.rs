//! Market-data collaborator seam. The core treats quotes as an opaque
//! price source: resolve a default order price and sanity-check a
//! requested price against the quote mid before the ledger is touched.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::types::trade::{InstrumentType, TradeIdentity};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub bid: f64,
    pub mid: f64,
    pub ask: f64,
    pub last: Option<f64>,
}

/// Current quote for an identity, or `None` when the instrument is not
/// found. Implementations own their own timeouts.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn quote(&self, identity: &TradeIdentity) -> Option<Quote>;
}

/// Quotes everything at one constant price. Backs the expiry sweep when no
/// broker is wired: expired options settle at a configured price.
pub struct FixedQuoteSource {
    price: f64,
}

impl FixedQuoteSource {
    pub fn new(price: f64) -> Self {
        Self { price }
    }
}

#[async_trait]
impl QuoteSource for FixedQuoteSource {
    async fn quote(&self, _identity: &TradeIdentity) -> Option<Quote> {
        Some(Quote {
            bid: self.price,
            mid: self.price,
            ask: self.price,
            last: Some(self.price),
        })
    }
}

/// A requested price of `None` or a non-positive value resolves to the
/// quote's last price, falling back to mid.
pub fn resolve_order_price(requested: Option<f64>, quote: &Quote) -> f64 {
    match requested {
        Some(p) if p > 0.0 => p,
        _ => quote.last.unwrap_or(quote.mid),
    }
}

/// Reject prices too far from the quote mid. Futures get a tight band with
/// floor/ceil at the boundary, options a wide one, stocks 0.2%.
pub fn validate_order_price(
    ticker: &str,
    instrument_type: Option<InstrumentType>,
    price: f64,
    mid: f64,
) -> Result<(), LedgerError> {
    let (low, high) = if ticker.contains('/') {
        ((mid * 0.9995).floor(), (mid * 1.0005).ceil())
    } else if instrument_type.is_some_and(InstrumentType::is_option) {
        (mid * 0.9, mid * 1.1)
    } else {
        (mid * 0.998, mid * 1.002)
    };
    if price < low || price > high {
        return Err(LedgerError::InvalidParameter(format!(
            "price {price} for {ticker} is too far from current market {mid:.2}"
        )));
    }
    Ok(())
}
