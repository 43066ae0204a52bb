//! Order price resolution and sanity-band tests.

use trade_ledger::error::LedgerError;
use trade_ledger::market::{
    FixedQuoteSource, Quote, QuoteSource, resolve_order_price, validate_order_price,
};
use trade_ledger::types::trade::{InstrumentType, TradeIdentity};

fn quote(mid: f64, last: Option<f64>) -> Quote {
    Quote {
        bid: mid - 0.05,
        mid,
        ask: mid + 0.05,
        last,
    }
}

#[test]
fn explicit_positive_price_wins() {
    assert_eq!(resolve_order_price(Some(101.5), &quote(100.0, Some(99.0))), 101.5);
}

#[test]
fn missing_or_non_positive_price_uses_last() {
    assert_eq!(resolve_order_price(None, &quote(100.0, Some(99.0))), 99.0);
    assert_eq!(resolve_order_price(Some(0.0), &quote(100.0, Some(99.0))), 99.0);
    assert_eq!(resolve_order_price(Some(-3.0), &quote(100.0, Some(99.0))), 99.0);
}

#[test]
fn missing_last_falls_back_to_mid() {
    assert_eq!(resolve_order_price(None, &quote(100.0, None)), 100.0);
}

#[test]
fn stock_band_is_tight() {
    assert!(validate_order_price("AAPL", Some(InstrumentType::Long), 100.1, 100.0).is_ok());
    let err = validate_order_price("AAPL", Some(InstrumentType::Long), 103.0, 100.0);
    assert!(matches!(err, Err(LedgerError::InvalidParameter(_))));
}

#[test]
fn option_band_is_wide() {
    assert!(validate_order_price("SPX", Some(InstrumentType::Call), 10.9, 10.0).is_ok());
    assert!(validate_order_price("SPX", Some(InstrumentType::Put), 8.5, 10.0).is_err());
}

#[test]
fn futures_band_uses_floor_and_ceil() {
    // 4500 * 0.9995 = 4497.75 floors to 4497; 4500 * 1.0005 ceils to 4503.
    assert!(validate_order_price("/ES", Some(InstrumentType::Long), 4497.0, 4500.0).is_ok());
    assert!(validate_order_price("/ES", Some(InstrumentType::Long), 4503.0, 4500.0).is_ok());
    assert!(validate_order_price("/ES", Some(InstrumentType::Long), 4496.0, 4500.0).is_err());
    assert!(validate_order_price("/ES", Some(InstrumentType::Long), 4504.0, 4500.0).is_err());
}

#[tokio::test]
async fn fixed_quote_source_quotes_everything_flat() {
    let source = FixedQuoteSource::new(0.01);
    let identity = TradeIdentity {
        user: "trader".to_string(),
        ticker: "SPX".to_string(),
        expiration: Some("8/4/25".to_string()),
        strike: Some("6300".to_string()),
        instrument_type: Some(InstrumentType::Put),
    };
    let q = source.quote(&identity).await.unwrap();
    assert_eq!(q.mid, 0.01);
    assert_eq!(q.last, Some(0.01));
}
