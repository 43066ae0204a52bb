//! Query tag parsing and timeframe window tests.

use chrono::{Local, Utc};
use trade_ledger::error::LedgerError;
use trade_ledger::types::filters::{StatusFilter, Timeframe};

#[test]
fn timeframe_tags_parse() {
    assert_eq!("today".parse::<Timeframe>().unwrap(), Timeframe::Today);
    assert_eq!("weekly".parse::<Timeframe>().unwrap(), Timeframe::Weekly);
    assert_eq!("monthly".parse::<Timeframe>().unwrap(), Timeframe::Monthly);
    assert_eq!("yearly".parse::<Timeframe>().unwrap(), Timeframe::Yearly);
    assert_eq!("all".parse::<Timeframe>().unwrap(), Timeframe::All);
}

#[test]
fn unknown_timeframe_is_invalid_parameter() {
    let err = "fortnightly".parse::<Timeframe>().unwrap_err();
    assert!(matches!(err, LedgerError::InvalidParameter(_)));
}

#[test]
fn status_tags_parse() {
    assert_eq!("open".parse::<StatusFilter>().unwrap(), StatusFilter::Open);
    assert_eq!("closed".parse::<StatusFilter>().unwrap(), StatusFilter::Closed);
    assert_eq!("all".parse::<StatusFilter>().unwrap(), StatusFilter::All);
}

#[test]
fn unknown_status_is_invalid_parameter() {
    let err = "pending".parse::<StatusFilter>().unwrap_err();
    assert!(matches!(err, LedgerError::InvalidParameter(_)));
}

#[test]
fn status_open_flags() {
    assert_eq!(StatusFilter::Open.as_open_flag(), Some(true));
    assert_eq!(StatusFilter::Closed.as_open_flag(), Some(false));
    assert_eq!(StatusFilter::All.as_open_flag(), None);
}

#[test]
fn today_window_starts_at_local_midnight() {
    let start = Timeframe::Today.start();
    assert!(start <= Utc::now());
    let local_start = start.with_timezone(&Local);
    assert_eq!(local_start.date_naive(), Local::now().date_naive());
    assert_eq!(local_start.time(), chrono::NaiveTime::MIN);
}

#[test]
fn all_window_starts_at_epoch() {
    assert_eq!(Timeframe::All.start(), chrono::DateTime::UNIX_EPOCH);
}

#[test]
fn rolling_windows_are_ordered() {
    let now = Utc::now();
    let weekly = Timeframe::Weekly.start();
    let monthly = Timeframe::Monthly.start();
    let yearly = Timeframe::Yearly.start();
    assert!(yearly < monthly && monthly < weekly && weekly < now);
}
