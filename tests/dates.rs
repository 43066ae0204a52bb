//! Expiration date parsing tests: supported month/day/year formats and the
//! two-digit-year pivot.

use chrono::NaiveDate;
use trade_ledger::dates::parse_expiration;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn parses_short_month_day_two_digit_year() {
    assert_eq!(parse_expiration("8/4/25"), Some(date(2025, 8, 4)));
}

#[test]
fn parses_zero_padded_two_digit_year() {
    assert_eq!(parse_expiration("08/04/25"), Some(date(2025, 8, 4)));
}

#[test]
fn parses_four_digit_year() {
    assert_eq!(parse_expiration("12/25/2025"), Some(date(2025, 12, 25)));
    assert_eq!(parse_expiration("1/2/2026"), Some(date(2026, 1, 2)));
}

#[test]
fn two_digit_year_pivot_at_fifty() {
    assert_eq!(parse_expiration("1/1/49"), Some(date(2049, 1, 1)));
    assert_eq!(parse_expiration("1/1/50"), Some(date(1950, 1, 1)));
    assert_eq!(parse_expiration("1/1/99"), Some(date(1999, 1, 1)));
}

#[test]
fn tolerates_surrounding_whitespace() {
    assert_eq!(parse_expiration(" 8/4/25 "), Some(date(2025, 8, 4)));
}

#[test]
fn rejects_out_of_range_components() {
    assert_eq!(parse_expiration("13/45/99"), None);
    assert_eq!(parse_expiration("2/30/25"), None);
}

#[test]
fn rejects_malformed_strings() {
    assert_eq!(parse_expiration(""), None);
    assert_eq!(parse_expiration("8/4"), None);
    assert_eq!(parse_expiration("8/4/25/1"), None);
    assert_eq!(parse_expiration("aug/4/25"), None);
    assert_eq!(parse_expiration("2025-08-04"), None);
}
