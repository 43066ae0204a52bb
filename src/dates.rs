//! Expiration date parsing. Dates arrive as free-text `month/day/year`
//! strings (e.g. "8/4/25", "08/04/2025"); parsing failure is a per-record
//! condition, never an error that escapes a scan loop.

use chrono::NaiveDate;

/// Parse a `month/day/year` string with 1- or 2-digit month/day and a
/// 2- or 4-digit year. Two-digit years below 50 map to the 2000s, 50 and
/// above to the 1900s. Returns `None` for anything unparseable.
pub fn parse_expiration(raw: &str) -> Option<NaiveDate> {
    let mut parts = raw.trim().split('/');
    let month: u32 = parts.next()?.trim().parse().ok()?;
    let day: u32 = parts.next()?.trim().parse().ok()?;
    let year: i32 = parts.next()?.trim().parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    let year = if year < 100 {
        if year < 50 { 2000 + year } else { 1900 + year }
    } else {
        year
    };
    NaiveDate::from_ymd_opt(year, month, day)
}
