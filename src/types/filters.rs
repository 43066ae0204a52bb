//! Query filter tags for the ledger read path. Unknown tags fail
//! `InvalidParameter` at parse time, before any query runs.

use std::str::FromStr;

use chrono::{DateTime, Duration, Local, Utc};
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// Timeframe window over `opened_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Timeframe {
    Today,
    Weekly,
    Monthly,
    Yearly,
    All,
}

impl Timeframe {
    /// Inclusive lower bound of the window. "Today" starts at midnight of
    /// the current calendar day in the local reference timezone.
    pub fn start(self) -> DateTime<Utc> {
        let now = Utc::now();
        match self {
            Self::Today => {
                let midnight = Local::now()
                    .date_naive()
                    .and_hms_opt(0, 0, 0)
                    .and_then(|t| t.and_local_timezone(Local).earliest());
                match midnight {
                    Some(t) => t.with_timezone(&Utc),
                    None => now - Duration::days(1),
                }
            }
            Self::Weekly => now - Duration::days(7),
            Self::Monthly => now - Duration::days(30),
            Self::Yearly => now - Duration::days(365),
            Self::All => DateTime::UNIX_EPOCH,
        }
    }
}

impl FromStr for Timeframe {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "today" => Ok(Self::Today),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            "all" => Ok(Self::All),
            other => Err(LedgerError::InvalidParameter(format!(
                "unknown timeframe '{other}', expected today/weekly/monthly/yearly/all"
            ))),
        }
    }
}

/// Open/closed status filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    Open,
    Closed,
    All,
}

impl StatusFilter {
    /// `None` means no predicate on `is_open`.
    pub fn as_open_flag(self) -> Option<bool> {
        match self {
            Self::Open => Some(true),
            Self::Closed => Some(false),
            Self::All => None,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Self::Open),
            "closed" => Ok(Self::Closed),
            "all" => Ok(Self::All),
            other => Err(LedgerError::InvalidParameter(format!(
                "unknown status '{other}', expected open/closed/all"
            ))),
        }
    }
}
