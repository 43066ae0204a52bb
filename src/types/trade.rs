use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const MAX_AVG_DOWNS: usize = 2;
pub const MAX_TRIMS: usize = 4;

/// Instrument type markers as reported by users. `L`/`S` are equity
/// buy-to-open / sell-to-open; `C`/`P` are option legs (a put is treated
/// as a short proxy for P&L direction).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstrumentType {
    #[serde(rename = "L")]
    Long,
    #[serde(rename = "S")]
    Short,
    #[serde(rename = "C")]
    Call,
    #[serde(rename = "P")]
    Put,
}

impl InstrumentType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Long => "L",
            Self::Short => "S",
            Self::Call => "C",
            Self::Put => "P",
        }
    }

    pub fn from_marker(s: &str) -> Option<Self> {
        match s {
            "L" => Some(Self::Long),
            "S" => Some(Self::Short),
            "C" => Some(Self::Call),
            "P" => Some(Self::Put),
            _ => None,
        }
    }

    /// Long direction for P&L: buy-to-open and calls.
    pub fn is_long(self) -> bool {
        matches!(self, Self::Long | Self::Call)
    }

    pub fn is_option(self) -> bool {
        matches!(self, Self::Call | Self::Put)
    }
}

/// Instrument class for P&L units and per-class aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstrumentClass {
    Options,
    Stocks,
    Futures,
}

/// Composite key naming one position. Optional fields, when omitted, are
/// NOT used as filter predicates when matching records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeIdentity {
    pub user: String,
    pub ticker: String,
    pub expiration: Option<String>,
    pub strike: Option<String>,
    pub instrument_type: Option<InstrumentType>,
}

/// One filled average-down slot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AvgDown {
    pub price: f64,
    pub qty: i64,
}

/// One position, open or closed. Avg-down and trim slots fill strictly in
/// order; the next empty slot is the first `None` index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub id: Uuid,
    pub user: String,
    pub ticker: String,
    pub expiration: Option<String>,
    pub strike: Option<String>,
    pub instrument_type: Option<InstrumentType>,
    pub entry_price: f64,
    pub entry_qty: i64,
    pub avg_downs: [Option<AvgDown>; MAX_AVG_DOWNS],
    pub trims: [Option<f64>; MAX_TRIMS],
    pub closing_price: Option<f64>,
    pub is_open: bool,
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl TradeRecord {
    pub fn identity(&self) -> TradeIdentity {
        TradeIdentity {
            user: self.user.clone(),
            ticker: self.ticker.clone(),
            expiration: self.expiration.clone(),
            strike: self.strike.clone(),
            instrument_type: self.instrument_type,
        }
    }

    pub fn avg_down_count(&self) -> usize {
        self.avg_downs.iter().flatten().count()
    }

    pub fn trim_count(&self) -> usize {
        self.trims.iter().flatten().count()
    }

    /// Ticker containing a slash is a futures contract (e.g. `/ES`), then
    /// option markers, otherwise stock.
    pub fn instrument_class(&self) -> InstrumentClass {
        if self.ticker.contains('/') {
            InstrumentClass::Futures
        } else if self.instrument_type.is_some_and(InstrumentType::is_option) {
            InstrumentClass::Options
        } else {
            InstrumentClass::Stocks
        }
    }

    /// Long only when the type marker says so; records without a marker
    /// follow the short branch, matching historical ledger data.
    pub fn is_long(&self) -> bool {
        self.instrument_type.is_some_and(InstrumentType::is_long)
    }
}
