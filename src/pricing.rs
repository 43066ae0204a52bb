//! Weighted price calculator: pure functions over a single trade record.
//! Testable without a database.

use serde::{Deserialize, Serialize};

use crate::types::trade::{InstrumentClass, TradeRecord};

/// P&L unit: percentage of weighted entry for stocks and options, raw
/// points for futures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PnlUnit {
    #[serde(rename = "%")]
    Percent,
    #[serde(rename = "pts")]
    Points,
}

impl PnlUnit {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Percent => "%",
            Self::Points => "pts",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pnl {
    pub value: f64,
    pub unit: PnlUnit,
}

/// Total quantity bought: initial entry plus all filled avg-down slots.
pub fn total_entry_quantity(record: &TradeRecord) -> i64 {
    record.entry_qty
        + record
            .avg_downs
            .iter()
            .flatten()
            .map(|a| a.qty)
            .sum::<i64>()
}

/// Volume-weighted entry price over the entry and filled avg-down pairs.
/// Falls back to the raw entry price when the total quantity is zero.
pub fn weighted_entry_price(record: &TradeRecord) -> f64 {
    let total = total_entry_quantity(record);
    if total <= 0 {
        return record.entry_price;
    }
    let value = record.entry_price * record.entry_qty as f64
        + record
            .avg_downs
            .iter()
            .flatten()
            .map(|a| a.price * a.qty as f64)
            .sum::<f64>();
    value / total as f64
}

/// Volume-weighted exit price across filled trims and the final close.
///
/// Trims are stored price-only, so each filled trim and the final close
/// implicitly exits an equal share of the total entry quantity (the close
/// receives the remainder). With equal shares the weighted mean collapses
/// to the arithmetic mean of the exit prices, which is the documented
/// policy here. `None` when no exit event exists yet.
pub fn weighted_exit_price(record: &TradeRecord) -> Option<f64> {
    let trims: Vec<f64> = record.trims.iter().flatten().copied().collect();

    if let Some(close) = record.closing_price {
        // Inconsistent data guard: no quantity to distribute and no trims,
        // report the closing price as-is.
        if total_entry_quantity(record) <= 0 && trims.is_empty() {
            return Some(close);
        }
        let sum: f64 = trims.iter().sum::<f64>() + close;
        return Some(sum / (trims.len() + 1) as f64);
    }

    if trims.is_empty() {
        None
    } else {
        Some(trims.iter().sum::<f64>() / trims.len() as f64)
    }
}

/// Per-trade P&L. `None` when no exit price is definable, or when a
/// percentage P&L would divide by a zero entry price.
pub fn pnl(record: &TradeRecord) -> Option<Pnl> {
    let entry = weighted_entry_price(record);
    let exit = weighted_exit_price(record)?;
    let diff = if record.is_long() {
        exit - entry
    } else {
        entry - exit
    };

    match record.instrument_class() {
        InstrumentClass::Futures => Some(Pnl {
            value: diff,
            unit: PnlUnit::Points,
        }),
        InstrumentClass::Options | InstrumentClass::Stocks => {
            if entry == 0.0 {
                return None;
            }
            Some(Pnl {
                value: diff / entry * 100.0,
                unit: PnlUnit::Percent,
            })
        }
    }
}
