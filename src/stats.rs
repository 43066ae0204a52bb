//! Statistics aggregator: consumes a collection of ledger records (already
//! filtered by the read path) and produces aggregate reports plus a
//! formatted human-readable summary.

use std::collections::HashMap;
use std::fmt::Write as _;

use serde::Serialize;

use crate::pricing::{self, Pnl};
use crate::types::trade::{InstrumentClass, TradeRecord};

const BEST_WORST_LIMIT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BasicCounts {
    pub total: usize,
    pub open: usize,
    pub closed: usize,
}

/// Per-class P&L aggregate over closed trades with a definable P&L.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Default)]
pub struct ClassPnl {
    pub avg: Option<f64>,
    pub total: f64,
    pub count: usize,
    pub wins: usize,
    pub losses: usize,
}

impl ClassPnl {
    fn from_values(values: &[f64]) -> Self {
        let count = values.len();
        let total: f64 = values.iter().sum();
        Self {
            avg: (count > 0).then(|| total / count as f64),
            total,
            count,
            wins: values.iter().filter(|p| **p > 0.0).count(),
            losses: values.iter().filter(|p| **p < 0.0).count(),
        }
    }

    fn win_rate(&self) -> Option<f64> {
        let decided = self.wins + self.losses;
        (decided > 0).then(|| self.wins as f64 / decided as f64 * 100.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Default)]
pub struct PnlByClass {
    pub options: ClassPnl,
    pub stocks: ClassPnl,
    pub futures: ClassPnl,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WinRates {
    pub options: Option<f64>,
    pub stocks: Option<f64>,
    pub futures: Option<f64>,
    pub overall: Option<f64>,
}

/// A closed record ranked by its P&L.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedTrade {
    pub record: TradeRecord,
    pub pnl: Pnl,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BestWorst {
    pub best: Vec<RankedTrade>,
    /// Worst first, improving toward the end.
    pub worst: Vec<RankedTrade>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Activity {
    pub most_traded: Option<(String, usize)>,
    /// Ticker counts in first-encounter order.
    pub trades_per_ticker: Vec<(String, usize)>,
    pub avg_downs_used: usize,
    pub trims_used: usize,
    pub unique_tickers: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeldTrade {
    pub record: TradeRecord,
    pub hours: f64,
}

/// Holding-time summary over closed records with both timestamps present.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HoldTime {
    pub avg_hours: f64,
    pub shortest: HeldTrade,
    pub longest: HeldTrade,
}

pub struct TradeStats {
    records: Vec<TradeRecord>,
}

impl TradeStats {
    pub fn new(records: Vec<TradeRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[TradeRecord] {
        &self.records
    }

    pub fn basic_counts(&self) -> BasicCounts {
        let open = self.records.iter().filter(|r| r.is_open).count();
        BasicCounts {
            total: self.records.len(),
            open,
            closed: self.records.len() - open,
        }
    }

    pub fn pnl_by_class(&self) -> PnlByClass {
        let mut options = Vec::new();
        let mut stocks = Vec::new();
        let mut futures = Vec::new();
        for record in self.records.iter().filter(|r| !r.is_open) {
            let Some(pnl) = pricing::pnl(record) else {
                continue;
            };
            match record.instrument_class() {
                InstrumentClass::Options => options.push(pnl.value),
                InstrumentClass::Stocks => stocks.push(pnl.value),
                InstrumentClass::Futures => futures.push(pnl.value),
            }
        }
        PnlByClass {
            options: ClassPnl::from_values(&options),
            stocks: ClassPnl::from_values(&stocks),
            futures: ClassPnl::from_values(&futures),
        }
    }

    pub fn win_rates(&self) -> WinRates {
        let pnl = self.pnl_by_class();
        let wins = pnl.options.wins + pnl.stocks.wins + pnl.futures.wins;
        let losses = pnl.options.losses + pnl.stocks.losses + pnl.futures.losses;
        let decided = wins + losses;
        WinRates {
            options: pnl.options.win_rate(),
            stocks: pnl.stocks.win_rate(),
            futures: pnl.futures.win_rate(),
            overall: (decided > 0).then(|| wins as f64 / decided as f64 * 100.0),
        }
    }

    /// Top/bottom closed trades by P&L. The sort is stable, so equal P&L
    /// keeps encounter order.
    pub fn best_worst(&self, limit: usize) -> BestWorst {
        let mut ranked: Vec<RankedTrade> = self
            .records
            .iter()
            .filter(|r| !r.is_open)
            .filter_map(|r| {
                pricing::pnl(r).map(|pnl| RankedTrade {
                    record: r.clone(),
                    pnl,
                })
            })
            .collect();
        ranked.sort_by(|a, b| {
            b.pnl
                .value
                .partial_cmp(&a.pnl.value)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let best = ranked.iter().take(limit).cloned().collect();
        let worst = ranked
            .iter()
            .rev()
            .take(limit.min(ranked.len()))
            .cloned()
            .collect();
        BestWorst { best, worst }
    }

    pub fn activity(&self) -> Activity {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        let mut order: Vec<&str> = Vec::new();
        let mut avg_downs_used = 0;
        let mut trims_used = 0;

        for record in &self.records {
            let entry = counts.entry(record.ticker.as_str()).or_insert(0);
            if *entry == 0 {
                order.push(record.ticker.as_str());
            }
            *entry += 1;
            avg_downs_used += record.avg_down_count();
            trims_used += record.trim_count();
        }

        let trades_per_ticker: Vec<(String, usize)> = order
            .iter()
            .map(|t| (t.to_string(), counts[t]))
            .collect();
        // Ties go to the first-encountered ticker, so only a strictly
        // greater count replaces the current leader.
        let mut most_traded: Option<(String, usize)> = None;
        for entry in &trades_per_ticker {
            match &most_traded {
                Some((_, count)) if *count >= entry.1 => {}
                _ => most_traded = Some(entry.clone()),
            }
        }

        Activity {
            most_traded,
            unique_tickers: trades_per_ticker.len(),
            trades_per_ticker,
            avg_downs_used,
            trims_used,
        }
    }

    /// `None` when no closed record has both timestamps; records missing a
    /// timestamp are excluded from this computation only.
    pub fn hold_time(&self) -> Option<HoldTime> {
        let held: Vec<HeldTrade> = self
            .records
            .iter()
            .filter(|r| !r.is_open)
            .filter_map(|r| {
                let closed_at = r.closed_at?;
                let hours = (closed_at - r.opened_at).num_seconds() as f64 / 3600.0;
                Some(HeldTrade {
                    record: r.clone(),
                    hours,
                })
            })
            .collect();
        if held.is_empty() {
            return None;
        }

        let avg_hours = held.iter().map(|h| h.hours).sum::<f64>() / held.len() as f64;
        let shortest = held
            .iter()
            .min_by(|a, b| a.hours.partial_cmp(&b.hours).unwrap_or(std::cmp::Ordering::Equal))?
            .clone();
        let longest = held
            .iter()
            .max_by(|a, b| a.hours.partial_cmp(&b.hours).unwrap_or(std::cmp::Ordering::Equal))?
            .clone();
        Some(HoldTime {
            avg_hours,
            shortest,
            longest,
        })
    }

    /// Human-readable summary. Section order is fixed; sections with no
    /// contributing data are omitted entirely.
    pub fn format_report(&self) -> String {
        let basic = self.basic_counts();
        let pnl = self.pnl_by_class();
        let win = self.win_rates();
        let activity = self.activity();
        let best_worst = self.best_worst(BEST_WORST_LIMIT);

        let mut out = String::new();
        let _ = writeln!(out, "OVERVIEW");
        let _ = writeln!(out, "Total trades: {}", basic.total);
        let _ = writeln!(out, "├─ Open: {}", basic.open);
        let _ = writeln!(out, "└─ Closed: {}", basic.closed);

        if let Some(overall) = win.overall {
            let _ = writeln!(out, "\nWIN RATE");
            let _ = writeln!(out, "Overall: {overall:.1}%");
            if let Some(rate) = win.options {
                let _ = writeln!(
                    out,
                    "├─ Options: {rate:.1}% ({}W/{}L)",
                    pnl.options.wins, pnl.options.losses
                );
            }
            if let Some(rate) = win.stocks {
                let _ = writeln!(
                    out,
                    "├─ Stocks: {rate:.1}% ({}W/{}L)",
                    pnl.stocks.wins, pnl.stocks.losses
                );
            }
            if let Some(rate) = win.futures {
                let _ = writeln!(
                    out,
                    "└─ Futures: {rate:.1}% ({}W/{}L)",
                    pnl.futures.wins, pnl.futures.losses
                );
            }
        }

        let mut pnl_lines = Vec::new();
        for (label, class, unit) in [
            ("Options", &pnl.options, "%"),
            ("Stocks", &pnl.stocks, "%"),
            ("Futures", &pnl.futures, "pts"),
        ] {
            if let Some(avg) = class.avg {
                pnl_lines.push(format!(
                    "{label}: {}{avg:.2}{unit} (Total: {}{:.2}{unit})",
                    plus_sign(avg),
                    plus_sign(class.total),
                    class.total
                ));
            }
        }
        if !pnl_lines.is_empty() {
            let _ = writeln!(out, "\nAVERAGE PNL");
            for line in pnl_lines {
                let _ = writeln!(out, "{line}");
            }
        }

        if activity.unique_tickers > 0 {
            let _ = writeln!(out, "\nACTIVITY");
            if let Some((ticker, count)) = &activity.most_traded {
                let _ = writeln!(out, "Most traded: {ticker} ({count} trades)");
            }
            let _ = writeln!(out, "Unique tickers: {}", activity.unique_tickers);
            let _ = writeln!(out, "Avg-downs used: {}", activity.avg_downs_used);
            let _ = writeln!(out, "Trims executed: {}", activity.trims_used);
        }

        if let Some(hold) = self.hold_time() {
            let _ = writeln!(out, "\nHOLD TIME");
            if hold.avg_hours < 24.0 {
                let _ = writeln!(out, "Average: {:.1} hours", hold.avg_hours);
            } else {
                let _ = writeln!(out, "Average: {:.1} days", hold.avg_hours / 24.0);
            }
            let _ = writeln!(
                out,
                "Shortest: {} ({:.1}h)",
                trade_label(&hold.shortest.record),
                hold.shortest.hours
            );
            let _ = writeln!(
                out,
                "Longest: {} ({:.1}h)",
                trade_label(&hold.longest.record),
                hold.longest.hours
            );
        }

        if !best_worst.best.is_empty() {
            let _ = writeln!(out, "\nBEST TRADES");
            for (i, item) in best_worst.best.iter().enumerate() {
                let _ = writeln!(
                    out,
                    "{}. {}: {}{:.2}{}",
                    i + 1,
                    trade_label(&item.record),
                    plus_sign(item.pnl.value),
                    item.pnl.value,
                    item.pnl.unit.as_str()
                );
            }
        }

        if !best_worst.worst.is_empty() {
            let _ = writeln!(out, "\nWORST TRADES");
            for (i, item) in best_worst.worst.iter().enumerate() {
                let _ = writeln!(
                    out,
                    "{}. {}: {:.2}{}",
                    i + 1,
                    trade_label(&item.record),
                    item.pnl.value,
                    item.pnl.unit.as_str()
                );
            }
        }

        out.trim_end().to_string()
    }
}

fn plus_sign(value: f64) -> &'static str {
    if value >= 0.0 { "+" } else { "" }
}

fn trade_label(record: &TradeRecord) -> String {
    match (&record.expiration, &record.strike) {
        (Some(date), Some(strike)) => {
            let marker = record
                .instrument_type
                .map(|t| t.as_str())
                .unwrap_or_default();
            format!("{} {date} {strike}{marker}", record.ticker)
        }
        _ => record.ticker.clone(),
    }
}
