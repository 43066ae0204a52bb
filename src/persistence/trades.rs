//! Trade ledger persistence: lifecycle mutations and read queries.
//!
//! Every mutation is an atomic check-then-write: it locks the matching open
//! row with `SELECT ... FOR UPDATE` inside one transaction, so two racing
//! callers cannot both pass the "already open" or "slot full" checks. A
//! partial unique index on the open identity backs up the open/open race.
//! Read-only queries recover storage errors locally (logged, empty result).

use chrono::{DateTime, Local, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{info, warn};
use uuid::Uuid;

use crate::dates::parse_expiration;
use crate::error::LedgerError;
use crate::pricing::weighted_entry_price;
use crate::types::filters::{StatusFilter, Timeframe};
use crate::types::trade::{
    AvgDown, InstrumentType, MAX_AVG_DOWNS, MAX_TRIMS, TradeIdentity, TradeRecord,
};

#[derive(Debug, sqlx::FromRow)]
pub struct TradeRow {
    pub id: Uuid,
    pub username: String,
    pub ticker: String,
    pub expiration: Option<String>,
    pub strike: Option<String>,
    pub instrument_type: Option<String>,
    pub entry_price: f64,
    pub entry_qty: i64,
    pub avg_down1_price: Option<f64>,
    pub avg_down1_qty: Option<i64>,
    pub avg_down2_price: Option<f64>,
    pub avg_down2_qty: Option<i64>,
    pub trim1: Option<f64>,
    pub trim2: Option<f64>,
    pub trim3: Option<f64>,
    pub trim4: Option<f64>,
    pub closing_price: Option<f64>,
    pub is_open: bool,
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

const TRADE_COLUMNS: &str = "id, username, ticker, expiration, strike, instrument_type, \
     entry_price, entry_qty, avg_down1_price, avg_down1_qty, avg_down2_price, avg_down2_qty, \
     trim1, trim2, trim3, trim4, closing_price, is_open, opened_at, closed_at";

/// Convert a flat row into the domain record with slot arrays. A slot is
/// filled iff its price column is set; a missing quantity on a legacy
/// avg-down row counts as zero.
pub fn trade_row_to_record(row: &TradeRow) -> TradeRecord {
    let avg_slot = |price: Option<f64>, qty: Option<i64>| {
        price.map(|p| AvgDown {
            price: p,
            qty: qty.unwrap_or(0),
        })
    };
    TradeRecord {
        id: row.id,
        user: row.username.clone(),
        ticker: row.ticker.clone(),
        expiration: row.expiration.clone(),
        strike: row.strike.clone(),
        instrument_type: row
            .instrument_type
            .as_deref()
            .and_then(InstrumentType::from_marker),
        entry_price: row.entry_price,
        entry_qty: row.entry_qty,
        avg_downs: [
            avg_slot(row.avg_down1_price, row.avg_down1_qty),
            avg_slot(row.avg_down2_price, row.avg_down2_qty),
        ],
        trims: [row.trim1, row.trim2, row.trim3, row.trim4],
        closing_price: row.closing_price,
        is_open: row.is_open,
        opened_at: row.opened_at,
        closed_at: row.closed_at,
    }
}

/// Lock the open row matching the identity. Omitted optional key fields do
/// not constrain the match.
async fn lock_open_row(
    tx: &mut Transaction<'_, Postgres>,
    identity: &TradeIdentity,
) -> Result<Option<TradeRow>, sqlx::Error> {
    let sql = format!(
        "SELECT {TRADE_COLUMNS} FROM trades \
         WHERE username = $1 AND ticker = $2 AND is_open \
           AND ($3::text IS NULL OR expiration = $3) \
           AND ($4::text IS NULL OR strike = $4) \
           AND ($5::text IS NULL OR instrument_type = $5) \
         FOR UPDATE"
    );
    sqlx::query_as::<_, TradeRow>(&sql)
        .bind(&identity.user)
        .bind(&identity.ticker)
        .bind(identity.expiration.as_deref())
        .bind(identity.strike.as_deref())
        .bind(identity.instrument_type.map(InstrumentType::as_str))
        .fetch_optional(&mut **tx)
        .await
}

/// True iff an open record matches the identity. Never fails: a storage
/// error is logged and reported as not-open.
pub async fn is_trade_open(pool: &PgPool, identity: &TradeIdentity) -> bool {
    let result = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM trades \
         WHERE username = $1 AND ticker = $2 AND is_open \
           AND ($3::text IS NULL OR expiration = $3) \
           AND ($4::text IS NULL OR strike = $4) \
           AND ($5::text IS NULL OR instrument_type = $5)",
    )
    .bind(&identity.user)
    .bind(&identity.ticker)
    .bind(identity.expiration.as_deref())
    .bind(identity.strike.as_deref())
    .bind(identity.instrument_type.map(InstrumentType::as_str))
    .fetch_one(pool)
    .await;
    match result {
        Ok(count) => count > 0,
        Err(e) => {
            warn!(user = %identity.user, ticker = %identity.ticker, error = %e,
                "is_trade_open check failed");
            false
        }
    }
}

/// Open a new position. Returns the entry price and a `None` closing price
/// (the position has no exit yet).
pub async fn open_trade(
    pool: &PgPool,
    identity: &TradeIdentity,
    price: f64,
    qty: i64,
) -> Result<(f64, Option<f64>), LedgerError> {
    let mut tx = pool.begin().await?;
    if lock_open_row(&mut tx, identity).await?.is_some() {
        return Err(LedgerError::AlreadyOpen);
    }

    let insert = sqlx::query(
        "INSERT INTO trades (id, username, ticker, expiration, strike, instrument_type, \
             entry_price, entry_qty, is_open, opened_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, TRUE, $9)",
    )
    .bind(Uuid::new_v4())
    .bind(&identity.user)
    .bind(&identity.ticker)
    .bind(identity.expiration.as_deref())
    .bind(identity.strike.as_deref())
    .bind(identity.instrument_type.map(InstrumentType::as_str))
    .bind(price)
    .bind(qty)
    .bind(Utc::now())
    .execute(&mut *tx)
    .await;
    match insert {
        Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
            return Err(LedgerError::AlreadyOpen);
        }
        other => other?,
    };
    tx.commit().await?;

    info!(user = %identity.user, ticker = %identity.ticker, price, qty, "opened position");
    Ok((price, None))
}

/// Fill the next empty average-down slot. Returns the recomputed weighted
/// entry price and the new filled slot count (1 or 2).
pub async fn avg_down_trade(
    pool: &PgPool,
    identity: &TradeIdentity,
    price: f64,
    qty: i64,
) -> Result<(f64, usize), LedgerError> {
    let mut tx = pool.begin().await?;
    let Some(row) = lock_open_row(&mut tx, identity).await? else {
        return Err(LedgerError::NotOpen);
    };
    let mut record = trade_row_to_record(&row);

    let slot = record.avg_down_count();
    if slot >= MAX_AVG_DOWNS {
        return Err(LedgerError::avg_down_slots_full());
    }
    let update = match slot {
        0 => "UPDATE trades SET avg_down1_price = $1, avg_down1_qty = $2 WHERE id = $3",
        _ => "UPDATE trades SET avg_down2_price = $1, avg_down2_qty = $2 WHERE id = $3",
    };
    sqlx::query(update)
        .bind(price)
        .bind(qty)
        .bind(row.id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    record.avg_downs[slot] = Some(AvgDown { price, qty });
    info!(user = %identity.user, ticker = %identity.ticker, price, qty,
        slot = slot + 1, "averaged down position");
    Ok((weighted_entry_price(&record), slot + 1))
}

/// Fill the next empty trim slot. Returns the (unchanged) weighted entry
/// price and the new trim count (1-4). Trimming does not close.
pub async fn trim_trade(
    pool: &PgPool,
    identity: &TradeIdentity,
    price: f64,
) -> Result<(f64, usize), LedgerError> {
    let mut tx = pool.begin().await?;
    let Some(row) = lock_open_row(&mut tx, identity).await? else {
        return Err(LedgerError::NotOpen);
    };
    let record = trade_row_to_record(&row);

    let slot = record.trim_count();
    if slot >= MAX_TRIMS {
        return Err(LedgerError::trim_slots_full());
    }
    let update = match slot {
        0 => "UPDATE trades SET trim1 = $1 WHERE id = $2",
        1 => "UPDATE trades SET trim2 = $1 WHERE id = $2",
        2 => "UPDATE trades SET trim3 = $1 WHERE id = $2",
        _ => "UPDATE trades SET trim4 = $1 WHERE id = $2",
    };
    sqlx::query(update)
        .bind(price)
        .bind(row.id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    info!(user = %identity.user, ticker = %identity.ticker, price,
        slot = slot + 1, "trimmed position");
    Ok((weighted_entry_price(&record), slot + 1))
}

/// Close the position: set the closing price, mark closed, timestamp.
/// Returns the weighted entry price and the closing price.
pub async fn close_trade(
    pool: &PgPool,
    identity: &TradeIdentity,
    closing_price: f64,
) -> Result<(f64, f64), LedgerError> {
    let mut tx = pool.begin().await?;
    let Some(row) = lock_open_row(&mut tx, identity).await? else {
        return Err(LedgerError::NotOpen);
    };
    let record = trade_row_to_record(&row);

    sqlx::query("UPDATE trades SET is_open = FALSE, closed_at = $1, closing_price = $2 WHERE id = $3")
        .bind(Utc::now())
        .bind(closing_price)
        .bind(row.id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    info!(user = %identity.user, ticker = %identity.ticker, closing_price, "closed position");
    Ok((weighted_entry_price(&record), closing_price))
}

/// Records for a user within a timeframe and status, in insertion order.
/// Storage errors are logged and reported as an empty result (reads favor
/// availability); empty is a valid outcome, not an error.
pub async fn list_trades(
    pool: &PgPool,
    user: &str,
    timeframe: Timeframe,
    status: StatusFilter,
) -> Vec<TradeRecord> {
    let sql = format!(
        "SELECT {TRADE_COLUMNS} FROM trades \
         WHERE username = $1 AND opened_at >= $2 \
           AND ($3::bool IS NULL OR is_open = $3) \
         ORDER BY seq"
    );
    let rows = sqlx::query_as::<_, TradeRow>(&sql)
        .bind(user)
        .bind(timeframe.start())
        .bind(status.as_open_flag())
        .fetch_all(pool)
        .await;
    match rows {
        Ok(rows) => rows.iter().map(trade_row_to_record).collect(),
        Err(e) => {
            warn!(user, error = %e, "list_trades failed");
            Vec::new()
        }
    }
}

/// Open option positions whose expiration date is on or before today.
/// Rows with unparseable expiration strings are skipped and logged; the
/// scan never aborts on one bad record.
pub async fn find_expiring_option_positions(pool: &PgPool) -> Vec<TradeRecord> {
    let sql = format!(
        "SELECT {TRADE_COLUMNS} FROM trades \
         WHERE is_open AND instrument_type IN ('C', 'P') AND expiration IS NOT NULL \
         ORDER BY seq"
    );
    let rows = match sqlx::query_as::<_, TradeRow>(&sql).fetch_all(pool).await {
        Ok(rows) => rows,
        Err(e) => {
            warn!(error = %e, "find_expiring_option_positions failed");
            return Vec::new();
        }
    };

    let today = Local::now().date_naive();
    rows.iter()
        .filter_map(|row| {
            let record = trade_row_to_record(row);
            match record.expiration.as_deref().and_then(parse_expiration) {
                Some(date) if date <= today => Some(record),
                Some(_) => None,
                None => {
                    warn!(ticker = %record.ticker, expiration = ?record.expiration,
                        "skipping option position with unparseable expiration");
                    None
                }
            }
        })
        .collect()
}
