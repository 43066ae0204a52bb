//! Daily expiry sweep: close open option positions whose expiration date
//! has passed. Each identity is processed independently so one failed
//! close never aborts the rest.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local, TimeZone};
use sqlx::PgPool;
use tracing::{info, warn};

use crate::market::QuoteSource;
use crate::persistence::{close_trade, find_expiring_option_positions};

/// Local wall-clock time of the daily run, shortly after market close.
const RUN_HOUR: u32 = 16;
const RUN_MINUTE: u32 = 15;

/// Close every expiring option position at a settlement price taken from
/// the quote source (last, falling back to mid; zero when the instrument
/// is not quoted). Returns the number of positions closed.
pub async fn close_expiring_positions<Q: QuoteSource + ?Sized>(pool: &PgPool, quotes: &Q) -> usize {
    let records = find_expiring_option_positions(pool).await;
    let mut closed = 0;
    for record in records {
        let identity = record.identity();
        let settlement = match quotes.quote(&identity).await {
            Some(quote) => quote.last.unwrap_or(quote.mid),
            None => {
                warn!(ticker = %identity.ticker, expiration = ?identity.expiration,
                    "no quote for expiring option, settling at 0");
                0.0
            }
        };
        match close_trade(pool, &identity, settlement).await {
            Ok((entry, close)) => {
                info!(user = %identity.user, ticker = %identity.ticker,
                    entry, close, "closed expiring option");
                closed += 1;
            }
            Err(e) => {
                warn!(user = %identity.user, ticker = %identity.ticker, error = %e,
                    "failed to close expiring option");
            }
        }
    }
    closed
}

/// Run the sweep once per day at the configured local time. Spawned from
/// `main` as a background task.
pub async fn run_daily(pool: PgPool, quotes: Arc<dyn QuoteSource>) {
    loop {
        tokio::time::sleep(duration_until_next_run(Local::now())).await;
        let closed = close_expiring_positions(&pool, quotes.as_ref()).await;
        info!(closed, "expiry sweep finished");
    }
}

fn duration_until_next_run<Tz: TimeZone>(now: DateTime<Tz>) -> Duration {
    let run_today = now
        .date_naive()
        .and_hms_opt(RUN_HOUR, RUN_MINUTE, 0)
        .and_then(|t| now.timezone().from_local_datetime(&t).earliest());
    let Some(run_today) = run_today else {
        return Duration::from_secs(3600);
    };
    let next = if now < run_today {
        run_today
    } else {
        run_today + chrono::Duration::days(1)
    };
    (next - now).to_std().unwrap_or(Duration::from_secs(60))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn next_run_is_today_before_cutoff() {
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap();
        let wait = duration_until_next_run(now);
        assert_eq!(wait, Duration::from_secs((6 * 60 + 15) * 60));
    }

    #[test]
    fn next_run_rolls_over_after_cutoff() {
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 16, 15, 0).unwrap();
        let wait = duration_until_next_run(now);
        assert_eq!(wait, Duration::from_secs(24 * 3600));
    }
}
