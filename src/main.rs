use std::sync::Arc;

use trade_ledger::api::routes::{AppState, app_router};
use trade_ledger::market::{FixedQuoteSource, QuoteSource};
use trade_ledger::persistence::create_pool_and_migrate;
use trade_ledger::sweep;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trade_ledger=info,sqlx=warn".into()),
        )
        .init();

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = create_pool_and_migrate(&database_url)
        .await
        .expect("database setup failed");

    // Expired options settle at a fixed price until a broker is wired in.
    let settlement = std::env::var("EXPIRY_SETTLEMENT_PRICE")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(0.01);
    let sweep_quotes: Arc<dyn QuoteSource> = Arc::new(FixedQuoteSource::new(settlement));
    tokio::spawn(sweep::run_daily(pool.clone(), sweep_quotes));

    let state = AppState {
        db: pool,
        quotes: None,
    };
    let bind = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .expect("failed to bind listener");
    tracing::info!(%bind, "trade ledger listening");
    axum::serve(listener, app_router(state))
        .await
        .expect("server error");
}
