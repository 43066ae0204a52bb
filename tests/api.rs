//! HTTP surface tests that run without a database: health, tag validation,
//! and request validation happen before any query is issued.

use axum::response::IntoResponse;
use sqlx::PgPool;
use trade_ledger::api::routes::{AppState, app_router};
use trade_ledger::error::LedgerError;

/// Lazy pool pointed at an unreachable address: handlers under test must
/// not touch the database.
fn test_state() -> AppState {
    let db = PgPool::connect_lazy("postgres://postgres@127.0.0.1:1/trade_ledger_test")
        .expect("lazy pool");
    AppState { db, quotes: None }
}

/// Spawn the app on a random port and return (base_url, guard that keeps
/// the server running).
async fn spawn_app(state: AppState) -> (String, tokio::task::JoinHandle<()>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let base_url = format!("http://{}", addr);
    let app = app_router(state);
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (base_url, handle)
}

#[test]
fn error_variants_map_to_status_codes() {
    assert_eq!(LedgerError::AlreadyOpen.into_response().status(), 409);
    assert_eq!(LedgerError::avg_down_slots_full().into_response().status(), 409);
    assert_eq!(LedgerError::trim_slots_full().into_response().status(), 409);
    assert_eq!(LedgerError::NotOpen.into_response().status(), 404);
    assert_eq!(
        LedgerError::InvalidParameter("bad tag".to_string())
            .into_response()
            .status(),
        422
    );
    assert_eq!(
        LedgerError::Storage(sqlx::Error::PoolClosed)
            .into_response()
            .status(),
        500
    );
}

#[tokio::test]
async fn storage_error_detail_is_redacted_from_the_body() {
    let response = LedgerError::Storage(sqlx::Error::PoolClosed).into_response();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "storage error");
}

#[tokio::test]
async fn health_returns_healthy() {
    let (base_url, _handle) = spawn_app(test_state()).await;
    let res = reqwest::get(format!("{base_url}/health")).await.unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "healthy");
}

#[tokio::test]
async fn stats_rejects_unknown_timeframe() {
    let (base_url, _handle) = spawn_app(test_state()).await;
    let res = reqwest::get(format!(
        "{base_url}/stats?user=trader&timeframe=fortnightly&status=all"
    ))
    .await
    .unwrap();
    assert_eq!(res.status(), 422);
    let body: serde_json::Value = res.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("timeframe"));
}

#[tokio::test]
async fn trades_rejects_unknown_status() {
    let (base_url, _handle) = spawn_app(test_state()).await;
    let res = reqwest::get(format!(
        "{base_url}/trades?user=trader&timeframe=all&status=pending"
    ))
    .await
    .unwrap();
    assert_eq!(res.status(), 422);
}

#[tokio::test]
async fn open_requires_a_price_without_quote_source() {
    let (base_url, _handle) = spawn_app(test_state()).await;
    let client = reqwest::Client::new();
    let res = client
        .post(format!("{base_url}/trades/open"))
        .json(&serde_json::json!({ "user": "trader", "ticker": "AAPL" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 422);
}

#[tokio::test]
async fn open_rejects_non_positive_quantity() {
    let (base_url, _handle) = spawn_app(test_state()).await;
    let client = reqwest::Client::new();
    let res = client
        .post(format!("{base_url}/trades/open"))
        .json(&serde_json::json!({
            "user": "trader", "ticker": "AAPL", "price": 100.0, "qty": 0
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 422);
}

#[tokio::test]
async fn avg_requires_a_quantity() {
    let (base_url, _handle) = spawn_app(test_state()).await;
    let client = reqwest::Client::new();
    let res = client
        .post(format!("{base_url}/trades/avg"))
        .json(&serde_json::json!({ "user": "trader", "ticker": "AAPL", "price": 95.0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 422);
}
