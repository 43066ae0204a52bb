//! HTTP surface: thin handlers over the ledger and the stats aggregator.

use std::str::FromStr;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::PgPool;
use tracing::error;

use crate::error::LedgerError;
use crate::market::{self, QuoteSource};
use crate::persistence;
use crate::stats::TradeStats;
use crate::types::filters::{StatusFilter, Timeframe};
use crate::types::trade::{InstrumentType, TradeIdentity, TradeRecord};

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Optional market-data collaborator; without it, requests must carry
    /// an explicit positive price and no sanity band is applied.
    pub quotes: Option<Arc<dyn QuoteSource>>,
}

pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/trades/open", post(open_position))
        .route("/trades/avg", post(avg_down_position))
        .route("/trades/trim", post(trim_position))
        .route("/trades/close", post(close_position))
        .route("/trades", get(list_positions))
        .route("/stats", get(stats_report))
        .with_state(state)
}

async fn health() -> &'static str {
    "healthy"
}

impl IntoResponse for LedgerError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::AlreadyOpen | Self::SlotsFull { .. } => StatusCode::CONFLICT,
            Self::NotOpen => StatusCode::NOT_FOUND,
            Self::InvalidParameter(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Storage(e) => {
                error!(error = %e, "storage failure");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let message = match &self {
            Self::Storage(_) => "storage error".to_string(),
            other => other.to_string(),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct OrderRequest {
    pub user: String,
    pub ticker: String,
    pub expiration: Option<String>,
    pub strike: Option<String>,
    pub instrument_type: Option<InstrumentType>,
    /// Omitted or non-positive resolves against the quote source.
    pub price: Option<f64>,
    pub qty: Option<i64>,
}

impl OrderRequest {
    fn identity(&self) -> TradeIdentity {
        TradeIdentity {
            user: self.user.clone(),
            ticker: self.ticker.to_uppercase(),
            expiration: self.expiration.clone(),
            strike: self.strike.clone(),
            instrument_type: self.instrument_type,
        }
    }
}

/// Resolve the order price through the quote source when one is wired,
/// otherwise require an explicit positive price.
async fn resolve_price(state: &AppState, req: &OrderRequest) -> Result<f64, LedgerError> {
    let identity = req.identity();
    match &state.quotes {
        Some(quotes) => {
            let quote = quotes.quote(&identity).await.ok_or_else(|| {
                LedgerError::InvalidParameter(format!("ticker {} not found", identity.ticker))
            })?;
            let price = market::resolve_order_price(req.price, &quote);
            market::validate_order_price(
                &identity.ticker,
                identity.instrument_type,
                price,
                quote.mid,
            )?;
            Ok(price)
        }
        None => match req.price {
            Some(p) if p > 0.0 => Ok(p),
            _ => Err(LedgerError::InvalidParameter(
                "a positive price is required".to_string(),
            )),
        },
    }
}

#[derive(Debug, Serialize)]
struct OpenResponse {
    entry_price: f64,
    closing_price: Option<f64>,
}

async fn open_position(
    State(state): State<AppState>,
    Json(req): Json<OrderRequest>,
) -> Result<impl IntoResponse, LedgerError> {
    let price = resolve_price(&state, &req).await?;
    let qty = req.qty.unwrap_or(1);
    if qty < 1 {
        return Err(LedgerError::InvalidParameter(
            "quantity must be at least 1".to_string(),
        ));
    }
    let (entry_price, closing_price) =
        persistence::open_trade(&state.db, &req.identity(), price, qty).await?;
    Ok((
        StatusCode::CREATED,
        Json(OpenResponse {
            entry_price,
            closing_price,
        }),
    ))
}

#[derive(Debug, Serialize)]
struct AvgDownResponse {
    avg_entry_price: f64,
    avg_down_count: usize,
}

async fn avg_down_position(
    State(state): State<AppState>,
    Json(req): Json<OrderRequest>,
) -> Result<impl IntoResponse, LedgerError> {
    let qty = req.qty.ok_or_else(|| {
        LedgerError::InvalidParameter("avg requires a positive quantity".to_string())
    })?;
    if qty < 1 {
        return Err(LedgerError::InvalidParameter(
            "avg requires a positive quantity".to_string(),
        ));
    }
    let price = resolve_price(&state, &req).await?;
    let (avg_entry_price, avg_down_count) =
        persistence::avg_down_trade(&state.db, &req.identity(), price, qty).await?;
    Ok(Json(AvgDownResponse {
        avg_entry_price,
        avg_down_count,
    }))
}

#[derive(Debug, Serialize)]
struct TrimResponse {
    avg_entry_price: f64,
    trim_count: usize,
}

async fn trim_position(
    State(state): State<AppState>,
    Json(req): Json<OrderRequest>,
) -> Result<impl IntoResponse, LedgerError> {
    let price = resolve_price(&state, &req).await?;
    let (avg_entry_price, trim_count) =
        persistence::trim_trade(&state.db, &req.identity(), price).await?;
    Ok(Json(TrimResponse {
        avg_entry_price,
        trim_count,
    }))
}

#[derive(Debug, Serialize)]
struct CloseResponse {
    avg_entry_price: f64,
    closing_price: f64,
}

async fn close_position(
    State(state): State<AppState>,
    Json(req): Json<OrderRequest>,
) -> Result<impl IntoResponse, LedgerError> {
    let price = resolve_price(&state, &req).await?;
    let (avg_entry_price, closing_price) =
        persistence::close_trade(&state.db, &req.identity(), price).await?;
    Ok(Json(CloseResponse {
        avg_entry_price,
        closing_price,
    }))
}

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub user: String,
    pub timeframe: Option<String>,
    pub status: Option<String>,
}

impl StatsQuery {
    fn parse_tags(&self) -> Result<(Timeframe, StatusFilter), LedgerError> {
        let timeframe = Timeframe::from_str(self.timeframe.as_deref().unwrap_or("all"))?;
        let status = StatusFilter::from_str(self.status.as_deref().unwrap_or("all"))?;
        Ok((timeframe, status))
    }
}

async fn list_positions(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<Vec<TradeRecord>>, LedgerError> {
    let (timeframe, status) = query.parse_tags()?;
    let records = persistence::list_trades(&state.db, &query.user, timeframe, status).await;
    Ok(Json(records))
}

#[derive(Debug, Serialize)]
struct StatsResponse {
    counts: crate::stats::BasicCounts,
    win_rates: crate::stats::WinRates,
    pnl_by_class: crate::stats::PnlByClass,
    activity: crate::stats::Activity,
    hold_time: Option<crate::stats::HoldTime>,
    report: String,
}

async fn stats_report(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<StatsResponse>, LedgerError> {
    let (timeframe, status) = query.parse_tags()?;
    let records = persistence::list_trades(&state.db, &query.user, timeframe, status).await;
    let stats = TradeStats::new(records);
    Ok(Json(StatsResponse {
        counts: stats.basic_counts(),
        win_rates: stats.win_rates(),
        pnl_by_class: stats.pnl_by_class(),
        activity: stats.activity(),
        hold_time: stats.hold_time(),
        report: stats.format_report(),
    }))
}
