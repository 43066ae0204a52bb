//! Database layer: pool, migrations, and the trade ledger operations.

mod pool;
mod trades;

pub use pool::{create_pool_and_migrate, run_migrations};
pub use sqlx::PgPool;
pub use trades::{
    TradeRow, avg_down_trade, close_trade, find_expiring_option_positions, is_trade_open,
    list_trades, open_trade, trade_row_to_record, trim_trade,
};
