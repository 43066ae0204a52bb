//! Database pool and migrations.

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Create a pool from the database URL and run migrations. Pool size is
/// taken from `DB_MAX_CONNECTIONS` when set.
pub async fn create_pool_and_migrate(database_url: &str) -> Result<PgPool, sqlx::Error> {
    let size = max_connections(std::env::var("DB_MAX_CONNECTIONS").ok());
    let pool = PgPoolOptions::new()
        .max_connections(size)
        .connect(database_url)
        .await?;
    run_migrations(&pool).await?;
    Ok(pool)
}

/// Run embedded migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

fn max_connections(raw: Option<String>) -> u32 {
    raw.and_then(|v| v.trim().parse().ok())
        .filter(|n| *n > 0)
        .unwrap_or(DEFAULT_MAX_CONNECTIONS)
}
