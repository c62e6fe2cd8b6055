use std::time::Duration;

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;

pub type DbPool = sqlx::PgPool;

/// Create the shared Postgres pool used as axum state.
pub async fn create_pool(database_url: &str) -> Result<DbPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await?;
    Ok(pool)
}
