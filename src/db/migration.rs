use sqlx::SqlitePool;
use tracing::info;

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    info!("Running database migrations...");

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS watched_accounts (
            address TEXT PRIMARY KEY,
            signature_from TEXT,
            signature_to TEXT,
            backfill_complete BOOLEAN NOT NULL DEFAULT 0,
            added_at INTEGER NOT NULL
        )"
    )
    .execute(pool)
    .await?;

    // Amounts are decimal text: raw token amounts do not fit in INTEGER
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS swaps (
            signature TEXT PRIMARY KEY,
            account TEXT NOT NULL,
            token_in TEXT NOT NULL,
            amount_in TEXT NOT NULL,
            token_out TEXT NOT NULL,
            amount_out TEXT NOT NULL,
            block_time INTEGER
        )"
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_swaps_account_token_in
         ON swaps(account, token_in)"
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_swaps_account_token_out
         ON swaps(account, token_out)"
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS token_metadata (
            mint TEXT PRIMARY KEY,
            name TEXT,
            symbol TEXT,
            decimals INTEGER,
            fetched_at INTEGER NOT NULL
        )"
    )
    .execute(pool)
    .await?;

    info!("Database migrations completed successfully");
    Ok(())
}
