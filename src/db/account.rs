// Watched accounts and their traversal cursors.

use crate::models::{AccountWatch, CursorUpdate};
use sqlx::{sqlite::SqliteRow, Pool, Row, Sqlite};

fn account_from_row(row: &SqliteRow) -> AccountWatch {
    AccountWatch {
        address: row.get("address"),
        signature_from: row.get("signature_from"),
        signature_to: row.get("signature_to"),
        backfill_complete: row.get::<bool, _>("backfill_complete"),
        added_at: row.get("added_at"),
    }
}

/// Insert or re-seed `address` with both cursors at `signature`.
/// Re-seeding discards earlier progress, including a finished backfill.
pub async fn seed_account(
    pool: &Pool<Sqlite>,
    address: &str,
    signature: &str,
) -> Result<AccountWatch, sqlx::Error> {
    let now = chrono::Utc::now().timestamp();

    sqlx::query(
        "INSERT INTO watched_accounts (address, signature_from, signature_to, backfill_complete, added_at)
         VALUES (?, ?, ?, 0, ?)
         ON CONFLICT(address) DO UPDATE SET
            signature_from = excluded.signature_from,
            signature_to = excluded.signature_to,
            backfill_complete = 0"
    )
    .bind(address)
    .bind(signature)
    .bind(signature)
    .bind(now)
    .execute(pool)
    .await?;

    let row = sqlx::query("SELECT * FROM watched_accounts WHERE address = ?")
        .bind(address)
        .fetch_one(pool)
        .await?;

    Ok(account_from_row(&row))
}

pub async fn get_account(pool: &Pool<Sqlite>, address: &str) -> Result<Option<AccountWatch>, sqlx::Error> {
    let row = sqlx::query("SELECT * FROM watched_accounts WHERE address = ?")
        .bind(address)
        .fetch_optional(pool)
        .await?;

    Ok(row.as_ref().map(account_from_row))
}

pub async fn update_cursors(
    pool: &Pool<Sqlite>,
    address: &str,
    update: &CursorUpdate,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE watched_accounts SET
            signature_from = COALESCE(?, signature_from),
            signature_to = COALESCE(?, signature_to),
            backfill_complete = COALESCE(?, backfill_complete)
         WHERE address = ?"
    )
    .bind(update.signature_from.as_deref())
    .bind(update.signature_to.as_deref())
    .bind(update.backfill_complete)
    .bind(address)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn get_all_watched_addresses(pool: &Pool<Sqlite>) -> Result<Vec<String>, sqlx::Error> {
    let rows = sqlx::query("SELECT address FROM watched_accounts ORDER BY added_at, address")
        .fetch_all(pool)
        .await?;

    Ok(rows.iter().map(|row| row.get("address")).collect())
}

pub async fn remove_account(pool: &Pool<Sqlite>, address: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM watched_accounts WHERE address = ?")
        .bind(address)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
