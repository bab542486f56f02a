use crate::db::StoreError;
use crate::models::{SwapRecord, TokenAmount};
use sqlx::{sqlite::SqliteRow, Pool, Row, Sqlite};

fn parse_amount(raw: &str) -> Result<u128, StoreError> {
    raw.parse().map_err(|_| StoreError::Corrupt {
        table: "swaps",
        reason: format!("amount {:?} is not an unsigned integer", raw),
    })
}

fn swap_from_row(row: &SqliteRow) -> Result<SwapRecord, StoreError> {
    Ok(SwapRecord {
        signature: row.get("signature"),
        account: row.get("account"),
        token_in: TokenAmount {
            mint: row.get("token_in"),
            amount: parse_amount(&row.get::<String, _>("amount_in"))?,
        },
        token_out: TokenAmount {
            mint: row.get("token_out"),
            amount: parse_amount(&row.get::<String, _>("amount_out"))?,
        },
        block_time: row.get("block_time"),
    })
}

/// Upsert keyed by signature; replaying a signature rewrites identical content.
pub async fn put_swap(pool: &Pool<Sqlite>, swap: &SwapRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO swaps (signature, account, token_in, amount_in, token_out, amount_out, block_time)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(signature) DO UPDATE SET
            account = excluded.account,
            token_in = excluded.token_in,
            amount_in = excluded.amount_in,
            token_out = excluded.token_out,
            amount_out = excluded.amount_out,
            block_time = excluded.block_time
        "#
    )
    .bind(&swap.signature)
    .bind(&swap.account)
    .bind(&swap.token_in.mint)
    .bind(swap.token_in.amount.to_string())
    .bind(&swap.token_out.mint)
    .bind(swap.token_out.amount.to_string())
    .bind(swap.block_time)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn get_swap(pool: &Pool<Sqlite>, signature: &str) -> Result<Option<SwapRecord>, StoreError> {
    let row = sqlx::query("SELECT * FROM swaps WHERE signature = ?")
        .bind(signature)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(swap_from_row).transpose()
}

pub async fn get_account_token_swaps(
    pool: &Pool<Sqlite>,
    account: &str,
    mint: &str,
) -> Result<Vec<SwapRecord>, StoreError> {
    let rows = sqlx::query(
        r#"SELECT signature, account, token_in, amount_in, token_out, amount_out, block_time
           FROM swaps
           WHERE account = ? AND (token_in = ? OR token_out = ?)
           ORDER BY block_time ASC, signature ASC"#
    )
    .bind(account)
    .bind(mint)
    .bind(mint)
    .fetch_all(pool)
    .await?;

    rows.iter().map(swap_from_row).collect()
}
