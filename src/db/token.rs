use crate::models::TokenMetadata;
use sqlx::{Pool, QueryBuilder, Row, Sqlite};

pub async fn get_tokens_metadata(
    pool: &Pool<Sqlite>,
    mints: &[String],
) -> Result<Vec<TokenMetadata>, sqlx::Error> {
    if mints.is_empty() {
        return Ok(Vec::new());
    }

    let mut query = QueryBuilder::<Sqlite>::new(
        "SELECT mint, name, symbol, decimals FROM token_metadata WHERE mint IN (",
    );
    let mut separated = query.separated(", ");
    for mint in mints {
        separated.push_bind(mint);
    }
    separated.push_unseparated(")");

    let rows = query.build().fetch_all(pool).await?;

    Ok(rows
        .iter()
        .map(|row| TokenMetadata {
            address: row.get("mint"),
            name: row.get("name"),
            symbol: row.get("symbol"),
            decimals: row
                .get::<Option<i64>, _>("decimals")
                .and_then(|d| u8::try_from(d).ok()),
        })
        .collect())
}

pub async fn put_token_metadata(pool: &Pool<Sqlite>, metadata: &TokenMetadata) -> Result<(), sqlx::Error> {
    let now = chrono::Utc::now().timestamp();

    sqlx::query(
        "INSERT INTO token_metadata (mint, name, symbol, decimals, fetched_at)
         VALUES (?, ?, ?, ?, ?)
         ON CONFLICT(mint) DO UPDATE SET
            name = excluded.name,
            symbol = excluded.symbol,
            decimals = excluded.decimals,
            fetched_at = excluded.fetched_at"
    )
    .bind(&metadata.address)
    .bind(&metadata.name)
    .bind(&metadata.symbol)
    .bind(metadata.decimals.map(i64::from))
    .bind(now)
    .execute(pool)
    .await?;

    Ok(())
}
