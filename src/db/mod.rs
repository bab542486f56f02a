pub mod account;
pub mod connection;
pub mod migration;
pub mod store;
pub mod swap;
pub mod token;

pub use store::SqliteStore;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Corrupt row in {table}: {reason}")]
    Corrupt { table: &'static str, reason: String },
}
