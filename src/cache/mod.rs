//! Token metadata caching

pub mod token;

pub use token::TokenMetadataCache;
