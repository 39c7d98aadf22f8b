// sentri-core/src/infrastructure/adapters/mod.rs

pub mod duckdb;
pub mod retry;

pub use self::duckdb::DuckDbConnector;
pub use retry::retry_with_backoff;
