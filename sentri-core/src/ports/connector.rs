// sentri-core/src/ports/connector.rs

// What the engine needs from a data source, without knowing where rows come from.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::dataset::Dataset;
use crate::error::SentriError;

#[async_trait]
pub trait DataConnector: Send + Sync {
    /// Cheap reachability check (file exists, database opens, query prepares).
    async fn validate_connection(&self) -> Result<(), SentriError>;

    /// Rows whose date column falls in `[start_date, end_date]`, column names lowercased.
    async fn fetch(&self, start_date: NaiveDate, end_date: NaiveDate) -> Result<Dataset, SentriError>;

    fn name(&self) -> &str;
}
