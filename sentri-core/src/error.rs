// sentri-core/src/error.rs

use crate::domain::error::DomainError;
use crate::infrastructure::error::InfrastructureError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SentriError {
    // --- DOMAIN (datasets, check configuration) ---
    #[error(transparent)]
    Domain(#[from] DomainError),

    // --- INFRASTRUCTURE (IO, YAML, DuckDB, writers) ---
    #[error(transparent)]
    Infrastructure(#[from] InfrastructureError),

    // --- APPLICATION ---
    #[error("Internal Error: {0}")]
    InternalError(String),
}

impl From<std::io::Error> for SentriError {
    fn from(err: std::io::Error) -> Self {
        SentriError::Infrastructure(InfrastructureError::Io(err))
    }
}
