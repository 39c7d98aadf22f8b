// sentri-core/src/domain/mod.rs

pub mod checks;
pub mod config;
pub mod dataset;
pub mod error;
pub mod report;
pub mod stats;

pub use error::{CheckEvaluationError, DomainError};
