// sentri-core/src/lib.rs

#![allow(missing_docs)]
// Memory safety
#![deny(unsafe_code)]
// Robustness
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
// Performance
#![warn(clippy::perf)]

// --- HEXAGONAL LAYERS ---

// Contracts towards data sources and alert channels.
pub mod ports;

// Datasets, checks, thresholds, result records, configuration model.
// Depends on nothing else in the crate.
pub mod domain;

// Adapters: config loader, DuckDB connector, report writers, alert plugins.
pub mod infrastructure;

// Use cases: check manager, report generation, alert dispatch, exit policy.
pub mod application;

pub mod error;

// --- FACADE ---
pub use error::SentriError;
