// sentri-core/src/infrastructure/mod.rs

pub mod adapters;
pub mod alerting;
pub mod config;
pub mod error;
pub mod fs;
pub mod output;
