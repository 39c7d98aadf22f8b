// sentri-core/src/ports/mod.rs

pub mod alerting;
pub mod connector;

pub use alerting::AlertPlugin;
pub use connector::DataConnector;
