// sentri-core/src/application/mod.rs

pub mod alerting;
pub mod exit;
pub mod manager;
pub mod output;

// --- FACADE ---
// `use sentri_core::application::{CheckManager, OutputManager};`
pub use alerting::AlertDispatcher;
pub use exit::ExitPolicy;
pub use manager::CheckManager;
pub use output::OutputManager;
