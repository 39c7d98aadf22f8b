// sentri-core/src/infrastructure/config/mod.rs

pub mod env;
pub mod loader;

pub use env::substitute_env;
pub use loader::{format_validation_errors, load_config, load_config_from_str};
