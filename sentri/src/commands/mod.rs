// sentri/src/commands/mod.rs

pub mod run;
pub mod validate;
