//! # Lumen
//!
//! Driver for the lumen light engine: loads a [`LumenConfig`], sets up logging and runs a
//! soak of random block edits against a generated world, optionally checking the result
//! against a from-scratch relight.

pub mod config;
pub mod logger;
pub mod soak;

pub use config::{ConfigError, LumenConfig};
pub use soak::{SoakSummary, run};
