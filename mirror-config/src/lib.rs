//! Configuration management for the mirror services.
//!
//! Provides environment detection, configuration loading from YAML files with
//! environment variable overrides, secret handling, and the shared
//! configuration types consumed by the orchestrator.

mod environment;
mod load;
mod secret;
pub mod shared;

pub use environment::*;
pub use load::*;
pub use secret::*;
