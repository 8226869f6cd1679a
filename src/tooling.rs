//! Tooling & Integration Layer
//!
//! Command-line entry points over the storage driver.

pub mod cli;

pub use cli::{Cli, CliContext, Commands};
