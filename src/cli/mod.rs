//! Command-line interface for demo.
//!
//! Provides commands for entering and stopping demo containers, running and
//! building demos, sharing files and reading generated guides.

mod commands;
pub mod usage;

pub use commands::{dispatch, parse_cli, run_with_cli, Cli, Commands, Env};
