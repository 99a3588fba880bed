//! demo-cli: Enter, run and share Docker demos.
//!
//! This library provides the pieces behind the `demo` command: demofile
//! loading and checking, Docker container lifecycle, shared directory sync,
//! script execution and guide generation.

// Core modules
pub mod cli;
pub mod demofile;
pub mod docker;
pub mod docs;
pub mod error;
pub mod lifecycle;
pub mod paths;
pub mod process;
pub mod script;
pub mod sync;

// Re-export commonly used error types
pub use error::{DemofileError, DockerError, DocsError, ScriptError, SyncError};
