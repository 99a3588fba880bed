//! Error types for demo operations.
//!
//! Defines error types for each subsystem:
//! - Demofile loading and validation
//! - Docker container management
//! - Shared directory synchronization
//! - Run/build script execution
//! - Documentation generation and paging

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while locating, reading or validating a demofile.
#[derive(Debug, Error)]
pub enum DemofileError {
    #[error("Need a demo file, run 'demo {command} --help' to learn more")]
    NotFound { command: String },

    #[error("demo file '{}' doesn't exist", .0.display())]
    Missing(PathBuf),

    #[error("couldn't read file '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read '{}' as {format}: {message}", .path.display())]
    Parse {
        path: PathBuf,
        format: &'static str,
        message: String,
    },

    #[error(
        "Some issues were found while parsing '{}':\n{}Run 'demo configure --check' to learn more",
        .path.display(),
        bullet_list(.issues)
    )]
    Invalid { path: PathBuf, issues: Vec<String> },

    #[error(
        "can't find '{name}' in {}. Defined configs: [ {} ] ?",
        .path.display(),
        .available.join(", ")
    )]
    UnknownConfig {
        name: String,
        path: PathBuf,
        available: Vec<String>,
    },

    #[error("unknown section '{0}'")]
    UnknownSection(String),

    #[error("YAML conversion error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Errors that can occur during Docker operations.
#[derive(Debug, Error)]
pub enum DockerError {
    #[error("failed to launch '{command}': {source}")]
    Launch {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{command}' failed: {stderr}")]
    Failed { command: String, stderr: String },

    #[error("'docker inspect' returned unexpected output (expected 'true' or 'false'): {output}")]
    UnexpectedInspect { output: String },

    #[error("Port {0} is busy, choose another with --port or use --no-port")]
    PortBusy(u16),

    #[error("Failed to create the shared directory '{}': {source}", .path.display())]
    SharedDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that can occur while syncing with the shared directory.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Cannot sync from '{}' because it doesn't exist", .0.display())]
    SourceMissing(PathBuf),

    #[error("'{}' has no parent directory to sync into", .0.display())]
    NoParent(PathBuf),

    #[error("failed to launch 'rsync': {0}")]
    Launch(#[source] std::io::Error),

    #[error(
        "Unexpected error syncing '{}' to '{}': {stderr}",
        .source_dir.display(),
        .destination.display()
    )]
    Failed {
        source_dir: PathBuf,
        destination: PathBuf,
        stderr: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur while executing run/build scripts.
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("couldn't read script '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to launch '{command}': {source}")]
    Launch {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to clean before build: {0}")]
    CleanFailed(String),
}

/// Errors that can occur while generating or showing documentation.
#[derive(Debug, Error)]
pub enum DocsError {
    #[error("Tera template rendering error: {0}")]
    Tera(#[from] tera::Error),

    #[error("couldn't write file '{}': {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    MissingData(String),

    #[error("guide '{0}' doesn't exist. Run 'demo docs --make'")]
    GuideNotFound(String),

    #[error("Failed to run less: {0}")]
    Pager(#[source] std::io::Error),

    #[error("less failed: {0}")]
    PagerFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn bullet_list(items: &[String]) -> String {
    items.iter().map(|item| format!("  - {item}\n")).collect()
}
