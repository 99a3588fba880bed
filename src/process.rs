//! External process execution.
//!
//! Every external binary the CLI drives (`docker`, `rsync`, `/bin/bash`,
//! `less`) goes through a [`ProcessCommand`] value and a [`CommandRunner`].
//! Building the command is pure and unit-tested; running it is the only part
//! that touches the system.

use std::fmt;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

/// A fully-specified external command: program plus argument list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessCommand {
    /// Program to execute (looked up on `PATH` unless absolute).
    pub program: String,
    /// Arguments, in order.
    pub args: Vec<String>,
}

impl ProcessCommand {
    /// Creates a command with no arguments.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Appends a single argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Short label such as `docker inspect`, used in error messages.
    pub fn label(&self) -> String {
        match self.args.first() {
            Some(sub) => format!("{} {}", self.program, sub),
            None => self.program.clone(),
        }
    }
}

impl fmt::Display for ProcessCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// How the child's standard streams are connected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StdioMode {
    /// Capture stdout and stderr; stdin is closed.
    Capture,
    /// Attach all streams to the terminal.
    Inherit,
    /// Stream stdout to the terminal, capture stderr.
    StreamStdout,
}

/// Result of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code, `None` when terminated by a signal.
    pub code: Option<i32>,
    /// Captured stdout (empty unless captured).
    pub stdout: String,
    /// Captured stderr (empty unless captured).
    pub stderr: String,
}

impl ProcessOutput {
    /// A successful exit with the given stdout.
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// A failed exit with the given code and stderr.
    pub fn failure(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Whether the process exited with status zero.
    pub fn is_success(&self) -> bool {
        self.code == Some(0)
    }

    /// Trimmed stderr, or a description of the exit status when stderr is empty.
    pub fn failure_message(&self) -> String {
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            return stderr.to_string();
        }
        match self.code {
            Some(code) => format!("exited with code {code}"),
            None => "terminated by a signal".to_string(),
        }
    }
}

/// Trait for anything that can execute a [`ProcessCommand`].
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs the command to completion.
    ///
    /// An `Err` means the process could not be launched at all; a launched
    /// process that fails is reported through [`ProcessOutput::code`].
    async fn run(&self, command: &ProcessCommand, stdio: StdioMode)
        -> std::io::Result<ProcessOutput>;
}

/// Runs commands on the host with `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(
        &self,
        command: &ProcessCommand,
        stdio: StdioMode,
    ) -> std::io::Result<ProcessOutput> {
        debug!(command = %command, mode = ?stdio, "Spawning process");

        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args);

        match stdio {
            StdioMode::Capture => {
                cmd.stdin(Stdio::null())
                    .stdout(Stdio::piped())
                    .stderr(Stdio::piped());
            }
            StdioMode::Inherit => {
                cmd.stdin(Stdio::inherit())
                    .stdout(Stdio::inherit())
                    .stderr(Stdio::inherit());
            }
            StdioMode::StreamStdout => {
                cmd.stdin(Stdio::inherit())
                    .stdout(Stdio::inherit())
                    .stderr(Stdio::piped());
            }
        }

        let output = cmd.spawn()?.wait_with_output().await?;
        let result = ProcessOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        };

        debug!(command = %command.label(), code = ?result.code, "Process finished");
        Ok(result)
    }
}
