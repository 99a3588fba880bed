//! Docker CLI client.
//!
//! Every operation is a `docker` subcommand built by a pure function
//! (`*_command`) and executed through a [`CommandRunner`], so argument lists
//! are unit-tested without a docker daemon.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::error::DockerError;
use crate::process::{CommandRunner, ProcessCommand, ProcessOutput, StdioMode};

/// Port the demo's file server listens on inside the container.
pub const CONTAINER_HTTP_PORT: u16 = 4444;

/// Mount point of the shared directory inside the container.
pub const CONTAINER_SHARED_DIR: &str = "/shared";

/// Working directory of the demo's shell.
pub const CONTAINER_WORKDIR: &str = "/root";

/// Container state as reported by `docker inspect`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerState {
    /// No container with that name exists.
    Absent,
    /// The container exists but isn't running.
    Stopped,
    Running,
}

impl fmt::Display for ContainerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerState::Absent => write!(f, "absent"),
            ContainerState::Stopped => write!(f, "stopped"),
            ContainerState::Running => write!(f, "running"),
        }
    }
}

/// A bind mount from the host into the container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeMount {
    pub host_path: PathBuf,
    pub container_path: String,
}

impl VolumeMount {
    pub fn new(host_path: impl Into<PathBuf>, container_path: impl Into<String>) -> Self {
        Self {
            host_path: host_path.into(),
            container_path: container_path.into(),
        }
    }

    /// Docker's `-v` format.
    pub fn to_docker_string(&self) -> String {
        format!("{}:{}", self.host_path.display(), self.container_path)
    }
}

/// Settings for `docker run`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub name: String,
    pub image: String,
    pub volume: Option<VolumeMount>,
    /// Host port mapped to [`CONTAINER_HTTP_PORT`].
    pub port: Option<u16>,
}

impl RunConfig {
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            volume: None,
            port: None,
        }
    }

    /// Mounts `host_dir` at `/shared`.
    pub fn with_shared_dir(mut self, host_dir: impl Into<PathBuf>) -> Self {
        self.volume = Some(VolumeMount::new(host_dir, CONTAINER_SHARED_DIR));
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }
}

fn docker() -> ProcessCommand {
    ProcessCommand::new("docker")
}

pub fn images_command(image: &str) -> ProcessCommand {
    docker().args(["images", "-q", image])
}

pub fn pull_command(image: &str) -> ProcessCommand {
    docker().args(["pull", image])
}

pub fn inspect_command(name: &str) -> ProcessCommand {
    docker().args(["inspect", "-f", "{{.State.Running}}", name])
}

pub fn run_command(config: &RunConfig) -> ProcessCommand {
    let mut cmd = docker().args([
        "run",
        "--name",
        config.name.as_str(),
        "-w",
        CONTAINER_WORKDIR,
    ]);
    if let Some(volume) = &config.volume {
        cmd = cmd.arg("-v").arg(volume.to_docker_string());
    }
    if let Some(port) = config.port {
        cmd = cmd
            .arg("-p")
            .arg(format!("{port}:{CONTAINER_HTTP_PORT}"));
    }
    cmd.args(["-d", "--rm", config.image.as_str()])
}

pub fn exec_shell_command(name: &str) -> ProcessCommand {
    docker().args(["exec", "-it", "-w", CONTAINER_WORKDIR, name, "/bin/bash"])
}

pub fn kill_command(name: &str) -> ProcessCommand {
    docker().args(["kill", name])
}

pub fn remove_command(name: &str) -> ProcessCommand {
    docker().args(["rm", name])
}

/// Maps `docker inspect -f {{.State.Running}}` results to a state.
pub fn parse_inspect(output: &ProcessOutput) -> Result<ContainerState, DockerError> {
    if !output.is_success() {
        return Ok(ContainerState::Absent);
    }
    let trimmed = output.stdout.trim();
    let unquoted = trimmed
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .unwrap_or(trimmed);
    match unquoted {
        "true" => Ok(ContainerState::Running),
        "false" => Ok(ContainerState::Stopped),
        _ => Err(DockerError::UnexpectedInspect {
            output: trimmed.to_string(),
        }),
    }
}

/// Client for the `docker` command line tool.
#[derive(Clone)]
pub struct DockerClient {
    runner: Arc<dyn CommandRunner>,
    quiet: bool,
}

impl DockerClient {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            quiet: false,
        }
    }

    /// Captures the output of `pull` and `run` instead of showing progress.
    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    fn progress_mode(&self) -> StdioMode {
        if self.quiet {
            StdioMode::Capture
        } else {
            StdioMode::Inherit
        }
    }

    async fn execute(
        &self,
        command: ProcessCommand,
        stdio: StdioMode,
    ) -> Result<ProcessOutput, DockerError> {
        let output = self
            .runner
            .run(&command, stdio)
            .await
            .map_err(|source| DockerError::Launch {
                command: command.label(),
                source,
            })?;
        if !output.is_success() {
            return Err(DockerError::Failed {
                command: command.label(),
                stderr: output.failure_message(),
            });
        }
        Ok(output)
    }

    /// Whether `image` is available locally.
    pub async fn image_exists(&self, image: &str) -> Result<bool, DockerError> {
        let output = self
            .execute(images_command(image), StdioMode::Capture)
            .await?;
        Ok(!output.stdout.trim().is_empty())
    }

    pub async fn pull_image(&self, image: &str) -> Result<(), DockerError> {
        info!(image = %image, "Pulling image");
        self.execute(pull_command(image), self.progress_mode())
            .await?;
        Ok(())
    }

    pub async fn container_state(&self, name: &str) -> Result<ContainerState, DockerError> {
        let command = inspect_command(name);
        let output = self
            .runner
            .run(&command, StdioMode::Capture)
            .await
            .map_err(|source| DockerError::Launch {
                command: command.label(),
                source,
            })?;
        let state = parse_inspect(&output)?;
        debug!(container = %name, state = %state, "Inspected container");
        Ok(state)
    }

    /// Starts a detached container that is removed when it stops.
    pub async fn run_container(&self, config: &RunConfig) -> Result<(), DockerError> {
        info!(container = %config.name, image = %config.image, "Starting container");
        self.execute(run_command(config), self.progress_mode())
            .await?;
        Ok(())
    }

    /// Attaches the terminal to a bash shell in the container.
    pub async fn exec_shell(&self, name: &str) -> Result<(), DockerError> {
        self.execute(exec_shell_command(name), StdioMode::Inherit)
            .await?;
        Ok(())
    }

    pub async fn kill_container(&self, name: &str) -> Result<(), DockerError> {
        info!(container = %name, "Killing container");
        self.execute(kill_command(name), StdioMode::Capture).await?;
        Ok(())
    }

    pub async fn remove_container(&self, name: &str) -> Result<(), DockerError> {
        info!(container = %name, "Removing container");
        self.execute(remove_command(name), StdioMode::Capture)
            .await?;
        Ok(())
    }
}

/// Resolves `dir` against `cwd` unless it is already absolute.
pub fn absolute_shared_dir(dir: &Path, cwd: &Path) -> PathBuf {
    if dir.is_absolute() {
        dir.to_path_buf()
    } else {
        cwd.join(dir)
    }
}
