//! Bringing a demo container up.
//!
//! `demo shell` and `demo up` share the same steps: make sure the image is
//! pulled, then make sure a container is running. Both are planned first so
//! the plan can be shown as a dry run before anything changes.

use std::path::PathBuf;

use tokio::net::TcpListener;
use tracing::{debug, info};

use crate::docker::{ContainerState, DockerClient, RunConfig};
use crate::error::DockerError;

/// What to do with a container in a given state to get it running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpAction {
    Run,
    /// A stopped container holds the name; remove it before running.
    RemoveThenRun,
    Nothing,
}

pub fn decide(state: ContainerState) -> UpAction {
    match state {
        ContainerState::Absent => UpAction::Run,
        ContainerState::Stopped => UpAction::RemoveThenRun,
        ContainerState::Running => UpAction::Nothing,
    }
}

/// Everything needed to start a demo container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpRequest {
    pub image: String,
    pub container: String,
    /// Absolute host directory mounted at `/shared`.
    pub shared_dir: Option<PathBuf>,
    pub port: Option<u16>,
}

impl UpRequest {
    fn run_config(&self) -> RunConfig {
        let mut config = RunConfig::new(&self.container, &self.image);
        if let Some(dir) = &self.shared_dir {
            config = config.with_shared_dir(dir);
        }
        if let Some(port) = self.port {
            config = config.with_port(port);
        }
        config
    }
}

/// The operations [`Lifecycle::ensure_up`] would perform right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpPlan {
    pub pull_needed: bool,
    pub state: ContainerState,
    pub shared_needs_create: bool,
    pub action: UpAction,
}

impl UpPlan {
    pub fn remove_needed(&self) -> bool {
        self.action == UpAction::RemoveThenRun
    }

    pub fn run_needed(&self) -> bool {
        self.action != UpAction::Nothing
    }

    /// Describes the plan for the confirmation prompt.
    ///
    /// `attach` adds the final `docker exec` step of `demo shell`.
    pub fn dry_run(&self, request: &UpRequest, attach: bool) -> DryRun {
        let mut dry_run = DryRun::default();

        if let Some(dir) = &request.shared_dir {
            if self.shared_needs_create {
                dry_run
                    .todo
                    .push(format!("Create '{}' to share with the demo", dir.display()));
            } else {
                dry_run.existing_shared_dir = Some(dir.clone());
            }
        }

        if self.pull_needed {
            dry_run
                .todo
                .push("Run 'docker pull' to download the demo".to_string());
        } else {
            dry_run
                .done
                .push("Downloaded, skipping 'docker pull'".to_string());
        }

        if self.remove_needed() {
            dry_run
                .todo
                .push("Run 'docker rm' to enable running the demo again".to_string());
        }

        if self.run_needed() {
            dry_run
                .todo
                .push("Run 'docker run' to load the demo files into an idle container".to_string());
            if let Some(dir) = &request.shared_dir {
                dry_run.todo.push(format!(
                    "Make '{}' visible inside the container at /shared",
                    dir.display()
                ));
            }
            if let Some(port) = request.port {
                dry_run.todo.push(format!(
                    "Serve the demo files at http://localhost:{port}"
                ));
            }
        } else {
            dry_run.done.push("Up, skipping 'docker run'".to_string());
        }

        if attach {
            dry_run
                .todo
                .push("Run 'docker exec' to attach this terminal to the demo".to_string());
        }

        dry_run
    }
}

/// Human-readable form of an [`UpPlan`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DryRun {
    pub existing_shared_dir: Option<PathBuf>,
    pub done: Vec<String>,
    pub todo: Vec<String>,
}

impl DryRun {
    pub fn render(&self) -> String {
        let mut out = String::from("Executing dry run ...\n\n");

        if let Some(dir) = &self.existing_shared_dir {
            out.push_str(&format!("The directory '{}':\n\n", dir.display()));
            out.push_str(
                "  - Already exists and its contents will be visible inside the demo\n\n",
            );
        }

        if !self.done.is_empty() {
            out.push_str("The demo is already:\n\n");
            for item in &self.done {
                out.push_str(&format!("  - {item}\n"));
            }
            out.push('\n');
        }

        if self.todo.is_empty() {
            out.push_str("There is nothing to do.\n");
        } else {
            out.push_str("This command will:\n\n");
            for item in &self.todo {
                out.push_str(&format!("  - {item}\n"));
            }
        }
        out
    }
}

/// Whether the container was started by this call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpOutcome {
    Started,
    AlreadyUp,
}

/// Fails when `port` can't be bound on the host.
pub async fn check_port(port: u16) -> Result<(), DockerError> {
    match TcpListener::bind(("0.0.0.0", port)).await {
        Ok(listener) => {
            drop(listener);
            Ok(())
        }
        Err(e) => {
            debug!(port, error = %e, "Port is not available");
            Err(DockerError::PortBusy(port))
        }
    }
}

/// Pulls and starts demo containers, printing progress unless quiet.
pub struct Lifecycle {
    docker: DockerClient,
    quiet: bool,
}

impl Lifecycle {
    pub fn new(docker: DockerClient) -> Self {
        Self {
            docker,
            quiet: false,
        }
    }

    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn docker(&self) -> &DockerClient {
        &self.docker
    }

    fn progress(&self, message: &str) {
        if !self.quiet {
            println!("\n{message}\n");
        }
    }

    pub async fn plan(&self, request: &UpRequest) -> Result<UpPlan, DockerError> {
        let pull_needed = !self.docker.image_exists(&request.image).await?;
        let state = self.docker.container_state(&request.container).await?;
        let shared_needs_create = request
            .shared_dir
            .as_ref()
            .is_some_and(|dir| !dir.exists());

        Ok(UpPlan {
            pull_needed,
            state,
            shared_needs_create,
            action: decide(state),
        })
    }

    /// Returns `true` when the image had to be pulled.
    pub async fn ensure_pulled(&self, image: &str) -> Result<bool, DockerError> {
        if self.docker.image_exists(image).await? {
            debug!(image = %image, "Image already present");
            return Ok(false);
        }
        self.progress("Downloading the demo ...");
        self.docker.pull_image(image).await?;
        Ok(true)
    }

    pub async fn ensure_up(&self, request: &UpRequest) -> Result<UpOutcome, DockerError> {
        let state = self.docker.container_state(&request.container).await?;
        let action = decide(state);
        info!(container = %request.container, state = %state, action = ?action, "Ensuring demo is up");

        if action == UpAction::Nothing {
            return Ok(UpOutcome::AlreadyUp);
        }

        if let Some(port) = request.port {
            check_port(port).await?;
        }

        if let Some(dir) = &request.shared_dir {
            if !dir.exists() {
                self.progress("Creating shared directory ...");
                tokio::fs::create_dir_all(dir)
                    .await
                    .map_err(|source| DockerError::SharedDirectory {
                        path: dir.clone(),
                        source,
                    })?;
            }
        }

        if action == UpAction::RemoveThenRun {
            self.progress("Removing the old, conflicting container ...");
            self.docker.remove_container(&request.container).await?;
        }

        self.progress("Loading the demo files into a container (ID below) ...");
        self.docker.run_container(&request.run_config()).await?;
        Ok(UpOutcome::Started)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::testing::RecordingRunner;
    use crate::process::ProcessOutput;
    use std::sync::Arc;

    fn request(shared_dir: Option<PathBuf>) -> UpRequest {
        UpRequest {
            image: "demomag/ants".to_string(),
            container: "demomag-ants".to_string(),
            shared_dir,
            port: None,
        }
    }

    fn lifecycle(runner: &Arc<RecordingRunner>) -> Lifecycle {
        Lifecycle::new(DockerClient::new(runner.clone())).with_quiet(true)
    }

    #[test]
    fn test_decision_table() {
        assert_eq!(decide(ContainerState::Absent), UpAction::Run);
        assert_eq!(decide(ContainerState::Stopped), UpAction::RemoveThenRun);
        assert_eq!(decide(ContainerState::Running), UpAction::Nothing);
    }

    #[tokio::test]
    async fn test_absent_container_is_run() {
        let runner = Arc::new(RecordingRunner::new().respond(ProcessOutput::failure(1, "")));
        let outcome = lifecycle(&runner).ensure_up(&request(None)).await.unwrap();

        assert_eq!(outcome, UpOutcome::Started);
        assert_eq!(
            runner.command_lines(),
            vec![
                "docker inspect -f {{.State.Running}} demomag-ants",
                "docker run --name demomag-ants -w /root -d --rm demomag/ants",
            ]
        );
    }

    #[tokio::test]
    async fn test_stopped_container_is_removed_then_run() {
        let runner = Arc::new(RecordingRunner::new().respond(ProcessOutput::success("false\n")));
        lifecycle(&runner).ensure_up(&request(None)).await.unwrap();

        let lines = runner.command_lines();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "docker rm demomag-ants");
        assert!(lines[2].starts_with("docker run"));
    }

    #[tokio::test]
    async fn test_running_container_is_left_alone() {
        let runner = Arc::new(RecordingRunner::new().respond(ProcessOutput::success("true\n")));
        let outcome = lifecycle(&runner).ensure_up(&request(None)).await.unwrap();

        assert_eq!(outcome, UpOutcome::AlreadyUp);
        assert_eq!(runner.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_shared_dir_is_created_and_mounted() {
        let tmp = tempfile::tempdir().unwrap();
        let shared = tmp.path().join("a").join("shared");
        let runner = Arc::new(RecordingRunner::new().respond(ProcessOutput::failure(1, "")));

        lifecycle(&runner)
            .ensure_up(&request(Some(shared.clone())))
            .await
            .unwrap();

        assert!(shared.is_dir());
        let run = &runner.calls()[1].0;
        assert!(run
            .args
            .windows(2)
            .any(|w| w[0] == "-v" && w[1] == format!("{}:/shared", shared.display())));
    }

    #[tokio::test]
    async fn test_busy_port_stops_before_run() {
        let listener = std::net::TcpListener::bind(("0.0.0.0", 0)).unwrap();
        let port = listener.local_addr().unwrap().port();

        let runner = Arc::new(RecordingRunner::new().respond(ProcessOutput::failure(1, "")));
        let mut req = request(None);
        req.port = Some(port);

        let err = lifecycle(&runner).ensure_up(&req).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("Port {port} is busy, choose another with --port or use --no-port")
        );
        assert_eq!(runner.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_ensure_pulled() {
        let runner = Arc::new(
            RecordingRunner::new()
                .respond(ProcessOutput::success("abc123\n"))
                .respond(ProcessOutput::success("")),
        );
        let lifecycle = lifecycle(&runner);
        assert!(!lifecycle.ensure_pulled("a").await.unwrap());
        assert!(lifecycle.ensure_pulled("b").await.unwrap());
        assert_eq!(
            runner.command_lines(),
            vec!["docker images -q a", "docker images -q b", "docker pull b"]
        );
    }

    #[tokio::test]
    async fn test_dry_run_for_fresh_shell() {
        let runner = Arc::new(
            RecordingRunner::new()
                .respond(ProcessOutput::success(""))
                .respond(ProcessOutput::failure(1, "")),
        );
        let mut req = request(Some(PathBuf::from("/nonexistent/demo-shared-7c1")));
        req.port = Some(4000);

        let plan = lifecycle(&runner).plan(&req).await.unwrap();
        assert!(plan.pull_needed);
        assert!(plan.shared_needs_create);
        assert_eq!(plan.action, UpAction::Run);

        let dry_run = plan.dry_run(&req, true);
        assert!(dry_run.done.is_empty());
        assert_eq!(
            dry_run.todo,
            vec![
                "Create '/nonexistent/demo-shared-7c1' to share with the demo",
                "Run 'docker pull' to download the demo",
                "Run 'docker run' to load the demo files into an idle container",
                "Make '/nonexistent/demo-shared-7c1' visible inside the container at /shared",
                "Serve the demo files at http://localhost:4000",
                "Run 'docker exec' to attach this terminal to the demo",
            ]
        );
    }

    #[test]
    fn test_dry_run_render_when_up() {
        let plan = UpPlan {
            pull_needed: false,
            state: ContainerState::Running,
            shared_needs_create: false,
            action: UpAction::Nothing,
        };
        let text = plan.dry_run(&request(None), false).render();
        assert_eq!(
            text,
            "Executing dry run ...\n\n\
             The demo is already:\n\n\
             \x20 - Downloaded, skipping 'docker pull'\n\
             \x20 - Up, skipping 'docker run'\n\n\
             There is nothing to do.\n"
        );
    }
}
