//! Runs the `run` and `build` scripts declared in the demofile.

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use crate::demofile::{ScriptConfig, ScriptKind};
use crate::error::ScriptError;
use crate::paths::DemoPaths;
use crate::process::{CommandRunner, ProcessCommand, StdioMode};

const RULE: &str = "---------------------------------------------------------------------";

pub fn bash_command(script: &Path) -> ProcessCommand {
    ProcessCommand::new("/bin/bash").arg(script.display().to_string())
}

fn boxed(lines: &[String]) -> String {
    let mut out = format!("\n{RULE}\n|\n");
    for line in lines {
        if line.is_empty() {
            out.push_str("|\n");
        } else {
            out.push_str(&format!("| {line}\n"));
        }
    }
    out.push_str(&format!("|\n{RULE}\n"));
    out
}

/// Banner plus the script's source, printed before it runs.
pub fn render_header(kind: ScriptKind, name: &str, script_source: &str) -> String {
    let verb = match kind {
        ScriptKind::Run => "Running",
        ScriptKind::Build => "Building",
    };
    let mut out = boxed(&[format!("{verb} demo with the '{name}' configuration")]);
    out.push_str("\n[Command line]\n\n");
    out.push_str(script_source.trim_end());
    out.push_str("\n\n[Logs]\n");
    out
}

pub fn render_footer(kind: ScriptKind, success: bool) -> String {
    let (noun, log) = match kind {
        ScriptKind::Run => ("Run", "run.log"),
        ScriptKind::Build => ("Build", "build.log"),
    };
    let lines: Vec<String> = if success {
        let next: &[&str] = match kind {
            ScriptKind::Run => &[
                "- Run 'demo docs source' to find the source code",
                "- Run 'demo run --list' to see more ways to run",
            ],
            ScriptKind::Build => &[
                "- Run 'demo run' to run the demo",
                "- Run 'demo build --list' to see more ways to build",
            ],
        };
        std::iter::once(format!("{noun} exited successfully. Next:"))
            .chain(std::iter::once(String::new()))
            .chain(next.iter().map(|s| s.to_string()))
            .collect()
    } else {
        vec![
            format!("{noun} exited unexpectedly"),
            String::new(),
            format!("To debug see the logs above or {log}"),
        ]
    };
    boxed(&lines)
}

/// Lists the configs of a section, marking the default.
pub fn render_config_list(kind: ScriptKind, configs: &[ScriptConfig]) -> String {
    let mut out = format!("Available '{}' configurations:\n\n", kind.section());
    let width = configs.iter().map(|c| c.name.len()).max().unwrap_or(0);
    for (index, config) in configs.iter().enumerate() {
        let description = config.description.as_deref().unwrap_or("");
        let marker = if index == 0 { " (default)" } else { "" };
        out.push_str(
            format!("  {:width$}   {description}{marker}", config.name)
                .trim_end(),
        );
        out.push('\n');
    }
    out
}

/// Executes named scripts with `/bin/bash`.
pub struct ScriptRunner {
    runner: Arc<dyn CommandRunner>,
    paths: DemoPaths,
}

impl ScriptRunner {
    pub fn new(runner: Arc<dyn CommandRunner>, paths: DemoPaths) -> Self {
        Self { runner, paths }
    }

    /// Runs the `build.clean` script, capturing its output.
    pub async fn clean(&self, script: &str) -> Result<(), ScriptError> {
        let path = self.paths.script(script);
        let command = bash_command(&path);
        info!(script = %path.display(), "Cleaning");

        let output = self
            .runner
            .run(&command, StdioMode::Capture)
            .await
            .map_err(|e| ScriptError::CleanFailed(e.to_string()))?;
        if !output.is_success() {
            return Err(ScriptError::CleanFailed(output.failure_message()));
        }
        Ok(())
    }

    /// Prints the banners around the script and returns whether it succeeded.
    ///
    /// `run` scripts stream stdout and keep stderr for the failure report;
    /// `build` scripts stream both.
    pub async fn execute(&self, kind: ScriptKind, config: &ScriptConfig) -> Result<bool, ScriptError> {
        let path = self.paths.script(&config.script);
        let source = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| ScriptError::Read {
                path: path.clone(),
                source,
            })?;

        println!("{}", render_header(kind, &config.name, &source));

        let command = bash_command(&path);
        let stdio = match kind {
            ScriptKind::Run => StdioMode::StreamStdout,
            ScriptKind::Build => StdioMode::Inherit,
        };
        let output = self
            .runner
            .run(&command, stdio)
            .await
            .map_err(|source| ScriptError::Launch {
                command: command.to_string(),
                source,
            })?;

        let success = output.is_success();
        if !success {
            warn!(script = %path.display(), code = ?output.code, "Script failed");
            if !output.stderr.is_empty() {
                eprint!("{}", output.stderr);
            }
        }
        println!("{}", render_footer(kind, success));
        Ok(success)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::testing::RecordingRunner;
    use crate::process::ProcessOutput;

    fn config(name: &str, script: &str) -> ScriptConfig {
        ScriptConfig {
            name: name.to_string(),
            description: None,
            script: script.to_string(),
        }
    }

    #[test]
    fn test_header_layout() {
        let header = render_header(ScriptKind::Run, "fast", "./ants --fast\n");
        assert_eq!(
            header,
            format!(
                "\n{RULE}\n|\n| Running demo with the 'fast' configuration\n|\n{RULE}\n\n[Command line]\n\n./ants --fast\n\n[Logs]\n"
            )
        );
    }

    #[test]
    fn test_footers() {
        let failed = render_footer(ScriptKind::Build, false);
        assert!(failed.contains("| Build exited unexpectedly\n"));
        assert!(failed.contains("| To debug see the logs above or build.log\n"));

        let ok = render_footer(ScriptKind::Run, true);
        assert!(ok.contains("| Run exited successfully. Next:\n|\n| - Run"));
    }

    #[test]
    fn test_config_list_marks_default() {
        let mut big = config("big", "big.sh");
        big.description = Some("The big colony".to_string());
        let text = render_config_list(ScriptKind::Run, &[config("default", "run.sh"), big]);
        assert_eq!(
            text,
            "Available 'run' configurations:\n\n  default    (default)\n  big       The big colony\n"
        );
    }

    #[tokio::test]
    async fn test_execute_runs_script_relative_to_demo_root() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("run.sh"), "echo hi\n").unwrap();
        let runner = Arc::new(RecordingRunner::new().respond(ProcessOutput::failure(2, "boom")));
        let scripts = ScriptRunner::new(runner.clone(), DemoPaths::default().with_root(tmp.path()));

        let success = scripts
            .execute(ScriptKind::Run, &config("default", "run.sh"))
            .await
            .unwrap();

        assert!(!success);
        let (command, mode) = &runner.calls()[0];
        assert_eq!(
            command.to_string(),
            format!("/bin/bash {}", tmp.path().join("run.sh").display())
        );
        assert_eq!(*mode, StdioMode::StreamStdout);
    }

    #[tokio::test]
    async fn test_missing_script_file() {
        let tmp = tempfile::tempdir().unwrap();
        let runner = Arc::new(RecordingRunner::new());
        let scripts = ScriptRunner::new(runner.clone(), DemoPaths::default().with_root(tmp.path()));

        let err = scripts
            .execute(ScriptKind::Build, &config("release", "build.sh"))
            .await
            .unwrap_err();
        assert!(matches!(err, ScriptError::Read { .. }));
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_clean_failure_message() {
        let runner = Arc::new(RecordingRunner::new().respond(ProcessOutput::failure(1, "rm: cannot remove 'out'\n")));
        let scripts = ScriptRunner::new(runner, DemoPaths::default());

        let err = scripts.clean("clean.sh").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Failed to clean before build: rm: cannot remove 'out'"
        );
    }
}
