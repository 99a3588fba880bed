//! Guide generation (`demo docs --make`) and display (`demo docs <guide>`).
//!
//! Guides are markdown templates filled from the demofile, then written
//! twice: as HTML for the browser and as wrapped text for `less`. Command
//! guides land in `commands/`, configuration section guides in `specs/`.

pub mod guides;
pub mod render;
pub mod text;

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::demofile::schema::SECTIONS;
use crate::demofile::Demofile;
use crate::error::DocsError;
use crate::process::{CommandRunner, ProcessCommand, StdioMode};

use guides::{command_context, section_context, COMMAND_GUIDES, SECTION_TEMPLATE};
use render::{render_guide, GuideFiles};

pub const COMMANDS_DIR: &str = "commands";
pub const SPECS_DIR: &str = "specs";

/// A guide that couldn't be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuideFailure {
    pub guide: String,
    pub message: String,
}

/// Result of [`make_all`].
#[derive(Debug, Default)]
pub struct MakeReport {
    pub written: Vec<String>,
    pub failures: Vec<GuideFailure>,
}

impl MakeReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    fn record(&mut self, name: &str, result: Result<(), DocsError>) -> bool {
        match result {
            Ok(()) => {
                self.written.push(name.to_string());
                true
            }
            Err(e) => {
                warn!(guide = name, error = %e, "Guide failed");
                self.failures.push(GuideFailure {
                    guide: name.to_string(),
                    message: e.to_string(),
                });
                false
            }
        }
    }
}

/// Writes every guide under `out_dir`.
///
/// A guide that fails doesn't stop the others; failures are collected in
/// the report. `progress` is called after each guide with its name and
/// whether it was written.
pub fn make_all(
    demofile: &Demofile,
    out_dir: &Path,
    mut progress: impl FnMut(&str, bool),
) -> Result<MakeReport, DocsError> {
    let commands_dir = out_dir.join(COMMANDS_DIR);
    let specs_dir = out_dir.join(SPECS_DIR);
    std::fs::create_dir_all(&commands_dir)?;
    std::fs::create_dir_all(&specs_dir)?;

    let mut report = MakeReport::default();

    for guide in COMMAND_GUIDES {
        let result = command_context(guide.name, demofile).and_then(|context| {
            render_guide(
                guide.template,
                &context,
                &GuideFiles::in_dir(&commands_dir, guide.name),
            )
        });
        let ok = report.record(guide.name, result);
        progress(guide.name, ok);
    }

    for spec in SECTIONS {
        let result = render_guide(
            SECTION_TEMPLATE,
            &section_context(spec),
            &GuideFiles::in_dir(&specs_dir, spec.name),
        );
        let ok = report.record(spec.name, result);
        progress(spec.name, ok);
    }

    info!(
        written = report.written.len(),
        failed = report.failures.len(),
        out_dir = %out_dir.display(),
        "Made guides"
    );
    Ok(report)
}

pub fn failures_message(failures: &[GuideFailure]) -> String {
    let mut message = String::from("Some issues were encountered while creating docs:\n\n");
    for failure in failures {
        message.push_str(&format!("  - {}: {}\n", failure.guide, failure.message));
    }
    message
}

/// Text file of a made guide, looking in `commands/` then `specs/`.
pub fn guide_path(out_dir: &Path, name: &str) -> Result<PathBuf, DocsError> {
    [COMMANDS_DIR, SPECS_DIR]
        .iter()
        .map(|dir| GuideFiles::in_dir(&out_dir.join(dir), name).text)
        .find(|path| path.is_file())
        .ok_or_else(|| DocsError::GuideNotFound(name.to_string()))
}

pub fn pager_command(path: &Path) -> ProcessCommand {
    ProcessCommand::new("less").arg(path.display().to_string())
}

/// Shows a text guide in `less`.
pub async fn page(runner: &dyn CommandRunner, path: &Path) -> Result<(), DocsError> {
    let output = runner
        .run(&pager_command(path), StdioMode::Inherit)
        .await
        .map_err(DocsError::Pager)?;
    if !output.is_success() {
        return Err(DocsError::PagerFailed(output.failure_message()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demofile::{RunSection, ScriptConfig};
    use crate::process::testing::RecordingRunner;
    use crate::process::ProcessOutput;

    fn demofile_with_run() -> Demofile {
        Demofile {
            title: Some("Ants".to_string()),
            run: Some(RunSection {
                description: Some("Watch the colony".to_string()),
                configs: vec![ScriptConfig {
                    name: "default".to_string(),
                    description: None,
                    script: "run.sh".to_string(),
                }],
                examples: Vec::new(),
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_make_all_collects_failures_and_keeps_going() {
        let dir = tempfile::tempdir().unwrap();
        let mut seen = Vec::new();

        let report = make_all(&demofile_with_run(), dir.path(), |name, ok| {
            seen.push((name.to_string(), ok))
        })
        .unwrap();

        assert_eq!(seen.len(), COMMAND_GUIDES.len() + SECTIONS.len());
        assert!(seen.contains(&("build".to_string(), false)));
        assert!(seen.contains(&("run".to_string(), true)));
        assert_eq!(
            report.failures,
            vec![GuideFailure {
                guide: "build".to_string(),
                message: "need a 'build' section".to_string(),
            }]
        );
        assert!(dir.path().join("commands/run.txt").is_file());
        assert!(dir.path().join("commands/run.html").is_file());
        assert!(dir.path().join("specs/image.txt").is_file());
        assert!(!dir.path().join("commands/build.txt").exists());
    }

    #[test]
    fn test_failures_message() {
        let message = failures_message(&[GuideFailure {
            guide: "run".to_string(),
            message: "need a 'run' section".to_string(),
        }]);
        assert_eq!(
            message,
            "Some issues were encountered while creating docs:\n\n  - run: need a 'run' section\n"
        );
    }

    #[test]
    fn test_guide_path_prefers_commands() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("specs")).unwrap();
        std::fs::write(dir.path().join("specs/run.txt"), "spec").unwrap();
        assert_eq!(
            guide_path(dir.path(), "run").unwrap(),
            dir.path().join("specs/run.txt")
        );

        std::fs::create_dir_all(dir.path().join("commands")).unwrap();
        std::fs::write(dir.path().join("commands/run.txt"), "command").unwrap();
        assert_eq!(
            guide_path(dir.path(), "run").unwrap(),
            dir.path().join("commands/run.txt")
        );

        let err = guide_path(dir.path(), "nope").unwrap_err();
        assert_eq!(
            err.to_string(),
            "guide 'nope' doesn't exist. Run 'demo docs --make'"
        );
    }

    #[tokio::test]
    async fn test_page_runs_less() {
        let runner = RecordingRunner::new();
        page(&runner, Path::new("/demo/docs/guides/commands/up.txt"))
            .await
            .unwrap();
        assert_eq!(
            runner.command_lines(),
            vec!["less /demo/docs/guides/commands/up.txt"]
        );
    }

    #[tokio::test]
    async fn test_page_reports_launch_failure() {
        let runner = RecordingRunner::new().fail_to_launch();
        let err = page(&runner, Path::new("x.txt")).await.unwrap_err();
        assert!(err.to_string().starts_with("Failed to run less:"));

        let runner = RecordingRunner::new().respond(ProcessOutput::failure(2, "bad"));
        assert!(matches!(
            page(&runner, Path::new("x.txt")).await.unwrap_err(),
            DocsError::PagerFailed(_)
        ));
    }
}
