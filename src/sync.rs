//! Copies the working directory between a demo and its shared directory.
//!
//! `demo share` mirrors the current directory into the shared mount so the
//! host can see it; `demo sync` brings the mirrored copy back. Paths under
//! the shared mount reproduce the absolute path inside the demo, so
//! `/root/project` is shared as `/shared/root/project`.

use std::os::unix::fs::MetadataExt;
use std::path::{Component, Path, PathBuf};

use tracing::info;

use crate::error::SyncError;
use crate::paths::DemoPaths;
use crate::process::{CommandRunner, ProcessCommand, StdioMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncDirection {
    /// Demo → shared directory.
    Share,
    /// Shared directory → demo.
    Sync,
}

/// Owner applied to synced files with `--chown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Owner {
    pub uid: u32,
    pub gid: u32,
}

impl Owner {
    pub const ROOT: Owner = Owner { uid: 0, gid: 0 };
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncPlan {
    pub source: PathBuf,
    /// Directory the source is copied into.
    pub destination_parent: PathBuf,
    pub owner: Owner,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncOptions {
    pub verbose: bool,
    /// Delete destination files missing from the source.
    pub complete: bool,
}

/// Whether the demo was started with a shared directory.
pub fn has_shared_mount(paths: &DemoPaths) -> bool {
    paths.shared.is_dir()
}

/// `path` with its root stripped, for nesting under the shared mount.
fn relative_to_root(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .collect()
}

/// Plans copying `cwd` in the given direction.
pub fn plan(direction: SyncDirection, cwd: &Path, paths: &DemoPaths) -> Result<SyncPlan, SyncError> {
    let parent = cwd
        .parent()
        .ok_or_else(|| SyncError::NoParent(cwd.to_path_buf()))?;

    match direction {
        SyncDirection::Share => {
            // Files written to the shared mount belong to whoever created it
            // on the host.
            let meta = std::fs::metadata(&paths.shared)?;
            Ok(SyncPlan {
                source: cwd.to_path_buf(),
                destination_parent: paths.shared.join(relative_to_root(parent)),
                owner: Owner {
                    uid: meta.uid(),
                    gid: meta.gid(),
                },
            })
        }
        SyncDirection::Sync => {
            let source = paths.shared.join(relative_to_root(cwd));
            if !source.exists() {
                return Err(SyncError::SourceMissing(source));
            }
            Ok(SyncPlan {
                source,
                destination_parent: parent.to_path_buf(),
                owner: Owner::ROOT,
            })
        }
    }
}

pub fn rsync_command(plan: &SyncPlan, options: SyncOptions) -> ProcessCommand {
    let mut cmd = ProcessCommand::new("rsync").arg("-a");
    if options.verbose {
        cmd = cmd.arg("-v");
    }
    cmd = cmd
        .arg(format!("--chown={}:{}", plan.owner.uid, plan.owner.gid))
        .arg(plan.source.display().to_string())
        .arg(plan.destination_parent.display().to_string());
    if options.complete {
        cmd = cmd.arg("--delete");
    }
    cmd
}

/// Runs rsync for `plan`, creating the destination parent first.
pub async fn execute(
    runner: &dyn CommandRunner,
    plan: &SyncPlan,
    options: SyncOptions,
) -> Result<(), SyncError> {
    tokio::fs::create_dir_all(&plan.destination_parent).await?;

    let command = rsync_command(plan, options);
    info!(source = %plan.source.display(), destination = %plan.destination_parent.display(), "Syncing");

    let stdio = if options.verbose {
        StdioMode::StreamStdout
    } else {
        StdioMode::Capture
    };
    let output = runner
        .run(&command, stdio)
        .await
        .map_err(SyncError::Launch)?;

    if !output.is_success() {
        return Err(SyncError::Failed {
            source_dir: plan.source.clone(),
            destination: plan.destination_parent.clone(),
            stderr: output.failure_message(),
        });
    }
    Ok(())
}
