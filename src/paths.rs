//! Well-known locations inside a demo container.

use std::path::{Path, PathBuf};

pub const DEFAULT_DEMO_ROOT: &str = "/demo";
pub const DEFAULT_SHARED_ROOT: &str = "/shared";

/// Mount points a demo image is built around.
///
/// The defaults match the containers started by `demo shell`; tests and
/// unusual images override them with `--demo-root` / `--shared-root`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoPaths {
    /// Directory holding the in-container `demo.yml` and the demo scripts.
    pub root: PathBuf,
    /// Bind mount of the host's shared directory.
    pub shared: PathBuf,
}

impl Default for DemoPaths {
    fn default() -> Self {
        Self {
            root: PathBuf::from(DEFAULT_DEMO_ROOT),
            shared: PathBuf::from(DEFAULT_SHARED_ROOT),
        }
    }
}

impl DemoPaths {
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    pub fn with_shared(mut self, shared: impl Into<PathBuf>) -> Self {
        self.shared = shared.into();
        self
    }

    /// The in-container demofile.
    pub fn demofile(&self) -> PathBuf {
        self.root.join("demo.yml")
    }

    /// Default output directory of `demo docs --make`.
    pub fn guides_dir(&self) -> PathBuf {
        self.root.join("docs").join("guides")
    }

    /// Whether this process runs inside a demo container.
    pub fn is_inside_demo(&self) -> bool {
        self.demofile().is_file()
    }

    /// Resolves a script path from the demofile against the demo root.
    pub fn script(&self, script: &str) -> PathBuf {
        let path = Path::new(script);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}
