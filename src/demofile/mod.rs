//! Demofile loading, validation and typed access.
//!
//! A demofile is read from YAML (`demo.yml`) or, for older demos, from a
//! TOML `Demofile`. Both formats are converted into one [`serde_yaml::Value`]
//! tree, validated against [`schema`] by [`check`], then deserialized into
//! [`Demofile`].

pub mod check;
pub mod schema;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use tracing::{debug, warn};

use crate::error::DemofileError;

/// File names searched for in the current directory, in order.
pub const DEMOFILE_NAMES: &[&str] = &["demo.yml", "Demofile"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Demofile {
    #[serde(skip)]
    pub path: PathBuf,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub instance: Option<String>,
    #[serde(default)]
    pub shared_directory: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub run: Option<RunSection>,
    #[serde(default)]
    pub build: Option<BuildSection>,
    #[serde(default)]
    pub source: Vec<SourceRepo>,
    #[serde(default)]
    pub papers: Vec<Paper>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSection {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub configs: Vec<ScriptConfig>,
    #[serde(default)]
    pub examples: Vec<RunExample>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildSection {
    #[serde(default)]
    pub clean: Option<String>,
    #[serde(default)]
    pub configs: Vec<ScriptConfig>,
}

/// A named script from `run.configs` or `build.configs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptConfig {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub script: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunExample {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceRepo {
    pub name: String,
    #[serde(default)]
    pub directory: Option<String>,
    #[serde(default)]
    pub notable: Notable,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Notable {
    #[serde(default)]
    pub build: Vec<NotableFile>,
    #[serde(default)]
    pub documentation: Vec<NotableFile>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotableFile {
    pub path: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Paper {
    pub path: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// Which script list a config is selected from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptKind {
    Run,
    Build,
}

impl ScriptKind {
    pub fn section(&self) -> &'static str {
        match self {
            ScriptKind::Run => "run",
            ScriptKind::Build => "build",
        }
    }
}

impl Demofile {
    /// Reads, validates and deserializes the demofile at `path`.
    ///
    /// `required` names sections the calling command can't work without;
    /// every other section present in the file is validated too.
    pub fn load(path: &Path, required: &[&str]) -> Result<Self, DemofileError> {
        let value = read_value(path)?;
        Self::from_value(path, value, required)
    }

    /// Validates and deserializes an already parsed value tree.
    pub fn from_value(path: &Path, value: Value, required: &[&str]) -> Result<Self, DemofileError> {
        validate(path, &value, required)?;
        let mut demofile: Demofile =
            serde_yaml::from_value(value).map_err(|e| DemofileError::Parse {
                path: path.to_path_buf(),
                format: "a demo file",
                message: e.to_string(),
            })?;
        demofile.path = path.to_path_buf();
        Ok(demofile)
    }

    pub fn configs(&self, kind: ScriptKind) -> &[ScriptConfig] {
        let configs = match kind {
            ScriptKind::Run => self.run.as_ref().map(|r| r.configs.as_slice()),
            ScriptKind::Build => self.build.as_ref().map(|b| b.configs.as_slice()),
        };
        configs.unwrap_or(&[])
    }

    /// Picks a config by name, or the first one when no name is given.
    pub fn select_config(
        &self,
        kind: ScriptKind,
        name: Option<&str>,
    ) -> Result<&ScriptConfig, DemofileError> {
        let configs = self.configs(kind);
        let found = match name {
            Some(name) => configs.iter().find(|config| config.name == name),
            None => configs.first(),
        };
        found.ok_or_else(|| DemofileError::UnknownConfig {
            name: name.unwrap_or_default().to_string(),
            path: self.path.clone(),
            available: configs.iter().map(|config| config.name.clone()).collect(),
        })
    }
}

/// Finds the demofile to use.
///
/// An explicit path always wins, even if it doesn't exist, so that loading
/// reports it as missing instead of silently falling back.
pub fn locate(explicit: Option<&Path>, cwd: &Path) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(cwd.join(path));
    }
    DEMOFILE_NAMES
        .iter()
        .map(|name| cwd.join(name))
        .find(|candidate| candidate.is_file())
}

fn is_toml(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "toml")
        || path.file_name().is_some_and(|name| name == "Demofile")
}

/// Parses a demofile into a generic value tree.
pub fn read_value(path: &Path) -> Result<Value, DemofileError> {
    if !path.exists() {
        return Err(DemofileError::Missing(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path).map_err(|source| DemofileError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let value = if is_toml(path) {
        debug!(path = %path.display(), "Parsing demo file as TOML");
        let table: toml::Value = toml::from_str(&content).map_err(|e| DemofileError::Parse {
            path: path.to_path_buf(),
            format: "TOML",
            message: e.to_string(),
        })?;
        serde_yaml::to_value(table)?
    } else {
        debug!(path = %path.display(), "Parsing demo file as YAML");
        serde_yaml::from_str(&content).map_err(|e| DemofileError::Parse {
            path: path.to_path_buf(),
            format: "YAML",
            message: e.to_string(),
        })?
    };

    match value {
        Value::Null => Ok(Value::Mapping(Default::default())),
        Value::Mapping(_) => Ok(value),
        _ => Err(DemofileError::Parse {
            path: path.to_path_buf(),
            format: "a demo file",
            message: "the top level must be a mapping of keys to values".to_string(),
        }),
    }
}

/// Checks the sections a command needs plus every section that is present.
fn validate(path: &Path, value: &Value, required: &[&str]) -> Result<(), DemofileError> {
    let mut issues = Vec::new();

    for spec in schema::SECTIONS {
        let report = check::check_section(value, spec);
        let present = matches!(value.get(spec.name), Some(v) if !v.is_null());

        if !present {
            if required.contains(&spec.name) {
                issues.push(format!("the '{}' field is required", spec.name));
            }
            continue;
        }

        for extra in report.warnings() {
            warn!(path = %path.display(), field = %extra.path, "Unrecognized demo file data");
        }
        issues.extend(report.errors().map(check::Issue::summary));
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(DemofileError::Invalid {
            path: path.to_path_buf(),
            issues,
        })
    }
}

/// Container name for `image`, optionally suffixed with `.instance`.
///
/// Characters docker rejects in names, and every `.`, become `-`.
pub fn container_name(image: &str, instance: Option<&str>) -> String {
    let base: String = image
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '-'
            }
        })
        .collect();
    match instance {
        Some(instance) if !instance.is_empty() => format!("{base}.{instance}"),
        _ => base,
    }
}
