//! Declarative description of every demofile section.
//!
//! The same tables drive command-time validation, `demo configure --check`
//! and the generated configuration guides.

use serde::Serialize;
use serde_yaml::Value;
use std::path::Path;

/// A rule a field value must satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Constraint {
    String,
    Integer,
    Array,
    NonEmpty,
    AbsolutePath,
    Port,
}

impl Constraint {
    /// Short name shown in guides and check output.
    pub fn name(&self) -> &'static str {
        match self {
            Constraint::String => "String",
            Constraint::Integer => "Integer",
            Constraint::Array => "Array",
            Constraint::NonEmpty => "non-empty",
            Constraint::AbsolutePath => "absolute-path",
            Constraint::Port => "port",
        }
    }

    /// One-line explanation for the configuration guides.
    pub fn description(&self) -> &'static str {
        match self {
            Constraint::String => "Text, quoted when it contains special characters",
            Constraint::Integer => "A whole number",
            Constraint::Array => "A list of values, one per line starting with '-'",
            Constraint::NonEmpty => "Required and can't be empty",
            Constraint::AbsolutePath => "A file path starting with '/'",
            Constraint::Port => "A TCP port number between 1 and 65535",
        }
    }

    /// Returns the problem with `value`, if any.
    ///
    /// `NonEmpty` only judges emptiness; absence is reported by the checker.
    pub fn violation(&self, value: &Value) -> Option<&'static str> {
        let ok = match self {
            Constraint::String => value.is_string(),
            Constraint::Integer => value.is_i64() || value.is_u64(),
            Constraint::Array => value.is_sequence(),
            Constraint::NonEmpty => !is_empty(value),
            Constraint::AbsolutePath => value
                .as_str()
                .map(|s| Path::new(s).is_absolute())
                .unwrap_or(false),
            Constraint::Port => value
                .as_u64()
                .map(|port| (1..=65535).contains(&port))
                .unwrap_or(false),
        };
        if ok {
            return None;
        }
        Some(match self {
            Constraint::String => "Must be a string",
            Constraint::Integer => "Must be an integer",
            Constraint::Array => "Must be an array",
            Constraint::NonEmpty => "Can't be empty (e.g. \"\", [], {})",
            Constraint::AbsolutePath => "Must be an absolute file path",
            Constraint::Port => "Must be a port number (1-65535)",
        })
    }
}

/// Numbers and booleans have no sense of emptiness.
fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Sequence(seq) => seq.is_empty(),
        Value::Mapping(map) => map.is_empty(),
        _ => false,
    }
}

/// One field of a section, addressed by a dotted path where `[]` means
/// "every element of this array" (e.g. `run.configs[].name`).
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FieldSpec {
    pub path: &'static str,
    pub constraints: &'static [Constraint],
    pub doc: &'static str,
}

impl FieldSpec {
    pub fn is_required(&self) -> bool {
        self.constraints.contains(&Constraint::NonEmpty)
    }
}

/// A top-level demofile section. Its name is also its top-level key.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SectionSpec {
    pub name: &'static str,
    pub doc: &'static str,
    pub fields: &'static [FieldSpec],
    pub example: &'static str,
}

impl SectionSpec {
    /// Whether `pattern` names a field of this section or an ancestor of one.
    pub fn knows(&self, pattern: &str) -> bool {
        self.fields.iter().any(|field| {
            field.path == pattern
                || field
                    .path
                    .strip_prefix(pattern)
                    .map(|rest| rest.starts_with('.') || rest.starts_with("[]"))
                    .unwrap_or(false)
        })
    }
}

use Constraint::{AbsolutePath, Array, Integer, NonEmpty, Port};

const fn field(
    path: &'static str,
    constraints: &'static [Constraint],
    doc: &'static str,
) -> FieldSpec {
    FieldSpec {
        path,
        constraints,
        doc,
    }
}

pub const IMAGE: SectionSpec = SectionSpec {
    name: "image",
    doc: "The Docker image that holds the demo files.",
    fields: &[field(
        "image",
        &[Constraint::String, NonEmpty],
        "Image name in docker's repository/name[:tag] format",
    )],
    example: "image: demomag/dm-ant-search",
};

pub const INSTANCE: SectionSpec = SectionSpec {
    name: "instance",
    doc: "Distinguishes several containers of the same image.",
    fields: &[field(
        "instance",
        &[Constraint::String],
        "Suffix appended to the container name",
    )],
    example: "instance: second",
};

pub const SHARED_DIRECTORY: SectionSpec = SectionSpec {
    name: "shared_directory",
    doc: "A directory on your computer that the demo sees at /shared.",
    fields: &[field(
        "shared_directory",
        &[Constraint::String],
        "Path to the directory, relative paths start at the current directory",
    )],
    example: "shared_directory: ./shared",
};

pub const PORT: SectionSpec = SectionSpec {
    name: "port",
    doc: "Serves the demo files over http on your computer.",
    fields: &[field(
        "port",
        &[Integer, Port],
        "Port on localhost mapped to the demo's file server",
    )],
    example: "port: 4000",
};

pub const RUN: SectionSpec = SectionSpec {
    name: "run",
    doc: "Named scripts that run the demo from inside a demo shell.",
    fields: &[
        field("run.description", &[Constraint::String], "What running the demo does"),
        field(
            "run.configs",
            &[Array, NonEmpty],
            "Run configurations, the first one is the default",
        ),
        field(
            "run.configs[].name",
            &[Constraint::String, NonEmpty],
            "Name passed to `demo run <name>`",
        ),
        field(
            "run.configs[].description",
            &[Constraint::String],
            "What this configuration does",
        ),
        field(
            "run.configs[].script",
            &[Constraint::String, NonEmpty],
            "Bash script to execute, relative to the demo directory",
        ),
        field("run.examples", &[Array], "Example command lines"),
        field(
            "run.examples[].description",
            &[Constraint::String],
            "What the example shows",
        ),
        field("run.examples[].args", &[Array], "The command line, word by word"),
        field("run.examples[].args[]", &[Constraint::String], "One word of the command line"),
    ],
    example: "run:
  description: Searches for ants
  configs:
    - name: default
      description: Search the small colony
      script: scripts/run.sh
  examples:
    - description: Search with verbose logs
      args: [ant-search, --verbose]",
};

pub const BUILD: SectionSpec = SectionSpec {
    name: "build",
    doc: "Named scripts that rebuild the demo from inside a demo shell.",
    fields: &[
        field(
            "build.clean",
            &[Constraint::String, NonEmpty],
            "Bash script run by 'demo build --clean' before building",
        ),
        field(
            "build.configs",
            &[Array, NonEmpty],
            "Build configurations, the first one is the default",
        ),
        field(
            "build.configs[].name",
            &[Constraint::String, NonEmpty],
            "Name passed to `demo build <name>`",
        ),
        field(
            "build.configs[].description",
            &[Constraint::String],
            "What this configuration does",
        ),
        field(
            "build.configs[].script",
            &[Constraint::String, NonEmpty],
            "Bash script to execute, relative to the demo directory",
        ),
    ],
    example: "build:
  clean: scripts/clean.sh
  configs:
    - name: release
      description: Optimized build
      script: scripts/build.sh",
};

pub const SOURCE: SectionSpec = SectionSpec {
    name: "source",
    doc: "Source code repositories inside the demo.",
    fields: &[
        field("source", &[Array], "Repositories"),
        field("source[].name", &[Constraint::String, NonEmpty], "Repository name"),
        field(
            "source[].directory",
            &[Constraint::String, AbsolutePath],
            "Where the repository lives inside the demo",
        ),
        field("source[].notable.build", &[Array], "Files involved in building"),
        field(
            "source[].notable.build[].path",
            &[Constraint::String, NonEmpty],
            "Path relative to the repository",
        ),
        field(
            "source[].notable.build[].description",
            &[Constraint::String],
            "What the file does",
        ),
        field(
            "source[].notable.documentation",
            &[Array],
            "Documentation files",
        ),
        field(
            "source[].notable.documentation[].path",
            &[Constraint::String, NonEmpty],
            "Path relative to the repository",
        ),
        field(
            "source[].notable.documentation[].description",
            &[Constraint::String],
            "What the document covers",
        ),
    ],
    example: "source:
  - name: ant-search
    directory: /root/ant-search
    notable:
      build:
        - path: Makefile
          description: Builds the search binary
      documentation:
        - path: README.md
          description: Project overview",
};

pub const PAPERS: SectionSpec = SectionSpec {
    name: "papers",
    doc: "Research papers that come with the demo.",
    fields: &[
        field("papers", &[Array], "Papers"),
        field("papers[].path", &[Constraint::String, NonEmpty], "Path to the paper"),
        field("papers[].keywords", &[Array], "Topics covered"),
        field("papers[].keywords[]", &[Constraint::String], "One topic"),
    ],
    example: "papers:
  - path: /root/papers/ant-colony.pdf
    keywords: [ants, search]",
};

pub const TITLE: SectionSpec = SectionSpec {
    name: "title",
    doc: "Human readable name of the demo.",
    fields: &[field("title", &[Constraint::String], "Shown at the top of the help guide")],
    example: "title: Ant Colony Search",
};

pub const DESCRIPTION: SectionSpec = SectionSpec {
    name: "description",
    doc: "Summary of what the demo is about.",
    fields: &[field(
        "description",
        &[Constraint::String],
        "Shown at the top of the help guide",
    )],
    example: "description: Optimizes paths the way ant colonies do",
};

/// Every known section, in the order they are documented and checked.
pub const SECTIONS: &[SectionSpec] = &[
    IMAGE,
    INSTANCE,
    SHARED_DIRECTORY,
    PORT,
    TITLE,
    DESCRIPTION,
    RUN,
    BUILD,
    SOURCE,
    PAPERS,
];

/// Looks up a section by name.
pub fn section(name: &str) -> Option<&'static SectionSpec> {
    SECTIONS.iter().find(|spec| spec.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(s: &str) -> Value {
        serde_yaml::from_str(s).expect("valid yaml")
    }

    #[test]
    fn test_constraint_violations() {
        assert_eq!(Constraint::String.violation(&yaml("3")), Some("Must be a string"));
        assert_eq!(Constraint::String.violation(&yaml("'3'")), None);
        assert_eq!(Array.violation(&yaml("a")), Some("Must be an array"));
        assert_eq!(
            NonEmpty.violation(&yaml("[]")),
            Some("Can't be empty (e.g. \"\", [], {})")
        );
        assert_eq!(NonEmpty.violation(&yaml("0")), None);
        assert_eq!(AbsolutePath.violation(&yaml("/root/x")), None);
        assert_eq!(
            AbsolutePath.violation(&yaml("root/x")),
            Some("Must be an absolute file path")
        );
        assert_eq!(Port.violation(&yaml("8080")), None);
        assert!(Port.violation(&yaml("0")).is_some());
        assert!(Port.violation(&yaml("70000")).is_some());
        assert!(Integer.violation(&yaml("1.5")).is_some());
    }

    #[test]
    fn test_section_knows_field_prefixes() {
        assert!(RUN.knows("run"));
        assert!(RUN.knows("run.configs"));
        assert!(RUN.knows("run.configs[].name"));
        assert!(!RUN.knows("run.config"));
        assert!(!RUN.knows("run.timeout"));
        assert!(SOURCE.knows("source[].notable"));
    }

    #[test]
    fn test_examples_parse_as_yaml() {
        for spec in SECTIONS {
            let value: Value = serde_yaml::from_str(spec.example)
                .unwrap_or_else(|e| panic!("example for '{}' is invalid: {e}", spec.name));
            assert!(value.get(spec.name).is_some(), "example for '{}'", spec.name);
        }
    }

    #[test]
    fn test_section_lookup() {
        assert_eq!(section("build").map(|s| s.name), Some("build"));
        assert!(section("nope").is_none());
    }
}
