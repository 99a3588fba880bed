//! The guides `demo docs --make` produces and the variables each one needs.

use std::path::Path;

use serde::Serialize;
use tera::Context;

use crate::demofile::schema::{SectionSpec, SECTIONS};
use crate::demofile::Demofile;
use crate::error::DocsError;

/// Placeholder for empty lists in guides.
const NONE: &str = "(none)";

/// Where a command may be run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Location {
    Host,
    Demo,
    Anywhere,
}

/// A command and its guide template.
#[derive(Debug, Clone, Copy)]
pub struct CommandGuide {
    pub name: &'static str,
    pub summary: &'static str,
    pub location: Location,
    pub template: &'static str,
}

pub const COMMAND_GUIDES: &[CommandGuide] = &[
    CommandGuide {
        name: "shell",
        summary: "Enter a demo shell, starting the demo if needed",
        location: Location::Host,
        template: include_str!("templates/shell.md"),
    },
    CommandGuide {
        name: "up",
        summary: "Start the demo in the background",
        location: Location::Host,
        template: include_str!("templates/up.md"),
    },
    CommandGuide {
        name: "down",
        summary: "Stop the demo",
        location: Location::Host,
        template: include_str!("templates/down.md"),
    },
    CommandGuide {
        name: "run",
        summary: "Run the demo",
        location: Location::Demo,
        template: include_str!("templates/run.md"),
    },
    CommandGuide {
        name: "build",
        summary: "Rebuild the demo from source",
        location: Location::Demo,
        template: include_str!("templates/build.md"),
    },
    CommandGuide {
        name: "share",
        summary: "Copy the current directory to the shared directory",
        location: Location::Demo,
        template: include_str!("templates/share.md"),
    },
    CommandGuide {
        name: "sync",
        summary: "Copy the current directory back from the shared directory",
        location: Location::Demo,
        template: include_str!("templates/sync.md"),
    },
    CommandGuide {
        name: "docs",
        summary: "Read the demo's guides",
        location: Location::Demo,
        template: include_str!("templates/docs.md"),
    },
    CommandGuide {
        name: "configure",
        summary: "Describe and check the demo file",
        location: Location::Anywhere,
        template: include_str!("templates/configure.md"),
    },
    CommandGuide {
        name: "help",
        summary: "Show usage guides",
        location: Location::Anywhere,
        template: include_str!("templates/help.md"),
    },
];

pub const SECTION_TEMPLATE: &str = include_str!("templates/section.md");

pub fn command_guide(name: &str) -> Option<&'static CommandGuide> {
    COMMAND_GUIDES.iter().find(|guide| guide.name == name)
}

#[derive(Serialize)]
struct CommandSummary {
    name: &'static str,
    summary: &'static str,
}

#[derive(Serialize)]
struct ConfigRow {
    name: String,
    description: String,
}

#[derive(Serialize)]
struct ExampleRow {
    description: String,
    commandline: String,
}

#[derive(Serialize)]
struct FileRow {
    file: String,
    description: String,
}

#[derive(Serialize)]
struct PaperRow {
    file: String,
    keywords: String,
}

fn missing(message: &str) -> DocsError {
    DocsError::MissingData(message.to_string())
}

/// Makes free text safe inside a markdown table cell.
fn table_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

fn config_rows(configs: &[crate::demofile::ScriptConfig]) -> Vec<ConfigRow> {
    configs
        .iter()
        .map(|config| ConfigRow {
            name: table_cell(&config.name),
            description: table_cell(config.description.as_deref().unwrap_or_default()),
        })
        .collect()
}

fn join_repo_path(directory: Option<&str>, path: &str) -> String {
    match directory {
        Some(dir) => Path::new(dir).join(path).display().to_string(),
        None => path.to_string(),
    }
}

/// Variables for a command guide.
pub fn command_context(name: &str, demofile: &Demofile) -> Result<Context, DocsError> {
    let mut context = Context::new();
    match name {
        "help" => {
            let summaries = |location: Location| -> Vec<CommandSummary> {
                COMMAND_GUIDES
                    .iter()
                    .filter(|guide| guide.location == location || guide.location == Location::Anywhere)
                    .map(|guide| CommandSummary {
                        name: guide.name,
                        summary: guide.summary,
                    })
                    .collect()
            };
            context.insert("title", demofile.title.as_deref().unwrap_or("Demo"));
            context.insert(
                "description",
                demofile.description.as_deref().unwrap_or(""),
            );
            context.insert("host_commands", &summaries(Location::Host));
            context.insert("demo_commands", &summaries(Location::Demo));
            context.insert("guides", &all_guide_names());
        }
        "run" => {
            let run = demofile.run.as_ref().ok_or_else(|| missing("need a 'run' section"))?;
            let description = run
                .description
                .as_deref()
                .ok_or_else(|| missing("need a 'description' under 'run'"))?;
            if run.configs.is_empty() {
                return Err(missing("need at least 1 config under 'run'"));
            }
            let mut examples: Vec<ExampleRow> = run
                .examples
                .iter()
                .map(|example| ExampleRow {
                    description: table_cell(example.description.as_deref().unwrap_or_default()),
                    commandline: table_cell(&example.args.join(" ")),
                })
                .collect();
            if examples.is_empty() {
                examples.push(ExampleRow {
                    description: NONE.to_string(),
                    commandline: String::new(),
                });
            }
            context.insert("description", description);
            context.insert("configs", &config_rows(&run.configs));
            context.insert("examples", &examples);
        }
        "build" => {
            let build = demofile
                .build
                .as_ref()
                .ok_or_else(|| missing("need a 'build' section"))?;
            if build.configs.is_empty() {
                return Err(missing("need at least 1 config under 'build'"));
            }
            let mut files: Vec<FileRow> = demofile
                .source
                .iter()
                .flat_map(|repo| {
                    repo.notable.build.iter().map(move |file| FileRow {
                        file: table_cell(&join_repo_path(repo.directory.as_deref(), &file.path)),
                        description: table_cell(file.description.as_deref().unwrap_or_default()),
                    })
                })
                .collect();
            if files.is_empty() {
                files.push(FileRow {
                    file: NONE.to_string(),
                    description: String::new(),
                });
            }
            context.insert("configs", &config_rows(&build.configs));
            context.insert("clean", build.clean.as_deref().unwrap_or(NONE));
            context.insert("build_files", &files);
        }
        "docs" => {
            let mut source_docs: Vec<FileRow> = demofile
                .source
                .iter()
                .flat_map(|repo| {
                    repo.notable.documentation.iter().map(move |doc| FileRow {
                        file: table_cell(&join_repo_path(repo.directory.as_deref(), &doc.path)),
                        description: table_cell(doc.description.as_deref().unwrap_or_default()),
                    })
                })
                .collect();
            if source_docs.is_empty() {
                source_docs.push(FileRow {
                    file: NONE.to_string(),
                    description: String::new(),
                });
            }
            let mut papers: Vec<PaperRow> = demofile
                .papers
                .iter()
                .map(|paper| PaperRow {
                    file: table_cell(&paper.path),
                    keywords: table_cell(&paper.keywords.join(", ")),
                })
                .collect();
            if papers.is_empty() {
                papers.push(PaperRow {
                    file: NONE.to_string(),
                    keywords: String::new(),
                });
            }
            let command_guides: Vec<&str> = COMMAND_GUIDES.iter().map(|g| g.name).collect();
            let section_guides: Vec<&str> = SECTIONS.iter().map(|s| s.name).collect();
            context.insert("command_guides", &command_guides);
            context.insert("section_guides", &section_guides);
            context.insert("source_docs", &source_docs);
            context.insert("papers", &papers);
        }
        "configure" => {
            let sections: Vec<ConfigRow> = SECTIONS
                .iter()
                .map(|spec| ConfigRow {
                    name: spec.name.to_string(),
                    description: spec.doc.to_string(),
                })
                .collect();
            context.insert("sections", &sections);
        }
        _ => {}
    }
    Ok(context)
}

#[derive(Serialize)]
struct ConstraintRow {
    name: &'static str,
    description: &'static str,
}

#[derive(Serialize)]
struct FieldRow {
    path: &'static str,
    doc: &'static str,
    constraints: Vec<ConstraintRow>,
}

/// Variables for a configuration section guide.
pub fn section_context(spec: &SectionSpec) -> Context {
    let fields: Vec<FieldRow> = spec
        .fields
        .iter()
        .map(|field| FieldRow {
            path: field.path,
            doc: field.doc,
            constraints: field
                .constraints
                .iter()
                .map(|constraint| ConstraintRow {
                    name: constraint.name(),
                    description: constraint.description(),
                })
                .collect(),
        })
        .collect();

    let mut context = Context::new();
    context.insert("name", spec.name);
    context.insert("doc", spec.doc);
    context.insert("fields", &fields);
    context.insert("example", spec.example);
    context
}

/// Every guide name, commands first.
///
/// `run` and `build` are both commands and sections; `demo docs` shows the
/// command guide for those, so they're listed once.
pub fn all_guide_names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = COMMAND_GUIDES.iter().map(|guide| guide.name).collect();
    for spec in SECTIONS {
        if !names.contains(&spec.name) {
            names.push(spec.name);
        }
    }
    names
}
