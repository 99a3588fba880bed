//! Validates demofile data against the section schema.

use serde::Serialize;
use serde_yaml::Value;

use super::schema::{FieldSpec, SectionSpec, SECTIONS};

/// What kind of problem an [`Issue`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// A key the schema doesn't know; reported as a warning.
    ExtraMetadata,
    /// A required field that is absent.
    RequiredMetadata,
    /// A present value that breaks one or more constraints.
    CheckedValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub kind: IssueKind,
    /// Concrete location such as `run.configs[1].script`.
    pub path: String,
    /// Rendered offending value, for [`IssueKind::CheckedValue`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub problems: Vec<String>,
}

impl Issue {
    pub fn is_warning(&self) -> bool {
        self.kind == IssueKind::ExtraMetadata
    }

    /// One-line description used in command-time errors.
    pub fn summary(&self) -> String {
        match self.kind {
            IssueKind::ExtraMetadata => format!("the '{}' field isn't recognized", self.path),
            IssueKind::RequiredMetadata => format!("the '{}' field is required", self.path),
            IssueKind::CheckedValue => format!(
                "the value of '{}' {}",
                self.path,
                self.problems
                    .iter()
                    .map(|p| lowercase_first(p))
                    .collect::<Vec<_>>()
                    .join(" and ")
            ),
        }
    }
}

/// Outcome of checking one section.
#[derive(Debug, Clone, Serialize)]
pub struct SectionReport {
    pub section: String,
    /// Concrete locations that were checked, failed ones included.
    pub checked: usize,
    pub issues: Vec<Issue>,
}

impl SectionReport {
    /// Warnings alone don't fail a section.
    pub fn passed(&self) -> bool {
        self.issues.iter().all(Issue::is_warning)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|issue| !issue.is_warning())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|issue| issue.is_warning())
    }
}

/// Outcome of checking a whole demofile.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CheckReport {
    pub sections: Vec<SectionReport>,
    /// Requested sections that aren't in the file.
    pub skipped: Vec<String>,
}

impl CheckReport {
    pub fn passed(&self) -> bool {
        self.sections.iter().all(SectionReport::passed)
    }
}

/// Checks `sections` (all known sections when empty) of `root`.
///
/// Sections whose top-level key is absent are skipped rather than failed.
pub fn check(root: &Value, sections: &[&'static SectionSpec]) -> CheckReport {
    let selected: Vec<&SectionSpec> = if sections.is_empty() {
        SECTIONS.iter().collect()
    } else {
        sections.to_vec()
    };

    let mut report = CheckReport::default();
    for spec in selected {
        if is_present(root, spec.name) {
            report.sections.push(check_section(root, spec));
        } else {
            report.skipped.push(spec.name.to_string());
        }
    }
    report
}

fn is_present(root: &Value, key: &str) -> bool {
    matches!(root.get(key), Some(value) if !value.is_null())
}

/// Checks a single section, whether or not its key is present.
pub fn check_section(root: &Value, spec: &SectionSpec) -> SectionReport {
    let mut issues = Vec::new();

    if let Some(value) = root.get(spec.name) {
        collect_extras(spec, value, spec.name, spec.name, &mut issues);
    }

    let mut checked = 0;
    let mut misshapen: Vec<String> = Vec::new();
    for field in spec.fields {
        let segments = parse_path(field.path);
        let mut found = Vec::new();
        resolve(root, &segments, String::new(), String::new(), &mut found);

        for location in found {
            match location {
                Location::Missing(path) => {
                    if field.is_required() {
                        checked += 1;
                        issues.push(Issue {
                            kind: IssueKind::RequiredMetadata,
                            path,
                            value: None,
                            problems: Vec::new(),
                        });
                    }
                }
                Location::Present(path, value) => {
                    checked += 1;
                    let problems: Vec<String> = field
                        .constraints
                        .iter()
                        .filter_map(|constraint| constraint.violation(value))
                        .map(str::to_string)
                        .collect();
                    if !problems.is_empty() {
                        issues.push(Issue {
                            kind: IssueKind::CheckedValue,
                            path,
                            value: Some(render_value(value)),
                            problems,
                        });
                    }
                }
                Location::Misshapen {
                    path,
                    pattern,
                    value,
                    problem,
                } => {
                    // A container that is itself a field reports its own type.
                    if spec.fields.iter().any(|f| f.path == pattern) || misshapen.contains(&path) {
                        continue;
                    }
                    checked += 1;
                    misshapen.push(path.clone());
                    issues.push(Issue {
                        kind: IssueKind::CheckedValue,
                        path,
                        value: Some(render_value(value)),
                        problems: vec![problem.to_string()],
                    });
                }
            }
        }
    }

    SectionReport {
        section: spec.name.to_string(),
        checked,
        issues,
    }
}

#[derive(Debug, PartialEq)]
enum Segment<'a> {
    Key(&'a str),
    Each,
}

fn parse_path(path: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    for part in path.split('.') {
        let mut key = part;
        let mut each = 0;
        while let Some(stripped) = key.strip_suffix("[]") {
            key = stripped;
            each += 1;
        }
        if !key.is_empty() {
            segments.push(Segment::Key(key));
        }
        segments.extend(std::iter::repeat_with(|| Segment::Each).take(each));
    }
    segments
}

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

/// A concrete location a field path expands to.
#[derive(Debug)]
enum Location<'v> {
    Missing(String),
    Present(String, &'v Value),
    /// A value on the way to the field that can't hold it.
    Misshapen {
        path: String,
        /// Schema path of the container, e.g. `run.configs[]`.
        pattern: String,
        value: &'v Value,
        problem: &'static str,
    },
}

/// Expands `segments` over `value`, yielding each concrete location.
///
/// A missing final key is yielded as missing; missing intermediate keys
/// yield nothing, the parent field reports those.
fn resolve<'v>(
    value: &'v Value,
    segments: &[Segment<'_>],
    prefix: String,
    pattern: String,
    out: &mut Vec<Location<'v>>,
) {
    let Some((first, rest)) = segments.split_first() else {
        out.push(Location::Present(prefix, value));
        return;
    };

    match first {
        Segment::Key(key) => {
            let Some(map) = value.as_mapping() else {
                out.push(Location::Misshapen {
                    path: prefix,
                    pattern,
                    value,
                    problem: "Must be a mapping",
                });
                return;
            };
            let path = join(&prefix, key);
            let pattern = join(&pattern, key);
            match map.get(*key) {
                Some(child) if !child.is_null() => resolve(child, rest, path, pattern, out),
                _ if rest.is_empty() => out.push(Location::Missing(path)),
                _ => {}
            }
        }
        Segment::Each => {
            let Some(items) = value.as_sequence() else {
                out.push(Location::Misshapen {
                    path: prefix,
                    pattern,
                    value,
                    problem: "Must be an array",
                });
                return;
            };
            let pattern = format!("{pattern}[]");
            for (index, item) in items.iter().enumerate() {
                resolve(item, rest, format!("{prefix}[{index}]"), pattern.clone(), out);
            }
        }
    }
}

/// Reports the topmost keys under `value` that no field accounts for.
fn collect_extras(
    spec: &SectionSpec,
    value: &Value,
    pattern: &str,
    concrete: &str,
    issues: &mut Vec<Issue>,
) {
    match value {
        Value::Mapping(map) => {
            for (key, child) in map {
                let key = match key.as_str() {
                    Some(key) => key.to_string(),
                    None => render_value(key),
                };
                let child_pattern = join(pattern, &key);
                let child_concrete = join(concrete, &key);
                if spec.knows(&child_pattern) {
                    collect_extras(spec, child, &child_pattern, &child_concrete, issues);
                } else {
                    issues.push(Issue {
                        kind: IssueKind::ExtraMetadata,
                        path: child_concrete,
                        value: None,
                        problems: Vec::new(),
                    });
                }
            }
        }
        Value::Sequence(items) => {
            let item_pattern = format!("{pattern}[]");
            for (index, item) in items.iter().enumerate() {
                collect_extras(
                    spec,
                    item,
                    &item_pattern,
                    &format!("{concrete}[{index}]"),
                    issues,
                );
            }
        }
        _ => {}
    }
}

/// Renders a value the way it appears in check output.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => format!("'{s}'"),
        other => serde_json::to_string(other).unwrap_or_else(|_| format!("{other:?}")),
    }
}

fn lowercase_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Multi-line detail for `demo configure --check`.
pub fn describe_section(report: &SectionReport, verbose: bool) -> String {
    let mut out = String::new();

    let extras: Vec<&Issue> = report.warnings().collect();
    if verbose && !extras.is_empty() {
        out.push_str("  This data isn't recognized and won't be used:\n");
        for issue in &extras {
            out.push_str(&format!("    - {}\n", issue.path));
        }
    }

    let required: Vec<&Issue> = report
        .errors()
        .filter(|issue| issue.kind == IssueKind::RequiredMetadata)
        .collect();
    if !required.is_empty() {
        out.push_str("  These fields are required but weren't found:\n");
        for issue in &required {
            out.push_str(&format!("    - {}\n", issue.path));
        }
    }

    for issue in report
        .errors()
        .filter(|issue| issue.kind == IssueKind::CheckedValue)
    {
        out.push_str(&format!("  {}\n", issue.path));
        if let Some(value) = &issue.value {
            out.push_str(&format!("     value: {value}\n"));
        }
        out.push_str("     issues:\n");
        for problem in &issue.problems {
            out.push_str(&format!("        - {problem}\n"));
        }
    }

    out
}
