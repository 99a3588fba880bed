//! Template → markdown → HTML and text files.

use std::path::{Path, PathBuf};

use pulldown_cmark::{html, Options, Parser};
use tera::{Context, Tera};
use tracing::debug;

use super::text::markdown_to_text;
use crate::error::DocsError;

/// Fills a markdown template.
pub fn render_markdown(template: &str, context: &Context) -> Result<String, DocsError> {
    Ok(Tera::one_off(template, context, false)?)
}

/// Converts markdown to HTML wrapped in `<div class="guide">`.
pub fn markdown_to_html(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, Options::ENABLE_TABLES);
    let mut body = String::new();
    html::push_html(&mut body, parser);
    format!("<div class=\"guide\">{body}</div>")
}

/// Files written for one guide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuideFiles {
    pub html: PathBuf,
    pub text: PathBuf,
}

impl GuideFiles {
    pub fn in_dir(dir: &Path, name: &str) -> Self {
        Self {
            html: dir.join(format!("{name}.html")),
            text: dir.join(format!("{name}.txt")),
        }
    }
}

fn write(path: &Path, content: &str) -> Result<(), DocsError> {
    std::fs::write(path, content).map_err(|source| DocsError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Renders a guide and writes both of its files.
pub fn render_guide(template: &str, context: &Context, files: &GuideFiles) -> Result<(), DocsError> {
    let markdown = render_markdown(template, context)?;
    write(&files.html, &markdown_to_html(&markdown))?;
    write(&files.text, &markdown_to_text(&markdown))?;
    debug!(html = %files.html.display(), text = %files.text.display(), "Wrote guide");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_markdown_fills_variables() {
        let mut context = Context::new();
        context.insert("name", "ants");
        context.insert("items", &vec!["a", "b"]);
        let md = render_markdown(
            "# {{ name }}\n{% for item in items %}- {{ item }}\n{% endfor %}",
            &context,
        )
        .unwrap();
        assert_eq!(md, "# ants\n- a\n- b\n");
    }

    #[test]
    fn test_missing_variable_is_an_error() {
        let err = render_markdown("{{ missing }}", &Context::new()).unwrap_err();
        assert!(matches!(err, DocsError::Tera(_)));
    }

    #[test]
    fn test_html_is_wrapped_and_tables_enabled() {
        let html = markdown_to_html("# Title\n\n| a | b |\n|---|---|\n| 1 | 2 |\n");
        assert!(html.starts_with("<div class=\"guide\"><h1>Title</h1>"));
        assert!(html.contains("<table>"));
        assert!(html.ends_with("</div>"));
    }

    #[test]
    fn test_render_guide_writes_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let files = GuideFiles::in_dir(dir.path(), "share");
        let mut context = Context::new();
        context.insert("title", "Share");

        render_guide("# {{ title }}\n\nCopies files.\n", &context, &files).unwrap();

        let html = std::fs::read_to_string(&files.html).unwrap();
        let text = std::fs::read_to_string(&files.text).unwrap();
        assert!(html.contains("<h1>Share</h1>"));
        assert!(text.contains("\n  Share\n\n  Copies files.\n"));
    }

    #[test]
    fn test_unwritable_directory() {
        let dir = tempfile::tempdir().unwrap();
        let files = GuideFiles::in_dir(&dir.path().join("missing"), "x");
        let err = render_guide("text", &Context::new(), &files).unwrap_err();
        assert!(matches!(err, DocsError::Write { .. }));
    }
}
