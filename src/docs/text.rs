//! Lays out guide markdown as plain text for `less`.
//!
//! Headings set the indentation of the body that follows them; paragraphs
//! and list items are wrapped at [`WRAP_WIDTH`]; tables are padded into
//! columns with the last column wrapped.

use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use textwrap::wrap;

/// Column at which prose is wrapped.
pub const WRAP_WIDTH: usize = 70;

/// The last table column is never squeezed below this width.
const MIN_LAST_COLUMN: usize = 45;

const LIST_PREFIX: &str = "+ ";
const COLUMN_GAP: &str = "   ";
const SECTION_MARKER: &str = "___";

const BANNER_INDENT: usize = 44;
const BANNER: &[&str] = &[
    "This doc is displayed by 'less':",
    "  type 'q' to exit",
    "  type '/' to search",
    "  type down arrow to scroll",
];

fn spaces(n: usize) -> String {
    " ".repeat(n)
}

fn heading_indent(level: HeadingLevel) -> usize {
    match level {
        HeadingLevel::H1 | HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        _ => 5,
    }
}

fn body_indent(level: Option<HeadingLevel>) -> usize {
    match level {
        None | Some(HeadingLevel::H1) => 2,
        Some(HeadingLevel::H2) => 3,
        Some(HeadingLevel::H3) => 5,
        Some(_) => 8,
    }
}

/// Banner reminding the reader how to drive `less`.
pub fn banner() -> String {
    BANNER
        .iter()
        .map(|line| format!("{}{line}\n", spaces(BANNER_INDENT)))
        .collect()
}

/// Renders a guide's markdown, banner included.
pub fn markdown_to_text(markdown: &str) -> String {
    let mut layout = Layout::default();
    for event in Parser::new_ext(markdown, Options::ENABLE_TABLES) {
        layout.event(event);
    }
    format!("{}{}", banner(), layout.out)
}

#[derive(Default)]
struct TableState {
    rows: Vec<Vec<String>>,
    row: Vec<String>,
}

#[derive(Default)]
struct Layout {
    out: String,
    inline: String,
    heading: Option<HeadingLevel>,
    /// One entry per open list: the next number of an ordered list.
    lists: Vec<Option<u64>>,
    /// Text of the innermost list item not yet written.
    item: Option<String>,
    code: Option<String>,
    table: Option<TableState>,
}

impl Layout {
    fn indent(&self) -> usize {
        body_indent(self.heading)
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => match &mut self.code {
                Some(code) => code.push_str(&text),
                None => self.inline.push_str(&text),
            },
            Event::Code(code) => self.inline.push_str(&code),
            Event::SoftBreak => self.inline.push(' '),
            Event::HardBreak => self.inline.push('\n'),
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Heading { .. } | Tag::Paragraph | Tag::TableCell => self.inline.clear(),
            Tag::List(start) => {
                self.flush_item();
                self.lists.push(start);
            }
            Tag::Item => {
                self.inline.clear();
                self.item = Some(String::new());
            }
            Tag::CodeBlock(_) => self.code = Some(String::new()),
            Tag::Table(_) => self.table = Some(TableState::default()),
            Tag::TableHead | Tag::TableRow => {
                if let Some(table) = &mut self.table {
                    table.row.clear();
                }
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Heading(level) => self.write_heading(level),
            TagEnd::Paragraph => {
                let text = std::mem::take(&mut self.inline);
                match &mut self.item {
                    Some(item) => {
                        if !item.is_empty() {
                            item.push(' ');
                        }
                        item.push_str(text.trim());
                    }
                    None => self.write_paragraph(&text),
                }
            }
            TagEnd::Item => {
                if let Some(item) = &mut self.item {
                    item.push_str(self.inline.trim());
                }
                self.inline.clear();
                self.flush_item();
                self.item = None;
            }
            TagEnd::List(_) => {
                self.lists.pop();
                if self.lists.is_empty() {
                    self.out.push('\n');
                } else {
                    // Back in the parent item, whose text was already written.
                    self.item = Some(String::new());
                }
            }
            TagEnd::CodeBlock => {
                if let Some(code) = self.code.take() {
                    let indent = spaces(self.indent() + 2);
                    for line in code.trim_end_matches('\n').lines() {
                        self.out.push_str(format!("{indent}{line}").trim_end());
                        self.out.push('\n');
                    }
                    self.out.push('\n');
                }
            }
            TagEnd::TableCell => {
                let cell = std::mem::take(&mut self.inline).trim().to_string();
                if let Some(table) = &mut self.table {
                    table.row.push(cell);
                }
            }
            TagEnd::TableHead | TagEnd::TableRow => {
                if let Some(table) = &mut self.table {
                    let row = std::mem::take(&mut table.row);
                    table.rows.push(row);
                }
            }
            TagEnd::Table => {
                if let Some(table) = self.table.take() {
                    let indent = spaces(self.indent());
                    for line in layout_table(&table.rows, WRAP_WIDTH).lines() {
                        if line.is_empty() {
                            self.out.push('\n');
                        } else {
                            self.out.push_str(&format!("{indent}{line}\n"));
                        }
                    }
                    self.out.push('\n');
                }
            }
            _ => {}
        }
    }

    fn write_heading(&mut self, level: HeadingLevel) {
        let text = std::mem::take(&mut self.inline).trim().to_string();
        self.heading = Some(level);
        let indent = spaces(heading_indent(level));

        if matches!(level, HeadingLevel::H1 | HeadingLevel::H2) {
            self.out.push('\n');
        }
        self.out.push_str(&format!("{indent}{text}\n"));
        if level == HeadingLevel::H2 {
            self.out
                .push_str(&format!("{indent}{}\n", "=".repeat(text.chars().count())));
        }
        self.out.push('\n');
    }

    fn write_paragraph(&mut self, text: &str) {
        let indent = spaces(self.indent());
        for line in wrap(text.trim(), WRAP_WIDTH) {
            self.out.push_str(&format!("{indent}{line}\n"));
        }
        self.out.push('\n');
    }

    /// Writes the pending item text with its bullet.
    fn flush_item(&mut self) {
        let Some(item) = self.item.take() else {
            return;
        };
        let text = if item.is_empty() {
            std::mem::take(&mut self.inline).trim().to_string()
        } else {
            item
        };
        self.inline.clear();
        if text.is_empty() {
            return;
        }

        let depth = self.lists.len().saturating_sub(1);
        let prefix = match self.lists.last_mut() {
            Some(Some(number)) => {
                let prefix = format!("{number}. ");
                *number += 1;
                prefix
            }
            _ => LIST_PREFIX.to_string(),
        };
        let indent = spaces(self.indent() + depth * 2);
        let continuation = format!("{indent}{}", spaces(prefix.len()));
        let width = WRAP_WIDTH.saturating_sub(prefix.len()).max(1);

        for (index, line) in wrap(&text, width).into_iter().enumerate() {
            if index == 0 {
                self.out.push_str(&format!("{indent}{prefix}{line}\n"));
            } else {
                self.out.push_str(&format!("{continuation}{line}\n"));
            }
        }
    }
}

/// Lays out table rows in padded columns.
///
/// A row whose first cell starts with `___` becomes a heading inside the
/// table, and the other rows are then indented under it. Rows with no text
/// are dropped.
pub fn layout_table(rows: &[Vec<String>], wrap_width: usize) -> String {
    let is_heading = |row: &Vec<String>| {
        row.first()
            .is_some_and(|cell| cell.starts_with(SECTION_MARKER))
    };
    let has_headings = rows.iter().any(is_heading);

    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    let mut widths = vec![0; columns];
    for row in rows.iter().filter(|row| !is_heading(*row)) {
        for (index, cell) in row.iter().enumerate() {
            widths[index] = widths[index].max(cell.chars().count());
        }
    }

    let mut out = String::new();
    for row in rows {
        if is_heading(row) {
            let title = row[0].trim_start_matches(SECTION_MARKER).trim();
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(&format!("{title}\n\n"));
            continue;
        }

        let mut line = String::new();
        let mut used = 0;
        let last = columns.saturating_sub(1);
        for (index, width) in widths.iter().enumerate() {
            let cell = row.get(index).map(String::as_str).unwrap_or("");
            if index < last {
                let padding = width.saturating_sub(cell.chars().count());
                line.push_str(cell);
                line.push_str(&spaces(padding));
                line.push_str(COLUMN_GAP);
                used += width + COLUMN_GAP.len();
                continue;
            }

            let max = wrap_width.saturating_sub(used).max(MIN_LAST_COLUMN);
            let wrapped = wrap(cell, max);
            for (i, piece) in wrapped.iter().enumerate() {
                if i > 0 {
                    line.push('\n');
                    line.push_str(&spaces(used + 2));
                }
                line.push_str(piece);
            }
        }

        if line.trim().is_empty() {
            continue;
        }
        let line = line
            .lines()
            .map(str::trim_end)
            .collect::<Vec<_>>()
            .join("\n");
        if has_headings {
            out.push_str("  ");
        }
        out.push_str(&line);
        out.push('\n');
    }
    out
}
