//! Usage guides printed by `demo help`.

use crate::docs::guides::{Location, COMMAND_GUIDES};

/// One `demo help <command>` page.
#[derive(Debug, Clone, Copy)]
pub struct Usage {
    pub command: &'static str,
    pub short_description: &'static str,
    /// `(description, snippet)` pairs.
    pub examples: &'static [(&'static str, &'static str)],
    pub formats: &'static [&'static str],
    /// `(option, summary)` pairs.
    pub options: &'static [(&'static str, &'static str)],
    pub long_description: &'static [&'static str],
    pub notes: &'static [&'static str],
}

const UP_OPTIONS: &[(&str, &str)] = &[
    ("-f, --demofile <file>", "Use this demo file instead of ./demo.yml"),
    ("-y, --yes", "Skip the dry run and confirmation"),
    ("-q, --quiet", "Skip the confirmation and hide docker's output"),
    ("--share <dir>", "Share this host directory at /shared"),
    ("--no-share", "Don't share a directory"),
    ("--port <port>", "Serve the demo files on this host port"),
    ("--no-port", "Don't map a port"),
];

const SYNC_OPTIONS: &[(&str, &str)] = &[
    ("--complete", "Also delete files missing from the source"),
    ("-v, --verbose", "List every file copied"),
];

pub const USAGES: &[Usage] = &[
    Usage {
        command: "shell",
        short_description: "Enter a demo shell",
        examples: &[
            ("Enter the demo described by ./demo.yml", "$ demo shell"),
            ("Enter a demo without a demo file", "$ demo shell demomag/ants"),
        ],
        formats: &[
            "demo shell",
            "demo shell <demo-image>",
            "demo shell -f <demo-file>",
        ],
        options: UP_OPTIONS,
        long_description: &[
            "Downloads the demo image if needed, starts a container from it if one isn't running, then attaches this terminal to a bash shell inside it.",
            "Before changing anything the steps are shown and you're asked to confirm.",
        ],
        notes: &["Exiting the shell leaves the demo running. Run 'demo down' to stop it."],
    },
    Usage {
        command: "up",
        short_description: "Start a demo in the background",
        examples: &[("Start the demo described by ./demo.yml", "$ demo up")],
        formats: &["demo up", "demo up <demo-image>", "demo up -f <demo-file>"],
        options: UP_OPTIONS,
        long_description: &[
            "Does everything 'demo shell' does except attaching to the demo.",
        ],
        notes: &[],
    },
    Usage {
        command: "down",
        short_description: "Stop a demo",
        examples: &[("Stop the demo described by ./demo.yml", "$ demo down")],
        formats: &["demo down", "demo down <demo-image>", "demo down -f <demo-file>"],
        options: &[("-f, --demofile <file>", "Use this demo file instead of ./demo.yml")],
        long_description: &[
            "Kills the demo's container. The container is removed, so files not shared with 'demo share' are lost.",
        ],
        notes: &[],
    },
    Usage {
        command: "run",
        short_description: "Run the demo",
        examples: &[
            ("Run the default configuration", "$ demo run"),
            ("See the other configurations", "$ demo run --list"),
        ],
        formats: &["demo run", "demo run <config>", "demo run --list"],
        options: &[("--list", "List the run configurations")],
        long_description: &[
            "Runs one of the scripts listed under 'run' in the demo file. The first one is the default.",
        ],
        notes: &["Only works inside a demo shell."],
    },
    Usage {
        command: "build",
        short_description: "Rebuild the demo from source",
        examples: &[
            ("Build the default configuration", "$ demo build"),
            ("Clean, then build", "$ demo build --clean"),
        ],
        formats: &["demo build", "demo build <config>", "demo build --clean", "demo build --list"],
        options: &[
            ("--clean", "Run the clean script first"),
            ("--list", "List the build configurations"),
        ],
        long_description: &[
            "Runs one of the scripts listed under 'build' in the demo file. The first one is the default.",
        ],
        notes: &["Only works inside a demo shell."],
    },
    Usage {
        command: "share",
        short_description: "Copy the current directory to your computer",
        examples: &[("Share the current directory", "$ demo share")],
        formats: &["demo share", "demo share --complete"],
        options: SYNC_OPTIONS,
        long_description: &[
            "Copies the current directory into the shared directory, under the same absolute path. Files are owned by the user that created the shared directory.",
        ],
        notes: &["Needs a demo started with a shared directory."],
    },
    Usage {
        command: "sync",
        short_description: "Copy the current directory back from your computer",
        examples: &[("Bring back changes made on your computer", "$ demo sync")],
        formats: &["demo sync", "demo sync --complete"],
        options: SYNC_OPTIONS,
        long_description: &["The reverse of 'demo share'."],
        notes: &["Needs a demo started with a shared directory."],
    },
    Usage {
        command: "docs",
        short_description: "Read the demo's guides",
        examples: &[
            ("Show the list of guides", "$ demo docs"),
            ("Show the guide of 'demo run'", "$ demo docs run"),
        ],
        formats: &["demo docs", "demo docs <guide>", "demo docs --make"],
        options: &[
            ("--make", "Regenerate every guide"),
            ("--demofile <file>", "Demo file the guides are made from"),
            ("--out <dir>", "Directory the guides are written to"),
        ],
        long_description: &[
            "Guides are shown with 'less'. They are generated from the demo file with 'demo docs --make'.",
        ],
        notes: &[],
    },
    Usage {
        command: "configure",
        short_description: "Describe and check the demo file",
        examples: &[
            ("Check every section of ./demo.yml", "$ demo configure --check"),
            ("Check only the 'run' section", "$ demo configure --check run"),
        ],
        formats: &["demo configure", "demo configure --check [section]"],
        options: &[
            ("--check", "Check the demo file"),
            ("--demofile <file>", "Check this demo file"),
            ("-v, --verbose", "Show each check and unrecognized data"),
            ("--json", "Print the check report as JSON"),
        ],
        long_description: &[
            "Without --check, lists the sections a demo file can have.",
        ],
        notes: &[],
    },
    Usage {
        command: "help",
        short_description: "Learn about a Demo CLI command",
        examples: &[
            ("Learn about the 'demo shell' command", "$ demo help shell"),
            ("Show this guide", "$ demo help help"),
        ],
        formats: &["demo help", "demo help <command>"],
        options: &[],
        long_description: &[
            "Shows a guide like this one for a Demo CLI command. Run 'demo help' for a list of all commands.",
        ],
        notes: &[],
    },
];

pub fn usage(command: &str) -> Option<&'static Usage> {
    USAGES.iter().find(|usage| usage.command == command)
}

fn header(title: &str, description: &str) -> String {
    format!(
        " ____\n|  _ \\    {title}\n| | | |\n| |_| |   {description}\n|____/\n"
    )
}

fn section(out: &mut String, heading: &str, lines: impl IntoIterator<Item = String>) {
    out.push_str(&format!("\n{heading}\n\n"));
    for line in lines {
        out.push_str(&line);
        out.push('\n');
    }
}

fn columns(rows: &[(&str, &str)]) -> Vec<String> {
    let width = rows.iter().map(|(left, _)| left.len()).max().unwrap_or(0);
    rows.iter()
        .map(|(left, right)| format!("  {left:width$}   {right}"))
        .collect()
}

fn get_help() -> Vec<String> {
    vec![
        "  Show this guide:\n\n    $ demo help\n".to_string(),
        "  Get help with a specific command:\n\n    $ demo help <command>".to_string(),
    ]
}

pub fn render(usage: &Usage) -> String {
    let mut out = header(
        &format!("Demo CLI - demo {}", usage.command),
        usage.short_description,
    );

    if !usage.examples.is_empty() {
        let examples = usage
            .examples
            .iter()
            .map(|(description, snippet)| format!("  {description}:\n\n    {snippet}\n"));
        section(&mut out, "Examples:", examples);
    }

    section(
        &mut out,
        "Usage:",
        usage.formats.iter().map(|format| format!("  {format}")),
    );

    if !usage.options.is_empty() {
        section(&mut out, "Options:", columns(usage.options));
    }

    section(
        &mut out,
        "Long description:",
        usage
            .long_description
            .iter()
            .map(|paragraph| textwrap::indent(&textwrap::fill(paragraph, 76), "  ")),
    );

    if !usage.notes.is_empty() {
        section(
            &mut out,
            "Notes and limitations:",
            usage.notes.iter().map(|note| format!("  - {note}")),
        );
    }

    section(&mut out, "Get help:", get_help());
    out
}

/// The `demo help` page listing every command.
pub fn render_overview() -> String {
    let mut out = header("Demo CLI", "Enter, run and share Docker demos");

    let rows = |location: Location| -> Vec<(&'static str, &'static str)> {
        COMMAND_GUIDES
            .iter()
            .filter(|guide| guide.location == location)
            .map(|guide| (guide.name, guide.summary))
            .collect()
    };
    section(&mut out, "On your computer:", columns(&rows(Location::Host)));
    section(&mut out, "Inside a demo:", columns(&rows(Location::Demo)));
    section(&mut out, "Anywhere:", columns(&rows(Location::Anywhere)));
    section(&mut out, "Get help:", get_help());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_command_has_usage() {
        for guide in COMMAND_GUIDES {
            assert!(usage(guide.name).is_some(), "no usage for {}", guide.name);
        }
    }

    #[test]
    fn test_render_layout() {
        let text = render(usage("help").unwrap());
        assert!(text.starts_with(" ____\n|  _ \\    Demo CLI - demo help\n"));
        assert!(text.contains("\nExamples:\n\n  Learn about the 'demo shell' command:\n\n    $ demo help shell\n"));
        assert!(text.contains("\nUsage:\n\n  demo help\n  demo help <command>\n"));
        assert!(!text.contains("Options:"));
        assert!(text.ends_with("$ demo help <command>\n"));
    }

    #[test]
    fn test_options_are_aligned() {
        let text = render(usage("down").unwrap());
        assert!(text.contains("  -f, --demofile <file>   Use this demo file instead of ./demo.yml\n"));
    }

    #[test]
    fn test_overview_lists_commands_by_location() {
        let text = render_overview();
        let host = text.find("On your computer:").unwrap();
        let demo = text.find("Inside a demo:").unwrap();
        let shell = text.find("  shell").unwrap();
        let run = text.find("  run ").unwrap();
        assert!(host < shell && shell < demo && demo < run);
    }
}
