//! CLI command definitions for demo.
//!
//! Host commands (`shell`, `up`, `down`) drive Docker from your computer;
//! demo commands (`run`, `build`, `share`, `sync`, `docs`) only make sense
//! inside a demo container. `configure` and `help` work anywhere.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context};
use clap::Parser;
use tracing::{info, warn};

use super::usage;
use crate::demofile::check::{self, describe_section, CheckReport};
use crate::demofile::schema::{self, SECTIONS};
use crate::demofile::{self, Demofile, ScriptKind};
use crate::docker::{absolute_shared_dir, ContainerState, DockerClient};
use crate::docs;
use crate::error::DemofileError;
use crate::lifecycle::{Lifecycle, UpOutcome, UpRequest};
use crate::paths::{DemoPaths, DEFAULT_DEMO_ROOT, DEFAULT_SHARED_ROOT};
use crate::process::{CommandRunner, SystemRunner};
use crate::script::{render_config_list, ScriptRunner};
use crate::sync::{self, SyncDirection, SyncOptions};

/// Enter, run and share Docker demos.
#[derive(Parser)]
#[command(name = "demo")]
#[command(about = "Enter, run and share Docker demos")]
#[command(version)]
#[command(disable_help_subcommand = true)]
#[command(
    long_about = "demo starts a demo's Docker container and attaches a shell to it, runs and rebuilds the demo inside it, and copies files between the demo and your computer.\n\nExample usage:\n  demo shell\n  demo run --list"
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "warn", global = true)]
    pub log_level: String,

    /// Directory holding a demo's files inside its container.
    #[arg(long, env = "DEMO_ROOT", default_value = DEFAULT_DEMO_ROOT, global = true)]
    pub demo_root: PathBuf,

    /// Mount point of the shared directory inside a demo container.
    #[arg(long, env = "DEMO_SHARED_ROOT", default_value = DEFAULT_SHARED_ROOT, global = true)]
    pub shared_root: PathBuf,
}

/// Available CLI subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Enter a demo shell, starting the demo if needed.
    Shell(UpArgs),

    /// Start the demo in the background.
    Up(UpArgs),

    /// Stop the demo.
    Down(DownArgs),

    /// Run the demo.
    Run(RunArgs),

    /// Rebuild the demo from source.
    Build(BuildArgs),

    /// Copy the current directory to the shared directory.
    Share(SyncArgs),

    /// Copy the current directory back from the shared directory.
    Sync(SyncArgs),

    /// Read or regenerate the demo's guides.
    Docs(DocsArgs),

    /// Describe and check the demo file.
    Configure(ConfigureArgs),

    /// Show the usage guide of a command.
    Help(HelpArgs),
}

/// Arguments for `demo shell` and `demo up`.
#[derive(Parser, Debug)]
pub struct UpArgs {
    /// Demo image, replaces the demo file's `image`.
    pub image: Option<String>,

    /// Demo file to use instead of ./demo.yml or ./Demofile.
    #[arg(short = 'f', long)]
    pub demofile: Option<PathBuf>,

    /// Skip the dry run and confirmation.
    #[arg(short, long)]
    pub yes: bool,

    /// Skip the confirmation and hide docker's output.
    #[arg(short, long)]
    pub quiet: bool,

    /// Host directory to share at /shared.
    #[arg(long, conflicts_with = "no_share")]
    pub share: Option<PathBuf>,

    /// Don't share a directory, even if the demo file names one.
    #[arg(long)]
    pub no_share: bool,

    /// Host port mapped to the demo's HTTP port.
    #[arg(long, conflicts_with = "no_port", value_parser = clap::value_parser!(u16).range(1..))]
    pub port: Option<u16>,

    /// Don't map a port, even if the demo file names one.
    #[arg(long)]
    pub no_port: bool,
}

/// Arguments for `demo down`.
#[derive(Parser, Debug)]
pub struct DownArgs {
    /// Demo image, replaces the demo file's `image`.
    pub image: Option<String>,

    /// Demo file to use instead of ./demo.yml or ./Demofile.
    #[arg(short = 'f', long)]
    pub demofile: Option<PathBuf>,
}

/// Arguments for `demo run`.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Run configuration, the first one when omitted.
    pub config: Option<String>,

    /// List the run configurations.
    #[arg(long)]
    pub list: bool,
}

/// Arguments for `demo build`.
#[derive(Parser, Debug)]
pub struct BuildArgs {
    /// Build configuration, the first one when omitted.
    pub config: Option<String>,

    /// Run the clean script before building.
    #[arg(long)]
    pub clean: bool,

    /// List the build configurations.
    #[arg(long)]
    pub list: bool,
}

/// Arguments for `demo share` and `demo sync`.
#[derive(Parser, Debug)]
pub struct SyncArgs {
    /// Delete destination files that are missing from the source.
    #[arg(long)]
    pub complete: bool,

    /// List every file copied.
    #[arg(short, long)]
    pub verbose: bool,
}

/// Arguments for `demo docs`.
#[derive(Parser, Debug)]
pub struct DocsArgs {
    /// Guide to show.
    #[arg(default_value = "docs")]
    pub guide: String,

    /// Regenerate every guide.
    #[arg(long)]
    pub make: bool,

    /// Demo file the guides are made from.
    #[arg(long)]
    pub demofile: Option<PathBuf>,

    /// Directory guides are written to and read from.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

/// Arguments for `demo configure`.
#[derive(Parser, Debug)]
pub struct ConfigureArgs {
    /// Only this section.
    pub section: Option<String>,

    /// Check the demo file against the section schema.
    #[arg(long)]
    pub check: bool,

    /// Demo file to check.
    #[arg(long)]
    pub demofile: Option<PathBuf>,

    /// Show every section's checks and unrecognized data.
    #[arg(short, long)]
    pub verbose: bool,

    /// Print the check report as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `demo help`.
#[derive(Parser, Debug)]
pub struct HelpArgs {
    /// Command to show the guide of.
    pub command: Option<String>,
}

/// What handlers run against: where the demo lives and how processes run.
#[derive(Clone)]
pub struct Env {
    pub paths: DemoPaths,
    pub runner: Arc<dyn CommandRunner>,
    pub cwd: PathBuf,
}

impl Env {
    fn docker(&self, quiet: bool) -> DockerClient {
        DockerClient::new(self.runner.clone()).with_quiet(quiet)
    }
}

/// Parse CLI arguments and return the Cli struct.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Run the CLI with pre-parsed arguments.
pub async fn run_with_cli(cli: Cli) -> anyhow::Result<ExitCode> {
    let env = Env {
        paths: DemoPaths::default()
            .with_root(&cli.demo_root)
            .with_shared(&cli.shared_root),
        runner: Arc::new(SystemRunner),
        cwd: std::env::current_dir().context("Failed to read the current directory")?,
    };
    dispatch(cli.command, &env).await
}

pub async fn dispatch(command: Commands, env: &Env) -> anyhow::Result<ExitCode> {
    match command {
        Commands::Shell(args) => run_up_command("shell", args, env, true).await,
        Commands::Up(args) => run_up_command("up", args, env, false).await,
        Commands::Down(args) => run_down_command(args, env).await,
        Commands::Run(args) => {
            run_script_command(ScriptKind::Run, args.config, args.list, false, env).await
        }
        Commands::Build(args) => {
            run_script_command(ScriptKind::Build, args.config, args.list, args.clean, env).await
        }
        Commands::Share(args) => run_sync_command(SyncDirection::Share, args, env).await,
        Commands::Sync(args) => run_sync_command(SyncDirection::Sync, args, env).await,
        Commands::Docs(args) => run_docs_command(args, env).await,
        Commands::Configure(args) => run_configure_command(args, env),
        Commands::Help(args) => run_help_command(args),
    }
}

// ============================================================================
// Guards and shared helpers
// ============================================================================

fn require_host(paths: &DemoPaths, command: &str) -> anyhow::Result<()> {
    if paths.is_inside_demo() {
        bail!("Can't run 'demo {command}' from within a demo shell");
    }
    Ok(())
}

fn require_demo(paths: &DemoPaths, command: &str) -> anyhow::Result<()> {
    if !paths.is_inside_demo() {
        bail!("Can't run 'demo {command}' from outside of a demo shell");
    }
    Ok(())
}

/// Asks a yes/no question on stdin; anything but `y`/`yes` is a no.
fn confirm(prompt: &str) -> anyhow::Result<bool> {
    print!("{prompt} [y/n] ");
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}

/// Loads the demofile for a host command, if there is one.
///
/// With no demofile around, an explicit image is enough; without either the
/// command can't know which demo to act on.
fn host_demofile(
    command: &str,
    explicit: Option<&Path>,
    image: Option<&str>,
    cwd: &Path,
) -> anyhow::Result<Option<Demofile>> {
    let required: &[&str] = if image.is_some() { &[] } else { &["image"] };
    match demofile::locate(explicit, cwd) {
        Some(path) => Ok(Some(Demofile::load(&path, required)?)),
        None if image.is_some() => Ok(None),
        None => Err(DemofileError::NotFound {
            command: command.to_string(),
        }
        .into()),
    }
}

fn resolve_image(image: Option<String>, demofile: Option<&Demofile>) -> anyhow::Result<String> {
    image
        .or_else(|| demofile.and_then(|d| d.image.clone()))
        .ok_or_else(|| anyhow!("Need a demo image, give one or add 'image' to the demo file"))
}

fn container_for(image: &str, demofile: Option<&Demofile>) -> String {
    demofile::container_name(image, demofile.and_then(|d| d.instance.as_deref()))
}

fn up_request(command: &str, args: &UpArgs, cwd: &Path) -> anyhow::Result<UpRequest> {
    let demofile = host_demofile(
        command,
        args.demofile.as_deref(),
        args.image.as_deref(),
        cwd,
    )?;
    let demofile = demofile.as_ref();
    let image = resolve_image(args.image.clone(), demofile)?;

    let shared_dir = if args.no_share {
        None
    } else {
        args.share
            .clone()
            .or_else(|| demofile.and_then(|d| d.shared_directory.as_ref().map(PathBuf::from)))
            .map(|dir| absolute_shared_dir(&dir, cwd))
    };
    let port = if args.no_port {
        None
    } else {
        args.port.or_else(|| demofile.and_then(|d| d.port))
    };

    Ok(UpRequest {
        container: container_for(&image, demofile),
        image,
        shared_dir,
        port,
    })
}

// ============================================================================
// Host commands
// ============================================================================

async fn run_up_command(
    command: &str,
    args: UpArgs,
    env: &Env,
    attach: bool,
) -> anyhow::Result<ExitCode> {
    require_host(&env.paths, command)?;
    let request = up_request(command, &args, &env.cwd)?;
    info!(command, image = %request.image, container = %request.container, "Bringing demo up");

    let lifecycle = Lifecycle::new(env.docker(args.quiet)).with_quiet(args.quiet);

    if !(args.yes || args.quiet) {
        let plan = lifecycle.plan(&request).await?;
        println!("{}", plan.dry_run(&request, attach).render());
        if !confirm("Do you want to continue?")? {
            return Ok(ExitCode::SUCCESS);
        }
    }

    lifecycle.ensure_pulled(&request.image).await?;
    let outcome = lifecycle.ensure_up(&request).await?;

    if attach {
        if !args.quiet {
            println!("\nEntering shell ...\n");
        }
        lifecycle.docker().exec_shell(&request.container).await?;
    } else {
        println!("{}", up_message(outcome));
    }
    Ok(ExitCode::SUCCESS)
}

fn up_message(outcome: UpOutcome) -> &'static str {
    match outcome {
        UpOutcome::Started => "Demo is up, now run 'demo shell' to enter it",
        UpOutcome::AlreadyUp => "Demo is already up, run 'demo shell' to enter it",
    }
}

async fn run_down_command(args: DownArgs, env: &Env) -> anyhow::Result<ExitCode> {
    require_host(&env.paths, "down")?;
    let demofile = host_demofile(
        "down",
        args.demofile.as_deref(),
        args.image.as_deref(),
        &env.cwd,
    )?;
    let image = resolve_image(args.image, demofile.as_ref())?;
    let container = container_for(&image, demofile.as_ref());

    let docker = env.docker(true);
    if docker.container_state(&container).await? != ContainerState::Running {
        bail!("Demo isn't up, run 'demo shell' first");
    }
    docker.kill_container(&container).await?;

    println!("\nDemo is down. Relaunch a fresh container by running 'demo shell'.\n");
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// Demo commands
// ============================================================================

async fn run_script_command(
    kind: ScriptKind,
    config: Option<String>,
    list: bool,
    clean: bool,
    env: &Env,
) -> anyhow::Result<ExitCode> {
    let command = kind.section();
    require_demo(&env.paths, command)?;
    let demofile = Demofile::load(&env.paths.demofile(), &[command])?;

    if list {
        print!("{}", render_config_list(kind, demofile.configs(kind)));
        return Ok(ExitCode::SUCCESS);
    }

    let selected = demofile.select_config(kind, config.as_deref())?;
    let scripts = ScriptRunner::new(env.runner.clone(), env.paths.clone());

    if clean {
        let clean_script = demofile
            .build
            .as_ref()
            .and_then(|build| build.clean.as_deref())
            .ok_or_else(|| anyhow!("Need a 'clean' script under 'build' to use --clean"))?;
        scripts.clean(clean_script).await?;
    }

    let success = scripts.execute(kind, selected).await?;
    Ok(if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn run_sync_command(
    direction: SyncDirection,
    args: SyncArgs,
    env: &Env,
) -> anyhow::Result<ExitCode> {
    let command = match direction {
        SyncDirection::Share => "share",
        SyncDirection::Sync => "sync",
    };
    require_demo(&env.paths, command)?;

    if !sync::has_shared_mount(&env.paths) {
        println!("Nothing to sync, no shared directory");
        return Ok(ExitCode::SUCCESS);
    }

    let plan = sync::plan(direction, &env.cwd, &env.paths)?;
    let options = SyncOptions {
        verbose: args.verbose,
        complete: args.complete,
    };
    sync::execute(env.runner.as_ref(), &plan, options).await?;
    Ok(ExitCode::SUCCESS)
}

async fn run_docs_command(args: DocsArgs, env: &Env) -> anyhow::Result<ExitCode> {
    let out_dir = args.out.unwrap_or_else(|| env.paths.guides_dir());

    if args.make {
        let path = args.demofile.unwrap_or_else(|| env.paths.demofile());
        let demofile = Demofile::load(&path, &[])?;
        let report = docs::make_all(&demofile, &out_dir, |name, ok| {
            println!("{} {name}", if ok { "✔" } else { "✖" });
        })?;
        if !report.is_complete() {
            bail!("{}", docs::failures_message(&report.failures).trim_end());
        }
        return Ok(ExitCode::SUCCESS);
    }

    require_demo(&env.paths, "docs")?;
    let path = docs::guide_path(&out_dir, &args.guide)?;
    docs::page(env.runner.as_ref(), &path).await?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// Commands that run anywhere
// ============================================================================

fn run_configure_command(args: ConfigureArgs, env: &Env) -> anyhow::Result<ExitCode> {
    let selected = match args.section.as_deref() {
        Some(name) => {
            vec![schema::section(name).ok_or_else(|| DemofileError::UnknownSection(name.to_string()))?]
        }
        None => Vec::new(),
    };

    if !args.check {
        let specs: Vec<_> = if selected.is_empty() {
            SECTIONS.iter().collect()
        } else {
            selected
        };
        let width = specs.iter().map(|spec| spec.name.len()).max().unwrap_or(0);
        println!("Demo file sections:\n");
        for spec in specs {
            println!("  {:width$}   {}", spec.name, spec.doc);
        }
        println!("\nRun 'demo configure --check' to check a demo file.");
        return Ok(ExitCode::SUCCESS);
    }

    let path = demofile::locate(args.demofile.as_deref(), &env.cwd)
        .or_else(|| env.paths.is_inside_demo().then(|| env.paths.demofile()))
        .ok_or_else(|| DemofileError::NotFound {
            command: "configure".to_string(),
        })?;
    let value = demofile::read_value(&path)?;
    let report = check::check(&value, &selected);

    for section in &report.skipped {
        warn!(section = %section, path = %path.display(), "Section isn't in the demo file, skipping");
        if args.verbose {
            println!("- skipping '{section}', it isn't in '{}'", path.display());
        }
    }
    if report.sections.is_empty() {
        bail!("no sections match demo file data, nothing to do");
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render_check(&report, args.verbose));
    }

    if report.passed() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

/// Progress lines and the failure details of a check.
fn render_check(report: &CheckReport, verbose: bool) -> String {
    let mut out = String::new();
    for section in &report.sections {
        let mark = if section.passed() { "✔" } else { "✖" };
        out.push_str(&format!("{mark} {}\n", section.section));
        if verbose {
            let failed = section.errors().count();
            out.push_str(&format!(
                "  {}/{} checks\n",
                section.checked.saturating_sub(failed),
                section.checked
            ));
            let details = describe_section(section, true);
            if !details.is_empty() {
                out.push_str(&details);
            }
        }
    }

    if report.passed() {
        out.push_str("\n✔ All checks succeeded\n");
        return out;
    }

    out.push_str("\nSome checks failed. Details:\n");
    for section in report.sections.iter().filter(|s| !s.passed()) {
        out.push_str(&format!("\n{}:\n", section.section));
        out.push_str(&describe_section(section, false));
    }
    out
}

fn run_help_command(args: HelpArgs) -> anyhow::Result<ExitCode> {
    match args.command.as_deref() {
        None => print!("{}", usage::render_overview()),
        Some(name) => {
            let page = usage::usage(name).ok_or_else(|| anyhow!("no help guide for '{name}'"))?;
            print!("{}", usage::render(page));
        }
    }
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::testing::RecordingRunner;
    use crate::process::ProcessOutput;
    use std::fs;

    fn env_with(runner: Arc<RecordingRunner>, root: &Path, cwd: &Path) -> Env {
        Env {
            paths: DemoPaths::default()
                .with_root(root.join("demo"))
                .with_shared(root.join("shared")),
            runner,
            cwd: cwd.to_path_buf(),
        }
    }

    fn inside_demo(root: &Path, demofile: &str) {
        fs::create_dir_all(root.join("demo")).unwrap();
        fs::write(root.join("demo/demo.yml"), demofile).unwrap();
    }

    #[test]
    fn test_parse_up_flags() {
        let cli = Cli::try_parse_from([
            "demo", "up", "demomag/ants", "-y", "--share", "work", "--port", "8080",
        ])
        .unwrap();
        assert_eq!(cli.log_level, "warn");
        match cli.command {
            Commands::Up(args) => {
                assert_eq!(args.image.as_deref(), Some("demomag/ants"));
                assert!(args.yes);
                assert_eq!(args.share, Some(PathBuf::from("work")));
                assert_eq!(args.port, Some(8080));
            }
            _ => panic!("expected up"),
        }
    }

    #[test]
    fn test_share_flags_conflict() {
        assert!(Cli::try_parse_from(["demo", "shell", "--share", "x", "--no-share"]).is_err());
        assert!(Cli::try_parse_from(["demo", "shell", "--port", "80", "--no-port"]).is_err());
        assert!(Cli::try_parse_from(["demo", "shell", "--port", "0"]).is_err());
    }

    #[test]
    fn test_global_options_after_subcommand() {
        let cli =
            Cli::try_parse_from(["demo", "run", "fast", "--demo-root", "/opt/demo", "-l", "debug"])
                .unwrap();
        assert_eq!(cli.demo_root, PathBuf::from("/opt/demo"));
        assert_eq!(cli.log_level, "debug");
    }

    #[test]
    fn test_docs_defaults_to_docs_guide() {
        let cli = Cli::try_parse_from(["demo", "docs"]).unwrap();
        match cli.command {
            Commands::Docs(args) => {
                assert_eq!(args.guide, "docs");
                assert!(!args.make);
            }
            _ => panic!("expected docs"),
        }
    }

    #[test]
    fn test_up_request_from_demofile() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(
            tmp.path().join("demo.yml"),
            "image: demomag/ants\ninstance: dev\nshared_directory: work\nport: 4000\n",
        )
        .unwrap();
        let args = UpArgs {
            image: None,
            demofile: None,
            yes: true,
            quiet: false,
            share: None,
            no_share: false,
            port: None,
            no_port: true,
        };

        let request = up_request("up", &args, tmp.path()).unwrap();
        assert_eq!(request.image, "demomag/ants");
        assert_eq!(request.container, "demomag-ants.dev");
        assert_eq!(request.shared_dir, Some(tmp.path().join("work")));
        assert_eq!(request.port, None);
    }

    #[test]
    fn test_up_request_needs_demofile_or_image() {
        let tmp = tempfile::tempdir().unwrap();
        let args = UpArgs {
            image: None,
            demofile: None,
            yes: true,
            quiet: true,
            share: None,
            no_share: false,
            port: None,
            no_port: false,
        };
        let err = up_request("shell", &args, tmp.path()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Need a demo file, run 'demo shell --help' to learn more"
        );

        let args = UpArgs {
            image: Some("demomag/ants".to_string()),
            ..args
        };
        let request = up_request("shell", &args, tmp.path()).unwrap();
        assert_eq!(request.container, "demomag-ants");
        assert_eq!(request.shared_dir, None);
    }

    fn image_args(image: &str) -> UpArgs {
        UpArgs {
            image: Some(image.to_string()),
            demofile: None,
            yes: true,
            quiet: false,
            share: None,
            no_share: false,
            port: None,
            no_port: false,
        }
    }

    #[tokio::test]
    async fn test_shell_starts_then_attaches() {
        let tmp = tempfile::tempdir().unwrap();
        let runner = Arc::new(
            RecordingRunner::new()
                .respond(ProcessOutput::success("3f2a9c\n"))
                .respond(ProcessOutput::failure(1, "Error: No such object: demomag-ants")),
        );
        let env = env_with(runner.clone(), tmp.path(), tmp.path());

        let code = dispatch(Commands::Shell(image_args("demomag/ants")), &env)
            .await
            .unwrap();
        assert_eq!(code, ExitCode::SUCCESS);
        assert_eq!(
            runner.command_lines(),
            vec![
                "docker images -q demomag/ants",
                "docker inspect -f {{.State.Running}} demomag-ants",
                "docker run --name demomag-ants -w /root -d --rm demomag/ants",
                "docker exec -it -w /root demomag-ants /bin/bash",
            ]
        );
        assert_eq!(runner.calls()[3].1, crate::process::StdioMode::Inherit);
    }

    #[tokio::test]
    async fn test_up_leaves_running_demo_alone() {
        let tmp = tempfile::tempdir().unwrap();
        let runner = Arc::new(
            RecordingRunner::new()
                .respond(ProcessOutput::success("3f2a9c\n"))
                .respond(ProcessOutput::success("true\n")),
        );
        let env = env_with(runner.clone(), tmp.path(), tmp.path());

        let code = dispatch(Commands::Up(image_args("demomag/ants")), &env)
            .await
            .unwrap();
        assert_eq!(code, ExitCode::SUCCESS);
        assert_eq!(
            runner.command_lines(),
            vec![
                "docker images -q demomag/ants",
                "docker inspect -f {{.State.Running}} demomag-ants",
            ]
        );
        assert_eq!(
            up_message(UpOutcome::AlreadyUp),
            "Demo is already up, run 'demo shell' to enter it"
        );
    }

    #[tokio::test]
    async fn test_host_commands_refuse_inside_demo() {
        let tmp = tempfile::tempdir().unwrap();
        inside_demo(tmp.path(), "run:\n  configs: []\n");
        let runner = Arc::new(RecordingRunner::new());
        let env = env_with(runner.clone(), tmp.path(), tmp.path());

        let err = dispatch(
            Commands::Down(DownArgs {
                image: Some("demomag/ants".to_string()),
                demofile: None,
            }),
            &env,
        )
        .await
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Can't run 'demo down' from within a demo shell"
        );
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_demo_commands_refuse_outside_demo() {
        let tmp = tempfile::tempdir().unwrap();
        let env = env_with(Arc::new(RecordingRunner::new()), tmp.path(), tmp.path());

        let err = dispatch(
            Commands::Run(RunArgs {
                config: None,
                list: false,
            }),
            &env,
        )
        .await
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Can't run 'demo run' from outside of a demo shell"
        );
    }

    #[tokio::test]
    async fn test_down_requires_running_container() {
        let tmp = tempfile::tempdir().unwrap();
        let runner = Arc::new(RecordingRunner::new().respond(ProcessOutput::success("false\n")));
        let env = env_with(runner.clone(), tmp.path(), tmp.path());

        let err = run_down_command(
            DownArgs {
                image: Some("demomag/ants".to_string()),
                demofile: None,
            },
            &env,
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "Demo isn't up, run 'demo shell' first");
        assert_eq!(
            runner.command_lines(),
            vec!["docker inspect -f {{.State.Running}} demomag-ants"]
        );
    }

    #[tokio::test]
    async fn test_down_kills_running_container() {
        let tmp = tempfile::tempdir().unwrap();
        let runner = Arc::new(RecordingRunner::new().respond(ProcessOutput::success("true\n")));
        let env = env_with(runner.clone(), tmp.path(), tmp.path());

        let code = run_down_command(
            DownArgs {
                image: Some("demomag/ants".to_string()),
                demofile: None,
            },
            &env,
        )
        .await
        .unwrap();
        assert_eq!(code, ExitCode::SUCCESS);
        assert_eq!(runner.command_lines()[1], "docker kill demomag-ants");
    }

    #[tokio::test]
    async fn test_run_relays_script_failure() {
        let tmp = tempfile::tempdir().unwrap();
        inside_demo(
            tmp.path(),
            "run:\n  description: Ants\n  configs:\n    - name: default\n      script: run.sh\n",
        );
        fs::write(tmp.path().join("demo/run.sh"), "exit 3\n").unwrap();
        let runner = Arc::new(RecordingRunner::new().respond(ProcessOutput::failure(3, "")));
        let env = env_with(runner, tmp.path(), tmp.path());

        let code = dispatch(
            Commands::Run(RunArgs {
                config: None,
                list: false,
            }),
            &env,
        )
        .await
        .unwrap();
        assert_eq!(code, ExitCode::FAILURE);
    }

    #[tokio::test]
    async fn test_run_unknown_config() {
        let tmp = tempfile::tempdir().unwrap();
        inside_demo(
            tmp.path(),
            "run:\n  configs:\n    - name: default\n      script: run.sh\n",
        );
        let env = env_with(Arc::new(RecordingRunner::new()), tmp.path(), tmp.path());

        let err = dispatch(
            Commands::Run(RunArgs {
                config: Some("fast".to_string()),
                list: false,
            }),
            &env,
        )
        .await
        .unwrap_err();
        assert!(err
            .to_string()
            .starts_with("can't find 'fast' in "));
        assert!(err.to_string().ends_with("Defined configs: [ default ] ?"));
    }

    #[tokio::test]
    async fn test_share_without_mount_is_a_no_op() {
        let tmp = tempfile::tempdir().unwrap();
        inside_demo(tmp.path(), "{}\n");
        let runner = Arc::new(RecordingRunner::new());
        let env = env_with(runner.clone(), tmp.path(), tmp.path());

        let code = dispatch(
            Commands::Share(SyncArgs {
                complete: false,
                verbose: false,
            }),
            &env,
        )
        .await
        .unwrap();
        assert_eq!(code, ExitCode::SUCCESS);
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_configure_check_reports_failure() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("demo.yml"), "image: 3\nport: 8080\n").unwrap();
        let env = env_with(Arc::new(RecordingRunner::new()), tmp.path(), tmp.path());

        let code = run_configure_command(
            ConfigureArgs {
                section: None,
                check: true,
                demofile: None,
                verbose: false,
                json: false,
            },
            &env,
        )
        .unwrap();
        assert_eq!(code, ExitCode::FAILURE);
    }

    #[test]
    fn test_configure_check_with_no_matching_sections() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("demo.yml"), "image: demomag/ants\n").unwrap();
        let env = env_with(Arc::new(RecordingRunner::new()), tmp.path(), tmp.path());

        let err = run_configure_command(
            ConfigureArgs {
                section: Some("run".to_string()),
                check: true,
                demofile: None,
                verbose: false,
                json: false,
            },
            &env,
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "no sections match demo file data, nothing to do"
        );
    }

    #[test]
    fn test_render_check_details() {
        let value: serde_yaml::Value = serde_yaml::from_str("image: 3\nport: 8080\n").unwrap();
        let report = check::check(&value, &[]);
        let text = render_check(&report, false);

        assert!(text.starts_with("✖ image\n"));
        assert!(text.contains("✔ port\n"));
        assert!(text.contains("\nSome checks failed. Details:\n\nimage:\n  image\n     value: 3\n"));
    }

    #[test]
    fn test_render_check_counts_each_location() {
        let value: serde_yaml::Value = serde_yaml::from_str(
            "run:\n  configs:\n    - name: 1\n      script: a.sh\n    - name: 2\n      script: b.sh\n",
        )
        .unwrap();
        let report = check::check(&value, &[]);
        let text = render_check(&report, true);
        assert!(text.contains("✖ run\n  3/5 checks\n"), "{text}");
    }

    #[test]
    fn test_configure_check_fails_on_misshapen_section() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("demo.yml"), "image: demomag/ants\nrun: hello\n").unwrap();
        let env = env_with(Arc::new(RecordingRunner::new()), tmp.path(), tmp.path());

        let code = run_configure_command(
            ConfigureArgs {
                section: Some("run".to_string()),
                check: true,
                demofile: None,
                verbose: false,
                json: false,
            },
            &env,
        )
        .unwrap();
        assert_eq!(code, ExitCode::FAILURE);
    }

    #[test]
    fn test_unknown_help_guide() {
        let err = run_help_command(HelpArgs {
            command: Some("dance".to_string()),
        })
        .unwrap_err();
        assert_eq!(err.to_string(), "no help guide for 'dance'");
    }
}
