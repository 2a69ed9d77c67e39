//! depsweep - Find and clean stale entries in package-manager caches.
//!
//! Usage:
//!   depsweep scan              Preview what a cleanup would remove
//!   depsweep clean             Delete the previewed entries
//!   depsweep detect [PATH]     Guess a project's ecosystem
//!   depsweep locate            Show the default repository roots
//!   depsweep --help            Show help

mod settings;

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use clap::{Args, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result, bail, eyre};
use strum::IntoEnumIterator;

use depsweep_core::{CleanupSummary, Ecosystem, FilterOptions, ScanConfig};
use depsweep_ops::{CleanupComplete, CleanupEvent, CleanupExecutor, format_size, start_cleanup};
use depsweep_scan::{ScanEvent, default_root, is_valid_repo_path, start_scan};

use settings::UserSettings;

#[derive(Parser)]
#[command(
    name = "depsweep",
    version,
    about = "Find and clean stale entries in package-manager caches",
    long_about = "depsweep scans a Maven, Gradle, npm or pip repository and reports \
                  snapshot builds, failed downloads, platform-specific binaries or a \
                  named package.\n\nRun `depsweep scan` to preview, then `depsweep clean` \
                  to delete."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan a repository and show the cleanup preview
    Scan {
        #[command(flatten)]
        target: TargetArgs,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Scan a repository and delete what it reports
    Clean {
        #[command(flatten)]
        target: TargetArgs,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,

        /// Show what would be deleted without deleting it
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Move entries to the trash instead of deleting them
        #[arg(long)]
        trash: bool,
    },

    /// Detect the ecosystem of a project directory
    Detect {
        /// Project directory
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Show the default repository root of each ecosystem
    Locate {
        /// Only show this ecosystem
        #[arg(short, long)]
        ecosystem: Option<Ecosystem>,

        /// Project directory searched for `node_modules`
        #[arg(short, long)]
        project: Option<PathBuf>,
    },
}

/// Repository selection and filters shared by `scan` and `clean`.
#[derive(Args)]
struct TargetArgs {
    /// Ecosystem to scan (maven, gradle, npm, pip); detected from the
    /// current directory when omitted
    #[arg(short, long)]
    ecosystem: Option<Ecosystem>,

    /// Repository root (defaults to the ecosystem's standard location)
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Report snapshot and prerelease versions
    #[arg(short, long)]
    snapshot: bool,

    /// Report failed or incomplete downloads
    #[arg(short, long)]
    invalid: bool,

    /// Report platform-specific native packages
    #[arg(long)]
    native: bool,

    /// Report packages whose name matches this value
    #[arg(short, long)]
    target: Option<String>,

    /// Skip pip distributions installed by other tools
    #[arg(long)]
    skip_foreign_installers: bool,

    /// Settings file (defaults to the user config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    match cli.command {
        Command::Scan { target, format } => {
            run_scan(&target, format).await?;
        }
        Command::Clean {
            target,
            yes,
            dry_run,
            trash,
        } => {
            run_clean(&target, yes, dry_run, trash).await?;
        }
        Command::Detect { path } => {
            run_detect(&path)?;
        }
        Command::Locate { ecosystem, project } => {
            run_locate(ecosystem, project.as_deref())?;
        }
    }

    Ok(())
}

impl TargetArgs {
    fn settings(&self) -> Result<UserSettings> {
        match &self.config {
            Some(path) => UserSettings::load_from(path),
            None => Ok(UserSettings::load()),
        }
    }

    /// Filters from the command line, or the configured ones when no
    /// filter flag is given.
    fn filters(&self, settings: &UserSettings) -> FilterOptions {
        let filters = FilterOptions {
            include_snapshot: self.snapshot,
            show_invalid_packages: self.invalid,
            show_platform_specific_binaries: self.native,
            target_package: self.target.clone().unwrap_or_default(),
        };
        if filters.has_any_filter() {
            filters
        } else {
            settings.filters.clone()
        }
    }

    fn scan_config(&self, settings: &UserSettings) -> Result<ScanConfig> {
        let cwd = std::env::current_dir().context("Cannot read current directory")?;

        let ecosystem = match self.ecosystem {
            Some(ecosystem) => ecosystem,
            None => Ecosystem::detect(&cwd)
                .ok_or_else(|| eyre!("Cannot detect the ecosystem here; pass --ecosystem"))?,
        };

        let root = match (&self.root, settings.root_for(ecosystem)) {
            (Some(root), _) => root.clone(),
            (None, Some(root)) => root.to_path_buf(),
            (None, None) => default_root(ecosystem, Some(&cwd))
                .ok_or_else(|| eyre!("No {ecosystem} repository found; pass --root"))?,
        };

        let mut config = ScanConfig::new(root, ecosystem).with_filters(self.filters(settings));
        config.skip_foreign_installers =
            self.skip_foreign_installers || settings.skip_foreign_installers;
        Ok(config)
    }
}

/// Run a scan in the background, printing progress to stderr.
async fn scan_with_progress(config: ScanConfig) -> Result<CleanupSummary> {
    eprintln!("Scanning {} ({})...", config.root.display(), config.ecosystem);

    let mut rx = start_scan(config);
    let mut result = None;
    while let Some(event) = rx.recv().await {
        match event {
            ScanEvent::Progress(progress) => {
                eprint!(
                    "\r {} directories, {}/{} packages",
                    progress.directories_visited, progress.units_processed, progress.units_total
                );
            }
            ScanEvent::Complete(complete) => result = Some(complete),
        }
    }
    eprintln!();

    let summary = result
        .ok_or_else(|| eyre!("Scan ended without a result"))?
        .context("Scan failed")?;
    Ok(summary)
}

/// Run a scan and print the cleanup preview.
async fn run_scan(args: &TargetArgs, format: OutputFormat) -> Result<()> {
    let settings = args.settings()?;
    let config = args.scan_config(&settings)?;
    let summary = scan_with_progress(config).await?;

    match format {
        OutputFormat::Text => print_summary(&summary),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
    }

    Ok(())
}

/// Run a scan and delete the selected entries.
async fn run_clean(args: &TargetArgs, yes: bool, dry_run: bool, trash: bool) -> Result<()> {
    let settings = args.settings()?;
    let config = args.scan_config(&settings)?;
    if !dry_run && !is_valid_repo_path(&config.root) {
        bail!("{} is not a writable directory", config.root.display());
    }

    let summary = scan_with_progress(config).await?;
    print_summary(&summary);

    let count = summary.selected().count();
    if count == 0 || dry_run {
        return Ok(());
    }
    if !yes && !confirm(&format!(
        "Delete {} items ({})?",
        count,
        format_size(summary.selected_size())
    ))? {
        println!("Nothing deleted.");
        return Ok(());
    }

    let executor = CleanupExecutor {
        use_trash: trash || settings.use_trash,
    };
    let entries = summary.selected().cloned().collect();
    let mut rx = start_cleanup(summary.ecosystem, entries, executor);

    let mut complete: Option<CleanupComplete> = None;
    while let Some(event) = rx.recv().await {
        match event {
            CleanupEvent::Progress(progress) => {
                eprint!(
                    "\r Cleaning {}/{} ({:.0}%)",
                    progress.completed,
                    progress.total,
                    progress.percentage()
                );
            }
            CleanupEvent::Complete(c) => complete = Some(c),
        }
    }
    eprintln!();

    let complete = complete.ok_or_else(|| eyre!("Cleanup ended without a result"))?;
    println!("{}", complete.summary());
    for failed in complete.results.iter().filter(|r| !r.success) {
        println!(
            "  failed: {} ({})",
            failed.path.display(),
            failed.error_message.as_deref().unwrap_or("unknown error")
        );
    }

    if !complete.is_success() {
        bail!("{} entries could not be cleaned", complete.failed());
    }
    Ok(())
}

/// Print the detected ecosystem of a project.
fn run_detect(path: &Path) -> Result<()> {
    let path = path.canonicalize().context("Invalid path")?;
    match Ecosystem::detect(&path) {
        Some(ecosystem) => println!("{ecosystem}"),
        None => bail!("No build markers found in {}", path.display()),
    }
    Ok(())
}

/// Print the default root of one or all ecosystems.
fn run_locate(ecosystem: Option<Ecosystem>, project: Option<&Path>) -> Result<()> {
    let settings = UserSettings::load();
    let ecosystems: Vec<Ecosystem> = match ecosystem {
        Some(ecosystem) => vec![ecosystem],
        None => Ecosystem::iter().collect(),
    };

    for ecosystem in ecosystems {
        let root = settings
            .root_for(ecosystem)
            .map(Path::to_path_buf)
            .or_else(|| default_root(ecosystem, project));
        match root {
            Some(root) => {
                let note = if is_valid_repo_path(&root) {
                    ""
                } else {
                    " (read-only)"
                };
                println!("{:<8} {}{}", ecosystem.to_string(), root.display(), note);
            }
            None => println!("{:<8} -", ecosystem.to_string()),
        }
    }

    Ok(())
}

fn print_summary(summary: &CleanupSummary) {
    println!();
    println!("{}", "─".repeat(70));
    println!(
        " {} packages scanned, {} reported - {}",
        summary.total_scanned_count,
        summary.total_count,
        format_size(summary.total_size)
    );
    println!("{}", "─".repeat(70));
    println!();

    if summary.entries.is_empty() {
        println!(" Nothing to clean.");
    }
    for entry in &summary.entries {
        println!(
            " {:<10} {:>10}  {}  {}",
            entry.match_type.label(summary.ecosystem),
            format_size(entry.file_size),
            format_date(entry.last_modified),
            truncate(&entry.package_name, 44)
        );
    }

    if !summary.warnings.is_empty() {
        println!();
        println!("{} warning(s) during scan", summary.warnings.len());
    }
}

/// Ask a yes/no question on stdin. Anything but `y` or `yes` is a no.
fn confirm(question: &str) -> Result<bool> {
    print!("{question} [y/N] ");
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn format_date(time: std::time::SystemTime) -> String {
    DateTime::<Local>::from(time).format("%Y-%m-%d").to_string()
}

/// Truncate a string to max length.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len - 1).collect();
        format!("{kept}…")
    }
}
