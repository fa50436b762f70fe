//! measure-ai-proficiency - Command-line interface for the proficiency scanner
//!
//! Scans local repositories, a directory of cloned repositories, or GitHub
//! repositories and reports their AI context engineering maturity.

mod remote;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use proficiency_scanner::output::{
    to_csv, to_json, to_json_multiple, to_markdown, to_markdown_summary, to_terminal,
    to_terminal_summary,
};
use proficiency_scanner::{RepoConfig, RepoScore, Scanner, MAX_LEVEL};
use std::path::PathBuf;
use tracing::{debug, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Every scanned repository is at Level 1
const EXIT_ALL_LEVEL_1: i32 = 2;

#[derive(Parser)]
#[command(name = "measure-ai-proficiency")]
#[command(about = "Measure AI coding proficiency from context engineering artifacts")]
#[command(version)]
struct Cli {
    /// Repository directories to scan
    #[arg(value_name = "PATH", default_value = ".")]
    paths: Vec<PathBuf>,

    /// Scan every repository directly inside a directory
    #[arg(long, value_name = "DIR", conflicts_with_all = ["github_repo", "github_org"])]
    org: Option<PathBuf>,

    /// Scan a GitHub repository without cloning it (requires gh)
    #[arg(long, value_name = "OWNER/REPO", conflicts_with = "github_org")]
    github_repo: Option<String>,

    /// Scan every repository of a GitHub organization (requires gh)
    #[arg(long, value_name = "ORG")]
    github_org: Option<String>,

    /// Maximum number of repositories listed with --github-org
    #[arg(long, default_value_t = 100)]
    limit: usize,

    /// Output format
    #[arg(short, long, value_enum, default_value = "terminal")]
    format: OutputFormat,

    /// Write the report to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Hide matched files in terminal reports
    #[arg(short, long)]
    quiet: bool,

    /// Only report repositories at or above this level
    #[arg(long, value_name = "LEVEL", value_parser = clap::value_parser!(u8).range(1..=i64::from(MAX_LEVEL)))]
    min_level: Option<u8>,

    /// Config file applied to every repository instead of its own
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long)]
    verbose: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    Terminal,
    Json,
    Markdown,
    Csv,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();
}

fn run(cli: &Cli) -> Result<i32> {
    let config = cli
        .config
        .as_deref()
        .map(|path| {
            RepoConfig::from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))
        })
        .transpose()?;

    let scanner = Scanner::new();
    let (results, single) = collect_scores(cli, &scanner, config)?;

    let mut scores = Vec::new();
    for result in results {
        match result {
            Ok(score) => scores.push(score),
            Err(e) if single => return Err(e),
            Err(e) => warn!("Skipping repository: {e:#}"),
        }
    }
    if scores.is_empty() {
        bail!("No repositories could be scanned");
    }

    let exit_code = if scores.iter().all(|s| s.overall_level == 1) {
        EXIT_ALL_LEVEL_1
    } else {
        0
    };

    if let Some(min_level) = cli.min_level {
        let before = scores.len();
        scores.retain(|s| s.overall_level >= min_level);
        debug!(
            "{} of {before} repositories at level {min_level} or above",
            scores.len()
        );
    }

    if cli.output.is_some() {
        console::set_colors_enabled(false);
    }
    let report = render(&scores, cli.format, single, cli.quiet)?;

    match &cli.output {
        Some(path) => {
            std::fs::write(path, report)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            if !cli.quiet {
                eprintln!("Report written to: {}", path.display());
            }
        }
        None => print!("{report}"),
    }

    Ok(exit_code)
}

/// Scan whichever source the arguments select
///
/// The flag is true when exactly one repository was requested, in which
/// case a failure is fatal and the detailed report is rendered.
fn collect_scores(
    cli: &Cli,
    scanner: &Scanner,
    config: Option<RepoConfig>,
) -> Result<(Vec<Result<RepoScore>>, bool)> {
    if let Some(repo) = &cli.github_repo {
        remote::ensure_gh()?;
        return Ok((vec![remote::scan_repo(scanner, repo, config)], true));
    }
    if let Some(org) = &cli.github_org {
        remote::ensure_gh()?;
        return Ok((remote::scan_org(scanner, org, cli.limit, config.as_ref())?, false));
    }
    if let Some(dir) = &cli.org {
        let results = scanner.scan_directory_of_repos(dir, config.as_ref())?;
        return Ok((results.into_iter().map(|r| r.map_err(Into::into)).collect(), false));
    }

    let results = scanner
        .scan_many(&cli.paths, config.as_ref())
        .into_iter()
        .map(|r| r.map_err(Into::into))
        .collect();
    Ok((results, cli.paths.len() == 1))
}

fn render(scores: &[RepoScore], format: OutputFormat, single: bool, quiet: bool) -> Result<String> {
    let single_score = if single { scores.first() } else { None };

    let report = match (format, single_score) {
        (OutputFormat::Terminal, Some(score)) => to_terminal(score, !quiet),
        (OutputFormat::Terminal, None) => to_terminal_summary(scores),
        (OutputFormat::Json, Some(score)) => to_json(score)?,
        (OutputFormat::Json, None) => to_json_multiple(scores)?,
        (OutputFormat::Markdown, Some(score)) => to_markdown(score),
        (OutputFormat::Markdown, None) => to_markdown_summary(scores),
        (OutputFormat::Csv, _) => to_csv(scores),
    };
    Ok(report)
}
