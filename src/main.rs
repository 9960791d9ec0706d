//! implements - CLI

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use implements::analysis::{analyze, Direction, Query};
use implements::frontend::module::{IndexTrust, PackageChoice};
use implements::util::config::{Config, Overrides};
use implements::util::logger::{self, LogLevel};
use implements::VERSION;
use tracing::{info, warn};

/// Lists which Go types implement which interfaces
#[derive(Parser, Debug)]
#[command(name = "implements")]
#[command(version = VERSION)]
#[command(about, long_about = None)]
struct Args {
    /// Comma-separated packages to scan for interfaces [default: std]
    #[arg(long, value_name = "PATTERNS")]
    interfaces: Option<String>,

    /// Comma-separated packages whose types are checked
    #[arg(long, value_name = "PATTERNS")]
    types: Option<String>,

    /// List implementers per interface instead of interfaces per type
    #[arg(long)]
    reverse: bool,

    /// Standard library source root (e.g. $GOROOT/src)
    #[arg(long, value_name = "DIR")]
    std_root: Option<PathBuf>,

    /// Workspace source root; may be repeated
    #[arg(long = "root", value_name = "DIR")]
    roots: Vec<PathBuf>,

    /// Directory holding export data
    #[arg(long, value_name = "DIR")]
    index_dir: Option<PathBuf>,

    /// When export data is used: never, std, fresh
    #[arg(long, value_name = "POLICY")]
    index_trust: Option<IndexTrust>,

    /// Write export data for every package checked from source
    #[arg(long)]
    write_index: bool,

    /// Which package to pick in multi-package directories: prefer-non-main, first, unique
    #[arg(long, value_name = "POLICY")]
    package_choice: Option<PackageChoice>,

    /// Target operating system for file selection
    #[arg(long, value_name = "GOOS")]
    goos: Option<String>,

    /// Target architecture for file selection
    #[arg(long, value_name = "GOARCH")]
    goarch: Option<String>,

    /// Comma-separated extra build tags
    #[arg(long, value_name = "TAGS")]
    tags: Option<String>,

    /// Config file to use instead of ./implements.toml
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable debug logging on stderr
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            config_file: self.config.clone(),
            std_root: self.std_root.clone(),
            roots: self.roots.clone(),
            index_dir: self.index_dir.clone(),
            index_trust: self.index_trust,
            package_choice: self.package_choice,
            goos: self.goos.clone(),
            goarch: self.goarch.clone(),
            tags: self.tags.as_ref().map(|tags| {
                tags.split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string)
                    .collect()
            }),
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    logger::init_with_level(LogLevel::from_verbose(args.verbose));

    let Some(types) = args.types.clone().filter(|t| !t.trim().is_empty()) else {
        eprintln!("{}", Args::command().render_usage());
        eprintln!("error: --types is required");
        return ExitCode::FAILURE;
    };

    match run(&args, &types) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(
    args: &Args,
    types: &str,
) -> Result<()> {
    let config = Config::load(&args.overrides()).context("Failed to load configuration")?;
    let interfaces = args
        .interfaces
        .clone()
        .unwrap_or_else(|| config.default_interfaces.clone());
    let direction = if args.reverse {
        Direction::Reverse
    } else {
        Direction::Forward
    };

    let mut resolver = config.resolver();
    let query = Query::from_patterns(&interfaces, types, direction, resolver.locator());
    info!(
        interfaces = query.interfaces.len(),
        types = query.types.len(),
        "expanded package patterns"
    );
    let analysis = analyze(&mut resolver, &query);

    for failure in &analysis.failures {
        eprintln!("{}", failure);
    }
    print!("{}", analysis.report);

    if args.write_index {
        if config.index_dir.is_none() {
            warn!("--write-index needs an index directory (--index-dir or IMPLEMENTS_INDEX_DIR)");
        } else if let Err(err) = resolver.write_index() {
            warn!(error = %err, "failed to write export data");
        }
    }

    Ok(())
}
