//! dupehunter - duplicate file finder
//!
//! Finds byte-identical files under a directory in two stages: files are
//! bucketed by exact size (no I/O beyond metadata), then only buckets with
//! two or more members are read in fixed-size chunks and fingerprinted with
//! BLAKE3. Anything that cannot be listed, sized or read is reported as a
//! skipped entry instead of failing the scan.
//!
//! ```no_run
//! use std::path::Path;
//!
//! let report = dupehunter::find_duplicates(Path::new(".")).unwrap();
//! for set in &report.sets {
//!     println!("{} bytes: {:?}", set.size, set.files);
//! }
//! for skipped in &report.diagnostics {
//!     eprintln!("skipped {} ({}): {}", skipped.path.display(), skipped.kind, skipped.reason);
//! }
//! ```

pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod signal;

use std::io::{IsTerminal, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;

use crate::cli::{Cli, Commands, OutputFormat, ScanArgs};
use crate::config::Config;
use crate::duplicates::{DuplicateFinder, FinderError, ScanReport};
use crate::error::ExitCode;
use crate::output::{JsonOutput, TextOutput};
use crate::progress::Progress;

/// Scan `root` with default settings.
///
/// Returns the duplicate sets together with every skipped entry.
///
/// # Errors
///
/// Fails only if `root` is not a listable directory.
pub fn find_duplicates(root: &Path) -> Result<ScanReport, FinderError> {
    DuplicateFinder::with_defaults().find_duplicates(root)
}

/// Run the command line application.
///
/// # Errors
///
/// Returns an error for an invalid root, an interrupted scan, a broken
/// configuration file or a failed write to stdout.
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);

    let config = match cli.config {
        Some(ref path) => Config::load_from(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => Config::load(),
    };

    match cli.command {
        Commands::Scan(ref args) => run_scan(&cli, args, config),
        Commands::Config => show_config(&cli, &config),
    }
}

/// Layer scan flags over the loaded configuration.
fn merge_scan_args(mut config: Config, args: &ScanArgs) -> Config {
    if let Some(output) = args.output {
        config.output = output;
    }
    if let Some(threads) = args.io_threads {
        config.io_threads = usize::from(threads);
    }
    if args.min_size.is_some() {
        config.min_size = args.min_size;
    }
    if args.max_size.is_some() {
        config.max_size = args.max_size;
    }
    config.ignore_patterns.extend(args.ignore_patterns.iter().cloned());
    config.follow_symlinks |= args.follow_symlinks;
    config.skip_hidden |= args.skip_hidden;
    config.include_empty |= args.include_empty;
    config.verify |= args.verify;
    config
}

fn run_scan(cli: &Cli, args: &ScanArgs, config: Config) -> anyhow::Result<ExitCode> {
    let config = merge_scan_args(config, args);
    if let (Some(min), Some(max)) = (config.min_size, config.max_size) {
        if min > max {
            anyhow::bail!("--min-size ({min}) is larger than --max-size ({max})");
        }
    }
    log::debug!("Effective configuration: {config:?}");

    let handler = signal::install_handler()?;
    let show_progress = !cli.quiet && std::io::stderr().is_terminal();

    let mut finder_config = config
        .finder_config()
        .with_shutdown_flag(handler.get_flag());
    if show_progress {
        finder_config = finder_config.with_progress_callback(Arc::new(Progress::new(false)));
    }

    let report = DuplicateFinder::new(finder_config).find_duplicates(&args.path)?;
    let exit_code = ExitCode::for_scan(report.has_duplicates(), report.diagnostics.len());

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match config.output {
        OutputFormat::Text => {
            let color = !cli.no_color && stdout.is_terminal();
            TextOutput::from_report(&report, color)
                .write_to(&mut out)
                .context("Failed to write report")?;
        }
        OutputFormat::Json => {
            JsonOutput::new(&report.sets, &report.diagnostics, &report.summary, exit_code)
                .write_to(&mut out, true)
                .context("Failed to write JSON report")?;
        }
    }
    out.flush().context("Failed to flush stdout")?;

    Ok(exit_code)
}

fn show_config(cli: &Cli, config: &Config) -> anyhow::Result<ExitCode> {
    let location = match cli.config {
        Some(ref path) => path.display().to_string(),
        None => match Config::default_path() {
            Ok(path) => path.display().to_string(),
            Err(e) => format!("<unavailable: {e}>"),
        },
    };

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "# Configuration file: {location}")?;
    writeln!(out, "# Environment prefix: {}", config::ENV_PREFIX)?;
    writeln!(out, "# Log level: {}", logging::current_level_name())?;
    write!(out, "{}", config.to_toml()?)?;
    Ok(ExitCode::Success)
}
