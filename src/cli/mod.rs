//! Command-line interface for hashcheck
//!
//! Parses flags with clap, layers them over the settings file and
//! environment, then drives one pipeline run followed by the optional merge
//! of staged hashes.

use anyhow::Result;
use clap::Parser;
use std::io;
use std::path::PathBuf;
use tracing::{debug, info};

use crate::audit::{AuditStore, MergeOutcome};
use crate::config::{Config, Settings, SettingsOverrides, parse_exit_codes};
use crate::error::ConfigError;
use crate::parallel::Pipeline;

pub mod input;
pub mod output;

pub use output::Output;

#[derive(Parser, Debug)]
#[command(
    name = "hashcheck",
    version = env!("CARGO_PKG_VERSION"),
    about = "Run a command on files, skipping the ones whose content hash has not changed",
    long_about = "Hashes each file with SHA-256, optionally runs a command on it and prints one \
                  JSON line per file to stdout. With a hashes file, audit mode only runs the \
                  command on files whose recorded hash changed, and update mode records the \
                  hashes of files whose command succeeded.\n\n\
                  Files are taken from the arguments, or read one per line from stdin."
)]
pub struct Cli {
    /// Command to run on each file ($FILE is replaced by the quoted path)
    #[arg(short = 'c', long = "check-command", value_name = "COMMAND")]
    pub check_command: Option<String>,

    /// Only run the command on files whose recorded hash changed
    #[arg(short, long)]
    pub audit: bool,

    /// Hashes file (JSON Lines) used for audit and update
    #[arg(short = 'f', long, value_name = "FILE")]
    pub hashes_file: Option<PathBuf>,

    /// Record hashes of files whose command exited 0 into the hashes file
    #[arg(short, long)]
    pub update: bool,

    /// Comma-separated exit codes counted as success
    #[arg(long, value_name = "CODES", allow_hyphen_values = true)]
    pub success_exit_codes: Option<String>,

    /// Comma-separated exit codes counted as errors (-1 = failed to run)
    #[arg(long, value_name = "CODES", allow_hyphen_values = true)]
    pub error_exit_codes: Option<String>,

    /// Number of worker threads (0 = one per CPU)
    #[arg(short, long, value_name = "N")]
    pub workers: Option<usize>,

    /// Show a progress bar and a final summary on stderr
    #[arg(short, long)]
    pub progress: bool,

    /// Suppress diagnostics (and results, when a hashes file is set)
    #[arg(short, long)]
    pub quiet: bool,

    /// Increase verbosity (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Use custom settings file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Files to process (read from stdin when omitted)
    pub files: Vec<String>,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        setup_logging(self.verbose, self.quiet);

        let (overrides, invalid_codes) = self.overrides();
        let settings = Settings::load(self.config.as_deref(), &overrides)?;
        let config = Config::try_from(settings)?;
        debug!("Resolved configuration: {:?}", config);

        let output = Output::new(config.quiet);
        for entry in &invalid_codes {
            output.warning(&format!("Invalid exit code '{entry}', ignoring"));
        }

        let mut files = input::collect_files(self.files)?;
        if files.is_empty() && config.hashes_file.is_none() {
            return Err(ConfigError::NoFiles.into());
        }

        let audit = match &config.hashes_file {
            Some(path) => Some(AuditStore::new(path).load()?),
            None => None,
        };

        // No files given: check everything the hashes file knows about
        if files.is_empty()
            && let Some(audit) = &audit
        {
            files = audit.keys().cloned().collect();
            debug!("Checking all {} recorded files", files.len());
        }

        let pipeline = Pipeline::new(&config, audit.as_ref(), &output);
        let summary = if config.quiet && config.hashes_file.is_some() {
            pipeline.run(files, io::sink())?
        } else {
            pipeline.run(files, io::stdout())?
        };
        info!(
            "Processed {} files: {} results, {} changed, {} errors",
            summary.processed, summary.emitted, summary.changed, summary.errored
        );

        if config.update
            && let Some(path) = &config.hashes_file
        {
            match AuditStore::new(path).merge()? {
                MergeOutcome::Merged { total, staged } => info!(
                    "Merged {} hashes into {} ({} total)",
                    staged,
                    path.display(),
                    total
                ),
                outcome => debug!("Nothing merged: {:?}", outcome),
            }
        }

        Ok(())
    }

    /// Settings explicitly given on the command line, plus any exit code
    /// list entries that could not be parsed
    fn overrides(&self) -> (SettingsOverrides, Vec<String>) {
        let mut invalid = Vec::new();
        let mut codes = |list: &Option<String>| {
            list.as_deref().map(|list| {
                let (codes, bad) = parse_exit_codes(list);
                invalid.extend(bad);
                codes
            })
        };

        let success_exit_codes = codes(&self.success_exit_codes);
        let error_exit_codes = codes(&self.error_exit_codes);

        let overrides = SettingsOverrides {
            command: self.check_command.clone(),
            hashes_file: self.hashes_file.clone(),
            audit: self.audit.then_some(true),
            update: self.update.then_some(true),
            success_exit_codes,
            error_exit_codes,
            workers: self.workers,
            progress: self.progress.then_some(true),
            quiet: self.quiet.then_some(true),
        };

        (overrides, invalid)
    }
}

fn setup_logging(verbose: u8, quiet: bool) {
    if quiet {
        return;
    }

    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        match verbose {
            0 => tracing_subscriber::EnvFilter::new("warn"),
            1 => tracing_subscriber::EnvFilter::new("info"),
            2 => tracing_subscriber::EnvFilter::new("debug"),
            _ => tracing_subscriber::EnvFilter::new("trace"),
        }
    });

    // stdout carries the result stream
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}
