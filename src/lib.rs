//! # hashcheck - content-hash gated command runner
//!
//! Hashes files with SHA-256, runs a command on each one and streams one JSON
//! line per file. A JSON Lines hashes file turns this into an incremental
//! check: audit mode only runs the command on files whose content changed,
//! and update mode records the files that passed.
//!
//! ## Quick Start
//!
//! ```bash
//! # Lint only the files that changed since the last passing run
//! git ls-files '*.rs' | hashcheck -a -u -f .hashes.jsonl -c 'rustfmt --check $FILE'
//!
//! # Keep only results whose command exited 0 or 1
//! hashcheck -c 'grep -q TODO' --success-exit-codes 0 --error-exit-codes 1 src/*.rs
//! ```

pub mod audit;
pub mod cli;
pub mod command;
pub mod config;
pub mod error;
pub mod hash;
pub mod parallel;
pub mod processor;

pub use cli::{Cli, Output};
pub use config::Config;

/// Result type alias for hashcheck operations
pub type Result<T> = anyhow::Result<T>;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
