//! Error types for hashcheck
//!
//! Per-file failures ([`HashError`]) are recoverable: the file is logged and
//! dropped from the run. Audit store and configuration failures abort the run.

use std::path::PathBuf;
use thiserror::Error;

/// Failure to hash a single file
#[derive(Debug, Error)]
pub enum HashError {
    #[error("cannot open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Fatal failure of the hashes file or its staging file
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("error creating hashes file {path}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error opening hashes file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error reading hashes file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed record in hashes file {path} at line {line}: {source}")]
    Malformed {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("error writing hashes file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error removing staging file {path}: {source}")]
    RemoveStaging {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Invalid run configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("either a check command (-c) or audit mode (--audit) is required")]
    MissingCommand,

    #[error("audit mode requires a hashes file (-f)")]
    AuditRequiresHashesFile,

    #[error("update mode requires a hashes file (-f)")]
    UpdateRequiresHashesFile,

    #[error("no files to process")]
    NoFiles,

    #[error("invalid settings: {0}")]
    Settings(#[from] Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        ConfigError::Settings(Box::new(err))
    }
}
