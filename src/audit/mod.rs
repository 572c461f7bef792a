//! Hashes file (audit store)
//!
//! The hashes file is JSON Lines, one `{"filename": ..., "hash": ...}` record
//! per line. It is read as a map: when a filename appears more than once the
//! last record wins.
//!
//! During an update run new hashes are appended to a staging file next to it
//! (`<hashes file>.new`); [`AuditStore::merge`] folds that file into the main
//! store once the run is over.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::AuditError;

/// Filename to last recorded hash
pub type AuditMap = BTreeMap<String, String>;

/// Suffix of the staging file written during update runs
pub const STAGING_SUFFIX: &str = ".new";

/// One persisted record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub filename: String,
    pub hash: String,
}

/// What [`AuditStore::merge`] did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// There was no staging file
    NoStagingFile,
    /// The staging file held no records; it was removed
    EmptyStaging,
    /// Staging records were folded into the store
    Merged {
        /// Records in the store after the merge
        total: usize,
        /// Records taken from the staging file
        staged: usize,
    },
}

/// A hashes file on disk
#[derive(Debug, Clone)]
pub struct AuditStore {
    path: PathBuf,
}

impl AuditStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn staging_path(&self) -> PathBuf {
        staging_path(&self.path)
    }

    /// Load the store, creating an empty file if it does not exist yet
    ///
    /// A malformed record is an error: the store must be trustworthy for the
    /// whole run to be meaningful.
    pub fn load(&self) -> Result<AuditMap, AuditError> {
        match File::open(&self.path) {
            Ok(file) => read_records(&self.path, file),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                warn!(
                    "Hashes file '{}' does not exist, creating empty file",
                    self.path.display()
                );
                File::create(&self.path).map_err(|source| AuditError::Create {
                    path: self.path.clone(),
                    source,
                })?;
                Ok(AuditMap::new())
            }
            Err(source) => Err(AuditError::Open {
                path: self.path.clone(),
                source,
            }),
        }
    }

    /// Fold the staging file into the store
    ///
    /// Staging records overwrite existing records with the same filename;
    /// every other existing record is kept. The staging file is removed
    /// afterwards. A missing store is treated as empty.
    pub fn merge(&self) -> Result<MergeOutcome, AuditError> {
        let staging = self.staging_path();

        let staged = match File::open(&staging) {
            Ok(file) => read_records(&staging, file)?,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("No staging file at {}", staging.display());
                return Ok(MergeOutcome::NoStagingFile);
            }
            Err(source) => {
                return Err(AuditError::Open {
                    path: staging,
                    source,
                });
            }
        };

        if staged.is_empty() {
            remove_staging(&staging)?;
            return Ok(MergeOutcome::EmptyStaging);
        }

        let mut merged = match File::open(&self.path) {
            Ok(file) => read_records(&self.path, file)?,
            Err(err) if err.kind() == ErrorKind::NotFound => AuditMap::new(),
            Err(source) => {
                return Err(AuditError::Open {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let staged_count = staged.len();
        merged.extend(staged);
        self.write(&merged)?;
        remove_staging(&staging)?;

        debug!(
            "Merged {} staged hashes into {} ({} total)",
            staged_count,
            self.path.display(),
            merged.len()
        );

        Ok(MergeOutcome::Merged {
            total: merged.len(),
            staged: staged_count,
        })
    }

    /// Replace the store's contents with `map`
    pub fn write(&self, map: &AuditMap) -> Result<(), AuditError> {
        let write_err = |source: std::io::Error| AuditError::Write {
            path: self.path.clone(),
            source,
        };

        let file = File::create(&self.path).map_err(write_err)?;
        let mut writer = BufWriter::new(file);
        for (filename, hash) in map {
            write_entry(
                &mut writer,
                &AuditEntry {
                    filename: filename.clone(),
                    hash: hash.clone(),
                },
            )
            .map_err(write_err)?;
        }
        writer.flush().map_err(write_err)
    }
}

/// `<path>.new`
pub fn staging_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(STAGING_SUFFIX);
    PathBuf::from(name)
}

/// Serialize one record as a JSON line
pub fn write_entry<W: Write>(writer: &mut W, entry: &AuditEntry) -> std::io::Result<()> {
    serde_json::to_writer(&mut *writer, entry)?;
    writer.write_all(b"\n")
}

fn read_records(path: &Path, file: File) -> Result<AuditMap, AuditError> {
    let mut map = AuditMap::new();

    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|source| AuditError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        if line.trim().is_empty() {
            continue;
        }

        let entry: AuditEntry =
            serde_json::from_str(&line).map_err(|source| AuditError::Malformed {
                path: path.to_path_buf(),
                line: index + 1,
                source,
            })?;
        map.insert(entry.filename, entry.hash);
    }

    Ok(map)
}

fn remove_staging(path: &Path) -> Result<(), AuditError> {
    fs::remove_file(path).map_err(|source| AuditError::RemoveStaging {
        path: path.to_path_buf(),
        source,
    })
}
