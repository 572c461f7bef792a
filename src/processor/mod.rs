//! Per-file processing: hash, audit lookup, command, exit-code filter
//!
//! Steps for one file are strictly sequential. A file that cannot be hashed
//! produces no result; neither does one whose command exit code is filtered
//! out.

pub mod classify;

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::audit::AuditMap;
use crate::cli::output::Output;
use crate::command::{CommandRunner, EXEC_FAILED};
use crate::config::Config;
use crate::hash::{BufferPool, CHUNK_SIZE, hash_file};

pub use classify::{ExitCodePolicy, Verdict};

/// One line of the result stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileResult {
    pub filename: String,
    pub hash: String,
    pub exit_code: i32,
    /// The file has a recorded hash in the audit map
    #[serde(default, skip_serializing_if = "is_false")]
    pub audited: bool,
    /// The recorded hash differs from the current one
    #[serde(default, skip_serializing_if = "is_false")]
    pub changed: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// What happened to one input file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// A result to write out
    Emitted(FileResult),
    /// The command's exit code was filtered out
    Filtered { changed: bool, exit_code: i32 },
    /// The file could not be hashed
    Failed,
}

impl FileOutcome {
    pub fn changed(&self) -> bool {
        match self {
            FileOutcome::Emitted(result) => result.changed,
            FileOutcome::Filtered { changed, .. } => *changed,
            FileOutcome::Failed => false,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, FileOutcome::Failed)
    }

    pub fn into_result(self) -> Option<FileResult> {
        match self {
            FileOutcome::Emitted(result) => Some(result),
            _ => None,
        }
    }
}

/// Processes files against one run's configuration and audit map
///
/// Shared by reference between all worker threads.
#[derive(Debug)]
pub struct FileProcessor<'a> {
    config: &'a Config,
    audit: Option<&'a AuditMap>,
    runner: Option<CommandRunner>,
    pool: BufferPool,
    output: &'a Output,
}

impl<'a> FileProcessor<'a> {
    pub fn new(config: &'a Config, audit: Option<&'a AuditMap>, output: &'a Output) -> Self {
        let runner = config
            .has_command()
            .then(|| CommandRunner::new(config.command.as_str()));

        Self {
            config,
            audit,
            runner,
            pool: BufferPool::new(config.workers.max(1), CHUNK_SIZE),
            output,
        }
    }

    /// Process one file, returning its result if it survives filtering
    pub fn process(&self, filename: &str) -> Option<FileResult> {
        self.process_outcome(filename).into_result()
    }

    pub fn process_outcome(&self, filename: &str) -> FileOutcome {
        let hash = match hash_file(Path::new(filename), &self.pool) {
            Ok(hash) => hash,
            Err(err) => {
                self.output.file_error(&format!("Error hashing {filename}: {err}"));
                return FileOutcome::Failed;
            }
        };

        let mut result = FileResult {
            filename: filename.to_string(),
            hash,
            exit_code: 0,
            audited: false,
            changed: false,
        };

        if let Some(recorded) = self.audit.and_then(|audit| audit.get(filename)) {
            result.audited = true;
            result.changed = *recorded != result.hash;
        }

        // Files missing from the audit map are never "changed", so audit
        // mode does not run the command on them
        let runner = match &self.runner {
            Some(runner) if !self.config.audit || result.changed => runner,
            _ => {
                debug!("Skipping command for {}", filename);
                return FileOutcome::Emitted(result);
            }
        };

        result.exit_code = runner.run(filename, self.output);

        let policy = ExitCodePolicy::from_config(self.config);
        if policy.classify(result.exit_code) == Verdict::Discard {
            if policy.needs_exec_failure_hint(result.exit_code) {
                self.output.file_error(&format!(
                    "Command failed to run with exit code {EXEC_FAILED} for {filename}"
                ));
                self.output.hint(&format!(
                    "If expected, add {EXEC_FAILED} to the error exit codes with --error-exit-codes"
                ));
            }
            debug!(
                "Discarding {} with exit code {}",
                filename, result.exit_code
            );
            return FileOutcome::Filtered {
                changed: result.changed,
                exit_code: result.exit_code,
            };
        }

        FileOutcome::Emitted(result)
    }
}
