use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::debug;

use crate::audit::{AuditEntry, staging_path, write_entry};
use crate::cli::output::Output;
use crate::processor::FileResult;

/// Counts reported by [`ResultWriter::finish`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriterStats {
    pub written: usize,
    pub staged: usize,
}

/// Serializes results as JSON lines and stages successful hashes
///
/// Owned by the single writer thread, so neither the sink nor the staging
/// file needs any locking. Write failures are reported and skipped; they never
/// abort the run.
pub struct ResultWriter<'a, W: Write> {
    sink: W,
    staging: Option<BufWriter<File>>,
    output: &'a Output,
    stats: WriterStats,
}

impl<'a, W: Write> ResultWriter<'a, W> {
    pub fn new(sink: W, output: &'a Output) -> Self {
        Self {
            sink,
            staging: None,
            output,
            stats: WriterStats::default(),
        }
    }

    /// Also write `{filename, hash}` of every exit-0 result to `<hashes_file>.new`
    ///
    /// The staging file is truncated. If it cannot be created the error is
    /// reported and the run continues without staging.
    pub fn with_staging(mut self, hashes_file: &Path) -> Self {
        let path = staging_path(hashes_file);
        match File::create(&path) {
            Ok(file) => {
                debug!("Staging successful hashes in {}", path.display());
                self.staging = Some(BufWriter::new(file));
            }
            Err(err) => {
                self.output
                    .file_error(&format!("Error creating {}: {err}", path.display()));
            }
        }
        self
    }

    pub fn is_staging(&self) -> bool {
        self.staging.is_some()
    }

    pub fn write(&mut self, result: &FileResult) {
        match write_result(&mut self.sink, result) {
            Ok(()) => self.stats.written += 1,
            Err(err) => self
                .output
                .file_error(&format!("Error encoding result for {}: {err}", result.filename)),
        }

        if result.exit_code != 0 {
            return;
        }
        if let Some(staging) = &mut self.staging {
            let entry = AuditEntry {
                filename: result.filename.clone(),
                hash: result.hash.clone(),
            };
            match write_entry(staging, &entry) {
                Ok(()) => self.stats.staged += 1,
                Err(err) => self
                    .output
                    .file_error(&format!("Error writing staging entry for {}: {err}", result.filename)),
            }
        }
    }

    /// Flush the sink and close the staging file
    pub fn finish(mut self) -> WriterStats {
        if let Err(err) = self.sink.flush() {
            self.output.file_error(&format!("Error flushing results: {err}"));
        }
        if let Some(mut staging) = self.staging.take()
            && let Err(err) = staging.flush()
        {
            self.output
                .file_error(&format!("Error flushing staging file: {err}"));
        }
        self.stats
    }
}

fn write_result<W: Write>(sink: &mut W, result: &FileResult) -> std::io::Result<()> {
    serde_json::to_writer(&mut *sink, result)?;
    sink.write_all(b"\n")
}
