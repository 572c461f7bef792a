use anyhow::Result;
use crossbeam::channel::{Receiver, Sender, bounded};
use std::io::Write;
use std::time::Duration;
use tracing::{debug, info};

use super::progress::ProgressReporter;
use super::writer::{ResultWriter, WriterStats};
use crate::audit::AuditMap;
use crate::cli::output::Output;
use crate::config::Config;
use crate::processor::{FileProcessor, FileResult};

/// Result channel slots per worker
const RESULT_BUFFER_PER_WORKER: usize = 4;

/// Totals for one pipeline run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Files handed to the pipeline
    pub total: usize,
    pub processed: usize,
    pub changed: usize,
    /// Files that could not be hashed
    pub errored: usize,
    /// Results written to the sink
    pub emitted: usize,
    /// Entries written to the staging file
    pub staged: usize,
    pub workers: usize,
    pub elapsed: Duration,
}

/// Fans files out to a worker pool and streams results through one writer
pub struct Pipeline<'a> {
    config: &'a Config,
    audit: Option<&'a AuditMap>,
    output: &'a Output,
}

/// Everything a worker thread needs
struct WorkerContext<'a> {
    worker_id: usize,
    job_rx: Receiver<String>,
    result_tx: Sender<FileResult>,
    processor: &'a FileProcessor<'a>,
    progress: &'a ProgressReporter,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a Config, audit: Option<&'a AuditMap>, output: &'a Output) -> Self {
        Self {
            config,
            audit,
            output,
        }
    }

    /// Number of worker threads used for `total_files` files
    pub fn worker_count(&self, total_files: usize) -> usize {
        self.config.workers.min(total_files).max(1)
    }

    /// Process `files`, writing one JSON line per surviving result to `sink`
    ///
    /// Results are written in completion order. Returns once every worker
    /// has exited and the writer has flushed.
    pub fn run<W>(&self, files: Vec<String>, sink: W) -> Result<RunSummary>
    where
        W: Write + Send,
    {
        let total = files.len();
        let workers = self.worker_count(total);

        // Built before anything else so an update run always starts from a
        // fresh staging file, even with nothing to process
        let writer = ResultWriter::new(sink, self.output);
        let writer = match (&self.config.hashes_file, self.config.update) {
            (Some(hashes_file), true) => writer.with_staging(hashes_file),
            _ => writer,
        };

        if files.is_empty() {
            debug!("No files to process");
            let writer_stats = writer.finish();
            return Ok(RunSummary {
                workers,
                staged: writer_stats.staged,
                ..RunSummary::default()
            });
        }

        info!("Processing {} files with {} workers", total, workers);

        // Every job is queued before the workers start, so the producer never blocks
        let (job_tx, job_rx) = bounded::<String>(total);
        for file in files {
            job_tx.send(file)?;
        }
        drop(job_tx);

        let (result_tx, result_rx) = bounded::<FileResult>(workers * RESULT_BUFFER_PER_WORKER);

        let processor = FileProcessor::new(self.config, self.audit, self.output);
        let progress = ProgressReporter::new(total, self.config.show_progress, self.output);

        let writer_stats = crossbeam::thread::scope(|s| {
            let writer_handle = s.spawn(move |_| drain_results(writer, result_rx));

            for worker_id in 0..workers {
                let ctx = WorkerContext {
                    worker_id,
                    job_rx: job_rx.clone(),
                    result_tx: result_tx.clone(),
                    processor: &processor,
                    progress: &progress,
                };
                s.spawn(move |_| worker_thread(ctx));
            }

            // Workers hold the only remaining senders; the writer stops once they exit
            drop(result_tx);

            writer_handle.join()
        })
        .map_err(|_| anyhow::anyhow!("Thread panic occurred during parallel execution"))?
        .map_err(|_| anyhow::anyhow!("Thread panic occurred during parallel execution"))?;

        // All workers have joined, so the counters are final
        let elapsed = progress.finish(self.output);
        let counts = progress.snapshot();

        debug!(
            "Run finished: {} processed, {} changed, {} errored, {} written, {} staged",
            counts.processed, counts.changed, counts.errored, writer_stats.written, writer_stats.staged
        );

        Ok(RunSummary {
            total,
            processed: counts.processed,
            changed: counts.changed,
            errored: counts.errored,
            emitted: writer_stats.written,
            staged: writer_stats.staged,
            workers,
            elapsed,
        })
    }
}

fn worker_thread(ctx: WorkerContext<'_>) {
    while let Ok(filename) = ctx.job_rx.recv() {
        let outcome = ctx.processor.process_outcome(&filename);
        ctx.progress.record(outcome.changed(), outcome.is_failed());

        if let Some(result) = outcome.into_result()
            && ctx.result_tx.send(result).is_err()
        {
            break; // Writer dropped
        }
    }
    debug!("Worker {} done", ctx.worker_id);
}

fn drain_results<W: Write>(mut writer: ResultWriter<'_, W>, result_rx: Receiver<FileResult>) -> WriterStats {
    while let Ok(result) = result_rx.recv() {
        writer.write(&result);
    }
    writer.finish()
}
