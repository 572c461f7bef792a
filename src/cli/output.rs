//! Diagnostic output for hashcheck
//!
//! Everything here goes to stderr: stdout is reserved for the JSON result
//! stream. A single [`Output`] is shared by every worker thread; writes are
//! serialized through one mutex so lines from different files never interleave.

use console::style;
use indicatif::ProgressBar;
use std::io::{self, Write};
use std::sync::{Mutex, MutexGuard};

/// Shared, quiet-aware diagnostic sink
pub struct Output {
    quiet: bool,
    sink: Mutex<Box<dyn Write + Send>>,
    /// Live progress bar that lines must not tear through
    progress: Mutex<Option<ProgressBar>>,
}

impl Output {
    /// Create an output handler writing to stderr
    pub fn new(quiet: bool) -> Self {
        Self::with_writer(quiet, Box::new(io::stderr()))
    }

    /// Create an output handler writing to an arbitrary sink
    pub fn with_writer(quiet: bool, sink: Box<dyn Write + Send>) -> Self {
        Self {
            quiet,
            sink: Mutex::new(sink),
            progress: Mutex::new(None),
        }
    }

    /// Print an error message
    ///
    /// Fatal errors are always shown, even in quiet mode.
    pub fn error(&self, message: &str) {
        self.write_line(&format!("{} {}", style("✖").red().for_stderr(), message));
    }

    /// Print a per-file error (suppressed in quiet mode)
    pub fn file_error(&self, message: &str) {
        if !self.quiet {
            self.error(message);
        }
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if !self.quiet {
            self.write_line(&format!(
                "{} {}",
                style("⚠").yellow().for_stderr(),
                message
            ));
        }
    }

    /// Print a hint on how to act on the previous diagnostic
    pub fn hint(&self, message: &str) {
        if !self.quiet {
            self.write_line(&format!(
                "  {} {}",
                style("→").cyan().for_stderr(),
                style(message).dim().for_stderr()
            ));
        }
    }

    /// Write every following line with `bar` suspended
    pub fn attach_progress(&self, bar: ProgressBar) {
        *lock(&self.progress) = Some(bar);
    }

    pub fn detach_progress(&self) {
        *lock(&self.progress) = None;
    }

    pub fn has_progress(&self) -> bool {
        lock(&self.progress).is_some()
    }

    /// Print an unstyled line regardless of quiet mode
    pub fn plain(&self, message: &str) {
        self.write_line(message);
    }

    fn write_line(&self, line: &str) {
        let write = || {
            let mut sink = lock(&self.sink);
            let _ = writeln!(sink, "{line}");
            let _ = sink.flush();
        };

        // Clone the handle so the progress lock is not held while writing
        let bar = lock(&self.progress).clone();
        match bar {
            Some(bar) => bar.suspend(write),
            None => write(),
        }
    }
}

/// A poisoned lock only means another thread panicked mid-write
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl std::fmt::Debug for Output {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Output").field("quiet", &self.quiet).finish()
    }
}

/// In-memory sink for inspecting diagnostics in tests
#[cfg(test)]
#[derive(Clone, Default)]
pub(crate) struct CapturedOutput(std::sync::Arc<Mutex<Vec<u8>>>);

#[cfg(test)]
impl CapturedOutput {
    pub(crate) fn output(&self, quiet: bool) -> Output {
        Output::with_writer(quiet, Box::new(self.clone()))
    }

    pub(crate) fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

#[cfg(test)]
impl Write for CapturedOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
