use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use crate::cli::output::Output;

/// Run statistics tracked atomically across worker threads
#[derive(Debug, Default)]
pub struct ProgressCounters {
    pub processed: AtomicUsize,
    pub changed: AtomicUsize,
    pub errored: AtomicUsize,
}

/// Point-in-time copy of [`ProgressCounters`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    pub processed: usize,
    pub changed: usize,
    pub errored: usize,
}

impl ProgressCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one finished file
    pub fn record(&self, changed: bool, errored: bool) {
        self.processed.fetch_add(1, Ordering::Relaxed);
        if changed {
            self.changed.fetch_add(1, Ordering::Relaxed);
        }
        if errored {
            self.errored.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            processed: self.processed.load(Ordering::Relaxed),
            changed: self.changed.load(Ordering::Relaxed),
            errored: self.errored.load(Ordering::Relaxed),
        }
    }
}

/// Live progress bar plus the counters behind it
///
/// The bar is only drawn when progress is enabled; the counters are always
/// kept so the caller gets a summary either way. While the bar is live it is
/// attached to the [`Output`], so diagnostics print above it instead of
/// through it.
pub struct ProgressReporter {
    counters: ProgressCounters,
    bar: Option<ProgressBar>,
    started: Instant,
}

impl ProgressReporter {
    pub fn new(total_files: usize, enabled: bool, output: &Output) -> Self {
        let bar = enabled.then(|| {
            let bar = ProgressBar::with_draw_target(
                Some(total_files as u64),
                ProgressDrawTarget::stderr(),
            );
            let style = ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) ETA {eta} {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
            bar.set_style(style);
            bar.enable_steady_tick(Duration::from_millis(100));
            output.attach_progress(bar.clone());
            bar
        });

        Self {
            counters: ProgressCounters::new(),
            bar,
            started: Instant::now(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.bar.is_some()
    }

    /// Count one finished file and refresh the bar
    pub fn record(&self, changed: bool, errored: bool) {
        self.counters.record(changed, errored);

        if let Some(bar) = &self.bar {
            let snapshot = self.counters.snapshot();
            bar.set_position(snapshot.processed as u64);
            bar.set_message(format!(
                "Changed: {} | Errors: {} | Rate: {:.1}/s",
                snapshot.changed,
                snapshot.errored,
                rate(snapshot.processed, self.started.elapsed())
            ));
        }
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        self.counters.snapshot()
    }

    /// Clear the bar and print the final summary
    ///
    /// Must only be called once every worker has finished, so the counters
    /// are final. Returns the run's elapsed time.
    pub fn finish(&self, output: &Output) -> Duration {
        let elapsed = self.started.elapsed();

        if let Some(bar) = &self.bar {
            output.detach_progress();
            bar.finish_and_clear();

            let snapshot = self.counters.snapshot();
            output.plain(&format!(
                "Completed: {} files in {} ({:.1} files/s)",
                snapshot.processed,
                format_duration(elapsed),
                rate(snapshot.processed, elapsed)
            ));
            if snapshot.changed > 0 {
                output.plain(&format!("Changed: {} files", snapshot.changed));
            }
            if snapshot.errored > 0 {
                output.plain(&format!("Errors: {} files", snapshot.errored));
            }
        }

        elapsed
    }
}

fn rate(count: usize, elapsed: Duration) -> f64 {
    let seconds = elapsed.as_secs_f64();
    if seconds > 0.0 {
        count as f64 / seconds
    } else {
        0.0
    }
}

/// Format a duration as `45s`, `2m5s` or `1h2m3s`
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);

    if hours > 0 {
        format!("{hours}h{minutes}m{seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m{seconds}s")
    } else {
        format!("{seconds}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::output::CapturedOutput;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(0)), "0s");
        assert_eq!(format_duration(Duration::from_secs(45)), "45s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m5s");
        assert_eq!(format_duration(Duration::from_secs(3600)), "1h0m0s");
        assert_eq!(format_duration(Duration::from_secs(3723)), "1h2m3s");
        assert_eq!(format_duration(Duration::from_millis(1999)), "1s");
    }

    #[test]
    fn test_counters_record_independently() {
        let counters = ProgressCounters::new();
        counters.record(false, false);
        counters.record(true, false);
        counters.record(false, true);

        assert_eq!(
            counters.snapshot(),
            CounterSnapshot {
                processed: 3,
                changed: 1,
                errored: 1
            }
        );
    }

    #[test]
    fn test_counters_are_shared_across_threads() {
        let counters = ProgressCounters::new();

        crossbeam::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|_| {
                    for i in 0..250 {
                        counters.record(i % 2 == 0, i % 5 == 0);
                    }
                });
            }
        })
        .unwrap();

        let snapshot = counters.snapshot();
        assert_eq!(snapshot.processed, 1000);
        assert_eq!(snapshot.changed, 500);
        assert_eq!(snapshot.errored, 200);
    }

    #[test]
    fn test_disabled_reporter_prints_no_summary() {
        let captured = CapturedOutput::default();
        let output = captured.output(false);
        let reporter = ProgressReporter::new(2, false, &output);
        assert!(!output.has_progress());

        reporter.record(true, false);
        reporter.finish(&output);
        assert!(!reporter.is_enabled());
        assert!(captured.contents().is_empty());
        assert_eq!(reporter.snapshot().changed, 1);
    }

    #[test]
    fn test_enabled_reporter_prints_summary() {
        let captured = CapturedOutput::default();
        // The summary is shown even in quiet mode
        let output = captured.output(true);
        let reporter = ProgressReporter::new(3, true, &output);
        assert!(output.has_progress());

        reporter.record(true, false);
        reporter.record(false, true);
        reporter.record(false, false);
        reporter.finish(&output);
        assert!(!output.has_progress());

        let contents = captured.contents();
        assert!(contents.contains("Completed: 3 files in"));
        assert!(contents.contains("Changed: 1 files"));
        assert!(contents.contains("Errors: 1 files"));
    }

    #[test]
    fn test_summary_omits_zero_counts() {
        let captured = CapturedOutput::default();
        let output = captured.output(false);
        let reporter = ProgressReporter::new(1, true, &output);

        reporter.record(false, false);
        reporter.finish(&output);

        let contents = captured.contents();
        assert!(contents.contains("Completed: 1 files"));
        assert!(!contents.contains("Changed:"));
        assert!(!contents.contains("Errors:"));
    }
}
