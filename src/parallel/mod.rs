//! Parallel file pipeline
//!
//! Files are processed by a fixed pool of worker threads while a single
//! writer thread streams results to the output sink as they arrive.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   jobs    ┌──────────────┐  results  ┌──────────────┐
//! │  File list   │──────────▶│   Workers    │──────────▶│    Writer    │──▶ sink (JSONL)
//! │ (pre-queued) │           │ hash, audit, │           │              │──▶ <hashes>.new
//! └──────────────┘           │ run, filter  │           └──────────────┘
//!                            └──────┬───────┘
//!                                   ▼
//!                           ProgressCounters (atomic)
//! ```
//!
//! - The job channel is sized to hold every file, so it is filled and closed
//!   before any worker starts.
//! - The result channel is bounded; a slow sink applies backpressure to the
//!   workers.
//! - Results carry no ordering guarantee relative to the input list.
//! - Threads run inside `crossbeam::thread::scope`, so workers borrow the
//!   configuration, audit map and diagnostic sink without reference counting.
//!
//! # Example
//!
//! ```rust,no_run
//! use hashcheck::cli::output::Output;
//! use hashcheck::config::Config;
//! use hashcheck::parallel::Pipeline;
//!
//! let config = Config::with_command("wc -l");
//! let output = Output::new(false);
//! let summary = Pipeline::new(&config, None, &output)
//!     .run(vec!["Cargo.toml".to_string()], std::io::stdout())?;
//! println!("{} results", summary.emitted);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod core;
pub mod progress;
pub mod writer;

pub use self::core::{Pipeline, RunSummary};
pub use progress::{ProgressCounters, ProgressReporter, format_duration};
pub use writer::{ResultWriter, WriterStats};
