//! Progress and outcome reporting.
//!
//! The pipeline never talks to a UI directly; it reports to a [`PipelineObserver`] supplied in
//! [`crate::pipeline::ProcessOptions`].

use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::ProcessingError;
use crate::pipeline::ProcessSummary;

/// Severity classification used for observer callbacks and alerting thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ProcessingSeverity {
    /// Informational event.
    Info,
    /// Warning-level event (non-fatal).
    Warning,
    /// Error-level event (bad input; the run failed).
    Error,
    /// Critical error (I/O or other infrastructure failures).
    Critical,
}

/// Context about a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineContext {
    /// Where the input came from: a file path, or a label for in-memory input.
    pub source: String,
}

/// Progress of the group writer, reported after each file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupProgress<'a> {
    /// Number of files written so far (1-based).
    pub current: usize,
    /// Number of files this run will write.
    pub total: usize,
    /// Key of the group just written.
    pub key: &'a str,
}

/// Observer interface for pipeline progress and outcomes.
///
/// Every method has a no-op default, so implementors override only what they need.
pub trait PipelineObserver: Send + Sync {
    /// Called after each group file is written.
    fn on_progress(&self, _progress: &GroupProgress<'_>) {}

    /// Called when a run succeeds.
    fn on_success(&self, _ctx: &PipelineContext, _summary: &ProcessSummary) {}

    /// Called when a run fails.
    fn on_failure(&self, _ctx: &PipelineContext, _severity: ProcessingSeverity, _error: &ProcessingError) {}

    /// Called when a failure meets the alert threshold.
    ///
    /// Default behavior forwards to [`Self::on_failure`].
    fn on_alert(&self, ctx: &PipelineContext, severity: ProcessingSeverity, error: &ProcessingError) {
        self.on_failure(ctx, severity, error)
    }
}

/// An observer that fans out callbacks to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn PipelineObserver>>,
}

impl CompositeObserver {
    /// Create a new composite observer from a list of observers.
    pub fn new(observers: Vec<Arc<dyn PipelineObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl PipelineObserver for CompositeObserver {
    fn on_progress(&self, progress: &GroupProgress<'_>) {
        for o in &self.observers {
            o.on_progress(progress);
        }
    }

    fn on_success(&self, ctx: &PipelineContext, summary: &ProcessSummary) {
        for o in &self.observers {
            o.on_success(ctx, summary);
        }
    }

    fn on_failure(&self, ctx: &PipelineContext, severity: ProcessingSeverity, error: &ProcessingError) {
        for o in &self.observers {
            o.on_failure(ctx, severity, error);
        }
    }

    fn on_alert(&self, ctx: &PipelineContext, severity: ProcessingSeverity, error: &ProcessingError) {
        for o in &self.observers {
            o.on_alert(ctx, severity, error);
        }
    }
}

/// Adapts a `(current, total)` closure into a progress-only observer.
pub struct ProgressFn<F>(F);

impl<F> ProgressFn<F>
where
    F: Fn(usize, usize) + Send + Sync,
{
    /// Wrap a progress callback.
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> fmt::Debug for ProgressFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ProgressFn")
    }
}

impl<F> PipelineObserver for ProgressFn<F>
where
    F: Fn(usize, usize) + Send + Sync,
{
    fn on_progress(&self, progress: &GroupProgress<'_>) {
        (self.0)(progress.current, progress.total)
    }
}

/// Logs progress and outcomes to stderr.
#[derive(Debug, Default)]
pub struct StdErrObserver;

impl PipelineObserver for StdErrObserver {
    fn on_progress(&self, progress: &GroupProgress<'_>) {
        eprintln!(
            "[labels][progress] group={} ({}/{})",
            progress.key, progress.current, progress.total
        );
    }

    fn on_success(&self, ctx: &PipelineContext, summary: &ProcessSummary) {
        eprintln!(
            "[labels][ok] source={} run={} input_rows={} rows={} groups={}",
            ctx.source, summary.run_id, summary.input_rows, summary.expanded_rows, summary.groups
        );
        if summary.dropped_rows > 0 {
            eprintln!(
                "[labels][Warning] source={} dropped_rows={} (missing OF_NUMERO)",
                ctx.source, summary.dropped_rows
            );
        }
    }

    fn on_failure(&self, ctx: &PipelineContext, severity: ProcessingSeverity, error: &ProcessingError) {
        eprintln!("[labels][{severity:?}] source={} err={error}", ctx.source);
    }

    fn on_alert(&self, ctx: &PipelineContext, severity: ProcessingSeverity, error: &ProcessingError) {
        eprintln!("[ALERT][labels][{severity:?}] source={} err={error}", ctx.source);
    }
}

/// Appends pipeline events to a local log file.
#[derive(Debug)]
pub struct FileObserver {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileObserver {
    /// Create a file observer that appends events to `path`.
    ///
    /// Writes are best-effort; failures to open/write the log file are ignored.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    fn append_line(&self, line: &str) {
        let _guard = self.lock.lock().ok();
        if let Ok(mut f) = OpenOptions::new().create(true).append(true).open(&self.path) {
            let _ = writeln!(f, "{line}");
        }
    }
}

impl PipelineObserver for FileObserver {
    fn on_progress(&self, progress: &GroupProgress<'_>) {
        self.append_line(&format!(
            "{} progress group={} current={} total={}",
            unix_ts(),
            progress.key,
            progress.current,
            progress.total
        ));
    }

    fn on_success(&self, ctx: &PipelineContext, summary: &ProcessSummary) {
        self.append_line(&format!(
            "{} ok source={} run={} input_rows={} rows={} groups={} dropped_rows={} archive_bytes={}",
            unix_ts(),
            ctx.source,
            summary.run_id,
            summary.input_rows,
            summary.expanded_rows,
            summary.groups,
            summary.dropped_rows,
            summary.archive_bytes
        ));
    }

    fn on_failure(&self, ctx: &PipelineContext, severity: ProcessingSeverity, error: &ProcessingError) {
        self.append_line(&format!(
            "{} fail severity={:?} source={} err={}",
            unix_ts(),
            severity,
            ctx.source,
            error
        ));
    }

    fn on_alert(&self, ctx: &PipelineContext, severity: ProcessingSeverity, error: &ProcessingError) {
        self.append_line(&format!(
            "{} ALERT severity={:?} source={} err={}",
            unix_ts(),
            severity,
            ctx.source,
            error
        ));
    }
}

fn unix_ts() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
