//! End-to-end runs: workbook → transform → group files → archive.
//!
//! The public entry points ([`process`], [`process_path`], [`process_bytes`] and
//! [`ProcessRequest::run`]) each report the outcome to the configured observer exactly once.

use std::error::Error as StdError;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use crate::columns::{input_schema, DATA_SHEET};
use crate::error::{ProcessingError, ProcessingResult};
use crate::ingestion::{ingest_workbook_from_bytes, ingest_workbook_from_path};
use crate::observability::{PipelineContext, PipelineObserver, ProcessingSeverity};
use crate::output::{write_groups, GroupArtifact, OutputOptions};
use crate::processing::{transform, TransformOptions};
use crate::types::DataSet;

/// Options for a whole pipeline run.
///
/// Use [`Default`] for common cases.
#[derive(Clone)]
pub struct ProcessOptions {
    /// Worksheet holding the order table.
    pub input_sheet: String,
    /// Column derivation options.
    pub transform: TransformOptions,
    /// Group writer options.
    pub output: OutputOptions,
    /// Optional observer for progress, logging and alerts.
    pub observer: Option<Arc<dyn PipelineObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: ProcessingSeverity,
}

impl fmt::Debug for ProcessOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessOptions")
            .field("input_sheet", &self.input_sheet)
            .field("transform", &self.transform)
            .field("output", &self.output)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            input_sheet: DATA_SHEET.to_string(),
            transform: TransformOptions::default(),
            output: OutputOptions::default(),
            observer: None,
            alert_at_or_above: ProcessingSeverity::Critical,
        }
    }
}

/// Machine-readable outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessSummary {
    pub run_id: String,
    /// Rows read from the input table.
    pub input_rows: usize,
    /// Rows after expansion by `QTD` (one per label).
    pub expanded_rows: usize,
    /// Number of files written, i.e. distinct `OF_NUMERO` values.
    pub groups: usize,
    /// Expanded rows left out because their `OF_NUMERO` is missing.
    pub dropped_rows: usize,
    pub archive_bytes: usize,
    pub scratch_dir: PathBuf,
}

/// Everything a successful run produces.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessOutput {
    /// Zip archive bytes, ready to be saved or served.
    pub archive: Vec<u8>,
    /// The expanded label table (useful for previews).
    pub expanded: DataSet,
    /// Files written into the scratch directory, in group order.
    pub artifacts: Vec<GroupArtifact>,
    pub summary: ProcessSummary,
}

impl ProcessOutput {
    /// Write the archive to `path`, replacing any existing file.
    pub fn save_archive(&self, path: impl AsRef<Path>) -> ProcessingResult<()> {
        fs::write(path, &self.archive)?;
        Ok(())
    }

    /// Delete the generated files, then the scratch directory if nothing else is left in it.
    pub fn remove_scratch(&self) -> ProcessingResult<()> {
        for artifact in &self.artifacts {
            match fs::remove_file(&artifact.path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        match fs::remove_dir(&self.summary.scratch_dir) {
            Ok(()) => Ok(()),
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::NotFound | io::ErrorKind::DirectoryNotEmpty
                ) =>
            {
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Run the pipeline on an already ingested order table.
///
/// # Examples
///
/// ```no_run
/// use label_sheets::columns::input_schema;
/// use label_sheets::ingestion::ingest_workbook_from_path;
/// use label_sheets::pipeline::{process, ProcessOptions};
///
/// # fn main() -> Result<(), label_sheets::ProcessingError> {
/// let table = ingest_workbook_from_path("pedidos.xlsm", "Dados", &input_schema())?;
/// let out = process(&table, &ProcessOptions::default())?;
/// out.save_archive("planilhas_geradas.zip")?;
/// # Ok(())
/// # }
/// ```
pub fn process(input: &DataSet, options: &ProcessOptions) -> ProcessingResult<ProcessOutput> {
    let ctx = PipelineContext {
        source: "<table>".to_string(),
    };
    let result = run_pipeline(input, options);
    report(&ctx, options, &result);
    result
}

/// Read the order sheet from a workbook on disk and run the pipeline.
///
/// When an observer is configured, this function reports:
///
/// - `on_progress` after each group file is written
/// - `on_success` on success, with the run summary
/// - `on_failure` on failure, with a computed severity
/// - `on_alert` on failure when the computed severity is >= `options.alert_at_or_above`
///
/// ```no_run
/// use std::sync::Arc;
///
/// use label_sheets::observability::StdErrObserver;
/// use label_sheets::pipeline::{process_path, ProcessOptions};
///
/// # fn main() -> Result<(), label_sheets::ProcessingError> {
/// let opts = ProcessOptions {
///     observer: Some(Arc::new(StdErrObserver)),
///     ..Default::default()
/// };
/// let out = process_path("pedidos.xlsm", &opts)?;
/// println!("{} sheets, {} labels", out.summary.groups, out.summary.expanded_rows);
/// # Ok(())
/// # }
/// ```
pub fn process_path(
    path: impl AsRef<Path>,
    options: &ProcessOptions,
) -> ProcessingResult<ProcessOutput> {
    let path = path.as_ref();
    let ctx = PipelineContext {
        source: path.display().to_string(),
    };
    let result = ingest_workbook_from_path(path, &options.input_sheet, &input_schema())
        .and_then(|table| run_pipeline(&table, options));
    report(&ctx, options, &result);
    result
}

/// Same as [`process_path`], for a workbook already held in memory (an upload).
pub fn process_bytes(bytes: &[u8], options: &ProcessOptions) -> ProcessingResult<ProcessOutput> {
    let ctx = PipelineContext {
        source: format!("<{} bytes>", bytes.len()),
    };
    let result = ingest_workbook_from_bytes(bytes, &options.input_sheet, &input_schema())
        .and_then(|table| run_pipeline(&table, options));
    report(&ctx, options, &result);
    result
}

/// An owned, reusable description of one run over a workbook file.
#[derive(Debug, Clone)]
pub struct ProcessRequest {
    pub path: PathBuf,
    pub options: ProcessOptions,
}

impl ProcessRequest {
    /// A request with default options.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            options: ProcessOptions::default(),
        }
    }

    /// Run the request. See [`process_path`].
    pub fn run(&self) -> ProcessingResult<ProcessOutput> {
        process_path(&self.path, &self.options)
    }
}

fn run_pipeline(input: &DataSet, options: &ProcessOptions) -> ProcessingResult<ProcessOutput> {
    let expanded = transform(input, &options.transform)?;
    let written = write_groups(&expanded, &options.output, options.observer.as_deref())?;

    let summary = ProcessSummary {
        run_id: written.run_id,
        input_rows: input.row_count(),
        expanded_rows: expanded.row_count(),
        groups: written.artifacts.len(),
        dropped_rows: written.dropped_rows,
        archive_bytes: written.archive.len(),
        scratch_dir: written.scratch_dir,
    };
    Ok(ProcessOutput {
        archive: written.archive,
        expanded,
        artifacts: written.artifacts,
        summary,
    })
}

fn report(ctx: &PipelineContext, options: &ProcessOptions, result: &ProcessingResult<ProcessOutput>) {
    let Some(obs) = options.observer.as_ref() else {
        return;
    };
    match result {
        Ok(out) => obs.on_success(ctx, &out.summary),
        Err(e) => {
            let sev = severity_for_error(e);
            obs.on_failure(ctx, sev, e);
            if sev >= options.alert_at_or_above {
                obs.on_alert(ctx, sev, e);
            }
        }
    }
}

/// Infrastructure failures are `Critical`; problems with the input data are `Error`.
pub fn severity_for_error(e: &ProcessingError) -> ProcessingSeverity {
    match e {
        ProcessingError::Io(_) | ProcessingError::Zip(zip::result::ZipError::Io(_)) => {
            ProcessingSeverity::Critical
        }
        ProcessingError::Excel(err) => io_or_error(err),
        ProcessingError::Xlsx(err) => io_or_error(err),
        ProcessingError::Zip(err) => io_or_error(err),
        ProcessingError::SheetNotFound { .. }
        | ProcessingError::SchemaMismatch { .. }
        | ProcessingError::ParseError { .. }
        | ProcessingError::InvalidGroupKey { .. }
        | ProcessingError::SheetLimit { .. } => ProcessingSeverity::Error,
    }
}

fn io_or_error(err: &(dyn StdError + 'static)) -> ProcessingSeverity {
    if error_chain_contains_io(err) {
        ProcessingSeverity::Critical
    } else {
        ProcessingSeverity::Error
    }
}

fn error_chain_contains_io(e: &(dyn StdError + 'static)) -> bool {
    let mut cur: Option<&(dyn StdError + 'static)> = Some(e);
    while let Some(err) = cur {
        if err.is::<io::Error>() {
            return true;
        }
        cur = err.source();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_errors_are_not_critical() {
        let e = ProcessingError::ParseError {
            row: 3,
            column: "QTD".into(),
            raw: "-1".into(),
            message: "quantity cannot be negative".into(),
        };
        assert_eq!(severity_for_error(&e), ProcessingSeverity::Error);

        let e = ProcessingError::SheetNotFound {
            sheet: "Dados".into(),
            available: vec!["Plan1".into()],
        };
        assert_eq!(severity_for_error(&e), ProcessingSeverity::Error);
    }

    #[test]
    fn io_errors_are_critical() {
        let e = ProcessingError::Io(io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
        assert_eq!(severity_for_error(&e), ProcessingSeverity::Critical);

        let zip_io = zip::result::ZipError::Io(io::Error::other("disk full"));
        assert_eq!(
            severity_for_error(&ProcessingError::Zip(zip_io)),
            ProcessingSeverity::Critical
        );
        assert_eq!(
            severity_for_error(&ProcessingError::Zip(zip::result::ZipError::FileNotFound)),
            ProcessingSeverity::Error
        );
    }

    #[test]
    fn options_debug_hides_observer() {
        let opts = ProcessOptions {
            observer: Some(Arc::new(crate::observability::StdErrObserver)),
            ..Default::default()
        };
        let dbg = format!("{opts:?}");
        assert!(dbg.contains("observer_set: true"));
        assert!(dbg.contains("input_sheet: \"Dados\""));
    }
}
