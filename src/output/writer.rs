use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use uuid::Uuid;

use crate::columns::{DATA_SHEET, OF_NUMERO};
use crate::error::{ProcessingError, ProcessingResult};
use crate::observability::{GroupProgress, PipelineObserver};
use crate::processing::normalize::display_value;
use crate::types::DataSet;

use super::archive::bundle;
use super::group::{partition, Partition};
use super::{OutputFormat, SheetContent};

/// Options controlling the group writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputOptions {
    /// Format of the generated files.
    pub format: OutputFormat,
    /// Worksheet name inside each generated file.
    pub sheet_name: String,
    /// Column whose values split the table into files.
    pub group_column: String,
    /// Where the files are written.
    ///
    /// If `None`, every run gets its own `label-sheets-<run id>` directory under the system
    /// temp directory. A caller-supplied directory is created if needed and reused as-is.
    pub scratch_dir: Option<PathBuf>,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            sheet_name: DATA_SHEET.to_string(),
            group_column: OF_NUMERO.to_string(),
            scratch_dir: None,
        }
    }
}

/// One generated file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupArtifact {
    /// Group key (display text of the group column).
    pub key: String,
    /// File name, also used as the archive member name.
    pub file_name: String,
    /// Location in the scratch directory.
    pub path: PathBuf,
    /// Number of data rows (header excluded).
    pub rows: usize,
}

/// Result of [`write_groups`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupArchive {
    /// Identifier of this run.
    pub run_id: String,
    /// Directory holding the generated files.
    pub scratch_dir: PathBuf,
    /// Generated files, in ascending key order.
    pub artifacts: Vec<GroupArtifact>,
    /// Rows without a group key; they appear in no file.
    pub dropped_rows: usize,
    /// Zip archive holding every artifact.
    pub archive: Vec<u8>,
}

/// Write one spreadsheet per group of `expanded` and bundle them into a zip archive.
///
/// - Groups are written in ascending key order (see [`super::GroupKey`])
/// - The header row is the dataset's column names, in schema order
/// - Every cell is written as display text; missing values and `nan` become empty cells
/// - Rows with a missing key are skipped and counted in [`GroupArchive::dropped_rows`]
/// - `observer.on_progress` is called after each file is written
///
/// Key and sheet-size problems are detected before any file is written. An I/O failure aborts
/// the run and leaves the files written so far in the scratch directory.
pub fn write_groups(
    expanded: &DataSet,
    options: &OutputOptions,
    observer: Option<&dyn PipelineObserver>,
) -> ProcessingResult<GroupArchive> {
    let run_id = Uuid::new_v4().to_string();
    let Partition {
        groups,
        dropped_rows,
    } = partition(expanded, &options.group_column)?;

    let max_rows = options.format.max_rows();
    if let Some(big) = groups.iter().find(|g| g.rows.len() + 1 > max_rows) {
        return Err(ProcessingError::SheetLimit {
            group: big.key.as_str().to_string(),
            message: format!(
                "{} data rows exceed the .{} limit of {}",
                big.rows.len(),
                options.format.extension(),
                max_rows - 1
            ),
        });
    }

    let scratch_dir = match &options.scratch_dir {
        Some(dir) => dir.clone(),
        None => env::temp_dir().join(format!("label-sheets-{run_id}")),
    };
    fs::create_dir_all(&scratch_dir).map_err(|e| with_path(e, &scratch_dir))?;

    let header: Vec<String> = expanded.schema.field_names().map(str::to_string).collect();
    let total = groups.len();
    let mut artifacts: Vec<GroupArtifact> = Vec::with_capacity(total);
    let mut rendered: Vec<Vec<u8>> = Vec::with_capacity(total);

    for (idx, group) in groups.iter().enumerate() {
        let key = group.key.as_str();
        let mut rows: Vec<Vec<String>> = Vec::with_capacity(group.rows.len() + 1);
        rows.push(header.clone());
        rows.extend(
            group
                .rows
                .iter()
                .map(|&r| expanded.rows[r].iter().map(display_value).collect()),
        );

        let sheet = SheetContent {
            group: key,
            sheet_name: &options.sheet_name,
            rows,
        };
        let bytes = options.format.render(&sheet)?;

        let file_name = format!("{key}.{}", options.format.extension());
        let path = scratch_dir.join(&file_name);
        fs::write(&path, &bytes).map_err(|e| with_path(e, &path))?;
        rendered.push(bytes);

        artifacts.push(GroupArtifact {
            key: key.to_string(),
            file_name,
            path,
            rows: group.rows.len(),
        });

        if let Some(obs) = observer {
            obs.on_progress(&GroupProgress {
                current: idx + 1,
                total,
                key,
            });
        }
    }

    let archive = bundle(
        artifacts
            .iter()
            .zip(&rendered)
            .map(|(a, bytes)| (a.file_name.as_str(), bytes.as_slice())),
    )?;

    Ok(GroupArchive {
        run_id,
        scratch_dir,
        artifacts,
        dropped_rows,
        archive,
    })
}

fn with_path(err: io::Error, path: &Path) -> ProcessingError {
    ProcessingError::Io(io::Error::new(err.kind(), format!("{}: {err}", path.display())))
}
