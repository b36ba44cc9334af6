use thiserror::Error;

/// Convenience result type for pipeline operations.
pub type ProcessingResult<T> = Result<T, ProcessingError>;

/// Error type returned by ingestion, transformation and output functions.
///
/// The pipeline is fail-fast: the first error aborts the whole run and is surfaced as-is.
#[derive(Debug, Error)]
pub enum ProcessingError {
    /// Underlying I/O error (e.g. file not found, permission denied, disk full).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The input workbook could not be opened or read.
    #[error("excel error: {0}")]
    Excel(#[from] calamine::Error),

    /// Writing an `.xlsx` artifact failed.
    #[error("xlsx write error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    /// Building the output archive failed.
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// The requested worksheet is not present in the workbook.
    #[error("sheet '{sheet}' not found. sheets={available:?}")]
    SheetNotFound { sheet: String, available: Vec<String> },

    /// The input does not have the expected shape (missing columns, no header row, etc.).
    #[error("schema mismatch: {message}")]
    SchemaMismatch { message: String },

    /// A value could not be converted into what its column requires.
    #[error("failed to parse value at row {row} column '{column}': {message} (raw='{raw}')")]
    ParseError {
        row: usize,
        column: String,
        raw: String,
        message: String,
    },

    /// A group key cannot be used as an output file name.
    #[error("invalid group key at row {row}: {message} (key='{key}')")]
    InvalidGroupKey {
        row: usize,
        key: String,
        message: String,
    },

    /// A group or cell does not fit in the output sheet format.
    #[error("group '{group}' does not fit in a sheet: {message}")]
    SheetLimit { group: String, message: String },
}
