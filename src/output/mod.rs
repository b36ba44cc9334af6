//! The group writer.
//!
//! Splits the expanded table by `OF_NUMERO`, writes one spreadsheet per group into a scratch
//! directory and bundles them into a zip archive:
//!
//! - [`group`]: partitioning and key ordering
//! - [`xls`]: legacy BIFF8 `.xls` rendering (default)
//! - [`xlsx`]: `.xlsx` rendering
//! - [`archive`]: zip bundling
//! - [`write_groups()`]: the whole step

pub mod archive;
pub mod group;
pub mod xls;
pub mod xlsx;
mod writer;

pub use archive::{bundle, DEFAULT_ARCHIVE_NAME};
pub use group::{partition, Group, GroupKey, Partition};
pub use writer::{write_groups, GroupArchive, GroupArtifact, OutputOptions};

use crate::error::ProcessingResult;

/// Spreadsheet format of the generated files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Excel 97-2003 binary workbook.
    #[default]
    Xls,
    /// Office Open XML workbook.
    Xlsx,
}

impl OutputFormat {
    /// File extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Xls => "xls",
            Self::Xlsx => "xlsx",
        }
    }

    /// Parse a format from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "xls" => Some(Self::Xls),
            "xlsx" => Some(Self::Xlsx),
            _ => None,
        }
    }

    /// Most rows (header included) one sheet can hold.
    pub fn max_rows(self) -> usize {
        match self {
            Self::Xls => xls::MAX_ROWS,
            Self::Xlsx => xlsx::MAX_ROWS,
        }
    }

    /// Render one sheet into the bytes of a complete file.
    pub fn render(self, sheet: &SheetContent<'_>) -> ProcessingResult<Vec<u8>> {
        match self {
            Self::Xls => xls::render(sheet),
            Self::Xlsx => xlsx::render(sheet),
        }
    }
}

/// One sheet worth of display text; `rows[0]` is the header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetContent<'a> {
    /// Group the sheet belongs to (used in error messages).
    pub group: &'a str,
    /// Worksheet name.
    pub sheet_name: &'a str,
    /// Cell text, row-major.
    pub rows: Vec<Vec<String>>,
}
