//! Zip bundling of the generated sheets.

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use crate::error::ProcessingResult;

/// Default file name for the downloadable archive.
pub const DEFAULT_ARCHIVE_NAME: &str = "planilhas_geradas.zip";

/// Deflate `(member name, contents)` pairs into one in-memory zip archive.
///
/// Members are stored in the given order and stamped with a fixed modification time so
/// identical inputs give identical archives. Contents come from memory, never from the
/// scratch directory, so a file system that folds names cannot swap one member for another.
pub fn bundle<'a, I>(files: I) -> ProcessingResult<Vec<u8>>
where
    I: IntoIterator<Item = (&'a str, &'a [u8])>,
{
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default());

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, bytes) in files {
        zip.start_file(name, options)?;
        zip.write_all(bytes)?;
    }
    Ok(zip.finish()?.into_inner())
}
