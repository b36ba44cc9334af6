//! Office Open XML (`.xlsx`) rendering via `rust_xlsxwriter`.

use rust_xlsxwriter::Workbook;

use crate::error::{ProcessingError, ProcessingResult};

use super::SheetContent;

/// Rows per sheet (header included).
pub const MAX_ROWS: usize = 1_048_576;

/// Render a sheet as a complete `.xlsx` file.
pub fn render(sheet: &SheetContent<'_>) -> ProcessingResult<Vec<u8>> {
    if sheet.rows.len() > MAX_ROWS {
        return Err(ProcessingError::SheetLimit {
            group: sheet.group.to_string(),
            message: format!("{} rows exceed the .xlsx limit of {MAX_ROWS}", sheet.rows.len()),
        });
    }

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet.sheet_name)?;
    for (r, row) in sheet.rows.iter().enumerate() {
        for (c, text) in row.iter().enumerate() {
            if !text.is_empty() {
                worksheet.write_string(r as u32, c as u16, text)?;
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}
