//! Workbook ingestion (`.xlsm`, `.xlsx`, `.xls`, `.xlsb`, `.ods`).

use std::io::{Cursor, Read, Seek};
use std::path::Path;

use calamine::{open_workbook_auto, open_workbook_auto_from_rs, Data, Reader, Sheets};

use crate::error::{ProcessingError, ProcessingResult};
use crate::types::{DataSet, DataType, Schema, Value};

/// Read one worksheet of the workbook at `path` into an in-memory `DataSet`.
///
/// Behavior:
/// - Fails with [`ProcessingError::SheetNotFound`] if `sheet_name` is not in the workbook
/// - Detects the first non-empty row as the header row
/// - Validates that all schema fields exist as headers (all missing ones are reported at once)
/// - Reads remaining rows and converts cells into typed `Value`s
/// - Skips rows whose schema columns are all empty
pub fn ingest_workbook_from_path(
    path: impl AsRef<Path>,
    sheet_name: &str,
    schema: &Schema,
) -> ProcessingResult<DataSet> {
    let mut workbook = open_workbook_auto(path)?;
    ingest_sheet(&mut workbook, sheet_name, schema)
}

/// Same as [`ingest_workbook_from_path`], for a workbook already held in memory
/// (e.g. an uploaded file). The container format is sniffed from the content.
pub fn ingest_workbook_from_bytes(
    bytes: &[u8],
    sheet_name: &str,
    schema: &Schema,
) -> ProcessingResult<DataSet> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
    ingest_sheet(&mut workbook, sheet_name, schema)
}

fn ingest_sheet<RS: Read + Seek>(
    workbook: &mut Sheets<RS>,
    sheet_name: &str,
    schema: &Schema,
) -> ProcessingResult<DataSet> {
    let available = workbook.sheet_names().to_vec();
    if !available.iter().any(|s| s == sheet_name) {
        return Err(ProcessingError::SheetNotFound {
            sheet: sheet_name.to_string(),
            available,
        });
    }

    let range = workbook.worksheet_range(sheet_name)?;
    let rows = ingest_sheet_range(sheet_name, &range, schema)?;
    Ok(DataSet::new(schema.clone(), rows))
}

fn ingest_sheet_range(
    sheet: &str,
    range: &calamine::Range<Data>,
    schema: &Schema,
) -> ProcessingResult<Vec<Vec<Value>>> {
    let (header_row_idx, col_idxs) =
        build_header_projection(range, schema).map_err(|e| wrap_schema_err_with_sheet(sheet, e))?;
    let first_row = range.start().map(|(r, _)| r as usize).unwrap_or(0);

    let mut rows: Vec<Vec<Value>> = Vec::new();
    for (idx0, row) in range.rows().enumerate() {
        if idx0 <= header_row_idx {
            continue;
        }
        let cells: Vec<&Data> = col_idxs
            .iter()
            .map(|&col_idx| row.get(col_idx).unwrap_or(&Data::Empty))
            .collect();
        if cells.iter().all(|c| matches!(c, Data::Empty)) {
            continue;
        }

        // Report 1-based row number (Excel-like).
        let user_row = first_row + idx0 + 1;

        let mut out_row: Vec<Value> = Vec::with_capacity(schema.fields.len());
        for (field, cell) in schema.fields.iter().zip(cells) {
            out_row.push(convert_cell(user_row, &field.name, &field.data_type, cell)?);
        }
        rows.push(out_row);
    }

    Ok(rows)
}

fn wrap_schema_err_with_sheet(sheet: &str, err: ProcessingError) -> ProcessingError {
    match err {
        ProcessingError::SchemaMismatch { message } => ProcessingError::SchemaMismatch {
            message: format!("sheet '{sheet}': {message}"),
        },
        other => other,
    }
}

fn build_header_projection(
    range: &calamine::Range<Data>,
    schema: &Schema,
) -> ProcessingResult<(usize, Vec<usize>)> {
    let (header_row_idx, header_cells) = range
        .rows()
        .enumerate()
        .find(|(_, row)| row.iter().any(|c| !matches!(c, Data::Empty)))
        .map(|(idx0, row)| (idx0, row.iter().map(cell_to_header_string).collect::<Vec<_>>()))
        .ok_or_else(|| ProcessingError::SchemaMismatch {
            message: "sheet has no non-empty rows (no header row found)".to_string(),
        })?;

    let mut col_idxs: Vec<usize> = Vec::with_capacity(schema.fields.len());
    let mut missing: Vec<&str> = Vec::new();
    for f in &schema.fields {
        match header_cells.iter().position(|h| h.trim() == f.name) {
            Some(idx) => col_idxs.push(idx),
            None => missing.push(&f.name),
        }
    }

    if !missing.is_empty() {
        let quoted: Vec<String> = missing.iter().map(|m| format!("'{m}'")).collect();
        return Err(ProcessingError::SchemaMismatch {
            message: format!(
                "missing required column(s) {}. headers={:?}",
                quoted.join(", "),
                header_cells
            ),
        });
    }

    Ok((header_row_idx, col_idxs))
}

fn cell_to_header_string(c: &Data) -> String {
    match c {
        Data::String(s) => s.clone(),
        Data::Float(f) if f.fract() == 0.0 => (*f as i64).to_string(),
        Data::Empty => String::new(),
        _ => c.to_string(),
    }
}

fn convert_cell(row: usize, column: &str, data_type: &DataType, c: &Data) -> ProcessingResult<Value> {
    // Error cells (#N/A, #REF!, ...) carry no usable value.
    if matches!(c, Data::Empty | Data::Error(_)) {
        return Ok(Value::Null);
    }

    match data_type {
        DataType::Any => Ok(native_value(c)),
        DataType::Utf8 => Ok(Value::Utf8(cell_to_string(c))),
        DataType::Int64 => parse_i64_cell(row, column, c).map(Value::Int64),
        DataType::Float64 => parse_f64_cell(row, column, c).map(Value::Float64),
    }
}

fn native_value(c: &Data) -> Value {
    match c {
        Data::Int(i) => Value::Int64(*i),
        Data::Float(f) => Value::Float64(*f),
        Data::Bool(b) => Value::Bool(*b),
        Data::Empty | Data::Error(_) => Value::Null,
        _ => Value::Utf8(cell_to_string(c)),
    }
}

fn cell_to_string(c: &Data) -> String {
    match c {
        Data::String(s) => s.clone(),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(ts) => ts.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => dt.as_f64().to_string(),
        },
        _ => c.to_string(),
    }
}

fn parse_i64_cell(row: usize, column: &str, c: &Data) -> ProcessingResult<i64> {
    match c {
        Data::Int(i) => Ok(*i),
        Data::Float(f) => {
            if f.fract() == 0.0 {
                Ok(*f as i64)
            } else {
                Err(ProcessingError::ParseError {
                    row,
                    column: column.to_string(),
                    raw: c.to_string(),
                    message: "expected integer (got non-integer float)".to_string(),
                })
            }
        }
        Data::String(s) => s.trim().parse::<i64>().map_err(|e| ProcessingError::ParseError {
            row,
            column: column.to_string(),
            raw: s.clone(),
            message: e.to_string(),
        }),
        _ => Err(ProcessingError::ParseError {
            row,
            column: column.to_string(),
            raw: c.to_string(),
            message: "expected integer".to_string(),
        }),
    }
}

fn parse_f64_cell(row: usize, column: &str, c: &Data) -> ProcessingResult<f64> {
    match c {
        Data::Float(f) => Ok(*f),
        Data::Int(i) => Ok(*i as f64),
        Data::String(s) => s.trim().parse::<f64>().map_err(|e| ProcessingError::ParseError {
            row,
            column: column.to_string(),
            raw: s.clone(),
            message: e.to_string(),
        }),
        _ => Err(ProcessingError::ParseError {
            row,
            column: column.to_string(),
            raw: c.to_string(),
            message: "expected number".to_string(),
        }),
    }
}
