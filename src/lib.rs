//! `label-sheets` turns an order workbook into one label spreadsheet per production order.
//!
//! The input is the `Dados` sheet of an order workbook (`.xlsm`, `.xlsx`, `.xls`, `.xlsb` or
//! `.ods`). Every order row carries a quantity `QTD`; the output has one row per label, so each
//! row is repeated `QTD` times. The expanded table is split by `OF_NUMERO` and each group is
//! written as its own legacy `.xls` workbook, ready to be merged into a label template. All
//! files are bundled into one zip archive.
//!
//! The primary entrypoint is [`pipeline::process_path`] (or [`pipeline::process_bytes`] for an
//! upload held in memory).
//!
//! ## Derived columns
//!
//! | Column | Value |
//! |---|---|
//! | `PRODUTO` | first word of `PROD_DESCRICAO` |
//! | `DESCRICAO` | rest of `PROD_DESCRICAO` after the first space |
//! | `PROD_DESC` | first 9 characters of `PROD_DESCRICAO` |
//! | `IMAGEM_MODELO_NEW` | image folder + `PROD_DESC` + `.jpg` |
//! | `PRECO_UNIT_PDV` | rewritten as `R$ 1.234,50` |
//!
//! Missing values, and text that reads `nan`, become empty cells in every output file.
//!
//! ## Quick example
//!
//! ```no_run
//! use label_sheets::pipeline::{process_path, ProcessOptions};
//!
//! # fn main() -> Result<(), label_sheets::ProcessingError> {
//! let out = process_path("pedidos.xlsm", &ProcessOptions::default())?;
//! println!(
//!     "sheets={} rows={} archive={} bytes",
//!     out.summary.groups, out.summary.expanded_rows, out.summary.archive_bytes
//! );
//! out.save_archive("planilhas_geradas.zip")?;
//! out.remove_scratch()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Transform only
//!
//! ```rust
//! use label_sheets::columns::input_schema;
//! use label_sheets::processing::{transform, TransformOptions};
//! use label_sheets::types::{DataSet, Value};
//!
//! let table = DataSet::new(
//!     input_schema(),
//!     vec![vec![
//!         Value::text("TENIS COURO PRETO"),
//!         Value::Float64(1234.5),
//!         Value::text("M"),
//!         Value::Int64(7),
//!         Value::Int64(1001),
//!         Value::text("P-77"),
//!         Value::Int64(38),
//!         Value::text("7890000000001"),
//!         Value::Int64(2),
//!         Value::text("PR"),
//!     ]],
//! );
//! let labels = transform(&table, &TransformOptions::default()).unwrap();
//! assert_eq!(labels.row_count(), 2);
//! ```
//!
//! ## Modules
//!
//! - [`ingestion`]: reading the order sheet from a workbook
//! - [`processing`]: column derivation and expansion by quantity
//! - [`output`]: per-group spreadsheets and the zip archive
//! - [`pipeline`]: end-to-end runs with observer reporting
//! - [`observability`]: progress and outcome observers
//! - [`columns`]: column names and schemas
//! - [`types`]: schema + in-memory dataset types
//! - [`error`]: the shared error type

pub mod columns;
pub mod error;
pub mod ingestion;
pub mod observability;
pub mod output;
pub mod pipeline;
pub mod processing;
pub mod types;

pub use error::{ProcessingError, ProcessingResult};
