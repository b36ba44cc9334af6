//! Ingestion of the order workbook.
//!
//! Most callers go through [`crate::pipeline::process_path`] or
//! [`crate::pipeline::process_bytes`], which read the `Dados` sheet with
//! [`crate::columns::input_schema`]. The functions here are the lower-level building blocks.

pub mod excel;

pub use excel::{ingest_workbook_from_bytes, ingest_workbook_from_path};
