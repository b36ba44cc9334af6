use std::path::Path;

use label_sheets::columns::{input_schema, DATA_SHEET};
use label_sheets::ingestion::{ingest_workbook_from_bytes, ingest_workbook_from_path};
use label_sheets::types::Value;
use label_sheets::ProcessingError;
use rust_xlsxwriter::{Workbook, Worksheet};

/// Header with the required columns shuffled, plus a column nobody reads.
const HEADER: [&str; 11] = [
    "OF_NUMERO",
    "OBS",
    "QTD",
    "PROD_DESCRICAO",
    "PRECO_UNIT_PDV",
    "LARGURA",
    "PLANO_PROD",
    "PROD_CODIGO",
    "GRADE_TAMANHO",
    "CODIGO_BARRAS",
    "UNID_MEDIDA",
];

fn write_header(ws: &mut Worksheet, row: u32, skip: Option<&str>) {
    let mut col = 0;
    for name in HEADER {
        if Some(name) == skip {
            continue;
        }
        ws.write_string(row, col, name).unwrap();
        col += 1;
    }
}

fn write_orders(path: &Path) {
    let mut wb = Workbook::new();

    let cover = wb.add_worksheet();
    cover.set_name("Capa").unwrap();
    cover.write_string(0, 0, "not the order sheet").unwrap();

    let ws = wb.add_worksheet();
    ws.set_name(DATA_SHEET).unwrap();
    // Header on the second sheet row; the first one stays empty.
    write_header(ws, 1, None);

    ws.write_number(2, 0, 1001).unwrap();
    ws.write_string(2, 1, "ignored").unwrap();
    ws.write_number(2, 2, 2).unwrap();
    ws.write_string(2, 3, "JB1234567 SCARPIN PRETO").unwrap();
    ws.write_number(2, 4, 199.9).unwrap();
    ws.write_string(2, 5, "M").unwrap();
    ws.write_string(2, 6, "P01").unwrap();
    ws.write_string(2, 7, "C-1").unwrap();
    ws.write_number(2, 8, 35).unwrap();
    ws.write_string(2, 9, "7890000000001").unwrap();
    ws.write_string(2, 10, "PR").unwrap();

    // Row 3 left blank on purpose.

    ws.write_string(4, 0, "OF-77").unwrap();
    ws.write_string(4, 2, "1").unwrap();
    ws.write_string(4, 3, "BOTA").unwrap();
    ws.write_string(4, 4, "nan").unwrap();

    wb.save(path).unwrap();
}

#[test]
fn ingest_projects_required_columns_in_schema_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pedidos.xlsx");
    write_orders(&path);

    let ds = ingest_workbook_from_path(&path, DATA_SHEET, &input_schema()).unwrap();
    assert_eq!(ds.row_count(), 2);

    // REQUIRED_COLUMNS order: PROD_DESCRICAO, PRECO_UNIT_PDV, LARGURA, PLANO_PROD, OF_NUMERO,
    // PROD_CODIGO, GRADE_TAMANHO, CODIGO_BARRAS, QTD, UNID_MEDIDA
    let first = &ds.rows[0];
    assert_eq!(first[0], Value::text("JB1234567 SCARPIN PRETO"));
    assert_eq!(first[1], Value::Float64(199.9));
    assert_eq!(first[2], Value::text("M"));
    assert_eq!(first[4], Value::Float64(1001.0));
    assert_eq!(first[8], Value::Int64(2));

    let second = &ds.rows[1];
    assert_eq!(second[0], Value::text("BOTA"));
    assert!(second[1].is_missing());
    assert_eq!(second[2], Value::Null);
    assert_eq!(second[4], Value::text("OF-77"));
    assert_eq!(second[8], Value::Int64(1));
}

#[test]
fn ingest_from_bytes_matches_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pedidos.xlsx");
    write_orders(&path);

    let from_path = ingest_workbook_from_path(&path, DATA_SHEET, &input_schema()).unwrap();
    let bytes = std::fs::read(&path).unwrap();
    let from_bytes = ingest_workbook_from_bytes(&bytes, DATA_SHEET, &input_schema()).unwrap();
    assert_eq!(from_path.rows.len(), from_bytes.rows.len());
    assert_eq!(from_path.rows[0], from_bytes.rows[0]);
}

#[test]
fn missing_sheet_lists_available_sheets() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pedidos.xlsx");
    write_orders(&path);

    let err = ingest_workbook_from_path(&path, "Pedidos", &input_schema()).unwrap_err();
    match err {
        ProcessingError::SheetNotFound { sheet, available } => {
            assert_eq!(sheet, "Pedidos");
            assert_eq!(available, vec!["Capa".to_string(), DATA_SHEET.to_string()]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn missing_columns_are_reported_together() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sem_qtd.xlsx");

    let mut wb = Workbook::new();
    let ws = wb.add_worksheet();
    ws.set_name(DATA_SHEET).unwrap();
    write_header(ws, 0, Some("QTD"));
    ws.write_string(1, 0, "1001").unwrap();
    wb.save(&path).unwrap();

    let err = ingest_workbook_from_path(&path, DATA_SHEET, &input_schema()).unwrap_err();
    assert!(matches!(err, ProcessingError::SchemaMismatch { .. }));
    let msg = err.to_string();
    assert!(msg.contains("sheet 'Dados'"), "{msg}");
    assert!(msg.contains("'QTD'"), "{msg}");
}

#[test]
fn fractional_quantity_is_rejected_with_sheet_row() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("qtd.xlsx");

    let mut wb = Workbook::new();
    let ws = wb.add_worksheet();
    ws.set_name(DATA_SHEET).unwrap();
    write_header(ws, 0, None);
    ws.write_string(1, 0, "1001").unwrap();
    ws.write_number(1, 2, 1.5).unwrap();
    wb.save(&path).unwrap();

    let err = ingest_workbook_from_path(&path, DATA_SHEET, &input_schema()).unwrap_err();
    match err {
        ProcessingError::ParseError { row, column, .. } => {
            assert_eq!(row, 2);
            assert_eq!(column, "QTD");
        }
        other => panic!("unexpected error: {other}"),
    }
}
