//! Column names of the input sheet and of the label sheets.

use crate::types::{DataType, Field, Schema};

pub const PLANO_PROD: &str = "PLANO_PROD";
pub const OF_NUMERO: &str = "OF_NUMERO";
pub const PROD_DESCRICAO: &str = "PROD_DESCRICAO";
pub const PRODUTO: &str = "PRODUTO";
pub const DESCRICAO: &str = "DESCRICAO";
pub const PROD_CODIGO: &str = "PROD_CODIGO";
pub const PRECO_UNIT_PDV: &str = "PRECO_UNIT_PDV";
pub const LARGURA: &str = "LARGURA";
pub const GRADE_TAMANHO: &str = "GRADE_TAMANHO";
pub const CODIGO_BARRAS: &str = "CODIGO_BARRAS";
pub const QTD: &str = "QTD";
pub const UNID_MEDIDA: &str = "UNID_MEDIDA";
pub const PROD_DESC: &str = "PROD_DESC";
pub const IMAGEM_MODELO_NEW: &str = "IMAGEM_MODELO_NEW";

/// Default name of the worksheet holding the order records.
pub const DATA_SHEET: &str = "Dados";

/// Columns every input sheet must carry.
pub const REQUIRED_COLUMNS: [&str; 10] = [
    PROD_DESCRICAO,
    PRECO_UNIT_PDV,
    LARGURA,
    PLANO_PROD,
    OF_NUMERO,
    PROD_CODIGO,
    GRADE_TAMANHO,
    CODIGO_BARRAS,
    QTD,
    UNID_MEDIDA,
];

/// Columns of every label sheet, in output order.
pub const OUTPUT_COLUMNS: [&str; 14] = [
    PLANO_PROD,
    OF_NUMERO,
    PROD_DESCRICAO,
    PRODUTO,
    DESCRICAO,
    PROD_CODIGO,
    PRECO_UNIT_PDV,
    LARGURA,
    GRADE_TAMANHO,
    CODIGO_BARRAS,
    QTD,
    UNID_MEDIDA,
    PROD_DESC,
    IMAGEM_MODELO_NEW,
];

/// Schema used to read the input sheet.
///
/// Price and quantity are typed so bad cells are rejected while reading; everything else is
/// carried through untouched.
pub fn input_schema() -> Schema {
    Schema::new(
        REQUIRED_COLUMNS
            .iter()
            .map(|&name| {
                let data_type = match name {
                    PROD_DESCRICAO => DataType::Utf8,
                    PRECO_UNIT_PDV => DataType::Float64,
                    QTD => DataType::Int64,
                    _ => DataType::Any,
                };
                Field::new(name, data_type)
            })
            .collect(),
    )
}

/// Schema of the expanded table produced by [`crate::processing::transform`].
pub fn output_schema() -> Schema {
    Schema::new(
        OUTPUT_COLUMNS
            .iter()
            .map(|&name| {
                let data_type = match name {
                    QTD => DataType::Int64,
                    PLANO_PROD | OF_NUMERO | PROD_CODIGO | GRADE_TAMANHO | CODIGO_BARRAS
                    | UNID_MEDIDA => DataType::Any,
                    _ => DataType::Utf8,
                };
                Field::new(name, data_type)
            })
            .collect(),
    )
}
