//! The transform engine: derive label columns, project them, expand rows by quantity.

use crate::columns::{self, output_schema, OUTPUT_COLUMNS, REQUIRED_COLUMNS};
use crate::error::{ProcessingError, ProcessingResult};
use crate::types::{DataSet, Schema, Value};

use super::normalize::{
    description_text, image_path, model_code, price_text, quantity, split_description, width_text,
};

/// Network folder holding the model pictures used by the label templates.
pub const DEFAULT_IMAGE_PATH_PREFIX: &str =
    r"\\SERVER-DADOS\Label\CÓDIGOS\H.Kuntzler\JORGE BISCHOFF\SAPATOS\";

/// Options controlling column derivation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformOptions {
    /// Text placed before the model code in `IMAGEM_MODELO_NEW`.
    pub image_path_prefix: String,
    /// Text placed after the model code in `IMAGEM_MODELO_NEW`.
    pub image_path_suffix: String,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            image_path_prefix: DEFAULT_IMAGE_PATH_PREFIX.to_string(),
            image_path_suffix: ".jpg".to_string(),
        }
    }
}

/// Indexes of the required input columns.
struct InputColumns {
    plano_prod: usize,
    of_numero: usize,
    prod_descricao: usize,
    prod_codigo: usize,
    preco_unit_pdv: usize,
    largura: usize,
    grade_tamanho: usize,
    codigo_barras: usize,
    qtd: usize,
    unid_medida: usize,
}

impl InputColumns {
    fn resolve(schema: &Schema) -> ProcessingResult<Self> {
        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|name| schema.index_of(name).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(missing_columns_error(&missing, schema));
        }

        // Every lookup below is covered by the check above.
        let idx = |name: &str| schema.index_of(name).unwrap_or_default();
        Ok(Self {
            plano_prod: idx(columns::PLANO_PROD),
            of_numero: idx(columns::OF_NUMERO),
            prod_descricao: idx(columns::PROD_DESCRICAO),
            prod_codigo: idx(columns::PROD_CODIGO),
            preco_unit_pdv: idx(columns::PRECO_UNIT_PDV),
            largura: idx(columns::LARGURA),
            grade_tamanho: idx(columns::GRADE_TAMANHO),
            codigo_barras: idx(columns::CODIGO_BARRAS),
            qtd: idx(columns::QTD),
            unid_medida: idx(columns::UNID_MEDIDA),
        })
    }
}

fn missing_columns_error(missing: &[&str], schema: &Schema) -> ProcessingError {
    let quoted: Vec<String> = missing.iter().map(|m| format!("'{m}'")).collect();
    ProcessingError::SchemaMismatch {
        message: format!(
            "missing required column(s) {}. columns={:?}",
            quoted.join(", "),
            schema.field_names().collect::<Vec<_>>()
        ),
    }
}

fn cell(row: &[Value], idx: usize) -> &Value {
    row.get(idx).unwrap_or(&Value::Null)
}

/// Derive the label columns and project every row onto [`OUTPUT_COLUMNS`].
///
/// Rows are not expanded yet; `QTD` is validated and stored as an integer. Errors carry the
/// 1-based data row number. The first bad row aborts the whole call.
pub fn derive(input: &DataSet, options: &TransformOptions) -> ProcessingResult<DataSet> {
    let cols = InputColumns::resolve(&input.schema)?;

    let mut rows: Vec<Vec<Value>> = Vec::with_capacity(input.row_count());
    for (idx0, row) in input.rows.iter().enumerate() {
        let user_row = idx0 + 1;

        let description = description_text(cell(row, cols.prod_descricao));
        let (produto, descricao) = split_description(description.as_deref());
        let code = description.as_deref().map(|d| model_code(Some(d)));
        let image = image_path(
            code.as_deref(),
            &options.image_path_prefix,
            &options.image_path_suffix,
        );
        let price = price_text(user_row, columns::PRECO_UNIT_PDV, cell(row, cols.preco_unit_pdv))?;
        let qtd = quantity(user_row, columns::QTD, cell(row, cols.qtd))?;

        rows.push(vec![
            cell(row, cols.plano_prod).clone(),
            cell(row, cols.of_numero).clone(),
            description.map(Value::Utf8).unwrap_or(Value::Null),
            Value::Utf8(produto),
            Value::Utf8(descricao),
            cell(row, cols.prod_codigo).clone(),
            Value::Utf8(price),
            Value::Utf8(width_text(cell(row, cols.largura))),
            cell(row, cols.grade_tamanho).clone(),
            cell(row, cols.codigo_barras).clone(),
            Value::Int64(qtd as i64),
            cell(row, cols.unid_medida).clone(),
            Value::Utf8(code.unwrap_or_default()),
            Value::Utf8(image),
        ]);
    }

    debug_assert!(rows.iter().all(|r| r.len() == OUTPUT_COLUMNS.len()));
    Ok(DataSet::new(output_schema(), rows))
}

/// Repeat every row `QTD` times, keeping the original order; `QTD = 0` drops the row.
pub fn expand_by_quantity(dataset: &DataSet) -> ProcessingResult<DataSet> {
    let qtd_idx = dataset
        .schema
        .index_of(columns::QTD)
        .ok_or_else(|| missing_columns_error(&[columns::QTD], &dataset.schema))?;

    let mut counts: Vec<usize> = Vec::with_capacity(dataset.row_count());
    for (idx0, row) in dataset.rows.iter().enumerate() {
        counts.push(quantity(idx0 + 1, columns::QTD, cell(row, qtd_idx))?);
    }

    let mut rows: Vec<Vec<Value>> = Vec::with_capacity(counts.iter().sum());
    for (row, copies) in dataset.rows.iter().zip(counts) {
        rows.extend(std::iter::repeat_n(row, copies).cloned());
    }

    Ok(DataSet::new(dataset.schema.clone(), rows))
}

/// Run the whole transform engine: [`derive`] followed by [`expand_by_quantity`].
///
/// # Examples
///
/// ```rust
/// use label_sheets::columns::{input_schema, REQUIRED_COLUMNS};
/// use label_sheets::processing::{transform, TransformOptions};
/// use label_sheets::types::{DataSet, Value};
///
/// # fn main() -> Result<(), label_sheets::ProcessingError> {
/// // Columns in REQUIRED_COLUMNS order.
/// let row = vec![
///     Value::text("JB1234567 SCARPIN PRETO"), // PROD_DESCRICAO
///     Value::Float64(1234.5),                 // PRECO_UNIT_PDV
///     Value::Null,                            // LARGURA
///     Value::text("P01"),                     // PLANO_PROD
///     Value::Int64(5001),                     // OF_NUMERO
///     Value::text("C-1"),                     // PROD_CODIGO
///     Value::text("35"),                      // GRADE_TAMANHO
///     Value::text("7890000000001"),           // CODIGO_BARRAS
///     Value::Int64(2),                        // QTD
///     Value::text("PR"),                      // UNID_MEDIDA
/// ];
/// assert_eq!(REQUIRED_COLUMNS.len(), row.len());
///
/// let expanded = transform(&DataSet::new(input_schema(), vec![row]), &TransformOptions::default())?;
/// assert_eq!(expanded.row_count(), 2);
/// assert_eq!(expanded.rows[0][6], Value::text("R$ 1.234,50"));
/// # Ok(())
/// # }
/// ```
pub fn transform(input: &DataSet, options: &TransformOptions) -> ProcessingResult<DataSet> {
    let derived = derive(input, options)?;
    expand_by_quantity(&derived)
}
