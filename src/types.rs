//! Core data model types.
//!
//! Workbooks are read into an in-memory [`DataSet`] shaped by a [`Schema`] (a list of typed
//! [`Field`]s). The transform engine produces another [`DataSet`] with the fixed output columns.

/// Logical data type for a schema field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataType {
    /// 64-bit signed integer.
    Int64,
    /// 64-bit floating point number.
    Float64,
    /// UTF-8 string.
    Utf8,
    /// Whatever the source cell holds (number, text, bool), kept as-is.
    Any,
}

/// A single named, typed field in a [`Schema`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Field/column name.
    pub name: String,
    /// Field data type.
    pub data_type: DataType,
}

impl Field {
    /// Create a new field.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// A list of fields describing the shape of a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    /// Ordered list of fields.
    pub fields: Vec<Field>,
}

impl Schema {
    /// Create a new schema from fields.
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Iterate field names in order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Returns the index of a field by name, if present.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }
}

/// A single typed value in a [`DataSet`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Missing/empty value.
    Null,
    /// 64-bit signed integer.
    Int64(i64),
    /// 64-bit float.
    Float64(f64),
    /// Boolean.
    Bool(bool),
    /// UTF-8 string.
    Utf8(String),
}

impl Value {
    /// Shorthand for `Value::Utf8(s.into())`.
    pub fn text(s: impl Into<String>) -> Self {
        Self::Utf8(s.into())
    }

    /// `true` for [`Value::Null`] and for a NaN float.
    pub fn is_missing(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Float64(f) => f.is_nan(),
            _ => false,
        }
    }
}

/// In-memory tabular dataset.
///
/// Rows are stored as `Vec<Vec<Value>>` in the same order as the [`Schema`] fields.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSet {
    /// Schema describing row shape.
    pub schema: Schema,
    /// Row-major value storage.
    pub rows: Vec<Vec<Value>>,
}

impl DataSet {
    /// Create a dataset from schema and rows.
    pub fn new(schema: Schema, rows: Vec<Vec<Value>>) -> Self {
        Self { schema, rows }
    }

    /// Number of rows in the dataset.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Iterate the values of one column, or `None` if the column does not exist.
    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = &Value>> {
        let idx = self.schema.index_of(name)?;
        Some(self.rows.iter().map(move |row| row.get(idx).unwrap_or(&Value::Null)))
    }

    /// Return a dataset holding at most the first `n` rows.
    pub fn head(&self, n: usize) -> Self {
        Self {
            schema: self.schema.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DataSet, DataType, Field, Schema, Value};

    fn sample_dataset() -> DataSet {
        let schema = Schema::new(vec![
            Field::new("OF_NUMERO", DataType::Any),
            Field::new("QTD", DataType::Int64),
        ]);
        DataSet::new(
            schema,
            vec![
                vec![Value::text("A"), Value::Int64(2)],
                vec![Value::text("B"), Value::Null],
                vec![Value::text("C"), Value::Int64(1)],
            ],
        )
    }

    #[test]
    fn schema_index_of_works() {
        let ds = sample_dataset();
        assert_eq!(ds.schema.index_of("OF_NUMERO"), Some(0));
        assert_eq!(ds.schema.index_of("QTD"), Some(1));
        assert_eq!(ds.schema.index_of("missing"), None);
        assert_eq!(ds.schema.field_names().collect::<Vec<_>>(), vec!["OF_NUMERO", "QTD"]);
    }

    #[test]
    fn column_yields_values_in_row_order() {
        let ds = sample_dataset();
        let qtd: Vec<&Value> = ds.column("QTD").unwrap().collect();
        assert_eq!(qtd, vec![&Value::Int64(2), &Value::Null, &Value::Int64(1)]);
        assert!(ds.column("nope").is_none());
    }

    #[test]
    fn head_truncates_without_touching_original() {
        let ds = sample_dataset();
        assert_eq!(ds.head(2).row_count(), 2);
        assert_eq!(ds.head(10).row_count(), 3);
        assert_eq!(ds.row_count(), 3);
    }

    #[test]
    fn nan_counts_as_missing() {
        assert!(Value::Null.is_missing());
        assert!(Value::Float64(f64::NAN).is_missing());
        assert!(!Value::Float64(0.0).is_missing());
        assert!(!Value::text("").is_missing());
    }
}
