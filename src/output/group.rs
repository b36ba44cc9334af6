//! Partitioning of the expanded table by group key.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use crate::error::{ProcessingError, ProcessingResult};
use crate::processing::normalize::display_value;
use crate::types::{DataSet, Value};

/// Characters that cannot appear in an output file name.
const FORBIDDEN_KEY_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Windows device names; a file named `CON.xls` cannot be created there.
const RESERVED_STEMS: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Display text of a group column value, ordered so that numeric keys sort numerically
/// (and before any non-numeric key) while other keys sort as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupKey(String);

impl GroupKey {
    /// Validate the key held by a group column cell. `row` is the 1-based data row used in
    /// errors.
    ///
    /// Returns `Ok(None)` when the cell is missing (Null, NaN, `nan` or blank text): such rows
    /// belong to no group.
    pub fn from_cell(row: usize, value: &Value) -> ProcessingResult<Option<Self>> {
        let key = display_value(value);
        if key.trim().is_empty() {
            return Ok(None);
        }
        let invalid = |message: &str| ProcessingError::InvalidGroupKey {
            row,
            key: key.clone(),
            message: message.to_string(),
        };

        if key == "." || key == ".." {
            return Err(invalid("key is not a file name"));
        }
        if key.chars().any(|c| c.is_control() || FORBIDDEN_KEY_CHARS.contains(&c)) {
            return Err(invalid("key contains characters not allowed in file names"));
        }
        if key.ends_with('.') || key.ends_with(' ') {
            return Err(invalid("key ends with a dot or a space"));
        }
        let stem = key.split('.').next().unwrap_or_default().trim_end();
        if RESERVED_STEMS.iter().any(|r| r.eq_ignore_ascii_case(stem)) {
            return Err(invalid("key is a reserved device name"));
        }
        Ok(Some(Self(key)))
    }

    /// The key text, as used in file names.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn numeric(&self) -> Option<f64> {
        self.0.trim().parse::<f64>().ok().filter(|f| f.is_finite())
    }
}

impl Ord for GroupKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.numeric(), other.numeric()) {
            (Some(a), Some(b)) => a.total_cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for GroupKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// One partition: the key and the indexes of its rows, in table order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub key: GroupKey,
    pub rows: Vec<usize>,
}

/// Output of [`partition`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    /// Groups in ascending key order.
    pub groups: Vec<Group>,
    /// Rows without a key. They are not written anywhere.
    pub dropped_rows: usize,
}

/// Split `dataset` by the display text of `column`, in ascending key order.
///
/// Values with the same display text (`5`, `5.0`, `"5"`) land in the same group, since they
/// would be written to the same file. Rows whose key is missing are counted and left out.
/// Two keys that differ only by letter case fail the run: they would name the same file on
/// case-insensitive file systems.
pub fn partition(dataset: &DataSet, column: &str) -> ProcessingResult<Partition> {
    let idx = dataset
        .schema
        .index_of(column)
        .ok_or_else(|| ProcessingError::SchemaMismatch {
            message: format!("missing group column '{column}'"),
        })?;

    let mut groups: BTreeMap<GroupKey, Vec<usize>> = BTreeMap::new();
    let mut dropped_rows = 0;
    for (row_idx, row) in dataset.rows.iter().enumerate() {
        let value = row.get(idx).unwrap_or(&Value::Null);
        match GroupKey::from_cell(row_idx + 1, value)? {
            Some(key) => groups.entry(key).or_default().push(row_idx),
            None => dropped_rows += 1,
        }
    }

    let mut folded: HashMap<String, &GroupKey> = HashMap::with_capacity(groups.len());
    for (key, rows) in &groups {
        if let Some(other) = folded.insert(key.as_str().to_lowercase(), key) {
            return Err(ProcessingError::InvalidGroupKey {
                row: rows.first().map_or(0, |r| r + 1),
                key: key.as_str().to_string(),
                message: format!("key differs from '{}' only by letter case", other.as_str()),
            });
        }
    }

    Ok(Partition {
        groups: groups
            .into_iter()
            .map(|(key, rows)| Group { key, rows })
            .collect(),
        dropped_rows,
    })
}
