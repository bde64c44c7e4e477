use std::fmt;

use crate::error::{DatasetError, Result};

// ---------------------------------------------------------------------------
// ColumnData – one typed column of a columnar table
// ---------------------------------------------------------------------------

/// Column payload, widened to the two numeric kinds the pipeline cares about.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Int(Vec<i64>),
    Float(Vec<f64>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Int(v) => v.len(),
            ColumnData::Float(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Value at `row` as `f32`, the dtype every sample tensor uses.
    pub fn get_f32(&self, row: usize) -> Option<f32> {
        match self {
            ColumnData::Int(v) => v.get(row).map(|&x| x as f32),
            ColumnData::Float(v) => v.get(row).map(|&x| x as f32),
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            ColumnData::Int(_) => "integer",
            ColumnData::Float(_) => "float",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn int(name: &str, values: Vec<i64>) -> Self {
        Self {
            name: name.to_string(),
            data: ColumnData::Int(values),
        }
    }

    pub fn float(name: &str, values: Vec<f64>) -> Self {
        Self {
            name: name.to_string(),
            data: ColumnData::Float(values),
        }
    }
}

// ---------------------------------------------------------------------------
// Table – an in-memory columnar table as read from disk
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<Column>,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    /// Row count. Fails if the columns disagree on length.
    pub fn num_rows(&self) -> Result<usize> {
        let Some(first) = self.columns.first() else {
            return Ok(0);
        };
        let n = first.data.len();
        for col in &self.columns[1..] {
            if col.data.len() != n {
                return Err(DatasetError::DataIntegrity(format!(
                    "column '{}' has {} rows but '{}' has {n}",
                    col.name,
                    col.data.len(),
                    first.name
                )));
            }
        }
        Ok(n)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Borrow an integer column, failing if it is absent or not integral.
    pub fn int_column(&self, name: &str) -> Result<&[i64]> {
        let col = self.column(name).ok_or_else(|| {
            DatasetError::DataIntegrity(format!(
                "missing column '{name}', found [{}]",
                self.column_names().join(", ")
            ))
        })?;
        match &col.data {
            ColumnData::Int(v) => Ok(v),
            other => Err(DatasetError::DataIntegrity(format!(
                "column '{name}' must be integer, found {}",
                other.type_name()
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// MeasurementStore – the flat backing store all samples slice into
// ---------------------------------------------------------------------------

/// Row-major `f32` matrix of every measurement, `rows × width`.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementStore {
    column_names: Vec<String>,
    width: usize,
    values: Vec<f32>,
}

impl MeasurementStore {
    /// Flatten every column of `table` into a row-major store.
    pub fn from_table(table: &Table) -> Result<Self> {
        let rows = table.num_rows()?;
        let width = table.columns.len();
        if width == 0 {
            return Err(DatasetError::DataIntegrity(
                "measurement table has no columns".into(),
            ));
        }

        let mut values = Vec::with_capacity(rows * width);
        for row in 0..rows {
            for col in &table.columns {
                // num_rows() guarantees every column covers `row`.
                values.push(col.data.get_f32(row).unwrap_or(f32::NAN));
            }
        }

        Ok(Self {
            column_names: table.columns.iter().map(|c| c.name.clone()).collect(),
            width,
            values,
        })
    }

    /// Single-column store, mostly for tests and synthetic data.
    pub fn from_values(name: &str, values: Vec<f32>) -> Self {
        Self {
            column_names: vec![name.to_string()],
            width: 1,
            values,
        }
    }

    pub fn rows(&self) -> usize {
        self.values.len() / self.width
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    /// Row-major values of rows `[begin, end)`, or `None` if out of bounds.
    pub fn rows_slice(&self, begin: usize, end: usize) -> Option<&[f32]> {
        if begin > end || end > self.rows() {
            return None;
        }
        self.values.get(begin * self.width..end * self.width)
    }
}

// ---------------------------------------------------------------------------
// Labels
// ---------------------------------------------------------------------------

/// Blood-culture outcome code. Only these two codes survive filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Label {
    Negative = 2,
    Positive = 3,
}

impl Label {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            2 => Some(Label::Negative),
            3 => Some(Label::Positive),
            _ => None,
        }
    }

    pub fn code(self) -> i64 {
        self as i64
    }

    /// Binary training target: 2 → 0.0, 3 → 1.0.
    pub fn target(self) -> f32 {
        match self {
            Label::Negative => 0.0,
            Label::Positive => 1.0,
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// One retained sample's segment description. `end` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelRecord {
    pub label: Label,
    pub count: i64,
    pub begin: i64,
    pub end: i64,
}

/// Filtered label table, contiguously indexed `[0, M)`.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelTable {
    records: Vec<LabelRecord>,
}

impl LabelTable {
    pub fn from_records(records: Vec<LabelRecord>) -> Result<Self> {
        if records.is_empty() {
            return Err(DatasetError::DataIntegrity(
                "label table is empty after filtering SPE_Result to {2, 3}".into(),
            ));
        }
        Ok(Self { records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, ordinal: usize) -> Option<&LabelRecord> {
        self.records.get(ordinal)
    }

    pub fn records(&self) -> &[LabelRecord] {
        &self.records
    }

    pub fn labels(&self) -> Vec<Label> {
        self.records.iter().map(|r| r.label).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_rejects_ragged_columns() {
        let table = Table::new(vec![
            Column::int("a", vec![1, 2, 3]),
            Column::float("b", vec![1.0, 2.0]),
        ]);
        assert!(matches!(
            table.num_rows(),
            Err(DatasetError::DataIntegrity(_))
        ));
    }

    #[test]
    fn int_column_checks_type() {
        let table = Table::new(vec![Column::float("Count", vec![1.0])]);
        assert!(table.int_column("Count").is_err());
        assert!(table.int_column("Begin").is_err());
    }

    #[test]
    fn store_is_row_major() {
        let table = Table::new(vec![
            Column::float("a", vec![1.0, 2.0, 3.0]),
            Column::int("b", vec![10, 20, 30]),
        ]);
        let store = MeasurementStore::from_table(&table).unwrap();
        assert_eq!(store.rows(), 3);
        assert_eq!(store.width(), 2);
        assert_eq!(store.rows_slice(1, 3).unwrap(), &[2.0, 20.0, 3.0, 30.0]);
        assert!(store.rows_slice(2, 4).is_none());
        assert!(store.rows_slice(2, 1).is_none());
    }

    #[test]
    fn label_codes_and_targets() {
        assert_eq!(Label::from_code(2), Some(Label::Negative));
        assert_eq!(Label::from_code(3), Some(Label::Positive));
        assert_eq!(Label::from_code(1), None);
        assert_eq!(Label::Negative.target(), 0.0);
        assert_eq!(Label::Positive.target(), 1.0);
        assert_eq!(Label::Positive.code(), 3);
    }

    #[test]
    fn empty_label_table_is_an_error() {
        assert!(LabelTable::from_records(Vec::new()).is_err());
    }
}
