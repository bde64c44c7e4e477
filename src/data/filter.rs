use super::model::{Label, LabelRecord, LabelTable, Table};
use crate::error::{DatasetError, Result};

pub const RESULT_COLUMN: &str = "SPE_Result";
pub const COUNT_COLUMN: &str = "Count";
pub const BEGIN_COLUMN: &str = "Begin";
pub const END_COLUMN: &str = "End";

/// Keep only rows whose outcome code is 2 or 3 and re-index them `[0, M)`.
///
/// The raw `End` column is inclusive; it is turned into an exclusive bound
/// here (`End + 1`) and nowhere else. Clamping happens later, per access.
///
/// Fails with [`DatasetError::DataIntegrity`] when a required column is
/// missing or non-integral, when the columns differ in length, or when no
/// row survives the filter.
pub fn filter_labels(raw: &Table) -> Result<LabelTable> {
    let results = raw.int_column(RESULT_COLUMN)?;
    let counts = raw.int_column(COUNT_COLUMN)?;
    let begins = raw.int_column(BEGIN_COLUMN)?;
    let ends = raw.int_column(END_COLUMN)?;

    for (name, len) in [
        (COUNT_COLUMN, counts.len()),
        (BEGIN_COLUMN, begins.len()),
        (END_COLUMN, ends.len()),
    ] {
        if len != results.len() {
            return Err(DatasetError::DataIntegrity(format!(
                "column {name} has {len} rows but {RESULT_COLUMN} has {}",
                results.len()
            )));
        }
    }

    let records: Vec<LabelRecord> = results
        .iter()
        .enumerate()
        .filter_map(|(row, &code)| {
            Label::from_code(code).map(|label| LabelRecord {
                label,
                count: counts[row],
                begin: begins[row],
                end: ends[row].saturating_add(1),
            })
        })
        .collect();

    let dropped = results.len() - records.len();
    if dropped > 0 {
        log::debug!("label filter dropped {dropped} rows with codes outside {{2, 3}}");
    }

    LabelTable::from_records(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Column;

    fn raw(results: Vec<i64>) -> Table {
        let n = results.len() as i64;
        Table::new(vec![
            Column::int(RESULT_COLUMN, results),
            Column::int(COUNT_COLUMN, (0..n).map(|_| 10).collect()),
            Column::int(BEGIN_COLUMN, (0..n).map(|i| i * 10).collect()),
            Column::int(END_COLUMN, (0..n).map(|i| i * 10 + 9).collect()),
        ])
    }

    #[test]
    fn keeps_only_valid_codes_and_reindexes() {
        let labels = filter_labels(&raw(vec![1, 2, 4, 3, 0, 2])).unwrap();
        assert_eq!(labels.len(), 3);
        assert_eq!(
            labels.labels(),
            vec![Label::Negative, Label::Positive, Label::Negative]
        );
        // Ordinal 1 is raw row 3.
        assert_eq!(labels.get(1).unwrap().begin, 30);
    }

    #[test]
    fn end_becomes_exclusive() {
        let labels = filter_labels(&raw(vec![2, 3])).unwrap();
        let rec = labels.get(0).unwrap();
        assert_eq!((rec.begin, rec.end), (0, 10));
        assert_eq!(rec.end - rec.begin, rec.count);
    }

    #[test]
    fn input_table_is_untouched() {
        let table = raw(vec![1, 2, 3]);
        let before = table.clone();
        filter_labels(&table).unwrap();
        assert_eq!(table, before);
    }

    #[test]
    fn empty_result_is_integrity_error() {
        let err = filter_labels(&raw(vec![1, 4, 0])).unwrap_err();
        assert!(matches!(err, DatasetError::DataIntegrity(_)));
    }

    #[test]
    fn missing_column_is_integrity_error() {
        let table = Table::new(vec![Column::int(RESULT_COLUMN, vec![2])]);
        let err = filter_labels(&table).unwrap_err();
        assert!(matches!(err, DatasetError::DataIntegrity(_)));
    }

    #[test]
    fn ragged_columns_are_integrity_error() {
        let table = Table::new(vec![
            Column::int(RESULT_COLUMN, vec![2, 3]),
            Column::int(COUNT_COLUMN, vec![1]),
            Column::int(BEGIN_COLUMN, vec![0, 1]),
            Column::int(END_COLUMN, vec![0, 1]),
        ]);
        assert!(filter_labels(&table).is_err());
    }
}
