//! Merging several table-shaped series into one table.
//!
//! Every series is remapped onto the union of all column names (first seen
//! wins the position), then rows that complement each other are folded
//! together: a later row whose present values agree with an earlier row
//! and which fills at least one of its gaps is absorbed into it.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::table::{Column, TableModel};
use super::value::{deserialize_rows, Cell, Row};

/// A table-shaped series as delivered by a data source.
///
/// Both parts are optional: a series without `columns` is not table data
/// and is skipped by [`merge_tables`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<Column>>,
    #[serde(
        default,
        deserialize_with = "deserialize_rows",
        skip_serializing_if = "Option::is_none"
    )]
    pub rows: Option<Vec<Row>>,
}

impl TableData {
    pub fn new(columns: Vec<Column>, rows: Vec<Row>) -> Self {
        Self {
            columns: Some(columns),
            rows: Some(rows),
        }
    }
}

impl From<&TableModel> for TableData {
    fn from(model: &TableModel) -> Self {
        TableData::new(model.columns.clone(), model.rows.clone())
    }
}

impl From<TableData> for TableModel {
    fn from(data: TableData) -> Self {
        TableModel::from_parts(data.columns.unwrap_or_default(), data.rows.unwrap_or_default())
    }
}

/// Merge `tables` into `dst` (or a fresh model).
///
/// - no tables: `dst` is returned as is
/// - one table: its columns and rows are copied over unchanged
/// - several: columns are unioned and complementary rows are folded
pub fn merge_tables(dst: Option<TableModel>, tables: &[TableData]) -> TableModel {
    let mut model = dst.unwrap_or_default();

    match tables {
        [] => return model,
        [single] => {
            model.set_contents(
                single.columns.clone().unwrap_or_default(),
                single.rows.clone().unwrap_or_default(),
            );
            return model;
        }
        _ => {}
    }

    let table_data: Vec<(&[Column], &[Row])> = tables
        .iter()
        .filter_map(|t| {
            t.columns
                .as_deref()
                .map(|cols| (cols, t.rows.as_deref().unwrap_or(&[])))
        })
        .collect();

    if table_data.len() < tables.len() {
        log::debug!(
            "merge: skipped {} series without columns",
            tables.len() - table_data.len()
        );
    }

    let (columns_union, column_names) = union_columns(&table_data);
    let width = columns_union.len();

    let flattened: Vec<Row> = table_data
        .iter()
        .flat_map(|(cols, rows)| {
            let mapper: Vec<usize> = cols.iter().map(|c| column_names[&c.text]).collect();
            rows.iter()
                .map(move |row| remap_row(row, &mapper, width))
                .collect::<Vec<_>>()
        })
        .collect();

    let merged = compact_rows(&flattened);

    log::debug!(
        "merge: {} series, {} union columns, {} rows folded into {}",
        table_data.len(),
        columns_union.len(),
        flattened.len(),
        merged.len()
    );

    model.set_contents(columns_union, merged);
    model
}

/// Union of all column names in first-seen order, plus name → union index.
fn union_columns(tables: &[(&[Column], &[Row])]) -> (Vec<Column>, HashMap<String, usize>) {
    let mut union = Vec::new();
    let mut names = HashMap::new();
    for (cols, _) in tables {
        for col in cols.iter() {
            if !names.contains_key(&col.text) {
                names.insert(col.text.clone(), union.len());
                union.push(col.clone());
            }
        }
    }
    (union, names)
}

/// Move each value of `row` to its union position; unmapped slots stay absent.
fn remap_row(row: &[Cell], mapper: &[usize], width: usize) -> Row {
    let mut altered: Row = vec![None; width];
    for (from, &to) in mapper.iter().enumerate() {
        altered[to] = row.get(from).cloned().flatten();
    }
    altered
}

/// True when every commonly present value is equal and at least one column
/// is present on exactly one side.
fn rows_match(row: &[Cell], other: &[Cell]) -> bool {
    let mut found_gap = false;
    for (a, b) in row.iter().zip(other.iter()) {
        match (a, b) {
            (Some(x), Some(y)) => {
                if x != y {
                    return false;
                }
            }
            (Some(_), None) | (None, Some(_)) => found_gap = true,
            (None, None) => {}
        }
    }
    found_gap
}

/// Fill the absent slots of `row` from `other`.
fn fill_gaps(row: &[Cell], other: &[Cell]) -> Row {
    row.iter()
        .zip(other.iter())
        .map(|(a, b)| a.clone().or_else(|| b.clone()))
        .collect()
}

/// Greedy forward merge: each unconsumed row absorbs every later unconsumed
/// row that matches its accumulated state.
fn compact_rows(rows: &[Row]) -> Vec<Row> {
    let mut consumed = vec![false; rows.len()];
    let mut compacted = Vec::new();

    for (idx, row) in rows.iter().enumerate() {
        if consumed[idx] {
            continue;
        }
        let mut acc = row.clone();
        for (offset, other) in rows.iter().enumerate().skip(idx + 1) {
            if !consumed[offset] && rows_match(&acc, other) {
                acc = fill_gaps(&acc, other);
                consumed[offset] = true;
            }
        }
        compacted.push(acc);
    }

    compacted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::value::CellValue;

    fn n(v: f64) -> Cell {
        Some(CellValue::Number(v))
    }

    fn s(v: &str) -> Cell {
        Some(CellValue::from(v))
    }

    fn cols(names: &[&str]) -> Vec<Column> {
        names.iter().map(|n| Column::new(*n)).collect()
    }

    fn col_names(table: &TableModel) -> Vec<&str> {
        table.columns.iter().map(|c| c.text.as_str()).collect()
    }

    #[test]
    fn test_merge_no_tables_returns_dst() {
        let merged = merge_tables(None, &[]);
        assert!(merged.columns.is_empty());
        assert!(merged.rows.is_empty());

        let dst = TableModel::from_parts(cols(&["X"]), vec![vec![n(1.0)]]);
        let merged = merge_tables(Some(dst.clone()), &[]);
        assert_eq!(merged, dst);
    }

    #[test]
    fn test_merge_single_table_copies() {
        let input = TableData::new(cols(&["A", "B"]), vec![vec![n(1.0), None]]);
        let merged = merge_tables(None, std::slice::from_ref(&input));
        assert_eq!(merged.columns, input.columns.clone().unwrap());
        assert_eq!(merged.rows, input.rows.clone().unwrap());
        assert_eq!(merged.column_index("B"), Some(1));
    }

    #[test]
    fn test_merge_single_table_without_columns() {
        let input = TableData {
            columns: None,
            rows: Some(vec![vec![n(1.0)]]),
        };
        let merged = merge_tables(None, &[input]);
        assert!(merged.columns.is_empty());
        assert_eq!(merged.rows.len(), 1);
    }

    #[test]
    fn test_merge_union_preserves_first_seen_order() {
        let a = TableData::new(cols(&["Time", "A"]), vec![]);
        let b = TableData::new(cols(&["B", "Time", "A"]), vec![]);
        let c = TableData::new(cols(&["C", "B"]), vec![]);
        let merged = merge_tables(None, &[a, b, c]);
        assert_eq!(col_names(&merged), vec!["Time", "A", "B", "C"]);
    }

    #[test]
    fn test_merge_drops_series_without_columns() {
        let a = TableData::new(cols(&["A"]), vec![vec![n(1.0)]]);
        let bad = TableData {
            columns: None,
            rows: Some(vec![vec![n(9.0)]]),
        };
        let b = TableData::new(cols(&["B"]), vec![vec![n(2.0)]]);
        let merged = merge_tables(None, &[a, bad, b]);
        assert_eq!(col_names(&merged), vec!["A", "B"]);
        assert_eq!(merged.rows, vec![vec![n(1.0), n(2.0)]]);
    }

    #[test]
    fn test_rows_match_complementary() {
        assert!(rows_match(&[n(1.0), None], &[None, s("x")]));
        assert_eq!(fill_gaps(&[n(1.0), None], &[None, s("x")]), vec![n(1.0), s("x")]);
    }

    #[test]
    fn test_rows_without_gap_do_not_match() {
        assert!(!rows_match(&[n(1.0), s("x")], &[n(1.0), s("x")]));
        // both absent on the only differing column is not a gap
        assert!(!rows_match(&[n(1.0), None], &[n(1.0), None]));
    }

    #[test]
    fn test_rows_with_conflict_do_not_match() {
        assert!(!rows_match(&[n(1.0), None], &[n(2.0), s("x")]));
    }

    #[test]
    fn test_merge_two_tables_end_to_end() {
        let t1 = TableData::new(cols(&["A", "B"]), vec![vec![n(1.0), None]]);
        let t2 = TableData::new(cols(&["B", "C"]), vec![vec![None, s("z")]]);
        let merged = merge_tables(None, &[t1, t2]);
        assert_eq!(col_names(&merged), vec!["A", "B", "C"]);
        // A and C are each present on one side only, so the rows fold
        assert_eq!(merged.rows, vec![vec![n(1.0), None, s("z")]]);
    }

    #[test]
    fn test_merge_time_keyed_series() {
        let t1 = TableData::new(
            cols(&["Time", "Value #A"]),
            vec![vec![n(1000.0), n(1.0)], vec![n(2000.0), n(2.0)]],
        );
        let t2 = TableData::new(
            cols(&["Time", "Value #B"]),
            vec![vec![n(1000.0), n(10.0)], vec![n(3000.0), n(30.0)]],
        );
        let merged = merge_tables(None, &[t1, t2]);
        assert_eq!(
            merged.rows,
            vec![
                vec![n(1000.0), n(1.0), n(10.0)],
                vec![n(2000.0), n(2.0), None],
                vec![n(3000.0), None, n(30.0)],
            ]
        );
    }

    #[test]
    fn test_absorbed_rows_are_not_reused() {
        // row 0 absorbs row 2; row 1 must not absorb row 2 again
        let t1 = TableData::new(cols(&["K", "A"]), vec![vec![s("k"), n(1.0)]]);
        let t2 = TableData::new(cols(&["K", "B"]), vec![vec![s("j"), n(5.0)]]);
        let t3 = TableData::new(cols(&["C"]), vec![vec![n(7.0)]]);
        let merged = merge_tables(None, &[t1, t2, t3]);
        assert_eq!(
            merged.rows,
            vec![
                vec![s("k"), n(1.0), None, n(7.0)],
                vec![s("j"), None, n(5.0), None],
            ]
        );
    }

    #[test]
    fn test_accumulated_row_drives_later_matches() {
        // after absorbing [_, 2, _] the accumulator conflicts with [_, 3, 9]
        let t1 = TableData::new(cols(&["A"]), vec![vec![n(1.0)]]);
        let t2 = TableData::new(cols(&["B"]), vec![vec![n(2.0)]]);
        let t3 = TableData::new(cols(&["B", "C"]), vec![vec![n(3.0), n(9.0)]]);
        let merged = merge_tables(None, &[t1, t2, t3]);
        assert_eq!(
            merged.rows,
            vec![vec![n(1.0), n(2.0), None], vec![None, n(3.0), n(9.0)]]
        );
    }
}
