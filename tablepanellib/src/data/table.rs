//! The row/column table model.
//!
//! `TableModel` is built fresh for every query response. Columns are unique
//! by `text` (first one wins, insertion order kept) and rows are positional,
//! so every row index lines up with the current column order.

use std::cmp::Ordering;
use std::collections::HashMap;

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use super::value::{parse_int, parse_int_cell, CellValue, Row};

/// A table column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    /// Stable identifier, unique within a table
    pub text: String,
    /// Display title, derived from `text` by the matched style's alias
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Unit hint from the data source; takes precedence over the style unit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// Column data type hint (e.g. `"date"` for time columns)
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub filterable: bool,
    #[serde(default)]
    pub sort: bool,
    #[serde(default)]
    pub desc: bool,
}

impl Column {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Builder: set the column type hint.
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Builder: set the unit hint.
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Builder: mark the column filterable.
    pub fn filterable(mut self) -> Self {
        self.filterable = true;
        self
    }
}

/// Sort request: column index (or none) and direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortOptions {
    #[serde(default)]
    pub col: Option<usize>,
    #[serde(default)]
    pub desc: bool,
}

impl Default for SortOptions {
    fn default() -> Self {
        Self {
            col: Some(0),
            desc: true,
        }
    }
}

impl SortOptions {
    /// No sorting.
    pub fn none() -> Self {
        Self {
            col: None,
            desc: false,
        }
    }

    /// Sort ascending on `col`.
    pub fn ascending(col: usize) -> Self {
        Self {
            col: Some(col),
            desc: false,
        }
    }

    /// Sort descending on `col`.
    pub fn descending(col: usize) -> Self {
        Self {
            col: Some(col),
            desc: true,
        }
    }

    /// Header click: descending → ascending → unsorted on the same column,
    /// and a different column always starts descending.
    pub fn toggle(self, col: usize) -> Self {
        if self.col == Some(col) {
            if self.desc {
                Self::ascending(col)
            } else {
                Self::none()
            }
        } else {
            Self::descending(col)
        }
    }
}

/// Table data: ordered columns plus positional rows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableModel {
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
    #[serde(skip)]
    column_map: HashMap<String, usize>,
}

impl PartialEq for TableModel {
    fn eq(&self, other: &Self) -> bool {
        self.columns == other.columns && self.rows == other.rows
    }
}

impl TableModel {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table through `add_column`/`add_row`, so duplicate column
    /// names collapse to their first occurrence.
    pub fn from_parts(columns: impl IntoIterator<Item = Column>, rows: Vec<Row>) -> Self {
        let mut model = Self::new();
        for col in columns {
            model.add_column(col);
        }
        for row in rows {
            model.add_row(row);
        }
        model
    }

    /// Replace columns and rows wholesale, without de-duplication.
    pub(crate) fn set_contents(&mut self, columns: Vec<Column>, rows: Vec<Row>) {
        self.column_map.clear();
        for (idx, col) in columns.iter().enumerate() {
            self.column_map.entry(col.text.clone()).or_insert(idx);
        }
        self.columns = columns;
        self.rows = rows;
    }

    /// Append `col` unless a column with the same `text` already exists.
    pub fn add_column(&mut self, col: Column) {
        if self.column_map.contains_key(&col.text) {
            return;
        }
        self.column_map.insert(col.text.clone(), self.columns.len());
        self.columns.push(col);
    }

    /// Append a row. Length is not checked against the column count.
    pub fn add_row(&mut self, row: Row) {
        self.rows.push(row);
    }

    /// Look up a column index by `text`.
    pub fn column_index(&self, text: &str) -> Option<usize> {
        if self.column_map.is_empty() && !self.columns.is_empty() {
            // Deserialized models skip the index
            return self.columns.iter().position(|c| c.text == text);
        }
        self.column_map.get(text).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Sort rows on `options.col`, then reverse everything if `options.desc`.
    ///
    /// Out-of-range or missing columns leave the table untouched. The
    /// target column is flagged `sort`/`desc` and every other column's sort
    /// flags are cleared.
    pub fn sort(&mut self, options: SortOptions) {
        let col = match options.col {
            Some(col) if col < self.columns.len() => col,
            _ => return,
        };

        let keyed: Vec<(SortKey, Row)> = std::mem::take(&mut self.rows)
            .into_iter()
            .map(|row| (SortKey::from_cell(row.get(col).and_then(|c| c.as_ref())), row))
            .collect();
        self.rows = merge_sort(keyed).into_iter().map(|(_, row)| row).collect();

        if options.desc {
            self.rows.reverse();
        }

        for (idx, column) in self.columns.iter_mut().enumerate() {
            column.sort = idx == col;
            column.desc = idx == col && options.desc;
        }
    }
}

fn k_suffix_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+\.?\d?K$").expect("valid regex"))
}

fn p1_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+\s+\((\d+)\sp1\)$").expect("valid regex"))
}

/// "3.7K" → "37000": drop the first `.`, then the `K` becomes `000`.
fn normalize_k_suffix(s: &str) -> String {
    if k_suffix_regex().is_match(s) {
        s.replacen('.', "", 1).replacen('K', "000", 1)
    } else {
        s.to_string()
    }
}

/// Stable merge sort on precomputed keys.
///
/// Key equality is not transitive (the `p1` tie-break only applies between
/// two `p1` strings), so rows move only past strictly greater keys.
fn merge_sort(mut items: Vec<(SortKey, Row)>) -> Vec<(SortKey, Row)> {
    if items.len() <= 1 {
        return items;
    }
    let right = items.split_off(items.len() / 2);
    let left = merge_sort(items);
    let right = merge_sort(right);

    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    loop {
        let take_right = match (left.peek(), right.peek()) {
            (Some(l), Some(r)) => r.0 < l.0,
            (Some(_), None) => false,
            (None, Some(_)) => true,
            (None, None) => break,
        };
        let next = if take_right { right.next() } else { left.next() };
        merged.extend(next);
    }
    merged
}

/// Ordering key for one cell of the sort column.
///
/// Integers come first in numeric order (two `"n (m p1)"` strings with the
/// same leading integer are ordered by the inner value; any other equal
/// integers tie), then strings that do not parse, in descending
/// case-insensitive order, then everything else that does not parse.
#[derive(Debug, Clone, PartialEq)]
enum SortKey {
    Int { value: f64, p1: Option<f64> },
    Text(String),
    Other,
}

impl SortKey {
    fn from_cell(cell: Option<&CellValue>) -> Self {
        match cell {
            Some(CellValue::String(s)) => {
                let normalized = normalize_k_suffix(s);
                match parse_int(&normalized) {
                    Some(value) => SortKey::Int {
                        value,
                        p1: p1_regex()
                            .captures(&normalized)
                            .and_then(|caps| parse_int(&caps[1])),
                    },
                    None => SortKey::Text(normalized.to_lowercase()),
                }
            }
            other => match parse_int_cell(other) {
                Some(value) => SortKey::Int { value, p1: None },
                None => SortKey::Other,
            },
        }
    }

    fn rank(&self) -> u8 {
        match self {
            SortKey::Int { .. } => 0,
            SortKey::Text(_) => 1,
            SortKey::Other => 2,
        }
    }
}

impl Eq for SortKey {}

impl PartialOrd for SortKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SortKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortKey::Int { value: a, p1: ap }, SortKey::Int { value: b, p1: bp }) => a
                .partial_cmp(b)
                .unwrap_or(Ordering::Equal)
                .then_with(|| match (ap, bp) {
                    (Some(x), Some(y)) => x.partial_cmp(y).unwrap_or(Ordering::Equal),
                    _ => Ordering::Equal,
                }),
            // Non-numeric strings sort in reverse lexical order.
            (SortKey::Text(a), SortKey::Text(b)) => b.cmp(a),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::value::Cell;

    fn s(v: &str) -> Cell {
        Some(CellValue::from(v))
    }

    fn n(v: f64) -> Cell {
        Some(CellValue::Number(v))
    }

    fn single_column(values: Vec<Cell>) -> TableModel {
        TableModel::from_parts(
            vec![Column::new("A")],
            values.into_iter().map(|v| vec![v]).collect(),
        )
    }

    fn first_cells(table: &TableModel) -> Vec<Cell> {
        table.rows.iter().map(|r| r[0].clone()).collect()
    }

    #[test]
    fn test_add_column_is_idempotent() {
        let mut table = TableModel::new();
        table.add_column(Column::new("A"));
        table.add_column(Column::new("A"));
        table.add_column(Column::new("B"));
        assert_eq!(table.columns.len(), 2);
        assert_eq!(table.column_index("B"), Some(1));
    }

    #[test]
    fn test_add_row_does_not_validate_length() {
        let mut table = TableModel::new();
        table.add_column(Column::new("A"));
        table.add_row(vec![n(1.0), n(2.0), n(3.0)]);
        assert_eq!(table.rows[0].len(), 3);
    }

    #[test]
    fn test_sort_k_suffix_ascending() {
        let mut table = single_column(vec![s("3.7K"), s("500"), s("10")]);
        table.sort(SortOptions::ascending(0));
        assert_eq!(first_cells(&table), vec![s("10"), s("500"), s("3.7K")]);
    }

    #[test]
    fn test_sort_numbers_before_unparseable() {
        let mut table = single_column(vec![s("abc"), n(5.0), s("2"), None]);
        table.sort(SortOptions::ascending(0));
        assert_eq!(first_cells(&table), vec![s("2"), n(5.0), s("abc"), None]);
    }

    #[test]
    fn test_sort_strings_descending_lexical_quirk() {
        let mut table = single_column(vec![s("apple"), s("Banana"), s("cherry")]);
        table.sort(SortOptions::ascending(0));
        assert_eq!(
            first_cells(&table),
            vec![s("cherry"), s("Banana"), s("apple")]
        );
    }

    #[test]
    fn test_sort_p1_tie_break() {
        let mut table = single_column(vec![s("1 (3 p1)"), s("1 (2 p1)"), s("0")]);
        table.sort(SortOptions::ascending(0));
        assert_eq!(
            first_cells(&table),
            vec![s("0"), s("1 (2 p1)"), s("1 (3 p1)")]
        );
    }

    #[test]
    fn test_sort_p1_needs_both_sides() {
        let mut table = single_column(vec![s("1 (2 p1)"), s("1")]);
        table.sort(SortOptions::ascending(0));
        assert_eq!(first_cells(&table), vec![s("1 (2 p1)"), s("1")]);

        let mut table = single_column(vec![s("1 (2 p1)"), n(1.0)]);
        table.sort(SortOptions::ascending(0));
        assert_eq!(first_cells(&table), vec![s("1 (2 p1)"), n(1.0)]);
    }

    #[test]
    fn test_sort_desc_reverses_ties() {
        let mut table = TableModel::from_parts(
            vec![Column::new("A"), Column::new("B")],
            vec![
                vec![n(1.0), s("first")],
                vec![n(1.0), s("second")],
                vec![n(2.0), s("third")],
            ],
        );
        table.sort(SortOptions::descending(0));
        let order: Vec<Cell> = table.rows.iter().map(|r| r[1].clone()).collect();
        // full reversal of the stable ascending order, ties included
        assert_eq!(order, vec![s("third"), s("second"), s("first")]);
        assert!(table.columns[0].sort);
        assert!(table.columns[0].desc);
    }

    #[test]
    fn test_sort_out_of_range_is_noop() {
        let mut table = single_column(vec![n(3.0), n(1.0)]);
        table.sort(SortOptions::ascending(5));
        assert_eq!(first_cells(&table), vec![n(3.0), n(1.0)]);
        table.sort(SortOptions::none());
        assert_eq!(first_cells(&table), vec![n(3.0), n(1.0)]);
        assert!(!table.columns[0].sort);
    }

    #[test]
    fn test_sort_clears_other_column_flags() {
        let mut table = TableModel::from_parts(
            vec![Column::new("A"), Column::new("B")],
            vec![vec![n(1.0), n(2.0)]],
        );
        table.sort(SortOptions::descending(0));
        table.sort(SortOptions::ascending(1));
        assert!(!table.columns[0].sort);
        assert!(!table.columns[0].desc);
        assert!(table.columns[1].sort);
        assert!(!table.columns[1].desc);
    }

    #[test]
    fn test_sort_short_rows() {
        let mut table = TableModel::from_parts(
            vec![Column::new("A"), Column::new("B")],
            vec![vec![n(1.0)], vec![n(2.0), n(1.0)]],
        );
        table.sort(SortOptions::ascending(1));
        assert_eq!(table.rows[0], vec![n(2.0), n(1.0)]);
    }

    #[test]
    fn test_toggle_sort_cycle() {
        let sort = SortOptions::default();
        assert_eq!(sort, SortOptions::descending(0));
        let sort = sort.toggle(0);
        assert_eq!(sort, SortOptions::ascending(0));
        let sort = sort.toggle(0);
        assert_eq!(sort, SortOptions::none());
        let sort = sort.toggle(2);
        assert_eq!(sort, SortOptions::descending(2));
    }
}
