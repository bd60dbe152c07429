//! Per-render state shared by the table and card renderers.
//!
//! A `RenderModel` pairs every resolved column with its formatter. It is
//! rebuilt whenever the table changes, so styles and hidden flags always
//! describe the current column set.

use serde::{Deserialize, Serialize};

use crate::data::table::{Column, TableModel};
use crate::data::value::CellValue;
use crate::format::cell::{CellFormatter, FormatContext, Formatted};
use crate::style::resolver::{resolve_columns, CompiledStyles, ResolvedColumn};

/// Resolved columns plus one formatter per column.
#[derive(Debug, Clone, Default)]
pub struct RenderModel {
    pub columns: Vec<ResolvedColumn>,
    formatters: Vec<CellFormatter>,
}

impl RenderModel {
    pub fn build(table: &TableModel, styles: &CompiledStyles) -> Self {
        let mut columns = resolve_columns(table, styles);
        let formatters: Vec<CellFormatter> = columns.iter().map(CellFormatter::for_column).collect();
        for (column, formatter) in columns.iter_mut().zip(&formatters) {
            column.column.hidden = matches!(formatter, CellFormatter::Hidden);
        }
        Self {
            columns,
            formatters,
        }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Format one cell of column `col`.
    pub fn format(&self, col: usize, value: Option<&CellValue>, ctx: &FormatContext<'_>) -> Formatted {
        match self.formatters.get(col) {
            Some(formatter) => formatter.format(value, ctx),
            None => Formatted {
                display: Some(value.map(CellValue::to_text).unwrap_or_default()),
                color: None,
            },
        }
    }

    /// Every row, every column formatted; hidden cells are `None`.
    pub fn values(&self, table: &TableModel, ctx: &FormatContext<'_>) -> RenderValues {
        let rows = table
            .rows
            .iter()
            .map(|row| {
                (0..self.len())
                    .map(|col| {
                        self.format(col, row.get(col).and_then(|c| c.as_ref()), ctx)
                            .display
                    })
                    .collect()
            })
            .collect();
        RenderValues {
            columns: self.columns.iter().map(|c| c.column.clone()).collect(),
            rows,
        }
    }
}

/// Formatted table for export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderValues {
    /// Columns with titles and hidden flags filled in
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<Option<String>>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::cell::EscapeSanitizer;
    use crate::style::options::{ColumnStyle, StyleType};

    #[test]
    fn test_values_formats_every_cell() {
        let table = TableModel::from_parts(
            vec![Column::new("Host"), Column::new("Secret"), Column::new("Load")],
            vec![vec![
                Some(CellValue::from("a<b")),
                Some(CellValue::from("x")),
                Some(CellValue::Number(0.5)),
            ]],
        );
        let styles = CompiledStyles::compile(&[
            ColumnStyle::new("Secret", StyleType::Hidden),
            ColumnStyle::new("Load", StyleType::Number).with_unit("percentunit"),
        ])
        .unwrap();
        let model = RenderModel::build(&table, &styles);
        let values = model.values(&table, &FormatContext::new(true, &EscapeSanitizer));

        assert!(values.columns[1].hidden);
        assert!(!values.columns[0].hidden);
        assert_eq!(values.columns[2].title.as_deref(), Some("Load"));
        assert_eq!(
            values.rows[0],
            vec![Some("a&lt;b".to_string()), None, Some("50%".to_string())]
        );
    }
}
