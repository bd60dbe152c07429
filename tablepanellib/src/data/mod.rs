//! Data model: cell values, the table model, merging and transforms.
//!
//! This module is the first stage of the pipeline. Query results come in as
//! series, a transform turns them into a [`TableModel`], and the model is
//! sorted in place before rendering.
//!
//! ## Example
//!
//! ```rust
//! use tablepanellib::data::{merge_tables, Column, SortOptions, TableData};
//! use tablepanellib::data::value::CellValue;
//!
//! let a = TableData::new(
//!     vec![Column::new("Host"), Column::new("Requests")],
//!     vec![vec![Some(CellValue::from("web1")), Some(CellValue::from(120.0))]],
//! );
//! let b = TableData::new(
//!     vec![Column::new("Host"), Column::new("Errors")],
//!     vec![vec![Some(CellValue::from("web1")), Some(CellValue::from(3.0))]],
//! );
//!
//! let mut table = merge_tables(None, &[a, b]);
//! assert_eq!(table.columns.len(), 3);
//! assert_eq!(table.rows.len(), 1);
//!
//! table.sort(SortOptions::descending(1));
//! assert!(table.columns[1].sort);
//! ```

pub mod merge;
pub mod table;
pub mod transform;
pub mod value;

pub use merge::{merge_tables, TableData};
pub use table::{Column, SortOptions, TableModel};
pub use transform::{
    detect_transform, transform_data_to_table, Annotation, ColumnSelection, QueryResult, Series,
    TransformKind,
};
pub use value::{Cell, CellValue, Row};
