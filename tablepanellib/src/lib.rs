//! # tablepanellib
//!
//! The rendering core of a dashboard table panel: it turns query results and
//! a panel configuration into paged HTML table rows (or summary cards).
//!
//! ## Overview
//!
//! The pipeline has four stages:
//!
//! - **Data**: query series are transformed into a [`TableModel`]; several
//!   table-shaped series are merged on their shared columns
//! - **Style**: each column is matched against the ordered [`ColumnStyle`]
//!   rules, giving it a title and formatting directives
//! - **Format**: every cell is formatted by its column's formatter (numbers
//!   with units, dates, value maps, icons), with an optional threshold color
//! - **Output**: rows of one page become `<tr>` markup or cards
//!
//! Nothing in the pipeline performs I/O. Configuration errors (bad JSON, bad
//! style patterns) surface when the configuration is loaded; rendering
//! itself never fails.
//!
//! ## Example
//!
//! ```rust
//! use tablepanellib::{PanelConfig, QueryResult};
//!
//! let data = QueryResult::from_json_str(r#"[{
//!     "type": "table",
//!     "columns": [{"text": "Host"}, {"text": "Load"}],
//!     "rows": [["web-1", 1234], ["web-2", 56]]
//! }]"#).unwrap();
//!
//! let config = PanelConfig::new();
//! let table = config.build_table(&data).unwrap();
//! let renderer = config.table_renderer(table).unwrap();
//!
//! let html = renderer.render(0);
//! assert!(html.contains("1.23 K"));
//! assert_eq!(renderer.page_count(), 1);
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod format;
pub mod output;
pub mod style;

pub use config::PanelConfig;
pub use data::{
    merge_tables, transform_data_to_table, CellValue, Column, QueryResult, SortOptions, TableData,
    TableModel, TransformKind,
};
pub use error::TablePanelError;
pub use format::{CellFormatter, FormatContext, Formatted, Sanitizer};
pub use output::{CardRenderer, RenderValues, TableRenderer, TemplateSrv, VariableInterpolator};
pub use style::{ColumnStyle, CompiledStyles, StyleType};

/// Result type for tablepanellib operations
pub type Result<T> = std::result::Result<T, TablePanelError>;
