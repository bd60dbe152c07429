//! Output: turn a styled table into markup.
//!
//! This is the final stage of the pipeline. It provides:
//!
//! - **TableRenderer**: paged `<tr>` rows plus pagination links
//! - **CardRenderer**: one summary card per row
//! - **RenderModel**: resolved columns and formatters shared by both
//! - **TemplateSrv**: variable substitution for links and tooltips
//!
//! Renderers only format. Transforming, merging and sorting happen in
//! [`crate::data`] before a table reaches them.
//!
//! ## Example
//!
//! ```rust
//! use tablepanellib::data::{CellValue, Column, TableModel};
//! use tablepanellib::output::TableRenderer;
//! use tablepanellib::style::CompiledStyles;
//!
//! let table = TableModel::from_parts(
//!     vec![Column::new("Host")],
//!     vec![vec![Some(CellValue::from("web-1"))]],
//! );
//! let renderer = TableRenderer::new(CompiledStyles::default(), table);
//! assert_eq!(renderer.render(0), "<tr><td><div class=\"table-panel-width-hack\">Host</div>web-1</td></tr>");
//! ```

pub mod card;
pub mod model;
pub mod table;
pub mod template;

pub use card::{CardLayout, CardRenderer};
pub use model::{RenderModel, RenderValues};
pub use table::{page_count, render_pagination, TableRenderer, DEFAULT_PAGE_SIZE};
pub use template::{
    encode_uri_component, format_value, row_variables, ScopedVar, ScopedVars, TemplateSrv,
    VariableInterpolator, VariableValue, URL_FORMAT,
};
