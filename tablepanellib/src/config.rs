//! Panel configuration as stored in dashboards.
//!
//! [`PanelConfig`] carries the column styles, paging, sort and transform
//! settings of one panel. JSON keys are camelCase; missing keys take the
//! panel defaults. Configurations that predate `styles` are migrated on load.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::data::table::{SortOptions, TableModel};
use crate::data::transform::{
    detect_transform, transform_data_to_table, ColumnSelection, QueryResult, TransformKind,
};
use crate::error::TablePanelError;
use crate::output::card::{CardLayout, CardRenderer};
use crate::output::table::TableRenderer;
use crate::style::options::{ColumnStyle, StyleType, DEFAULT_DATE_FORMAT};
use crate::style::resolver::CompiledStyles;
use crate::Result;

/// Threshold colors of the catch-all number style.
pub const DEFAULT_COLORS: [&str; 3] = [
    "rgba(245, 54, 54, 0.9)",
    "rgba(237, 129, 40, 0.89)",
    "rgba(50, 172, 45, 0.97)",
];

/// Styles for a new panel: a `Time` date column and a number style for
/// everything else.
pub fn default_styles() -> Vec<ColumnStyle> {
    vec![
        ColumnStyle::new("Time", StyleType::Date)
            .with_alias("Time")
            .with_date_format(DEFAULT_DATE_FORMAT),
        ColumnStyle {
            alias: Some(String::new()),
            unit: Some("short".to_string()),
            decimals: Some(2),
            colors: DEFAULT_COLORS.iter().map(|c| c.to_string()).collect(),
            thresholds: Some(Vec::new()),
            ..ColumnStyle::new("/.*/", StyleType::Number)
        },
    ]
}

/// Settings for one table or card panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PanelConfig {
    /// Column style rules, first match wins
    pub styles: Vec<ColumnStyle>,
    /// Rows per page; unset uses the renderer default
    pub page_size: Option<usize>,
    pub sort: SortOptions,
    pub transform: TransformKind,
    /// Document fields or aggregations to show, depending on `transform`
    pub columns: Vec<ColumnSelection>,
    pub show_header: bool,
    pub scroll: bool,
    pub font_size: String,
    /// Cards only: show apps whose name contains this
    pub app_name_filter: Option<String>,
    /// Cards only: border class for cards without a state
    pub border_class: String,
    pub card_layout: CardLayout,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            styles: default_styles(),
            page_size: None,
            sort: SortOptions::default(),
            transform: TransformKind::default(),
            columns: Vec::new(),
            show_header: true,
            scroll: true,
            font_size: "100%".to_string(),
            app_name_filter: None,
            border_class: String::new(),
            card_layout: CardLayout::default(),
        }
    }
}

/// Move pre-`styles` keys into place: `columns` held the styles and
/// `fields` held the column selections.
fn migrate_legacy(value: &mut Value) {
    let obj = match value.as_object_mut() {
        Some(obj) => obj,
        None => return,
    };
    if obj.get("styles").map_or(false, |s| !s.is_null()) {
        return;
    }

    log::debug!("config: migrating legacy panel without styles");
    obj.remove("styles");
    if let Some(styles) = obj.remove("columns") {
        obj.insert("styles".to_string(), styles);
    }
    if let Some(fields) = obj.remove("fields") {
        obj.insert("columns".to_string(), fields);
    }
}

impl PanelConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a configuration object, migrating legacy keys first.
    pub fn from_value(mut value: Value) -> Result<Self> {
        migrate_legacy(&mut value);
        serde_json::from_value(value).map_err(|e| TablePanelError::InvalidConfig(e.to_string()))
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: Value =
            serde_json::from_str(json).map_err(|e| TablePanelError::InvalidConfig(e.to_string()))?;
        Self::from_value(value)
    }

    /// Read and decode a configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| TablePanelError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    /// Builder: replace the style rules.
    pub fn styles(mut self, styles: Vec<ColumnStyle>) -> Self {
        self.styles = styles;
        self
    }

    /// Builder: append a style rule after the existing ones.
    pub fn style(mut self, style: ColumnStyle) -> Self {
        self.styles.push(style);
        self
    }

    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn sort(mut self, sort: SortOptions) -> Self {
        self.sort = sort;
        self
    }

    pub fn transform(mut self, transform: TransformKind) -> Self {
        self.transform = transform;
        self
    }

    pub fn columns(mut self, columns: Vec<ColumnSelection>) -> Self {
        self.columns = columns;
        self
    }

    pub fn app_name_filter(mut self, filter: impl Into<String>) -> Self {
        self.app_name_filter = Some(filter.into());
        self
    }

    pub fn border_class(mut self, class: impl Into<String>) -> Self {
        self.border_class = class.into();
        self
    }

    /// Compile the style rules; fails on the first invalid pattern.
    pub fn compile_styles(&self) -> Result<CompiledStyles> {
        CompiledStyles::compile(&self.styles)
    }

    /// Transform `data` into a sorted table.
    ///
    /// The transform is re-detected from the data's shape the way the panel
    /// does on every data update.
    pub fn build_table(&self, data: &QueryResult) -> Result<TableModel> {
        let kind = detect_transform(self.transform, data);
        let mut table = transform_data_to_table(data, kind, &self.columns)?;
        table.sort(self.sort);
        log::debug!(
            "config: built {} x {} table with {:?}",
            table.rows.len(),
            table.columns.len(),
            kind
        );
        Ok(table)
    }

    pub fn table_renderer(&self, table: TableModel) -> Result<TableRenderer> {
        Ok(TableRenderer::new(self.compile_styles()?, table).page_size(self.page_size))
    }

    pub fn card_renderer(&self, table: TableModel) -> Result<CardRenderer> {
        Ok(CardRenderer::new(self.compile_styles()?, table)
            .page_size(self.page_size)
            .layout(self.card_layout.clone())
            .name_filter(self.app_name_filter.clone())
            .border_class(self.border_class.clone()))
    }
}
