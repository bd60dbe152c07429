//! Paginated table-row markup.
//!
//! The data flow is:
//! 1. `TableModel` (merged and sorted)
//! 2. `RenderModel` (resolved styles, one formatter per column)
//! 3. `<tr>` markup for one page, plus pagination links
//!
//! The renderer only formats; sorting and merging happen on the model.

use crate::data::table::TableModel;
use crate::data::value::CellValue;
use crate::format::cell::{EscapeSanitizer, FormatContext, Formatted, Sanitizer};
use crate::style::options::{ColorMode, StyleType};
use crate::style::resolver::CompiledStyles;

use super::model::{RenderModel, RenderValues};
use super::template::{row_variables, ScopedVar, TemplateSrv, VariableInterpolator, URL_FORMAT};

/// Rows per page when the panel does not set one.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Number of pages for `rows` rows.
pub fn page_count(rows: usize, page_size: usize) -> usize {
    rows.div_ceil(page_size.max(1))
}

/// Page links around `page`: up to nine pages starting three before it.
///
/// Empty when everything fits on one page.
pub fn render_pagination(page: usize, page_count: usize) -> String {
    if page_count <= 1 {
        return String::new();
    }
    let start = page.saturating_sub(3);
    let end = page_count.min(start + 9);

    let mut html = String::from("<ul>");
    for idx in start..end {
        let active = if idx == page { " active" } else { "" };
        html.push_str(&format!(
            r#"<li><a class="table-panel-page-link pointer{}">{}</a></li>"#,
            active,
            idx + 1
        ));
    }
    html.push_str("</ul>");
    html
}

/// Renders table rows for one page at a time.
pub struct TableRenderer {
    styles: CompiledStyles,
    page_size: usize,
    utc: bool,
    sanitizer: Box<dyn Sanitizer>,
    template_srv: Box<dyn TemplateSrv>,
    table: TableModel,
    model: RenderModel,
}

impl TableRenderer {
    pub fn new(styles: CompiledStyles, table: TableModel) -> Self {
        let model = RenderModel::build(&table, &styles);
        Self {
            styles,
            page_size: DEFAULT_PAGE_SIZE,
            utc: false,
            sanitizer: Box::new(EscapeSanitizer),
            template_srv: Box::new(VariableInterpolator::new()),
            table,
            model,
        }
    }

    /// Builder: rows per page (`0` or `None` keeps the default).
    pub fn page_size(mut self, page_size: Option<usize>) -> Self {
        self.page_size = page_size.filter(|&n| n > 0).unwrap_or(DEFAULT_PAGE_SIZE);
        self
    }

    pub fn utc(mut self, utc: bool) -> Self {
        self.utc = utc;
        self
    }

    pub fn sanitizer(mut self, sanitizer: Box<dyn Sanitizer>) -> Self {
        self.sanitizer = sanitizer;
        self
    }

    pub fn template_srv(mut self, template_srv: Box<dyn TemplateSrv>) -> Self {
        self.template_srv = template_srv;
        self
    }

    /// Swap in a new table and re-resolve its columns.
    pub fn set_table(&mut self, table: TableModel) {
        self.model = RenderModel::build(&table, &self.styles);
        self.table = table;
    }

    pub fn table(&self) -> &TableModel {
        &self.table
    }

    pub fn model(&self) -> &RenderModel {
        &self.model
    }

    pub fn page_count(&self) -> usize {
        page_count(self.table.rows.len(), self.page_size)
    }

    pub fn render_pagination(&self, page: usize) -> String {
        render_pagination(page, self.page_count())
    }

    fn context(&self) -> FormatContext<'_> {
        FormatContext::new(self.utc, self.sanitizer.as_ref())
    }

    /// Markup for page `page`; pages past the end render empty.
    pub fn render(&self, page: usize) -> String {
        let start = page.saturating_mul(self.page_size);
        let end = (start.saturating_add(self.page_size)).min(self.table.rows.len());
        let ctx = self.context();
        let mut html = String::new();

        for row_idx in start..end {
            let row = &self.table.rows[row_idx];
            let mut cells = String::new();
            let mut row_color = None;

            for col in 0..self.model.len() {
                let value = row.get(col).and_then(|c| c.as_ref());
                let formatted = self.model.format(col, value, &ctx);
                if let Some(color) = &formatted.color {
                    if color.mode == ColorMode::Row {
                        row_color = Some(color.color.clone());
                    }
                }
                cells.push_str(&self.render_cell(col, row_idx, formatted, row_idx == start));
            }

            match row_color {
                Some(color) => html.push_str(&format!(
                    r#"<tr class="table-panel-color-row" style="background-color:{}">{}</tr>"#,
                    color, cells
                )),
                None => html.push_str(&format!("<tr>{}</tr>", cells)),
            }
        }

        log::debug!(
            "table: rendered rows {}..{} of {} (page {})",
            start.min(end),
            end,
            self.table.rows.len(),
            page
        );
        html
    }

    fn render_cell(&self, col: usize, row_idx: usize, formatted: Formatted, width_hack: bool) -> String {
        let resolved = &self.model.columns[col];
        let style = resolved.style.as_ref();

        let mut value = match formatted.display {
            Some(display) => display,
            None => return String::new(),
        };

        let mut classes: Vec<&str> = Vec::new();
        let mut cell_style = String::new();
        let mut text_style = String::new();
        match &formatted.color {
            Some(color) if color.mode == ColorMode::Cell => {
                cell_style = format!(r#" style="background-color:{}""#, color.color);
                classes.push("table-panel-color-cell");
            }
            Some(color) if color.mode == ColorMode::Value => {
                text_style = format!(r#" style="color:{}""#, color.color);
            }
            _ => {}
        }

        // Invisible copy of the header keeps the column at least as wide as
        // its fixed header.
        let mut html = String::new();
        if width_hack {
            let title = if style.map_or(false, |s| s.no_header) {
                ""
            } else {
                resolved.title()
            };
            html.push_str(&format!(r#"<div class="table-panel-width-hack">{}</div>"#, title));
        }

        if style.map_or(false, |s| s.preserve_format) {
            classes.push("table-panel-cell-pre");
        }

        let row = self.table.rows.get(row_idx).map(Vec::as_slice).unwrap_or(&[]);
        let mut scoped_vars = row_variables(row);

        if let Some(icon_template) = style.and_then(|s| s.fontawesome.as_deref()) {
            let icon = self.template_srv.replace(icon_template, &scoped_vars, None);
            value = format!(r#"<i class="{}" style="padding-right:.5rem"></i>{}"#, icon, value);
        }

        scoped_vars.insert(
            "__cell".to_string(),
            ScopedVar::from_cell(Some(&CellValue::String(value.clone()))),
        );

        match style {
            Some(s) if s.link => {
                let link = self.template_srv.replace(
                    s.link_url.as_deref().unwrap_or(""),
                    &scoped_vars,
                    Some(URL_FORMAT),
                );
                let tooltip =
                    self.template_srv
                        .replace(s.link_tooltip.as_deref().unwrap_or(""), &scoped_vars, None);
                let target = if s.link_target_blank { "_blank" } else { "" };
                let data_link_tooltip = if s.mouseover_tooltip {
                    "data-link-tooltip-mouseover"
                } else {
                    "data-link-tooltip"
                };
                classes.push("table-panel-cell-link");

                if !value.is_empty() {
                    html.push_str(&format!(
                        r#" <a href="{}" target="{}" {} data-original-title="{}" data-placement="right"{}> {} </a> "#,
                        link, target, data_link_tooltip, tooltip, text_style, value
                    ));
                }
            }
            _ => html.push_str(&value),
        }

        if resolved.column.filterable {
            classes.push("table-panel-cell-filterable");
            for (title, operator, icon) in [
                ("Filter out value", "!=", "fa-search-minus"),
                ("Filter for value", "=", "fa-search-plus"),
            ] {
                html.push_str(&format!(
                    r#"<a class="table-panel-filter-link" data-link-tooltip data-original-title="{}" data-placement="bottom" data-row="{}" data-column="{}" data-operator="{}"><i class="fa {}"></i></a>"#,
                    title, row_idx, col, operator, icon
                ));
            }
        }

        if style.and_then(|s| s.kind) == Some(StyleType::Fontawesome) {
            classes.push("text-center");
        }

        let class_attr = if classes.is_empty() {
            String::new()
        } else {
            format!(r#" class="{}""#, classes.join(" "))
        };

        format!("<td{}{}{}>{}</td>", class_attr, cell_style, text_style, html)
    }

    /// Every row formatted, for CSV export.
    pub fn render_values(&self) -> RenderValues {
        self.model.values(&self.table, &self.context())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::table::Column;
    use crate::data::value::Cell;
    use crate::style::options::ColumnStyle;

    fn n(v: f64) -> Cell {
        Some(CellValue::Number(v))
    }

    fn s(v: &str) -> Cell {
        Some(CellValue::from(v))
    }

    fn renderer(styles: Vec<ColumnStyle>, columns: &[&str], rows: Vec<Vec<Cell>>) -> TableRenderer {
        let table = TableModel::from_parts(columns.iter().map(|c| Column::new(*c)), rows);
        TableRenderer::new(CompiledStyles::compile(&styles).unwrap(), table).utc(true)
    }

    #[test]
    fn test_page_math() {
        assert_eq!(page_count(0, 100), 0);
        assert_eq!(page_count(100, 100), 1);
        assert_eq!(page_count(101, 100), 2);
        assert_eq!(page_count(5, 0), 5);
    }

    #[test]
    fn test_pagination_window() {
        assert_eq!(render_pagination(0, 1), "");
        let html = render_pagination(0, 2);
        assert!(html.contains(r#"pointer active">1<"#));
        assert!(html.contains(r#"pointer">2<"#));

        let html = render_pagination(10, 30);
        assert!(!html.contains(">7<"));
        assert!(html.contains(r#">8<"#));
        assert!(html.contains(r#"pointer active">11<"#));
        assert!(html.contains(r#">16<"#));
        assert!(!html.contains(">17<"));
    }

    #[test]
    fn test_render_page_slice() {
        let rows = (0..5).map(|i| vec![n(i as f64)]).collect();
        let r = renderer(vec![], &["A"], rows).page_size(Some(2));
        assert_eq!(r.page_count(), 3);
        let page = r.render(1);
        assert_eq!(page.matches("<tr>").count(), 2);
        assert!(page.contains(">2</td>"));
        assert!(page.contains(">3</td>"));
        assert_eq!(r.render(9), "");
    }

    #[test]
    fn test_width_hack_only_on_first_row() {
        let r = renderer(
            vec![ColumnStyle::new("A", StyleType::String).with_alias("Alpha")],
            &["A"],
            vec![vec![s("x")], vec![s("y")]],
        );
        let html = r.render(0);
        assert_eq!(html.matches("table-panel-width-hack").count(), 1);
        assert!(html.contains(r#"<td><div class="table-panel-width-hack">Alpha</div>x</td>"#));
    }

    #[test]
    fn test_hidden_column_omitted() {
        let r = renderer(
            vec![ColumnStyle::new("Secret", StyleType::Hidden)],
            &["A", "Secret"],
            vec![vec![s("x"), s("hidden-value")]],
        );
        let html = r.render(0);
        assert!(!html.contains("hidden-value"));
        assert_eq!(html.matches("<td").count(), 1);
        assert!(r.model().columns[1].column.hidden);
    }

    #[test]
    fn test_cell_and_row_colors() {
        let cell_style = ColumnStyle::new("A", StyleType::Number).with_colors(
            ColorMode::Cell,
            ["#000", "#111"],
            vec![5.0],
        );
        let row_style = ColumnStyle::new("B", StyleType::Number).with_colors(
            ColorMode::Row,
            ["#222", "#333"],
            vec![5.0],
        );
        let r = renderer(vec![cell_style, row_style], &["A", "B"], vec![vec![n(10.0), n(1.0)]]);
        let html = r.render(0);
        assert!(html.starts_with(
            r#"<tr class="table-panel-color-row" style="background-color:#222">"#
        ));
        assert!(html.contains(
            r#"<td class="table-panel-color-cell" style="background-color:#111">"#
        ));
    }

    #[test]
    fn test_value_color_on_text() {
        let style = ColumnStyle::new("A", StyleType::Number).with_colors(
            ColorMode::Value,
            ["#000", "#111"],
            vec![5.0],
        );
        let r = renderer(vec![style], &["A"], vec![vec![n(1.0)]]);
        assert!(r.render(0).contains(r#"<td style="color:#000">"#));
    }

    #[test]
    fn test_link_cell() {
        let style = ColumnStyle::new("Host", StyleType::String)
            .with_link("/d/host?name=${__cell_0}&v=$__cell", "Open $__cell_0");
        let r = renderer(vec![style], &["Host"], vec![vec![s("web 1")]]);
        let html = r.render(0);
        assert!(html.contains(r#"class="table-panel-cell-link""#));
        assert!(html.contains(r#"href="/d/host?name=web%201&v=web%201""#));
        assert!(html.contains(r#"data-original-title="Open web 1""#));
        assert!(html.contains(r#"target="""#));
    }

    #[test]
    fn test_filterable_and_fontawesome_classes() {
        let mut table = TableModel::new();
        table.add_column(Column::new("State").filterable());
        table.add_row(vec![s("fa fa-check")]);
        let style = ColumnStyle::new("State", StyleType::Fontawesome);
        let r = TableRenderer::new(CompiledStyles::compile(&[style]).unwrap(), table);
        let html = r.render(0);
        assert!(html.contains(r#"class="table-panel-cell-filterable text-center""#));
        assert!(html.contains(r#"data-operator="!=""#));
        assert!(html.contains(r#"data-row="0" data-column="0""#));
    }

    #[test]
    fn test_icon_template_prefix() {
        let mut style = ColumnStyle::new("Name", StyleType::String);
        style.fontawesome = Some("fa fa-$__cell_1".to_string());
        let r = renderer(vec![style], &["Name", "Icon"], vec![vec![s("app"), s("server")]]);
        assert!(r
            .render(0)
            .contains(r#"<i class="fa fa-server" style="padding-right:.5rem"></i>app"#));
    }

    #[test]
    fn test_set_table_re_resolves() {
        let mut r = renderer(
            vec![ColumnStyle::new("A", StyleType::Hidden)],
            &["A"],
            vec![vec![s("x")]],
        );
        assert_eq!(r.render(0).matches("<td").count(), 0);
        r.set_table(TableModel::from_parts(vec![Column::new("B")], vec![vec![s("y")]]));
        assert_eq!(r.render(0).matches("<td").count(), 1);
    }

    #[test]
    fn test_render_values() {
        let r = renderer(
            vec![ColumnStyle::new("A", StyleType::Number).with_decimals(1)],
            &["A", "B"],
            vec![vec![n(1.0), s("z")], vec![None, None]],
        );
        let values = r.render_values();
        assert_eq!(values.rows[0], vec![Some("1.0".to_string()), Some("z".to_string())]);
        assert_eq!(values.rows[1], vec![Some("-".to_string()), Some(String::new())]);
    }
}
