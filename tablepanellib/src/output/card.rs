//! Summary cards: one card per row, keyed by well-known column names.
//!
//! A card shows a name with a state icon, an alert icon, a body of stats and
//! a footer of stats. Which columns fill those slots is set by
//! [`CardLayout`]; columns missing from the table leave their slot empty.

use serde::{Deserialize, Serialize};

use crate::data::table::TableModel;
use crate::data::value::CellValue;
use crate::format::cell::{
    default_format, html_escape, mapped_icon, threshold_color, EscapeSanitizer, FormatContext,
    Sanitizer,
};
use crate::style::options::ColumnStyle;
use crate::style::resolver::{CompiledStyles, ResolvedColumn};

use super::model::{RenderModel, RenderValues};
use super::table::{page_count, DEFAULT_PAGE_SIZE};
use super::template::{row_variables, ScopedVars, TemplateSrv, VariableInterpolator, URL_FORMAT};

/// Column names for each card slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CardLayout {
    pub name: String,
    /// Icon next to the name; its numeric value also picks the border
    pub state: String,
    /// Icon on the right of the header
    pub alert: String,
    pub body_stats: Vec<String>,
    pub footer_stats: Vec<String>,
}

impl Default for CardLayout {
    fn default() -> Self {
        Self {
            name: "Name".to_string(),
            state: "ReliabilityState".to_string(),
            alert: "AlertStatus".to_string(),
            body_stats: vec![
                "NewIssues".to_string(),
                "Regressions".to_string(),
                "TransactionFailureCount".to_string(),
                "ErrorCount".to_string(),
            ],
            footer_stats: vec![
                "TransactionCount".to_string(),
                "Slowdowns".to_string(),
                "ConnectedClients".to_string(),
            ],
        }
    }
}

/// Border class for a numeric state value.
fn border_for_state(value: Option<&CellValue>) -> Option<&'static str> {
    match value {
        Some(CellValue::Number(n)) if *n == 0.0 => Some("border-success"),
        Some(CellValue::Number(n)) if *n == 1.0 => Some("border-warning"),
        Some(CellValue::Number(n)) if *n == 2.0 => Some("border-danger"),
        _ => None,
    }
}

/// Link attributes of a card slot; empty when the style has no link.
#[derive(Debug, Default)]
struct SlotLink {
    href: String,
    tooltip: String,
    data_link_tooltip: &'static str,
}

/// Renders summary cards for one page of rows.
pub struct CardRenderer {
    styles: CompiledStyles,
    layout: CardLayout,
    page_size: usize,
    utc: bool,
    name_filter: Option<String>,
    border_class: String,
    sanitizer: Box<dyn Sanitizer>,
    template_srv: Box<dyn TemplateSrv>,
    table: TableModel,
    model: RenderModel,
}

impl CardRenderer {
    pub fn new(styles: CompiledStyles, table: TableModel) -> Self {
        let model = RenderModel::build(&table, &styles);
        Self {
            styles,
            layout: CardLayout::default(),
            page_size: DEFAULT_PAGE_SIZE,
            utc: false,
            name_filter: None,
            border_class: String::new(),
            sanitizer: Box::new(EscapeSanitizer),
            template_srv: Box::new(VariableInterpolator::new()),
            table,
            model,
        }
    }

    pub fn layout(mut self, layout: CardLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn page_size(mut self, page_size: Option<usize>) -> Self {
        self.page_size = page_size.filter(|&n| n > 0).unwrap_or(DEFAULT_PAGE_SIZE);
        self
    }

    pub fn utc(mut self, utc: bool) -> Self {
        self.utc = utc;
        self
    }

    /// Builder: only show cards whose name contains `filter` (empty shows all).
    pub fn name_filter(mut self, filter: Option<String>) -> Self {
        self.name_filter = filter.filter(|f| !f.is_empty());
        self
    }

    /// Builder: border class for cards without a numeric state.
    pub fn border_class(mut self, class: impl Into<String>) -> Self {
        self.border_class = class.into();
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

    pub fn set_table(&mut self, table: TableModel) {
        self.model = RenderModel::build(&table, &self.styles);
        self.table = table;
    }

    pub fn page_count(&self) -> usize {
        page_count(self.table.rows.len(), self.page_size)
    }

    fn context(&self) -> FormatContext<'_> {
        FormatContext::new(self.utc, self.sanitizer.as_ref())
    }

    fn column(&self, name: &str) -> Option<(usize, &ResolvedColumn)> {
        self.model
            .columns
            .iter()
            .enumerate()
            .find(|(_, c)| c.text() == name)
    }

    fn slot_link(&self, style: Option<&ColumnStyle>, vars: &ScopedVars) -> SlotLink {
        match style {
            Some(s) if s.link => SlotLink {
                href: self.template_srv.replace(
                    s.link_url.as_deref().unwrap_or(""),
                    vars,
                    Some(URL_FORMAT),
                ),
                tooltip: self
                    .template_srv
                    .replace(s.link_tooltip.as_deref().unwrap_or(""), vars, None),
                data_link_tooltip: if s.mouseover_tooltip {
                    "data-link-tooltip-mouseover"
                } else {
                    "data-link-tooltip"
                },
            },
            _ => SlotLink::default(),
        }
    }

    fn stat_markup(&self, name: &str, row: &[Option<CellValue>], vars: &ScopedVars) -> String {
        let (value, title, style) = match self.column(name) {
            Some((idx, col)) => (
                row.get(idx).and_then(|c| c.as_ref()),
                col.title().to_string(),
                col.style.as_ref(),
            ),
            None => (None, String::new(), None),
        };
        let link = self.slot_link(style, vars);
        let text = match value {
            Some(v) if v.is_truthy() => html_escape(&v.to_text()),
            _ => "0".to_string(),
        };
        let value_class = value.map(|v| html_escape(&v.to_text())).unwrap_or_default();
        let color = style
            .and_then(|s| threshold_color(value, s))
            .map(|c| c.color)
            .unwrap_or_default();

        format!(
            r#"<li class="value-{}"><a href="{}" {} data-original-title="{}" data-placement="right"><span class="stat" style="color:{}">{}</span><span class="desc">{}</span></a></li>"#,
            value_class, link.href, link.data_link_tooltip, link.tooltip, color, text, title
        )
    }

    /// Icon for a state slot, plus the border it implies.
    fn icon_slot(
        &self,
        name: &str,
        row: &[Option<CellValue>],
        vars: &ScopedVars,
        ctx: &FormatContext<'_>,
    ) -> (String, SlotLink, Option<&'static str>) {
        match self.column(name) {
            Some((idx, col)) => {
                let value = row.get(idx).and_then(|c| c.as_ref());
                let fallback = ColumnStyle::default();
                let style = col.style.as_ref().unwrap_or(&fallback);
                let (icon, _) = mapped_icon(value, style, ctx);
                (
                    icon,
                    self.slot_link(col.style.as_ref(), vars),
                    border_for_state(value),
                )
            }
            None => (String::new(), SlotLink::default(), None),
        }
    }

    /// Markup for one card, or `None` when the name filter excludes it.
    fn render_card(&self, row_idx: usize, ctx: &FormatContext<'_>) -> Option<String> {
        let row = self.table.rows.get(row_idx)?;
        let vars = row_variables(row);

        let (name_value, name_style, name_link) = match self.column(&self.layout.name) {
            Some((idx, col)) => (
                row.get(idx).and_then(|c| c.as_ref()),
                col.style.as_ref(),
                self.slot_link(col.style.as_ref(), &vars),
            ),
            None => (None, None, SlotLink::default()),
        };

        if let (Some(filter), Some(name)) = (&self.name_filter, name_value) {
            if name.is_null() || !name.to_text().contains(filter.as_str()) {
                log::trace!("cards: row {} filtered out by name", row_idx);
                return None;
            }
        }

        let (state_icon, state_link, state_border) =
            self.icon_slot(&self.layout.state, row, &vars, ctx);
        let (alert_icon, alert_link, alert_border) =
            self.icon_slot(&self.layout.alert, row, &vars, ctx);
        // The alert slot is processed last, so its state wins.
        let border = alert_border
            .or(state_border)
            .unwrap_or(self.border_class.as_str());

        let name_text = default_format(name_value, name_style, ctx);
        let body: String = self
            .layout
            .body_stats
            .iter()
            .map(|stat| self.stat_markup(stat, row, &vars))
            .collect();
        let footer: String = self
            .layout
            .footer_stats
            .iter()
            .map(|stat| self.stat_markup(stat, row, &vars))
            .collect();

        Some(format!(
            concat!(
                r#"<div class="card {}"><div class="card-body">"#,
                r#"<h2 class="pull-left"><span style="margin-right:4px">"#,
                r#"<a href="{}" {} data-original-title="{}" data-placement="right">{}</a></span>"#,
                r#"<a href="{}" {} data-original-title="{}" data-placement="right">{}</a></h2>"#,
                r#"<span class="pull-right control">"#,
                r#"<a href="{}" data-iframe {} data-original-title="{}" data-placement="right">{}</a></span>"#,
                r#"<hr class="clear"><ul class="card-content">{}</ul>"#,
                r#"<ul class="card-content card-footer">{}</ul>"#,
                r#"</div></div>"#
            ),
            border,
            state_link.href,
            state_link.data_link_tooltip,
            state_link.tooltip,
            state_icon,
            name_link.href,
            name_link.data_link_tooltip,
            name_link.tooltip,
            name_text,
            alert_link.href,
            alert_link.data_link_tooltip,
            alert_link.tooltip,
            alert_icon,
            body,
            footer
        ))
    }

    /// Cards for page `page`.
    pub fn render(&self, page: usize) -> String {
        let start = page.saturating_mul(self.page_size);
        let end = start
            .saturating_add(self.page_size)
            .min(self.table.rows.len());
        let ctx = self.context();

        (start..end)
            .filter_map(|row_idx| self.render_card(row_idx, &ctx))
            .collect()
    }

    pub fn render_values(&self) -> RenderValues {
        self.model.values(&self.table, &self.context())
    }
}
