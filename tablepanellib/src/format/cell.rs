//! Per-column cell formatting.
//!
//! A [`CellFormatter`] is chosen once per column from its resolved style and
//! then applied to every cell of that column. Formatting is total: every
//! value shape has a defined display, and the only side output is the
//! threshold color returned alongside the text.

use crate::data::value::{parse_int, string_to_number, CellValue};
use crate::style::options::{ColorMode, ColumnStyle, MappingType, StyleType, ValueMap};
use crate::style::resolver::ResolvedColumn;

use super::color::color_for_value;
use super::date::format_date;
use super::units::ValueFormat;

/// Display for missing values in typed columns.
pub const EMPTY_VALUE: &str = "-";

/// Host-supplied cleaner for text that is allowed to carry markup.
pub trait Sanitizer {
    fn sanitize(&self, text: &str) -> String;
}

impl<F> Sanitizer for F
where
    F: Fn(&str) -> String,
{
    fn sanitize(&self, text: &str) -> String {
        self(text)
    }
}

/// Default sanitizer: escapes everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct EscapeSanitizer;

impl Sanitizer for EscapeSanitizer {
    fn sanitize(&self, text: &str) -> String {
        html_escape(text)
    }
}

/// Escape the five HTML-significant characters.
pub fn html_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Per-render inputs shared by all formatters.
#[derive(Clone, Copy)]
pub struct FormatContext<'a> {
    /// Render dates in UTC instead of local time
    pub utc: bool,
    pub sanitizer: &'a dyn Sanitizer,
}

impl<'a> FormatContext<'a> {
    pub fn new(utc: bool, sanitizer: &'a dyn Sanitizer) -> Self {
        Self { utc, sanitizer }
    }
}

/// A threshold color picked while formatting a cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellColor {
    pub mode: ColorMode,
    pub color: String,
}

/// Result of formatting one cell.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Formatted {
    /// Display markup; `None` hides the cell and its column
    pub display: Option<String>,
    pub color: Option<CellColor>,
}

impl Formatted {
    fn text(display: impl Into<String>) -> Self {
        Self {
            display: Some(display.into()),
            color: None,
        }
    }

    fn hidden() -> Self {
        Self::default()
    }

    fn with_color(mut self, color: Option<CellColor>) -> Self {
        self.color = color;
        self
    }

    pub fn is_hidden(&self) -> bool {
        self.display.is_none()
    }

    /// Display text, empty for hidden cells.
    pub fn as_str(&self) -> &str {
        self.display.as_deref().unwrap_or("")
    }
}

/// The formatter chosen for a column.
#[derive(Debug, Clone)]
pub enum CellFormatter {
    /// No matching style
    Default,
    Hidden,
    Date(ColumnStyle),
    Text(ColumnStyle),
    Number {
        style: ColumnStyle,
        format: ValueFormat,
    },
    Html,
    FontAwesome(ColumnStyle),
    /// A style without a type: default formatting honoring `sanitize`
    Styled(ColumnStyle),
}

impl CellFormatter {
    /// Pick the formatter for a resolved column.
    ///
    /// Number columns prefer the column's own unit over the style's.
    pub fn for_column(column: &ResolvedColumn) -> Self {
        let style = match &column.style {
            Some(style) => style,
            None => return CellFormatter::Default,
        };
        match style.kind {
            Some(StyleType::Hidden) => CellFormatter::Hidden,
            Some(StyleType::Date) => CellFormatter::Date(style.clone()),
            Some(StyleType::String) => CellFormatter::Text(style.clone()),
            Some(StyleType::Number) => {
                let unit = column.column.unit.as_deref().or(style.unit.as_deref());
                CellFormatter::Number {
                    style: style.clone(),
                    format: ValueFormat::from_unit(unit),
                }
            }
            Some(StyleType::Html) => CellFormatter::Html,
            Some(StyleType::Fontawesome) => CellFormatter::FontAwesome(style.clone()),
            None => CellFormatter::Styled(style.clone()),
        }
    }

    /// Format one cell; `None` is an absent value.
    pub fn format(&self, value: Option<&CellValue>, ctx: &FormatContext<'_>) -> Formatted {
        match self {
            CellFormatter::Default => Formatted::text(default_format(value, None, ctx)),
            CellFormatter::Styled(style) => {
                Formatted::text(default_format(value, Some(style), ctx))
            }
            CellFormatter::Hidden => Formatted::hidden(),
            CellFormatter::Date(style) => Formatted::text(format_date_cell(value, style, ctx)),
            CellFormatter::Text(style) => format_text(value, style, ctx),
            CellFormatter::Number { style, format } => format_number(value, style, *format, ctx),
            CellFormatter::Html => Formatted::text(match value {
                None | Some(CellValue::Null) => String::new(),
                Some(v) => v.to_text(),
            }),
            CellFormatter::FontAwesome(style) => format_icon(value, style, ctx),
        }
    }
}

/// Escape (or sanitize, when the style asks) and stringify.
///
/// Missing values render empty and arrays join with `", "`.
pub fn default_format(
    value: Option<&CellValue>,
    style: Option<&ColumnStyle>,
    ctx: &FormatContext<'_>,
) -> String {
    let text = match value {
        None | Some(CellValue::Null) => return String::new(),
        Some(v) => v.join(", "),
    };
    sanitize_or_escape(&text, style, ctx)
}

fn sanitize_or_escape(text: &str, style: Option<&ColumnStyle>, ctx: &FormatContext<'_>) -> String {
    if style.map_or(false, |s| s.sanitize) {
        ctx.sanitizer.sanitize(text)
    } else {
        html_escape(text)
    }
}

/// Threshold color for `value`, if the style has a color mode and the value
/// is a finite number (numeric strings included).
pub fn threshold_color(value: Option<&CellValue>, style: &ColumnStyle) -> Option<CellColor> {
    let mode = style.color_mode?;
    let number = match value {
        None | Some(CellValue::Null) | Some(CellValue::Array(_)) => return None,
        Some(v) => v.to_number(),
    };
    if !number.is_finite() {
        return None;
    }
    color_for_value(number, style).map(|color| CellColor { mode, color })
}

/// Value-map equality: numeric for non-string values, exact for strings.
fn value_map_matches(map: &ValueMap, value: &CellValue) -> bool {
    match value {
        CellValue::String(s) => map.value == *s,
        other => string_to_number(&map.value) == other.to_number(),
    }
}

fn format_date_cell(
    value: Option<&CellValue>,
    style: &ColumnStyle,
    ctx: &FormatContext<'_>,
) -> String {
    let value = match value {
        None | Some(CellValue::Null) => return EMPTY_VALUE.to_string(),
        Some(CellValue::Array(items)) => match items.first() {
            Some(first) => first.clone(),
            None => return EMPTY_VALUE.to_string(),
        },
        Some(v) => v.clone(),
    };

    // Long numeric strings are epoch values
    let value = match value {
        CellValue::String(s) if s.len() > 12 && !string_to_number(&s).is_nan() => {
            match parse_int(&s) {
                Some(n) => CellValue::Number(n),
                None => CellValue::String(s),
            }
        }
        other => other,
    };

    format_date(&value, style.date_format(), ctx.utc)
}

fn format_text(value: Option<&CellValue>, style: &ColumnStyle, ctx: &FormatContext<'_>) -> Formatted {
    let joined = value.map(|v| match v {
        CellValue::Array(_) => CellValue::String(v.join(", ")),
        other => other.clone(),
    });

    match (style.mapping(), joined.as_ref()) {
        (MappingType::ValueToText, Some(v)) => {
            for map in &style.value_maps {
                if v.is_null() {
                    if map.value == "null" {
                        return Formatted::text(map.text.clone());
                    }
                    continue;
                }
                if value_map_matches(map, v) {
                    return Formatted::text(sanitize_or_escape(&map.text, Some(style), ctx))
                        .with_color(threshold_color(Some(v), style));
                }
            }
        }
        (MappingType::RangeToText, Some(v)) => {
            for map in &style.range_maps {
                if v.is_null() {
                    if map.from == "null" && map.to == "null" {
                        return Formatted::text(map.text.clone());
                    }
                    continue;
                }
                let number = v.to_number();
                if string_to_number(&map.from) <= number && string_to_number(&map.to) >= number {
                    return Formatted::text(sanitize_or_escape(&map.text, Some(style), ctx))
                        .with_color(threshold_color(Some(v), style));
                }
            }
        }
        _ => {}
    }

    match joined {
        None | Some(CellValue::Null) => Formatted::text(EMPTY_VALUE),
        Some(v) => Formatted::text(default_format(Some(&v), Some(style), ctx))
            .with_color(threshold_color(Some(&v), style)),
    }
}

fn format_number(
    value: Option<&CellValue>,
    style: &ColumnStyle,
    format: ValueFormat,
    ctx: &FormatContext<'_>,
) -> Formatted {
    let v = match value {
        None | Some(CellValue::Null) => return Formatted::text(EMPTY_VALUE),
        Some(v) => v,
    };
    let number = v.to_number();
    if v.is_array() || number.is_nan() {
        return Formatted::text(default_format(Some(v), Some(style), ctx));
    }
    Formatted::text(format.format(number, style.decimals))
        .with_color(threshold_color(Some(v), style))
}

/// Icon markup, with the value as a hover tooltip when requested.
pub fn icon_markup(icon: &str, tooltip: Option<&str>) -> String {
    match tooltip {
        Some(tip) => format!(
            r#"<i class="{}" data-link-tooltip data-original-title="{}" data-placement="right"></i>"#,
            icon, tip
        ),
        None => format!(r#"<i class="{}"></i>"#, icon),
    }
}

/// Map a value to an icon class through the style's value maps, falling
/// back to the sanitized value itself.
pub fn mapped_icon(
    value: Option<&CellValue>,
    style: &ColumnStyle,
    ctx: &FormatContext<'_>,
) -> (String, Option<CellColor>) {
    let tooltip = |text: &str| style.value_as_tooltip.then(|| text.to_string());

    if style.mapping() == MappingType::ValueToText {
        if let Some(v) = value {
            for map in &style.value_maps {
                if v.is_null() {
                    if map.value == "null" {
                        return (icon_markup(&map.text, tooltip(&map.value).as_deref()), None);
                    }
                    continue;
                }
                if value_map_matches(map, v) {
                    let icon = sanitize_or_escape(&map.text, Some(style), ctx);
                    return (
                        icon_markup(&icon, tooltip(&map.value).as_deref()),
                        threshold_color(Some(v), style),
                    );
                }
            }
        }
    }

    let sanitized = match value {
        None | Some(CellValue::Null) => String::new(),
        Some(v) => ctx.sanitizer.sanitize(&v.to_text()),
    };
    (icon_markup(&sanitized, tooltip(&sanitized).as_deref()), None)
}

fn format_icon(value: Option<&CellValue>, style: &ColumnStyle, ctx: &FormatContext<'_>) -> Formatted {
    let (markup, color) = mapped_icon(value, style, ctx);
    Formatted::text(markup).with_color(color)
}
