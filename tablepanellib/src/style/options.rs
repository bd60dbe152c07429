//! Column style rules as stored in panel configuration.
//!
//! A [`ColumnStyle`] pairs a name pattern with formatting directives. The
//! JSON shape follows the dashboard format (camelCase keys), and loose values
//! such as numeric map keys or string thresholds are normalized on load.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::data::value::{number_to_string, string_to_number};

/// Default moment-style pattern for dates without an explicit `dateFormat`.
pub const DEFAULT_DATE_FORMAT: &str = "YYYY-MM-DD HH:mm:ss";

/// How a matched column's values are displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StyleType {
    Number,
    String,
    Date,
    Hidden,
    Html,
    Fontawesome,
}

/// Where a threshold color is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// Cell background
    Cell,
    /// Cell text
    Value,
    /// Row background
    Row,
}

/// Display-text substitution strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MappingType {
    #[default]
    None,
    ValueToText,
    RangeToText,
}

impl From<u8> for MappingType {
    fn from(raw: u8) -> Self {
        match raw {
            1 => MappingType::ValueToText,
            2 => MappingType::RangeToText,
            _ => MappingType::None,
        }
    }
}

/// Discrete value substitution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueMap {
    #[serde(deserialize_with = "loose_string")]
    pub value: String,
    #[serde(default, deserialize_with = "loose_string")]
    pub text: String,
}

/// Inclusive numeric range substitution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeMap {
    #[serde(deserialize_with = "loose_string")]
    pub from: String,
    #[serde(deserialize_with = "loose_string")]
    pub to: String,
    #[serde(default, deserialize_with = "loose_string")]
    pub text: String,
}

/// A pattern-matched formatting rule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnStyle {
    /// Column name pattern: `/regex/flags` or an exact name
    pub pattern: String,
    /// Title replacement for the matched part of the column name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<StyleType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decimals: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_mode: Option<ColorMode>,
    #[serde(default)]
    pub colors: Vec<String>,
    /// Ascending threshold values; `colors` has one more entry
    #[serde(
        default,
        deserialize_with = "loose_thresholds",
        skip_serializing_if = "Option::is_none"
    )]
    pub thresholds: Option<Vec<f64>>,
    #[serde(default, deserialize_with = "loose_u8")]
    pub mapping_type: u8,
    #[serde(default)]
    pub value_maps: Vec<ValueMap>,
    #[serde(default)]
    pub range_maps: Vec<RangeMap>,
    #[serde(default)]
    pub link: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_tooltip: Option<String>,
    #[serde(default)]
    pub link_target_blank: bool,
    /// Pass text through the host sanitizer instead of escaping it
    #[serde(default)]
    pub sanitize: bool,
    #[serde(default)]
    pub value_as_tooltip: bool,
    #[serde(default)]
    pub preserve_format: bool,
    #[serde(default)]
    pub no_header: bool,
    #[serde(default)]
    pub mouseover_tooltip: bool,
    /// Icon class template rendered in front of the cell value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fontawesome: Option<String>,
}

impl ColumnStyle {
    pub fn new(pattern: impl Into<String>, kind: StyleType) -> Self {
        Self {
            pattern: pattern.into(),
            kind: Some(kind),
            ..Self::default()
        }
    }

    pub fn mapping(&self) -> MappingType {
        MappingType::from(self.mapping_type)
    }

    pub fn date_format(&self) -> &str {
        self.date_format.as_deref().unwrap_or(DEFAULT_DATE_FORMAT)
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn with_decimals(mut self, decimals: usize) -> Self {
        self.decimals = Some(decimals);
        self
    }

    pub fn with_date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = Some(format.into());
        self
    }

    /// Builder: color mode, colors and thresholds together.
    pub fn with_colors<S: Into<String>>(
        mut self,
        mode: ColorMode,
        colors: impl IntoIterator<Item = S>,
        thresholds: Vec<f64>,
    ) -> Self {
        self.color_mode = Some(mode);
        self.colors = colors.into_iter().map(Into::into).collect();
        self.thresholds = Some(thresholds);
        self
    }

    pub fn with_value_maps(mut self, maps: Vec<ValueMap>) -> Self {
        self.mapping_type = 1;
        self.value_maps = maps;
        self
    }

    pub fn with_range_maps(mut self, maps: Vec<RangeMap>) -> Self {
        self.mapping_type = 2;
        self.range_maps = maps;
        self
    }

    pub fn with_link(mut self, url: impl Into<String>, tooltip: impl Into<String>) -> Self {
        self.link = true;
        self.link_url = Some(url.into());
        self.link_tooltip = Some(tooltip.into());
        self
    }

    pub fn sanitized(mut self) -> Self {
        self.sanitize = true;
        self
    }
}

impl ValueMap {
    pub fn new(value: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            text: text.into(),
        }
    }
}

impl RangeMap {
    pub fn new(from: impl Into<String>, to: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            text: text.into(),
        }
    }
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => number_to_string(n.as_f64().unwrap_or(f64::NAN)),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

/// Map keys and bounds are edited as text but may be stored as numbers.
fn loose_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_string(&value))
}

fn loose_thresholds<'de, D>(deserializer: D) -> Result<Option<Vec<f64>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Vec<Value>> = Option::deserialize(deserializer)?;
    Ok(raw.map(|values| {
        values
            .iter()
            .map(|v| match v {
                Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
                other => string_to_number(&value_to_string(other)),
            })
            .collect()
    }))
}

fn loose_u8<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n.as_u64().unwrap_or(0) as u8,
        Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    })
}
