//! Cell values and the loose coercions the panel applies to them.
//!
//! Query results carry dynamically typed cells. `CellValue` models the JSON
//! shapes a cell can take, and `Cell` (`Option<CellValue>`) adds the
//! "absent" state used by sparse merged rows. Absent is not the same as a
//! present `Null`: merging only fills absent slots.

use serde::{Deserialize, Deserializer, Serialize};

/// A present cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<CellValue>),
}

/// A possibly absent cell.
pub type Cell = Option<CellValue>;

/// A row of cells, positionally aligned to the owning table's columns.
pub type Row = Vec<Cell>;

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    pub fn is_string(&self) -> bool {
        matches!(self, CellValue::String(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, CellValue::Array(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// String conversion with `String(value)` semantics.
    ///
    /// Arrays join their elements with `,`, and null elements inside an
    /// array render as empty strings.
    pub fn to_text(&self) -> String {
        match self {
            CellValue::Null => "null".to_string(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Number(n) => number_to_string(*n),
            CellValue::String(s) => s.clone(),
            CellValue::Array(items) => join_items(items, ","),
        }
    }

    /// Join array elements with `sep`; scalars render as with [`to_text`](Self::to_text).
    pub fn join(&self, sep: &str) -> String {
        match self {
            CellValue::Array(items) => join_items(items, sep),
            other => other.to_text(),
        }
    }

    /// Numeric conversion with `Number(value)` semantics.
    pub fn to_number(&self) -> f64 {
        match self {
            CellValue::Null => 0.0,
            CellValue::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            CellValue::Number(n) => *n,
            CellValue::String(s) => string_to_number(s),
            CellValue::Array(items) => match items.as_slice() {
                [] => 0.0,
                [single] => string_to_number(&single.to_text()),
                _ => f64::NAN,
            },
        }
    }

    /// Truthiness as used for scoped variable text and card stat defaults.
    pub fn is_truthy(&self) -> bool {
        match self {
            CellValue::Null => false,
            CellValue::Bool(b) => *b,
            CellValue::Number(n) => *n != 0.0 && !n.is_nan(),
            CellValue::String(s) => !s.is_empty(),
            CellValue::Array(_) => true,
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

impl From<serde_json::Value> for CellValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => CellValue::Null,
            serde_json::Value::Bool(b) => CellValue::Bool(b),
            serde_json::Value::Number(n) => CellValue::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => CellValue::String(s),
            serde_json::Value::Array(items) => {
                CellValue::Array(items.into_iter().map(CellValue::from).collect())
            }
            // Objects have no cell representation; keep their JSON text.
            obj @ serde_json::Value::Object(_) => CellValue::String(obj.to_string()),
        }
    }
}

fn join_items(items: &[CellValue], sep: &str) -> String {
    items
        .iter()
        .map(|item| match item {
            CellValue::Null => String::new(),
            other => other.to_text(),
        })
        .collect::<Vec<_>>()
        .join(sep)
}

/// Render a number the way `String(number)` does.
pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    if n.abs() >= 1e21 || n.abs() < 1e-6 {
        let formatted = format!("{:e}", n);
        // Rust prints `1e21`, the panel expects `1e+21`
        return match formatted.split_once('e') {
            Some((mantissa, exp)) if !exp.starts_with('-') => format!("{}e+{}", mantissa, exp),
            _ => formatted,
        };
    }
    format!("{}", n)
}

/// `Number(string)`: trimmed decimal, hex, or infinity literal; empty is zero.
pub fn string_to_number(s: &str) -> f64 {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    if let Some(hex) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        return i64::from_str_radix(hex, 16)
            .map(|v| v as f64)
            .unwrap_or(f64::NAN);
    }
    match trimmed {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    // Reject forms Rust accepts but the panel does not ("inf", "nan").
    if trimmed
        .chars()
        .any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E')
    {
        return f64::NAN;
    }
    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

/// `parseInt(text, 10)`: optional sign and the leading run of digits.
pub fn parse_int(text: &str) -> Option<f64> {
    let trimmed = text.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let value = digits.parse::<f64>().ok()?;
    Some(if negative { -value } else { value })
}

/// Integer parse of any cell, stringifying non-strings first.
pub fn parse_int_cell(cell: Option<&CellValue>) -> Option<f64> {
    match cell {
        None => None,
        Some(CellValue::String(s)) => parse_int(s),
        Some(other) => parse_int(&other.to_text()),
    }
}

/// Deserialize rows where every JSON value (including `null`) is present.
pub fn deserialize_rows<'de, D>(deserializer: D) -> Result<Option<Vec<Row>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Vec<Vec<CellValue>>> = Option::deserialize(deserializer)?;
    Ok(raw.map(|rows| {
        rows.into_iter()
            .map(|row| row.into_iter().map(Some).collect())
            .collect()
    }))
}
