//! Template variable substitution for link URLs, tooltips and icon classes.
//!
//! Supported forms: `$var`, `${var}`, `${var:format}`, `${var.text}`,
//! `[[var]]` and `[[var:format]]`. Per-row scoped variables take precedence
//! over dashboard variables; unknown variables are left untouched.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::data::value::CellValue;
use crate::format::cell::html_escape;

/// Format used for link URLs.
pub const URL_FORMAT: &str = "percentencode";

/// A per-row variable: the raw cell and its text.
#[derive(Debug, Clone, PartialEq)]
pub struct ScopedVar {
    pub value: Option<CellValue>,
    pub text: String,
}

impl ScopedVar {
    /// Text is empty for falsy values.
    pub fn from_cell(value: Option<&CellValue>) -> Self {
        let text = match value {
            Some(v) if v.is_truthy() => v.to_text(),
            _ => String::new(),
        };
        Self {
            value: value.cloned(),
            text,
        }
    }
}

pub type ScopedVars = HashMap<String, ScopedVar>;

/// Host-side variable substitution.
pub trait TemplateSrv {
    /// Replace variables in `target`; `format` applies when the reference
    /// carries none of its own.
    fn replace(&self, target: &str, scoped_vars: &ScopedVars, format: Option<&str>) -> String;
}

/// A dashboard variable's current value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariableValue {
    Single(String),
    Multi(Vec<String>),
}

impl From<&str> for VariableValue {
    fn from(value: &str) -> Self {
        VariableValue::Single(value.to_string())
    }
}

impl From<Vec<String>> for VariableValue {
    fn from(values: Vec<String>) -> Self {
        VariableValue::Multi(values)
    }
}

impl VariableValue {
    fn from_cell(value: &CellValue) -> Self {
        match value {
            CellValue::Array(items) => {
                VariableValue::Multi(items.iter().map(CellValue::to_text).collect())
            }
            other => VariableValue::Single(other.to_text()),
        }
    }
}

/// Default [`TemplateSrv`]: scoped variables plus a fixed set of dashboard
/// variables.
#[derive(Debug, Clone, Default)]
pub struct VariableInterpolator {
    variables: HashMap<String, VariableValue>,
}

fn variable_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"\$(\w+)|\[\[([\s\S]+?)(?::(\w+))?\]\]|\$\{(\w+)(?:\.([^:^\}]+))?(?::([^\}]+))?\}",
        )
        .expect("valid regex")
    })
}

impl VariableInterpolator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: add a dashboard variable.
    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<VariableValue>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    fn lookup(&self, name: &str, field: Option<&str>, scoped: &ScopedVars) -> Option<VariableValue> {
        if let Some(var) = scoped.get(name) {
            let resolved = match field {
                Some("text") => Some(VariableValue::Single(var.text.clone())),
                Some("value") | None => match &var.value {
                    None | Some(CellValue::Null) => None,
                    Some(v) => Some(VariableValue::from_cell(v)),
                },
                Some(_) => None,
            };
            if resolved.is_some() {
                return resolved;
            }
        }
        self.variables.get(name).cloned()
    }
}

impl TemplateSrv for VariableInterpolator {
    fn replace(&self, target: &str, scoped_vars: &ScopedVars, format: Option<&str>) -> String {
        if target.is_empty() {
            return String::new();
        }
        variable_regex()
            .replace_all(target, |caps: &Captures| {
                let name = caps
                    .get(1)
                    .or_else(|| caps.get(2))
                    .or_else(|| caps.get(4))
                    .map_or("", |m| m.as_str());
                let field = caps.get(5).map(|m| m.as_str());
                let fmt = caps
                    .get(3)
                    .or_else(|| caps.get(6))
                    .map(|m| m.as_str())
                    .or(format);

                match self.lookup(name, field, scoped_vars) {
                    Some(value) => format_value(&value, fmt),
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    }
}

fn lucene_escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if "+-&|!(){}[]^\"~*?:\\/".contains(c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// `encodeURIComponent`: like `urlencoding::encode`, but `! ' ( ) *` stay
/// literal.
pub fn encode_uri_component(value: &str) -> String {
    urlencoding::encode(value)
        .replace("%21", "!")
        .replace("%27", "'")
        .replace("%28", "(")
        .replace("%29", ")")
        .replace("%2A", "*")
}

/// Render a variable value with a named format.
pub fn format_value(value: &VariableValue, format: Option<&str>) -> String {
    use VariableValue::{Multi, Single};

    match (format, value) {
        (None | Some("raw"), Single(v)) => v.clone(),
        (None | Some("raw") | Some("csv"), Multi(vs)) => vs.join(","),
        (Some("csv"), Single(v)) => v.clone(),
        (Some("pipe"), Single(v)) => v.clone(),
        (Some("pipe"), Multi(vs)) => vs.join("|"),
        (Some("json"), Single(v)) => serde_json::to_string(v).unwrap_or_default(),
        (Some("json"), Multi(vs)) => serde_json::to_string(vs).unwrap_or_default(),
        (Some("regex"), Single(v)) => regex::escape(v),
        (Some("regex"), Multi(vs)) => format!(
            "({})",
            vs.iter().map(|v| regex::escape(v)).collect::<Vec<_>>().join("|")
        ),
        (Some("lucene"), Single(v)) => lucene_escape(v),
        (Some("lucene"), Multi(vs)) => format!(
            "({})",
            vs.iter()
                .map(|v| format!("\"{}\"", lucene_escape(v)))
                .collect::<Vec<_>>()
                .join(" OR ")
        ),
        (Some("percentencode"), Single(v)) => encode_uri_component(v),
        (Some("percentencode"), Multi(vs)) => {
            encode_uri_component(&format!("{{{}}}", vs.join(",")))
        }
        (Some("html"), Single(v)) => html_escape(v),
        (Some("html"), Multi(vs)) => html_escape(&vs.join(", ")),
        (Some(_), Single(v)) => v.clone(),
        (Some(_), Multi(vs)) => format!("{{{}}}", vs.join(",")),
    }
}

/// Scoped variables for one row: `__cell_<i>` per column.
pub fn row_variables(row: &[Option<CellValue>]) -> ScopedVars {
    row.iter()
        .enumerate()
        .map(|(idx, cell)| (format!("__cell_{}", idx), ScopedVar::from_cell(cell.as_ref())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars() -> ScopedVars {
        row_variables(&[
            Some(CellValue::from("web 1")),
            Some(CellValue::Number(0.0)),
            None,
        ])
    }

    #[test]
    fn test_scoped_forms() {
        let srv = VariableInterpolator::new();
        let v = vars();
        assert_eq!(srv.replace("/host/$__cell_0", &v, None), "/host/web 1");
        assert_eq!(srv.replace("${__cell_0}", &v, None), "web 1");
        assert_eq!(srv.replace("[[__cell_0]]", &v, None), "web 1");
        assert_eq!(srv.replace("${__cell_1}", &v, None), "0");
        assert_eq!(srv.replace("${__cell_1.text}", &v, None), "");
    }

    #[test]
    fn test_unknown_and_absent_left_untouched() {
        let srv = VariableInterpolator::new();
        let v = vars();
        assert_eq!(srv.replace("$nope and $__cell_2", &v, None), "$nope and $__cell_2");
    }

    #[test]
    fn test_default_format_applies_to_all() {
        let srv = VariableInterpolator::new();
        let v = vars();
        assert_eq!(
            srv.replace("/d?host=$__cell_0", &v, Some(URL_FORMAT)),
            "/d?host=web%201"
        );
        // an explicit format wins over the default
        assert_eq!(
            srv.replace("${__cell_0:raw}", &v, Some(URL_FORMAT)),
            "web 1"
        );
    }

    #[test]
    fn test_link_encoding_keeps_uri_component_marks() {
        let srv = VariableInterpolator::new();
        let v = row_variables(&[Some(CellValue::from("it's (v2)!*"))]);
        assert_eq!(
            srv.replace("/d?q=$__cell_0", &v, Some(URL_FORMAT)),
            "/d?q=it's%20(v2)!*"
        );
        assert_eq!(encode_uri_component("a/b&c=d~e"), "a%2Fb%26c%3Dd~e");
    }

    #[test]
    fn test_dashboard_variables() {
        let srv = VariableInterpolator::new()
            .with_variable("env", "prod")
            .with_variable("hosts", vec!["a".to_string(), "b".to_string()]);
        let v = ScopedVars::new();
        assert_eq!(srv.replace("$env/${hosts:pipe}", &v, None), "prod/a|b");
        assert_eq!(srv.replace("[[hosts:regex]]", &v, None), "(a|b)");
        assert_eq!(srv.replace("${hosts:lucene}", &v, None), r#"("a" OR "b")"#);
        assert_eq!(srv.replace("${hosts:glob}", &v, None), "{a,b}");
    }

    #[test]
    fn test_scoped_shadow_dashboard() {
        let srv = VariableInterpolator::new().with_variable("__cell_0", "dash");
        assert_eq!(srv.replace("$__cell_0", &vars(), None), "web 1");
    }
}
