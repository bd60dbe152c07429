//! Matching columns against style rules.
//!
//! Resolution is a pure function of the table's columns and the compiled
//! rules: it returns fresh [`ResolvedColumn`]s instead of attaching styles to
//! the table, so nothing carries over when the table shape changes.

use super::options::ColumnStyle;
use super::pattern::StylePattern;
use crate::data::table::{Column, TableModel};
use crate::Result;

/// A style rule with its pattern compiled.
#[derive(Debug, Clone)]
pub struct CompiledStyle {
    pub style: ColumnStyle,
    pub pattern: StylePattern,
}

/// Ordered, pre-validated style rules.
#[derive(Debug, Clone, Default)]
pub struct CompiledStyles {
    rules: Vec<CompiledStyle>,
}

impl CompiledStyles {
    /// Compile every rule, failing on the first invalid pattern.
    pub fn compile(styles: &[ColumnStyle]) -> Result<Self> {
        let rules = styles
            .iter()
            .map(|style| {
                StylePattern::parse(&style.pattern).map(|pattern| CompiledStyle {
                    style: style.clone(),
                    pattern,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    /// First rule whose pattern matches `name`.
    pub fn find(&self, name: &str) -> Option<&CompiledStyle> {
        self.rules.iter().find(|rule| rule.pattern.is_match(name))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// A column with its display title and matched style.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedColumn {
    /// The column, with `title` filled in
    pub column: Column,
    pub style: Option<ColumnStyle>,
}

impl ResolvedColumn {
    pub fn title(&self) -> &str {
        self.column.title.as_deref().unwrap_or(&self.column.text)
    }

    pub fn text(&self) -> &str {
        &self.column.text
    }
}

/// Resolve one column: the first matching rule wins.
pub fn resolve_column(column: &Column, styles: &CompiledStyles) -> ResolvedColumn {
    let mut column = column.clone();
    let matched = styles.find(&column.text);

    let title = match matched {
        Some(rule) => match rule.style.alias.as_deref() {
            Some(alias) if !alias.is_empty() => rule.pattern.apply_alias(&column.text, alias),
            _ => column.text.clone(),
        },
        None => column.text.clone(),
    };

    match matched {
        Some(rule) => log::trace!(
            "style: column '{}' matched '{}' (title '{}')",
            column.text,
            rule.pattern.as_str(),
            title
        ),
        None => log::trace!("style: column '{}' has no matching style", column.text),
    }

    column.title = Some(title);
    ResolvedColumn {
        column,
        style: matched.map(|rule| rule.style.clone()),
    }
}

/// Resolve every column of `table`, in column order.
pub fn resolve_columns(table: &TableModel, styles: &CompiledStyles) -> Vec<ResolvedColumn> {
    table
        .columns
        .iter()
        .map(|column| resolve_column(column, styles))
        .collect()
}

/// Compile `styles` and resolve `table` in one step.
pub fn resolve_styles(table: &TableModel, styles: &[ColumnStyle]) -> Result<Vec<ResolvedColumn>> {
    let compiled = CompiledStyles::compile(styles)?;
    Ok(resolve_columns(table, &compiled))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TablePanelError;
    use crate::style::options::StyleType;

    fn table(names: &[&str]) -> TableModel {
        TableModel::from_parts(names.iter().map(|n| Column::new(*n)), vec![])
    }

    #[test]
    fn test_first_match_wins() {
        let styles = vec![
            ColumnStyle::new("Time", StyleType::Date).with_alias("When"),
            ColumnStyle::new("/.*/", StyleType::Number),
            ColumnStyle::new("Host", StyleType::String),
        ];
        let resolved = resolve_styles(&table(&["Time", "Host"]), &styles).unwrap();
        assert_eq!(resolved[0].title(), "When");
        assert_eq!(resolved[0].style.as_ref().unwrap().kind, Some(StyleType::Date));
        // the catch-all shadows the later Host rule
        assert_eq!(resolved[1].title(), "Host");
        assert_eq!(
            resolved[1].style.as_ref().unwrap().kind,
            Some(StyleType::Number)
        );
    }

    #[test]
    fn test_unmatched_column_keeps_text() {
        let styles = vec![ColumnStyle::new("Time", StyleType::Date)];
        let resolved = resolve_styles(&table(&["Value"]), &styles).unwrap();
        assert_eq!(resolved[0].title(), "Value");
        assert!(resolved[0].style.is_none());
    }

    #[test]
    fn test_alias_uses_regex_replace() {
        let styles = vec![ColumnStyle::new("/Value #(\\w)/", StyleType::Number).with_alias("Query $1")];
        let resolved = resolve_styles(&table(&["Value #A", "Value #B"]), &styles).unwrap();
        assert_eq!(resolved[0].title(), "Query A");
        assert_eq!(resolved[1].title(), "Query B");
    }

    #[test]
    fn test_empty_alias_keeps_text() {
        let styles = vec![ColumnStyle::new("/.*/", StyleType::Number).with_alias("")];
        let resolved = resolve_styles(&table(&["cpu"]), &styles).unwrap();
        assert_eq!(resolved[0].title(), "cpu");
    }

    #[test]
    fn test_resolution_does_not_leak_between_tables() {
        let compiled =
            CompiledStyles::compile(&[ColumnStyle::new("A", StyleType::Hidden)]).unwrap();
        let first = resolve_columns(&table(&["A"]), &compiled);
        assert!(first[0].style.is_some());
        let second = resolve_columns(&table(&["B", "A"]), &compiled);
        assert!(second[0].style.is_none());
        assert!(second[1].style.is_some());
    }

    #[test]
    fn test_invalid_pattern_fails_compile() {
        let styles = vec![ColumnStyle::new("/(/", StyleType::Number)];
        assert!(matches!(
            CompiledStyles::compile(&styles),
            Err(TablePanelError::InvalidPattern { .. })
        ));
    }
}
