//! Normalizing raw query results into a [`TableModel`].
//!
//! Data sources hand the panel a list of series in one of a few shapes
//! (table, time series, raw documents) or a list of annotation events.
//! Each [`TransformKind`] turns that input into rows and columns.

use std::collections::HashMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::merge::{merge_tables, TableData};
use super::table::{Column, TableModel};
use super::value::{CellValue, Row};
use crate::error::TablePanelError;
use crate::Result;

/// How raw query results become a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformKind {
    /// One row per datapoint: Time, Metric, Value
    TimeseriesToRows,
    /// One row per timestamp, one column per series
    #[default]
    TimeseriesToColumns,
    /// One row per series with the selected aggregations
    TimeseriesAggregations,
    /// One row per annotation event
    Annotations,
    /// Merge table-shaped series
    Table,
    /// Raw documents, optionally projected onto selected fields
    Json,
}

impl FromStr for TransformKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "timeseries_to_rows" => Ok(TransformKind::TimeseriesToRows),
            "timeseries_to_columns" => Ok(TransformKind::TimeseriesToColumns),
            "timeseries_aggregations" => Ok(TransformKind::TimeseriesAggregations),
            "annotations" => Ok(TransformKind::Annotations),
            "table" => Ok(TransformKind::Table),
            "json" => Ok(TransformKind::Json),
            _ => Err(format!("Transformer {} not found", s)),
        }
    }
}

/// A column picked for the `json` and `timeseries_aggregations` transforms.
///
/// `text` is the column header, `value` the document path or aggregation name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSelection {
    pub text: String,
    pub value: String,
}

impl ColumnSelection {
    pub fn new(text: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            value: value.into(),
        }
    }
}

/// A metric series: `[value, timestamp]` datapoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    #[serde(default)]
    pub target: String,
    #[serde(default)]
    pub datapoints: Vec<(Option<f64>, Option<f64>)>,
}

/// A document series (`"type": "docs"`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocsSeries {
    #[serde(default)]
    pub datapoints: Vec<Value>,
    #[serde(default)]
    pub filterable: bool,
}

/// One series of a query response.
#[derive(Debug, Clone, PartialEq)]
pub enum Series {
    Table(TableData),
    TimeSeries(TimeSeries),
    Docs(DocsSeries),
    /// Anything else; kept so table merging can skip it
    Other(Value),
}

impl Series {
    /// Classify a raw JSON series by shape.
    pub fn from_value(value: Value) -> Result<Self> {
        let invalid = |e: serde_json::Error| TablePanelError::InvalidData(e.to_string());
        let (has_columns, is_docs, has_datapoints) = match &value {
            Value::Object(map) => (
                map.contains_key("columns"),
                map.get("type").and_then(Value::as_str) == Some("docs"),
                map.contains_key("datapoints"),
            ),
            _ => (false, false, false),
        };

        if has_columns {
            serde_json::from_value(value).map(Series::Table).map_err(invalid)
        } else if is_docs {
            serde_json::from_value(value).map(Series::Docs).map_err(invalid)
        } else if has_datapoints {
            serde_json::from_value(value)
                .map(Series::TimeSeries)
                .map_err(invalid)
        } else {
            Ok(Series::Other(value))
        }
    }

    pub fn is_table(&self) -> bool {
        matches!(self, Series::Table(_))
    }

    fn as_table_data(&self) -> TableData {
        match self {
            Series::Table(data) => data.clone(),
            _ => TableData::default(),
        }
    }
}

/// An annotation event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    #[serde(default)]
    pub time: Option<f64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

/// A full query response.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    Series(Vec<Series>),
    Annotations(Vec<Annotation>),
}

impl QueryResult {
    /// Parse a response: a JSON array of series, or an object holding
    /// `annotations`.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Array(items) => items
                .into_iter()
                .map(Series::from_value)
                .collect::<Result<Vec<_>>>()
                .map(QueryResult::Series),
            Value::Object(mut map) => {
                let annotations = map.remove("annotations").unwrap_or(Value::Array(vec![]));
                serde_json::from_value(annotations)
                    .map(QueryResult::Annotations)
                    .map_err(|e| TablePanelError::InvalidData(e.to_string()))
            }
            Value::Null => Ok(QueryResult::Series(vec![])),
            other => Err(TablePanelError::InvalidData(format!(
                "expected a list of series, got {}",
                other
            ))),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: Value =
            serde_json::from_str(json).map_err(|e| TablePanelError::InvalidData(e.to_string()))?;
        Self::from_value(value)
    }

    pub fn is_empty(&self) -> bool {
        match self {
            QueryResult::Series(series) => series.is_empty(),
            QueryResult::Annotations(events) => events.is_empty(),
        }
    }
}

/// Pick the transform for freshly received data.
///
/// Table-shaped data always uses `table` and documents use `json`; for
/// anything else a stale `table`/`json` choice falls back to
/// `timeseries_to_rows`, while other choices are kept.
pub fn detect_transform(current: TransformKind, data: &QueryResult) -> TransformKind {
    let first = match data {
        QueryResult::Series(series) => series.first(),
        QueryResult::Annotations(_) => return current,
    };
    let detected = match first {
        None => current,
        Some(Series::Table(_)) => TransformKind::Table,
        Some(Series::Docs(_)) => TransformKind::Json,
        Some(_) => match current {
            TransformKind::Table | TransformKind::Json => TransformKind::TimeseriesToRows,
            other => other,
        },
    };
    if detected != current {
        log::debug!("transform: switching from {:?} to {:?}", current, detected);
    }
    detected
}

/// Build a table from `data` using `kind`.
///
/// `columns` selects document fields (`json`) or aggregations
/// (`timeseries_aggregations`) and is ignored otherwise.
pub fn transform_data_to_table(
    data: &QueryResult,
    kind: TransformKind,
    columns: &[ColumnSelection],
) -> Result<TableModel> {
    let mut model = TableModel::new();
    if data.is_empty() {
        return Ok(model);
    }

    match (kind, data) {
        (TransformKind::Annotations, QueryResult::Annotations(events)) => {
            annotations(events, &mut model);
        }
        (TransformKind::Annotations, QueryResult::Series(_)) => {
            annotations(&[], &mut model);
        }
        (_, QueryResult::Annotations(_)) => {
            log::warn!("transform: {:?} cannot use annotation events", kind);
        }
        (TransformKind::Table, QueryResult::Series(series)) => {
            if !series.iter().any(|s| matches!(s, Series::Table(t) if t.rows.is_some())) {
                return Err(TablePanelError::InvalidData(
                    "query result is not in table format, try using another transform".to_string(),
                ));
            }
            let tables: Vec<TableData> = series.iter().map(Series::as_table_data).collect();
            model = merge_tables(Some(model), &tables);
        }
        (TransformKind::TimeseriesToRows, QueryResult::Series(series)) => {
            timeseries_to_rows(&time_series(series), &mut model);
        }
        (TransformKind::TimeseriesToColumns, QueryResult::Series(series)) => {
            timeseries_to_columns(&time_series(series), &mut model);
        }
        (TransformKind::TimeseriesAggregations, QueryResult::Series(series)) => {
            timeseries_aggregations(&time_series(series), columns, &mut model);
        }
        (TransformKind::Json, QueryResult::Series(series)) => {
            json_documents(series, columns, &mut model);
        }
    }

    Ok(model)
}

fn time_series(series: &[Series]) -> Vec<&TimeSeries> {
    series
        .iter()
        .filter_map(|s| match s {
            Series::TimeSeries(ts) => Some(ts),
            _ => None,
        })
        .collect()
}

fn number_cell(value: Option<f64>) -> Option<CellValue> {
    Some(value.map(CellValue::Number).unwrap_or(CellValue::Null))
}

fn time_column() -> Column {
    Column::new("Time").with_kind("date")
}

fn timeseries_to_rows(series: &[&TimeSeries], model: &mut TableModel) {
    model.add_column(time_column());
    model.add_column(Column::new("Metric"));
    model.add_column(Column::new("Value"));

    for ts in series {
        for (value, time) in &ts.datapoints {
            model.add_row(vec![
                number_cell(*time),
                Some(CellValue::from(ts.target.as_str())),
                number_cell(*value),
            ]);
        }
    }
}

fn timeseries_to_columns(series: &[&TimeSeries], model: &mut TableModel) {
    // Targets may repeat, so columns are positional rather than de-duplicated.
    let mut columns = vec![time_column()];
    columns.extend(series.iter().map(|ts| Column::new(ts.target.clone())));

    let mut order: Vec<String> = Vec::new();
    let mut points: HashMap<String, (Option<f64>, Row)> = HashMap::new();

    for (idx, ts) in series.iter().enumerate() {
        for (value, time) in &ts.datapoints {
            let key = time
                .map(crate::data::value::number_to_string)
                .unwrap_or_else(|| "null".to_string());
            let entry = points.entry(key.clone()).or_insert_with(|| {
                order.push(key);
                (*time, vec![None; series.len()])
            });
            entry.1[idx] = number_cell(*value);
        }
    }

    let rows = order
        .iter()
        .filter_map(|key| points.remove(key))
        .map(|(time, values)| {
            let mut row = Vec::with_capacity(values.len() + 1);
            row.push(number_cell(time));
            row.extend(values);
            row
        })
        .collect();

    model.set_contents(columns, rows);
}

/// Summary statistics over the non-null values of a series.
fn series_stat(ts: &TimeSeries, stat: &str) -> Option<CellValue> {
    let values: Vec<f64> = ts.datapoints.iter().filter_map(|(v, _)| *v).collect();
    let first = values.first().copied();
    let last = values.last().copied();
    let total: f64 = values.iter().sum();
    let min = values.iter().copied().fold(None, |acc: Option<f64>, v| {
        Some(acc.map_or(v, |a| a.min(v)))
    });
    let max = values.iter().copied().fold(None, |acc: Option<f64>, v| {
        Some(acc.map_or(v, |a| a.max(v)))
    });

    let result = match stat {
        "total" => Some(total),
        "min" => min,
        "max" => max,
        "avg" => (!values.is_empty()).then(|| total / values.len() as f64),
        "current" => last,
        "first" => first,
        "diff" => first.zip(last).map(|(f, l)| l - f),
        "range" => min.zip(max).map(|(lo, hi)| hi - lo),
        "count" => Some(values.len() as f64),
        _ => return None,
    };
    number_cell(result)
}

fn timeseries_aggregations(
    series: &[&TimeSeries],
    columns: &[ColumnSelection],
    model: &mut TableModel,
) {
    model.add_column(Column::new("Metric"));
    for col in columns {
        model.add_column(Column::new(col.text.clone()));
    }

    for ts in series {
        let mut cells: Row = vec![Some(CellValue::from(ts.target.as_str()))];
        cells.extend(columns.iter().map(|col| series_stat(ts, &col.value)));
        model.add_row(cells);
    }
}

fn annotations(events: &[Annotation], model: &mut TableModel) {
    model.add_column(time_column());
    model.add_column(Column::new("Title"));
    model.add_column(Column::new("Text"));
    model.add_column(Column::new("Tags"));

    for evt in events {
        let text_cell = |v: &Option<String>| v.as_deref().map(CellValue::from);
        model.add_row(vec![
            evt.time.map(CellValue::Number),
            text_cell(&evt.title),
            text_cell(&evt.text),
            evt.tags.as_ref().map(|tags| {
                CellValue::Array(tags.iter().map(|t| CellValue::from(t.as_str())).collect())
            }),
        ]);
    }
}

/// Flatten nested objects into dotted keys; arrays stay whole.
fn flatten_document(value: &Value, prefix: &str, out: &mut HashMap<String, Value>) {
    match value {
        Value::Object(map) if !map.is_empty() => {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten_document(child, &path, out);
            }
        }
        other => {
            out.insert(prefix.to_string(), other.clone());
        }
    }
}

fn json_documents(series: &[Series], columns: &[ColumnSelection], model: &mut TableModel) {
    let filterable = matches!(series.first(), Some(Series::Docs(docs)) if docs.filterable);

    for col in columns {
        let mut column = Column::new(col.text.clone());
        column.filterable = filterable;
        model.add_column(column);
    }
    if model.columns.is_empty() {
        model.add_column(Column::new("JSON"));
    }

    for docs in series.iter().filter_map(|s| match s {
        Series::Docs(docs) => Some(docs),
        _ => None,
    }) {
        for doc in &docs.datapoints {
            if doc.is_object() && !columns.is_empty() {
                let mut flattened = HashMap::new();
                flatten_document(doc, "", &mut flattened);
                model.add_row(
                    columns
                        .iter()
                        .map(|col| flattened.get(&col.value).cloned().map(CellValue::from))
                        .collect(),
                );
            } else {
                model.add_row(vec![Some(CellValue::String(doc.to_string()))]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn n(v: f64) -> Option<CellValue> {
        Some(CellValue::Number(v))
    }

    fn s(v: &str) -> Option<CellValue> {
        Some(CellValue::from(v))
    }

    fn sample_series() -> QueryResult {
        QueryResult::from_value(json!([
            {"target": "cpu", "datapoints": [[1.5, 1000], [2.5, 2000]]},
            {"target": "mem", "datapoints": [[10, 2000], [null, 3000]]}
        ]))
        .unwrap()
    }

    #[test]
    fn test_series_classification() {
        let data = QueryResult::from_value(json!([
            {"columns": [{"text": "A"}], "rows": [[1]]},
            {"type": "docs", "datapoints": [{"a": 1}]},
            {"target": "x", "datapoints": []},
            {"something": true}
        ]))
        .unwrap();
        match data {
            QueryResult::Series(series) => {
                assert!(series[0].is_table());
                assert!(matches!(series[1], Series::Docs(_)));
                assert!(matches!(series[2], Series::TimeSeries(_)));
                assert!(matches!(series[3], Series::Other(_)));
            }
            _ => panic!("expected series"),
        }
    }

    #[test]
    fn test_detect_transform() {
        let table = QueryResult::from_value(json!([{"columns": [], "rows": []}])).unwrap();
        assert_eq!(
            detect_transform(TransformKind::TimeseriesToColumns, &table),
            TransformKind::Table
        );
        let docs = QueryResult::from_value(json!([{"type": "docs", "datapoints": []}])).unwrap();
        assert_eq!(
            detect_transform(TransformKind::Table, &docs),
            TransformKind::Json
        );
        let ts = sample_series();
        assert_eq!(
            detect_transform(TransformKind::Table, &ts),
            TransformKind::TimeseriesToRows
        );
        assert_eq!(
            detect_transform(TransformKind::TimeseriesAggregations, &ts),
            TransformKind::TimeseriesAggregations
        );
    }

    #[test]
    fn test_timeseries_to_rows() {
        let model =
            transform_data_to_table(&sample_series(), TransformKind::TimeseriesToRows, &[])
                .unwrap();
        assert_eq!(model.columns.len(), 3);
        assert_eq!(model.columns[0].kind.as_deref(), Some("date"));
        assert_eq!(model.rows.len(), 4);
        assert_eq!(model.rows[0], vec![n(1000.0), s("cpu"), n(1.5)]);
        assert_eq!(
            model.rows[3],
            vec![n(3000.0), s("mem"), Some(CellValue::Null)]
        );
    }

    #[test]
    fn test_timeseries_to_columns() {
        let model =
            transform_data_to_table(&sample_series(), TransformKind::TimeseriesToColumns, &[])
                .unwrap();
        let names: Vec<&str> = model.columns.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(names, vec!["Time", "cpu", "mem"]);
        assert_eq!(
            model.rows,
            vec![
                vec![n(1000.0), n(1.5), None],
                vec![n(2000.0), n(2.5), n(10.0)],
                vec![n(3000.0), None, Some(CellValue::Null)],
            ]
        );
    }

    #[test]
    fn test_timeseries_aggregations() {
        let columns = vec![
            ColumnSelection::new("Avg", "avg"),
            ColumnSelection::new("Max", "max"),
            ColumnSelection::new("Current", "current"),
            ColumnSelection::new("Count", "count"),
        ];
        let model = transform_data_to_table(
            &sample_series(),
            TransformKind::TimeseriesAggregations,
            &columns,
        )
        .unwrap();
        assert_eq!(model.columns.len(), 5);
        assert_eq!(
            model.rows[0],
            vec![s("cpu"), n(2.0), n(2.5), n(2.5), n(2.0)]
        );
        assert_eq!(
            model.rows[1],
            vec![s("mem"), n(10.0), n(10.0), n(10.0), n(1.0)]
        );
    }

    #[test]
    fn test_table_transform_merges() {
        let data = QueryResult::from_value(json!([
            {"columns": [{"text": "Host"}, {"text": "A"}], "rows": [["h1", 1]]},
            {"columns": [{"text": "Host"}, {"text": "B"}], "rows": [["h1", 2]]}
        ]))
        .unwrap();
        let model = transform_data_to_table(&data, TransformKind::Table, &[]).unwrap();
        assert_eq!(model.columns.len(), 3);
        assert_eq!(model.rows, vec![vec![s("h1"), n(1.0), n(2.0)]]);
    }

    #[test]
    fn test_table_transform_rejects_non_table_data() {
        let err = transform_data_to_table(&sample_series(), TransformKind::Table, &[]);
        assert!(matches!(err, Err(TablePanelError::InvalidData(_))));
    }

    #[test]
    fn test_annotations_transform() {
        let data = QueryResult::from_value(json!({
            "annotations": [{"time": 5, "title": "deploy", "text": "v2", "tags": ["a", "b"]}]
        }))
        .unwrap();
        let model = transform_data_to_table(&data, TransformKind::Annotations, &[]).unwrap();
        assert_eq!(model.columns.len(), 4);
        assert_eq!(
            model.rows[0],
            vec![
                n(5.0),
                s("deploy"),
                s("v2"),
                Some(CellValue::Array(vec!["a".into(), "b".into()]))
            ]
        );
    }

    #[test]
    fn test_json_transform_with_columns() {
        let data = QueryResult::from_value(json!([
            {"type": "docs", "filterable": true, "datapoints": [
                {"host": {"name": "web1"}, "status": 200},
                {"status": 500}
            ]}
        ]))
        .unwrap();
        let columns = vec![
            ColumnSelection::new("Host", "host.name"),
            ColumnSelection::new("Status", "status"),
        ];
        let model = transform_data_to_table(&data, TransformKind::Json, &columns).unwrap();
        assert!(model.columns[0].filterable);
        assert_eq!(model.rows[0], vec![s("web1"), n(200.0)]);
        assert_eq!(model.rows[1], vec![None, n(500.0)]);
    }

    #[test]
    fn test_json_transform_without_columns() {
        let data = QueryResult::from_value(json!([
            {"type": "docs", "datapoints": [{"a": 1}]}
        ]))
        .unwrap();
        let model = transform_data_to_table(&data, TransformKind::Json, &[]).unwrap();
        assert_eq!(model.columns[0].text, "JSON");
        assert_eq!(model.rows[0], vec![s(r#"{"a":1}"#)]);
    }

    #[test]
    fn test_empty_data_gives_empty_model() {
        let data = QueryResult::Series(vec![]);
        let model = transform_data_to_table(&data, TransformKind::Table, &[]).unwrap();
        assert!(model.columns.is_empty());
        assert!(model.rows.is_empty());
    }

    #[test]
    fn test_transform_kind_from_str() {
        assert_eq!(
            TransformKind::from_str("timeseries_to_rows").unwrap(),
            TransformKind::TimeseriesToRows
        );
        assert!(TransformKind::from_str("bogus").is_err());
    }
}
