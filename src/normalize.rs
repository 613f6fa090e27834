//! Chart response normalization.
//!
//! The AI service answers with one of three shapes:
//!
//! 1. structured JSON that already carries `dataStructure.rows` (or `.example`),
//! 2. prose with a fenced (or bare) JSON object in its `response` text,
//! 3. plain prose.
//!
//! Everything funnels through [`classify`] into an [`AiReply`], which resolves
//! to exactly one [`ChartSpec`]. Parse problems are logged and absorbed here;
//! callers always get something renderable.

use crate::model::{ChartSpec, ChartType, ColumnSpec, Row};
use crate::parser::json_candidate;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

/// Insight attached to the fallback chart
pub const FALLBACK_INSIGHT: &str = "Review the response for chart recommendations";

/// Outcome of classifying an AI payload
#[derive(Debug, Clone, PartialEq)]
pub enum AiReply {
    Structured(ChartSpec),
    /// No usable chart structure; holds the reply text (possibly empty)
    RawText(String),
}

impl AiReply {
    pub fn is_structured(&self) -> bool {
        matches!(self, AiReply::Structured(_))
    }

    /// Resolve to a canonical spec. Raw text becomes the fallback chart.
    pub fn into_chart_spec(self) -> ChartSpec {
        match self {
            AiReply::Structured(spec) => spec,
            AiReply::RawText(text) => {
                let raw = if text.is_empty() { None } else { Some(text) };
                fallback_spec(raw)
            }
        }
    }
}

/// Normalize an AI payload into a chart spec
pub fn normalize_payload(payload: &Value) -> ChartSpec {
    classify(payload).into_chart_spec()
}

/// Normalize a bare reply string (treated as `{"response": text}`)
pub fn normalize_text(text: &str) -> ChartSpec {
    normalize_payload(&Value::String(text.to_string()))
}

/// Read a raw reply: a JSON object or string is used as is,
/// anything else (prose, bare numbers, arrays) is kept as reply text
pub fn payload_from_text(text: String) -> Value {
    match serde_json::from_str::<Value>(&text) {
        Ok(value @ (Value::Object(_) | Value::String(_))) => value,
        _ => Value::String(text),
    }
}

/// Decide whether a payload carries a chart structure
pub fn classify(payload: &Value) -> AiReply {
    let empty = Map::new();
    let (fields, response) = match payload {
        Value::Object(map) => (map, map.get("response").and_then(Value::as_str)),
        Value::String(text) => (&empty, Some(text.as_str())),
        _ => (&empty, None),
    };

    if has_structured_rows(fields) {
        debug!("using structured chart fields from payload");
        return AiReply::Structured(build_spec(fields, response.map(str::to_string)));
    }

    if let Some(text) = response {
        return match embedded_object(text) {
            Some(parsed) => {
                debug!("using chart JSON embedded in reply text");
                let merged = merge_fields(fields, parsed);
                AiReply::Structured(build_spec(&merged, Some(text.to_string())))
            }
            None => AiReply::RawText(text.to_string()),
        };
    }

    if fields.contains_key("chartType") || fields.contains_key("dataStructure") {
        debug!("payload has chart fields but no rows");
        return AiReply::Structured(build_spec(fields, None));
    }

    warn!("AI payload carried neither chart fields nor reply text");
    AiReply::RawText(String::new())
}

/// Extract the JSON object embedded in reply text: first json/untagged fenced
/// block, else the first top-level `{...}` span. Failures are logged.
pub fn embedded_object(text: &str) -> Option<Map<String, Value>> {
    let Some((source, candidate)) = json_candidate(text) else {
        warn!("no JSON object found in AI reply");
        return None;
    };

    match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(map)) => Some(map),
        Ok(_) => {
            warn!(?source, "embedded JSON is not an object");
            None
        }
        Err(e) => {
            warn!(?source, error = %e, "failed to parse embedded JSON");
            None
        }
    }
}

/// Illustrative chart shown when nothing could be extracted
pub fn fallback_spec(raw_text: Option<String>) -> ChartSpec {
    let rows = [("Sample A", 100), ("Sample B", 80), ("Sample C", 120), ("Sample D", 90)]
        .iter()
        .filter_map(|(category, value)| {
            json!({ "category": category, "value": value }).as_object().cloned()
        })
        .collect();

    ChartSpec::new(ChartType::Bar, rows)
        .with_columns(Some(vec![
            ColumnSpec::new("category", "string"),
            ColumnSpec::new("value", "number"),
        ]))
        .with_insights(vec![FALLBACK_INSIGHT.to_string()])
        .with_raw_text(raw_text)
}

fn has_structured_rows(fields: &Map<String, Value>) -> bool {
    let Some(structure) = fields.get("dataStructure") else {
        return false;
    };
    ["rows", "example"].iter().any(|key| {
        structure
            .get(*key)
            .and_then(Value::as_array)
            .map_or(false, |rows| !rows.is_empty())
    })
}

/// Shallow merge; parsed values replace payload values
fn merge_fields(fields: &Map<String, Value>, parsed: Map<String, Value>) -> Map<String, Value> {
    let mut merged = fields.clone();
    for (key, value) in parsed {
        merged.insert(key, value);
    }
    merged
}

fn build_spec(fields: &Map<String, Value>, raw_text: Option<String>) -> ChartSpec {
    let chart_type = fields
        .get("chartType")
        .and_then(Value::as_str)
        .and_then(ChartType::parse)
        .unwrap_or(ChartType::Bar);

    let structure = fields.get("dataStructure");
    let config = fields.get("config");

    let title = config
        .and_then(|c| c.get("title"))
        .or_else(|| fields.get("title"))
        .and_then(Value::as_str)
        .map(str::to_string);
    let x_label = config.and_then(|c| string_field(c, "xAxisLabel"));
    let y_label = config.and_then(|c| string_field(c, "yAxisLabel"));

    ChartSpec::new(chart_type, extract_rows(structure))
        .with_columns(structure.and_then(|s| s.get("columns")).and_then(extract_columns))
        .with_insights(fields.get("insights").map(extract_strings).unwrap_or_default())
        .with_color_scheme(fields.get("colorScheme").map(extract_strings).unwrap_or_default())
        .with_title(title)
        .with_axis_labels(x_label, y_label)
        .with_raw_text(raw_text)
}

/// `rows` when non-empty, else `example`
fn extract_rows(structure: Option<&Value>) -> Vec<Row> {
    let Some(structure) = structure else {
        return Vec::new();
    };

    let source = match structure.get("rows").and_then(Value::as_array) {
        Some(rows) if !rows.is_empty() => Some(rows),
        _ => structure.get("example").and_then(Value::as_array),
    };

    let Some(items) = source else {
        return Vec::new();
    };

    let rows: Vec<Row> = items.iter().filter_map(|item| item.as_object().cloned()).collect();
    if rows.len() != items.len() {
        debug!(dropped = items.len() - rows.len(), "dropped non-object rows");
    }
    rows
}

fn extract_columns(value: &Value) -> Option<Vec<ColumnSpec>> {
    let items = value.as_array()?;
    let columns = items
        .iter()
        .filter_map(|item| match item {
            Value::String(name) => Some(ColumnSpec::new(name.clone(), "unknown")),
            Value::Object(obj) => {
                let name = obj.get("name")?.as_str()?;
                let kind = obj.get("type").and_then(Value::as_str).unwrap_or("unknown");
                Some(ColumnSpec::new(name, kind))
            }
            _ => None,
        })
        .collect();
    Some(columns)
}

/// Strings (and numbers, stringified) from an array, or a lone string
fn extract_strings(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => vec![s.clone()],
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}
