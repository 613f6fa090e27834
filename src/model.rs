// Canonical chart description shared by the normalizer and the renderer

use crate::palette::DEFAULT_PALETTE;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

/// One record of chart data. Key order is the order the AI service emitted.
pub type Row = Map<String, Value>;

/// Title used when the reply does not carry one
pub const DEFAULT_TITLE: &str = "Chart Analysis";

/// Chart family requested by the AI service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChartType {
    Bar,
    Line,
    Pie,
    Scatter,
    /// Anything else; keeps the token as the service spelled it
    Unknown(String),
}

impl ChartType {
    /// Parse a chart type token (case-insensitive). Blank tokens yield None.
    pub fn parse(token: &str) -> Option<Self> {
        let token = token.trim();
        if token.is_empty() {
            return None;
        }

        Some(match token.to_lowercase().as_str() {
            "bar" => ChartType::Bar,
            "line" => ChartType::Line,
            "pie" => ChartType::Pie,
            "scatter" => ChartType::Scatter,
            _ => ChartType::Unknown(token.to_string()),
        })
    }

    pub fn as_str(&self) -> &str {
        match self {
            ChartType::Bar => "bar",
            ChartType::Line => "line",
            ChartType::Pie => "pie",
            ChartType::Scatter => "scatter",
            ChartType::Unknown(token) => token,
        }
    }
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ChartType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Declared column of the data structure
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
        }
    }
}

/// Fully defaulted chart description.
///
/// Built once per AI reply and only ever read afterwards; the renderer
/// borrows it and never mutates it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSpec {
    chart_type: ChartType,
    rows: Vec<Row>,
    #[serde(skip_serializing_if = "Option::is_none")]
    columns: Option<Vec<ColumnSpec>>,
    insights: Vec<String>,
    color_scheme: Vec<String>,
    title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    x_axis_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    y_axis_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    raw_text: Option<String>,
}

impl ChartSpec {
    /// Create a spec with the default palette and title
    pub fn new(chart_type: ChartType, rows: Vec<Row>) -> Self {
        Self {
            chart_type,
            rows,
            columns: None,
            insights: Vec::new(),
            color_scheme: default_color_scheme(),
            title: DEFAULT_TITLE.to_string(),
            x_axis_label: None,
            y_axis_label: None,
            raw_text: None,
        }
    }

    pub fn with_columns(mut self, columns: Option<Vec<ColumnSpec>>) -> Self {
        self.columns = columns;
        self
    }

    pub fn with_insights(mut self, insights: Vec<String>) -> Self {
        self.insights = insights;
        self
    }

    /// An empty scheme keeps the default palette
    pub fn with_color_scheme(mut self, colors: Vec<String>) -> Self {
        if !colors.is_empty() {
            self.color_scheme = colors;
        }
        self
    }

    /// A blank title keeps the default
    pub fn with_title(mut self, title: Option<String>) -> Self {
        if let Some(title) = title.filter(|t| !t.trim().is_empty()) {
            self.title = title;
        }
        self
    }

    pub fn with_axis_labels(mut self, x: Option<String>, y: Option<String>) -> Self {
        self.x_axis_label = x;
        self.y_axis_label = y;
        self
    }

    pub fn with_raw_text(mut self, raw_text: Option<String>) -> Self {
        self.raw_text = raw_text;
        self
    }

    pub fn chart_type(&self) -> &ChartType {
        &self.chart_type
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn columns(&self) -> Option<&[ColumnSpec]> {
        self.columns.as_deref()
    }

    pub fn insights(&self) -> &[String] {
        &self.insights
    }

    /// Never empty
    pub fn color_scheme(&self) -> &[String] {
        &self.color_scheme
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn x_axis_label(&self) -> Option<&str> {
        self.x_axis_label.as_deref()
    }

    pub fn y_axis_label(&self) -> Option<&str> {
        self.y_axis_label.as_deref()
    }

    /// The unparsed reply, kept so the explanation can still be shown
    pub fn raw_text(&self) -> Option<&str> {
        self.raw_text.as_deref()
    }
}

fn default_color_scheme() -> Vec<String> {
    DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_chart_type_parse_case_insensitive() {
        assert_eq!(ChartType::parse("BAR"), Some(ChartType::Bar));
        assert_eq!(ChartType::parse(" Line "), Some(ChartType::Line));
        assert_eq!(ChartType::parse("pie"), Some(ChartType::Pie));
        assert_eq!(ChartType::parse("Scatter"), Some(ChartType::Scatter));
    }

    #[test]
    fn test_chart_type_unknown_keeps_token() {
        let parsed = ChartType::parse("Area").unwrap();
        assert_eq!(parsed, ChartType::Unknown("Area".to_string()));
        assert_eq!(parsed.as_str(), "Area");
    }

    #[test]
    fn test_chart_type_blank_is_none() {
        assert_eq!(ChartType::parse(""), None);
        assert_eq!(ChartType::parse("   "), None);
    }

    #[test]
    fn test_new_spec_defaults() {
        let spec = ChartSpec::new(ChartType::Bar, Vec::new());
        assert_eq!(spec.title(), DEFAULT_TITLE);
        assert_eq!(spec.color_scheme(), &["#8884d8", "#82ca9d", "#ffc658"]);
        assert!(spec.rows().is_empty());
        assert!(spec.columns().is_none());
    }

    #[test]
    fn test_empty_scheme_and_blank_title_keep_defaults() {
        let spec = ChartSpec::new(ChartType::Pie, Vec::new())
            .with_color_scheme(Vec::new())
            .with_title(Some("  ".to_string()));
        assert_eq!(spec.color_scheme().len(), 3);
        assert_eq!(spec.title(), DEFAULT_TITLE);
    }

    #[test]
    fn test_serializes_camel_case() {
        let row = json!({"city": "A", "sales": 10}).as_object().unwrap().clone();
        let spec = ChartSpec::new(ChartType::Pie, vec![row])
            .with_color_scheme(vec!["#111111".to_string()]);
        let value = serde_json::to_value(&spec).unwrap();
        assert_eq!(value["chartType"], "pie");
        assert_eq!(value["colorScheme"], json!(["#111111"]));
        assert_eq!(value["rows"], json!([{"city": "A", "sales": 10}]));
        assert!(value.get("rawText").is_none());
    }
}
