//! AI-designed dashboards over an uploaded table.
//!
//! The model proposes names, metric cards and widgets; the widget data it
//! invents is swapped for real records before anything is drawn.

use crate::data::DataTable;
use crate::ingest::strip_extension;
use crate::model::{ChartSpec, ChartType, Row};
use crate::normalize::embedded_object;
use crate::palette::DEFAULT_PALETTE;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};

/// Records a widget is re-pointed at
pub const WIDGET_ROW_LIMIT: usize = 20;
/// Records shown by the fallback overview widget
const OVERVIEW_ROWS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default = "default_layout")]
    pub layout: String,
    #[serde(default)]
    pub metrics: Vec<Metric>,
    #[serde(default)]
    pub widgets: Vec<Widget>,
}

fn default_category() -> String { "custom".to_string() }
fn default_layout() -> String { "grid".to_string() }
fn default_widget_type() -> String { "chart".to_string() }
fn default_chart_type() -> String { "bar".to_string() }

/// Headline number card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    #[serde(default)]
    pub title: String,
    #[serde(default, deserialize_with = "text_or_number")]
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Widget {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default = "default_widget_type")]
    pub kind: String,
    #[serde(default)]
    pub title: String,
    #[serde(default = "default_chart_type")]
    pub chart_type: String,
    #[serde(default)]
    pub data: Vec<Value>,
    #[serde(default)]
    pub insights: Vec<String>,
    #[serde(default)]
    pub color_scheme: Vec<String>,
}

/// Metric values arrive as either `"1,234"` or `1234`
fn text_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

impl Widget {
    /// Chart spec for the shared renderer. Non-object data entries are
    /// dropped; a blank chart type means bar.
    pub fn to_chart_spec(&self) -> ChartSpec {
        let rows: Vec<Row> = self
            .data
            .iter()
            .filter_map(|entry| entry.as_object().cloned())
            .collect();
        let chart_type = ChartType::parse(&self.chart_type).unwrap_or(ChartType::Bar);

        ChartSpec::new(chart_type, rows)
            .with_insights(self.insights.clone())
            .with_color_scheme(self.color_scheme.clone())
            .with_title(Some(self.title.clone()))
    }
}

/// What the `dashboard` command writes out
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardAnalysis {
    pub dashboard_config: DashboardConfig,
    pub data_preview: Vec<Row>,
    pub total_rows: usize,
}

impl DashboardAnalysis {
    pub fn new(dashboard_config: DashboardConfig, table: &DataTable) -> Self {
        Self {
            dashboard_config,
            data_preview: table.to_records(WIDGET_ROW_LIMIT),
            total_rows: table.row_count(),
        }
    }
}

/// Dashboard from the model's reply text. Unparseable replies yield the
/// overview dashboard; widget data always comes from `table`.
pub fn normalize_dashboard(text: &str, file_name: &str, table: &DataTable) -> DashboardConfig {
    let config = embedded_object(text)
        .and_then(parse_config)
        .unwrap_or_else(|| fallback_dashboard(file_name, table));
    with_real_data(config, table)
}

/// Same as [`normalize_dashboard`] for a whole invoker reply: either the
/// config object itself or `{response: text}`.
pub fn dashboard_from_payload(payload: &Value, file_name: &str, table: &DataTable) -> DashboardConfig {
    match payload {
        Value::Object(map) => match map.get("response").and_then(Value::as_str) {
            Some(text) => normalize_dashboard(text, file_name, table),
            None => {
                let config = parse_config(map.clone()).unwrap_or_else(|| fallback_dashboard(file_name, table));
                with_real_data(config, table)
            }
        },
        Value::String(text) => normalize_dashboard(text, file_name, table),
        _ => with_real_data(fallback_dashboard(file_name, table), table),
    }
}

fn parse_config(map: Map<String, Value>) -> Option<DashboardConfig> {
    match serde_json::from_value::<DashboardConfig>(Value::Object(map)) {
        Ok(config) => {
            info!(widgets = config.widgets.len(), "parsed dashboard configuration");
            Some(config)
        }
        Err(e) => {
            warn!(error = %e, "dashboard JSON has an unexpected shape");
            None
        }
    }
}

/// Overview dashboard used when the reply has no usable configuration
pub fn fallback_dashboard(file_name: &str, table: &DataTable) -> DashboardConfig {
    let total = table.row_count();
    let palette = DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect();

    DashboardConfig {
        name: format!("{} Dashboard", strip_extension(file_name)),
        description: format!("AI-generated dashboard for {}", file_name),
        category: default_category(),
        layout: default_layout(),
        metrics: vec![Metric {
            title: "Total Records".to_string(),
            value: total.to_string(),
            change: Some("Data uploaded".to_string()),
            icon: Some("BarChart3".to_string()),
        }],
        widgets: vec![Widget {
            id: "overview".to_string(),
            kind: default_widget_type(),
            title: "Data Overview".to_string(),
            chart_type: default_chart_type(),
            data: table.to_records(OVERVIEW_ROWS).into_iter().map(Value::Object).collect(),
            insights: vec![format!("Analyzed {} records from {}", total, file_name)],
            color_scheme: palette,
        }],
    }
}

/// Replace model-invented widget data with the first real records.
/// Widgets without data are left alone.
fn with_real_data(mut config: DashboardConfig, table: &DataTable) -> DashboardConfig {
    let records: Vec<Value> = table
        .to_records(WIDGET_ROW_LIMIT)
        .into_iter()
        .map(Value::Object)
        .collect();

    for widget in config.widgets.iter_mut().filter(|w| !w.data.is_empty()) {
        widget.data = records.clone();
    }
    config
}
