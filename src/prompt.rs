use crate::data::DataTable;
use crate::error::{Error, Result};
use crate::ingest::DataFile;
use crate::invoker::RequestKind;
use serde_json::Value;

/// Rows of file context shown with a chat question
pub const QUESTION_SAMPLE_ROWS: usize = 5;
/// Rows shown to the model when designing a dashboard
pub const DASHBOARD_SAMPLE_ROWS: usize = 20;

pub const GENERAL_SYSTEM_PROMPT: &str =
    "You are a helpful AI assistant. Provide clear, concise, and accurate responses to user questions.";

pub const CHART_SYSTEM_PROMPT: &str = r##"You are a data visualization expert. Based on the user's request, provide specific recommendations for creating charts.

Return your response as valid JSON with these exact fields:
{
  "chartType": "bar|line|pie|scatter",
  "dataStructure": {
    "columns": [{"name": "string", "type": "string|number"}],
    "rows": [{"key": "value"}]
  },
  "insights": ["insight 1", "insight 2"],
  "colorScheme": ["#8884d8", "#82ca9d", "#ffc658"],
  "config": {
    "title": "Chart Title",
    "xAxisLabel": "X Axis",
    "yAxisLabel": "Y Axis"
  }
}

Create sample data that matches the user's request with at least 4-5 data points."##;

const DASHBOARD_SCHEMA: &str = r##"{
  "name": "Dashboard Name",
  "description": "Dashboard description",
  "category": "sales|marketing|operations|hr|finance|custom",
  "layout": "grid",
  "metrics": [
    {
      "title": "Metric Name",
      "value": "123,456",
      "change": "+12% from last month",
      "icon": "DollarSign|Users|TrendingUp|BarChart3"
    }
  ],
  "widgets": [
    {
      "id": "widget1",
      "type": "chart",
      "title": "Chart Title",
      "chartType": "bar|line|pie",
      "data": [{"name": "Item1", "value": 100}],
      "insights": ["Key insight about this chart"],
      "colorScheme": ["#8884d8", "#82ca9d", "#ffc658"]
    }
  ]
}"##;

/// System prompt sent ahead of the user prompt for each request kind.
/// Dashboard prompts carry their own schema.
pub fn system_prompt(kind: RequestKind) -> &'static str {
    match kind {
        RequestKind::Chart => CHART_SYSTEM_PROMPT,
        RequestKind::General | RequestKind::Dashboard => GENERAL_SYSTEM_PROMPT,
    }
}

fn non_empty(input: &str) -> Result<&str> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(Error::EmptyPrompt);
    }
    Ok(trimmed)
}

fn pretty(rows: Vec<crate::model::Row>) -> String {
    let rows: Vec<Value> = rows.into_iter().map(Value::Object).collect();
    serde_json::to_string_pretty(&rows).unwrap_or_default()
}

/// Chat prompt: the question alone, or wrapped in the attached file's context
pub fn compose_question(question: &str, file: Option<&DataFile>) -> Result<String> {
    let question = non_empty(question)?;

    let file = match file {
        Some(file) if !file.text.trim().is_empty() => file,
        _ => return Ok(question.to_string()),
    };

    let table = file.table();
    if table.is_empty() {
        return Ok(format!(
            "Context: I have uploaded a data file ({}). Its content begins:\n\n{}\n\nUser question: {}\n\nPlease answer the user's question based on this data context.",
            file.name,
            file.sample(),
            question
        ));
    }

    Ok(format!(
        "Context: I have uploaded a data file ({}) with the following structure:\n\nHeaders: {}\nSample data (first {} rows):\n{}\n\nUser question: {}\n\nPlease answer the user's question based on this data context.",
        file.name,
        table.headers.join(", "),
        QUESTION_SAMPLE_ROWS,
        pretty(table.to_text_records(QUESTION_SAMPLE_ROWS)),
        question
    ))
}

/// Chart request: the description, plus the data sample when a file is attached
pub fn compose_chart(description: &str, file: Option<&DataFile>) -> Result<String> {
    let description = non_empty(description)?;

    match file {
        Some(file) if !file.text.trim().is_empty() => Ok(format!(
            "{}\n\nUse the data from the uploaded file {}:\n{}",
            description,
            file.name,
            file.sample()
        )),
        _ => Ok(description.to_string()),
    }
}

/// Dashboard analysis prompt over a parsed table
pub fn compose_dashboard(file_name: &str, table: &DataTable) -> String {
    format!(
        "Analyze this dataset and create a comprehensive dashboard configuration. Here's the data:\n\n\
         File: {}\n\
         Columns: {}\n\
         Total Rows: {}\n\
         Sample Data: {}\n\n\
         Create a dashboard configuration with:\n\
         1. An appropriate dashboard name and description\n\
         2. 3-6 relevant widgets with different chart types (bar, line, pie)\n\
         3. Key metrics cards\n\
         4. Insights about the data\n\
         5. Appropriate color schemes\n\n\
         Return ONLY a JSON object with this structure:\n{}",
        file_name,
        table.headers.join(", "),
        table.row_count(),
        pretty(table.to_records(DASHBOARD_SAMPLE_ROWS)),
        DASHBOARD_SCHEMA
    )
}
