use crate::data::DataTable;
use anyhow::{anyhow, Context, Result};
use calamine::{open_workbook_auto, DataType, Reader};
use std::fs;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// Character budget for file content sent along with a prompt
pub const SAMPLE_CHAR_LIMIT: usize = 5000;

const SPREADSHEET_EXTENSIONS: [&str; 4] = ["xlsx", "xls", "xlsm", "ods"];

/// An uploaded file reduced to its text form
#[derive(Debug, Clone, PartialEq)]
pub struct DataFile {
    pub name: String,
    pub text: String,
}

impl DataFile {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }

    /// File text cut to `SAMPLE_CHAR_LIMIT` characters
    pub fn sample(&self) -> &str {
        match self.text.char_indices().nth(SAMPLE_CHAR_LIMIT) {
            Some((byte_idx, _)) => &self.text[..byte_idx],
            None => &self.text,
        }
    }

    pub fn stem(&self) -> &str {
        strip_extension(&self.name)
    }

    /// Preview table. JSON arrays of objects are tabulated directly,
    /// everything else goes through the naive CSV split.
    pub fn table(&self) -> DataTable {
        if self.name.to_lowercase().ends_with(".json") {
            if let Ok(value) = serde_json::from_str::<serde_json::Value>(&self.text) {
                if let Ok(table) = DataTable::from_json(&value) {
                    return table;
                }
            }
        }
        DataTable::from_csv_text(&self.text)
    }
}

/// File name without its last extension
pub fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(idx) if idx > 0 => &name[..idx],
        _ => name,
    }
}

fn is_spreadsheet(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SPREADSHEET_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Read a data file into text. Spreadsheets become CSV text of their
/// first worksheet; any other file is read as (lossy) UTF-8.
pub fn load_file(path: &Path) -> Result<DataFile> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let text = if is_spreadsheet(path) {
        read_spreadsheet(path)?
    } else {
        let bytes = fs::read(path)
            .with_context(|| format!("Failed to read file '{}'", path.display()))?;
        String::from_utf8_lossy(&bytes).into_owned()
    };

    info!(file = %name, chars = text.chars().count(), "loaded data file");
    Ok(DataFile::new(name, text))
}

fn read_spreadsheet(path: &Path) -> Result<String> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|err| anyhow!("Unable to open the spreadsheet: {err}"))?;

    let sheet_name = workbook
        .sheet_names()
        .get(0)
        .cloned()
        .ok_or_else(|| anyhow!("The workbook does not contain any worksheets"))?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .ok_or_else(|| anyhow!("Unable to read the worksheet named '{sheet_name}'"))?
        .map_err(|err| anyhow!("Unable to read the worksheet data: {err}"))?;

    debug!(sheet = %sheet_name, rows = range.height(), "converting worksheet");
    rows_to_csv(range.rows().map(|row| row.iter().map(cell_to_string).collect()))
}

fn cell_to_string(cell: &DataType) -> String {
    match cell {
        DataType::Empty => String::new(),
        _ => cell.to_string(),
    }
}

/// Serialize rows as CSV text, skipping rows with no content
fn rows_to_csv(rows: impl Iterator<Item = Vec<String>>) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());

    for row in rows {
        if row.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        writer.write_record(&row).context("Failed to write CSV row")?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|err| anyhow!("Failed to flush CSV output: {err}"))?;
    String::from_utf8(bytes).context("Spreadsheet produced invalid UTF-8")
}

/// Read strict CSV (quoting rules honoured) into a table
pub fn read_csv<R: Read>(reader: R) -> Result<DataTable> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .context("Failed to read CSV headers")?
        .iter()
        .map(String::from)
        .collect();

    let mut rows = Vec::new();
    for result in csv_reader.records() {
        let record = result.context("Failed to read CSV record")?;
        rows.push(record.iter().map(String::from).collect());
    }

    Ok(DataTable::new(headers, rows))
}
