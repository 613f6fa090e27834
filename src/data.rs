use crate::model::Row;
use anyhow::{anyhow, Result};
use serde_json::{Number, Value};

/// Tabular preview of an uploaded file
#[derive(Debug, Clone, PartialEq)]
pub struct DataTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl DataTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Naive CSV split: blank lines dropped, cells split on commas,
    /// trimmed and stripped of double quotes. No escaping rules apply.
    pub fn from_csv_text(text: &str) -> Self {
        let mut lines = text.lines().filter(|line| !line.trim().is_empty());

        let headers = match lines.next() {
            Some(line) => split_naive(line),
            None => return Self::new(Vec::new(), Vec::new()),
        };
        let rows = lines.map(split_naive).collect();

        Self { headers, rows }
    }

    /// Create a DataTable from a JSON array of objects
    pub fn from_json(value: &Value) -> Result<Self> {
        let array = value.as_array().ok_or_else(||
            anyhow!("Input data must be a JSON array of objects")
        )?;

        if array.is_empty() {
            return Err(anyhow!("Input data array is empty"));
        }

        // Extract headers from the first object
        let first_obj = array[0].as_object().ok_or_else(||
            anyhow!("Items in array must be objects")
        )?;

        let headers: Vec<String> = first_obj.keys().cloned().collect();

        let mut rows = Vec::new();
        for item in array {
            let obj = item.as_object().ok_or_else(||
                anyhow!("Items in array must be objects")
            )?;

            let mut row = Vec::new();
            for header in &headers {
                let val_str = match obj.get(header) {
                    Some(Value::String(s)) => s.clone(),
                    Some(Value::Number(n)) => n.to_string(),
                    Some(Value::Bool(b)) => b.to_string(),
                    Some(Value::Null) | None => "".to_string(),
                    _ => return Err(anyhow!("Unsupported value type for field '{}'", header)),
                };
                row.push(val_str);
            }
            rows.push(row);
        }

        Ok(Self { headers, rows })
    }

    /// True when there is no header row or no data row
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() || self.rows.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Records keyed by header; cells that parse as numbers become numbers.
    pub fn to_records(&self, limit: usize) -> Vec<Row> {
        self.build_records(limit, typed_cell)
    }

    /// Records keyed by header with every cell kept as text
    pub fn to_text_records(&self, limit: usize) -> Vec<Row> {
        self.build_records(limit, |cell| Value::String(cell.to_string()))
    }

    fn build_records(&self, limit: usize, convert: impl Fn(&str) -> Value) -> Vec<Row> {
        self.rows
            .iter()
            .take(limit)
            .map(|cells| {
                self.headers
                    .iter()
                    .enumerate()
                    .map(|(i, header)| {
                        let cell = cells.get(i).map(String::as_str).unwrap_or("");
                        (header.clone(), convert(cell))
                    })
                    .collect()
            })
            .collect()
    }
}

fn split_naive(line: &str) -> Vec<String> {
    line.split(',')
        .map(|cell| cell.trim().replace('"', ""))
        .collect()
}

fn typed_cell(cell: &str) -> Value {
    if let Ok(n) = cell.parse::<i64>() {
        return Value::Number(n.into());
    }
    cell.parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(cell.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_csv_text_naive() {
        let table = DataTable::from_csv_text("\"region\", sales\n\nNorth, 10\n\"South\",12.5\n");
        assert_eq!(table.headers, vec!["region", "sales"]);
        assert_eq!(table.rows, vec![vec!["North", "10"], vec!["South", "12.5"]]);
    }

    #[test]
    fn test_quoted_commas_are_split() {
        // Naive splitting: quoted commas are not special
        let table = DataTable::from_csv_text("name,city\n\"Doe, J\",Paris\n");
        assert_eq!(table.rows[0], vec!["Doe", "J", "Paris"]);
    }

    #[test]
    fn test_empty_text() {
        let table = DataTable::from_csv_text("\n  \n");
        assert!(table.is_empty());
        assert_eq!(table.row_count(), 0);
    }

    #[test]
    fn test_to_records_types_numbers() {
        let table = DataTable::from_csv_text("region,sales,share\nNorth,10,0.5\nSouth,n/a,\n");
        let records = table.to_records(10);
        assert_eq!(Value::Object(records[0].clone()), json!({"region": "North", "sales": 10, "share": 0.5}));
        assert_eq!(Value::Object(records[1].clone()), json!({"region": "South", "sales": "n/a", "share": ""}));
    }

    #[test]
    fn test_to_records_limit_and_missing_cells() {
        let table = DataTable::from_csv_text("a,b\n1\n2,3\n4,5\n");
        let records = table.to_text_records(2);
        assert_eq!(records.len(), 2);
        assert_eq!(Value::Object(records[0].clone()), json!({"a": "1", "b": ""}));
    }

    #[test]
    fn test_from_json() {
        let table = DataTable::from_json(&json!([{"x": 1, "y": "a"}, {"x": 2, "y": null}])).unwrap();
        assert_eq!(table.headers, vec!["x", "y"]);
        assert_eq!(table.rows[1], vec!["2", ""]);
        assert!(DataTable::from_json(&json!([])).is_err());
        assert!(DataTable::from_json(&json!({"x": 1})).is_err());
    }
}
