// Axis key inference for schema-less rows

use crate::model::Row;
use serde_json::Value;

/// Value key used when the first row has no numeric field
pub const FALLBACK_VALUE_KEY: &str = "value";
/// Name key used when the first row has no string field
pub const FALLBACK_NAME_KEY: &str = "name";

/// Runtime type of a field value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Number,
    String,
    Other,
}

impl FieldKind {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Number(_) => FieldKind::Number,
            Value::String(_) => FieldKind::String,
            _ => FieldKind::Other,
        }
    }
}

/// Which fields feed the category axis and the value series
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxisKeys {
    pub name_key: String,
    pub value_key: String,
}

/// Ordered (key, kind) pairs of a row, in insertion order
pub fn field_kinds(row: &Row) -> Vec<(&str, FieldKind)> {
    row.iter().map(|(key, value)| (key.as_str(), FieldKind::of(value))).collect()
}

/// First numeric key is the value key, first string key the name key
pub fn infer_keys(fields: &[(&str, FieldKind)]) -> AxisKeys {
    let first_of = |kind: FieldKind| {
        fields
            .iter()
            .find(|(_, k)| *k == kind)
            .map(|(key, _)| key.to_string())
    };

    AxisKeys {
        name_key: first_of(FieldKind::String).unwrap_or_else(|| FALLBACK_NAME_KEY.to_string()),
        value_key: first_of(FieldKind::Number).unwrap_or_else(|| FALLBACK_VALUE_KEY.to_string()),
    }
}

/// Infer keys from the first row; empty input yields the fallback keys
pub fn infer_from_rows(rows: &[Row]) -> AxisKeys {
    match rows.first() {
        Some(row) => infer_keys(&field_kinds(row)),
        None => infer_keys(&[]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_first_keys_in_insertion_order() {
        let r = row(json!({"id": 7, "region": "North", "sales": 10, "label": "x"}));
        let keys = infer_keys(&field_kinds(&r));
        assert_eq!(keys.value_key, "id");
        assert_eq!(keys.name_key, "region");
    }

    #[test]
    fn test_insertion_order_not_alphabetical() {
        let r = row(json!({"zeta": "z", "alpha": "a", "yield": 2, "beta": 1}));
        let keys = infer_keys(&field_kinds(&r));
        assert_eq!(keys.name_key, "zeta");
        assert_eq!(keys.value_key, "yield");
    }

    #[test]
    fn test_all_numeric_falls_back_to_name() {
        let r = row(json!({"x": 1, "y": 2}));
        let keys = infer_keys(&field_kinds(&r));
        assert_eq!(keys.name_key, FALLBACK_NAME_KEY);
        assert_eq!(keys.value_key, "x");
    }

    #[test]
    fn test_all_strings_falls_back_to_value() {
        let r = row(json!({"city": "A", "amount": "10"}));
        let keys = infer_keys(&field_kinds(&r));
        assert_eq!(keys.name_key, "city");
        assert_eq!(keys.value_key, FALLBACK_VALUE_KEY);
    }

    #[test]
    fn test_other_kinds_ignored() {
        let r = row(json!({"flag": true, "missing": null, "nested": {"a": 1}, "n": 3}));
        let kinds = field_kinds(&r);
        assert_eq!(kinds[0], ("flag", FieldKind::Other));
        let keys = infer_keys(&kinds);
        assert_eq!(keys.value_key, "n");
        assert_eq!(keys.name_key, FALLBACK_NAME_KEY);
    }

    #[test]
    fn test_inference_is_idempotent() {
        let rows = vec![row(json!({"city": "A", "sales": 10})), row(json!({"sales": 5}))];
        assert_eq!(infer_from_rows(&rows), infer_from_rows(&rows));
        assert_eq!(infer_from_rows(&rows).name_key, "city");
    }

    #[test]
    fn test_empty_rows() {
        let keys = infer_from_rows(&[]);
        assert_eq!(keys.name_key, "name");
        assert_eq!(keys.value_key, "value");
    }
}
