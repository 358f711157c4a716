use core_types::Datum;
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Loads a JSON array of records into data for a join.
pub fn load_records(path: &Path) -> Vec<Datum> {
    let content = fs::read_to_string(path)
        .unwrap_or_else(|err| panic!("failed to read records {path:?}: {err}"));
    let value: Value = serde_json::from_str(&content)
        .unwrap_or_else(|err| panic!("failed to parse records {path:?}: {err}"));
    let Value::Array(items) = value else {
        panic!("records file {path:?} must hold a top-level array");
    };
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            datum_from_json(item)
                .unwrap_or_else(|| panic!("record {i} in {path:?} has no datum form: {item}"))
        })
        .collect()
}

/// `null` and arrays have no datum form.
pub fn datum_from_json(value: &Value) -> Option<Datum> {
    match value {
        Value::Bool(b) => Some(Datum::Bool(*b)),
        Value::Number(n) => n.as_f64().map(Datum::Number),
        Value::String(s) => Some(Datum::text(s)),
        Value::Object(fields) => {
            let mut out = Vec::with_capacity(fields.len());
            for (k, v) in fields {
                out.push((k.as_str(), datum_from_json(v)?));
            }
            Some(Datum::record(out))
        }
        Value::Null | Value::Array(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn objects_become_records() {
        let value: Value = serde_json::from_str(r#"{"id": "a", "value": 3, "on": true}"#).unwrap();
        let datum = datum_from_json(&value).unwrap();
        assert_eq!(datum.field("id"), Some(&Datum::text("a")));
        assert_eq!(datum.field("value").and_then(Datum::as_number), Some(3.0));
        assert_eq!(datum.field("on"), Some(&Datum::Bool(true)));
        assert_eq!(datum_from_json(&Value::Null), None);
    }
}
