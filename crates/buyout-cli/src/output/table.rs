use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{headline, lookup, primary_rows};

/// Render output as tables: the per-row series, a two-way grid when present,
/// then the headline figures, warnings and methodology.
pub fn print_table(value: &Value) {
    if let Some(rows) = primary_rows(value) {
        print_array_table(rows);
    }

    if let Some(result) = lookup(value, &["result"]) {
        print_grid(result, "irr", "IRR");
        print_grid(result, "moic", "MOIC");
    }

    if let Some(map) = headline(value) {
        print_fields(map);
    } else if primary_rows(value).is_none() {
        println!("{value}");
    }

    if let Some(Value::Array(warnings)) = value.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings.iter().filter_map(Value::as_str) {
                println!("  - {w}");
            }
        }
    }

    if let Some(Value::String(meth)) = value.get("methodology") {
        println!("\nMethodology: {meth}");
    }
}

/// Scalar fields only; nested series are shown in their own tables.
fn print_fields(map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in map.iter().filter(|(_, v)| !v.is_object() && !is_nested(v)) {
        builder.push_record([key.as_str(), &format_value(val)]);
    }
    println!("{}", Table::from(builder));
}

/// Arrays of arrays or objects (grids, row series).
fn is_nested(value: &Value) -> bool {
    value
        .as_array()
        .and_then(|rows| rows.first())
        .map_or(false, |first| first.is_array() || first.is_object())
}

/// `result[key]` as a values_1 × values_2 grid.
fn print_grid(result: &Value, key: &str, label: &str) {
    let (Some(grid), Some(v1), Some(v2)) = (
        result.get(key).and_then(Value::as_array),
        result.get("values_1").and_then(Value::as_array),
        result.get("values_2").and_then(Value::as_array),
    ) else {
        return;
    };

    let mut builder = Builder::default();
    let mut header = vec![label.to_string()];
    header.extend(v2.iter().map(format_value));
    builder.push_record(header);

    for (row_value, row) in v1.iter().zip(grid) {
        let mut record = vec![format_value(row_value)];
        if let Some(cells) = row.as_array() {
            record.extend(cells.iter().map(format_value));
        }
        builder.push_record(record);
    }
    println!("{}\n", Table::from(builder));
}

fn print_array_table(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    let Some(Value::Object(first)) = arr.first() else {
        for item in arr {
            println!("{}", format_value(item));
        }
        return;
    };

    let headers: Vec<String> = first.keys().cloned().collect();
    let mut builder = Builder::default();
    builder.push_record(&headers);

    for item in arr {
        if let Value::Object(map) = item {
            let row: Vec<String> = headers
                .iter()
                .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default())
                .collect();
            builder.push_record(row);
        }
    }

    println!("{}\n", Table::from(builder));
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "-".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_value_joins_arrays() {
        assert_eq!(format_value(&json!(["1", "2"])), "1, 2");
        assert_eq!(format_value(&Value::Null), "-");
    }

    #[test]
    fn test_nested_detection() {
        assert!(is_nested(&json!([[1, 2], [3, 4]])));
        assert!(is_nested(&json!([{"year": 1}])));
        assert!(!is_nested(&json!([1, 2])));
    }
}
