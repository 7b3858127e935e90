use serde_json::Value;

use super::lookup;

/// Print just the key answer value from the output.
///
/// Looks for well-known result fields in order of priority, then falls back
/// to the first field in the result object.
pub fn print_minimal(value: &Value) {
    let priority_paths: [&[&str]; 7] = [
        &["result", "run", "exit", "irr"],
        &["result", "deal_irr"],
        &["result", "lp_irr"],
        &["result", "success_rate"],
        &["result", "moic"],
        &["lp_irr"],
        &["result", "run", "exit", "moic"],
    ];

    for path in priority_paths {
        if let Some(val) = lookup(value, path) {
            if !val.is_null() {
                println!("{}", format_minimal(val));
                return;
            }
        }
    }

    // Year-by-year ledger: report the last year's LP IRR
    if let Some(last) = value.as_array().and_then(|arr| arr.last()) {
        if let Some(irr) = last.get("lp_irr") {
            println!("{}", format_minimal(irr));
            return;
        }
    }

    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);
    if let Value::Object(map) = result_obj {
        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_minimal(val));
            return;
        }
    }

    println!("{}", format_minimal(result_obj));
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
