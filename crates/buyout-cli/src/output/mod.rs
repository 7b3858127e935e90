pub mod csv_out;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("JSON serialization error: {e}"),
    }
}

/// Follow a path of object keys.
pub fn lookup<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |v, key| v.get(*key))
}

/// The per-row series of a command's output: LBO years, waterfall records,
/// sensitivity rows or the fund ledger.
pub fn primary_rows(value: &Value) -> Option<&Vec<Value>> {
    if let Value::Array(arr) = value {
        return Some(arr);
    }
    [
        &["result", "run", "years"][..],
        &["result", "rows"][..],
        &["waterfall"][..],
    ]
    .iter()
    .find_map(|path| lookup(value, path).and_then(Value::as_array))
}

/// Headline figures shown next to the rows.
pub fn headline(value: &Value) -> Option<&serde_json::Map<String, Value>> {
    lookup(value, &["result", "run", "exit"])
        .or_else(|| lookup(value, &["result"]))
        .and_then(Value::as_object)
}
