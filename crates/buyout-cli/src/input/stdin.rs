use serde_json::Value;
use std::io::{self, Read};

use super::{parse_value, InputFormat};

/// Read a piped JSON or YAML document from stdin.
/// Returns None if stdin is a TTY (interactive) or empty.
pub fn read_stdin() -> Result<Option<Value>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;

    let trimmed = buffer.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    // JSON first, then YAML
    let value = parse_value(trimmed, InputFormat::Json)
        .or_else(|_| parse_value(trimmed, InputFormat::Yaml))?;
    Ok(Some(value))
}
