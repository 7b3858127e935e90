pub mod file;
pub mod stdin;

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Document formats accepted on `--input` and stdin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Json,
    Yaml,
}

/// Parse `text` as JSON or YAML into a generic value.
pub fn parse_value(text: &str, format: InputFormat) -> Result<Value, Box<dyn std::error::Error>> {
    let value = match format {
        InputFormat::Json => serde_json::from_str(text)?,
        InputFormat::Yaml => serde_yaml::from_str(text)?,
    };
    Ok(value)
}

/// Load the command's input document from `--input` or piped stdin.
pub fn read_value(path: Option<&str>, what: &str) -> Result<Value, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        return file::read_value(path);
    }
    match stdin::read_stdin()? {
        Some(value) => Ok(value),
        None => Err(format!("--input <file.json|file.yaml> or stdin required for {what}").into()),
    }
}

/// Load and deserialise the command's input.
pub fn read_input<T: DeserializeOwned>(
    path: Option<&str>,
    what: &str,
) -> Result<T, Box<dyn std::error::Error>> {
    let value = read_value(path, what)?;
    let typed = serde_json::from_value(value)
        .map_err(|e| format!("Invalid {what} input: {e}"))?;
    Ok(typed)
}
