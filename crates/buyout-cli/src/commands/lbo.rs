use clap::Args;
use serde_json::Value;

use buyout_core::lbo::{self, LboInput};

use crate::input;

/// Arguments for a single LBO run
#[derive(Args)]
pub struct LboArgs {
    /// Path to JSON or YAML input file (an LBO input document)
    #[arg(long)]
    pub input: Option<String>,

    /// Override the projection horizon
    #[arg(long)]
    pub years: Option<u32>,

    /// Override the exit year
    #[arg(long)]
    pub exit_year: Option<u32>,

    /// Print a plain-text run summary instead of the full envelope
    #[arg(long)]
    pub summary: bool,
}

pub fn run_lbo(args: LboArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut lbo_input: LboInput = input::read_input(args.input.as_deref(), "LBO")?;
    if let Some(years) = args.years {
        lbo_input.years = years;
    }
    if args.exit_year.is_some() {
        lbo_input.exit_year = args.exit_year;
    }

    let result = lbo::build_lbo(&lbo_input)?;
    if args.summary {
        return Ok(Value::String(result.result.run.summary()));
    }
    Ok(serde_json::to_value(result)?)
}
