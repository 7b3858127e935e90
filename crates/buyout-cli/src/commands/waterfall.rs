use clap::Args;
use serde_json::Value;

use buyout_core::waterfall::{self, WaterfallInput};

use crate::input;

/// Arguments for the fund waterfall
#[derive(Args)]
pub struct WaterfallArgs {
    /// Path to JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,

    /// Report fund totals instead of the year-by-year ledger
    #[arg(long)]
    pub summary: bool,
}

pub fn run_waterfall(args: WaterfallArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let wf_input: WaterfallInput = input::read_input(args.input.as_deref(), "waterfall")?;
    if args.summary {
        let result = waterfall::summarize_waterfall(&wf_input)?;
        return Ok(serde_json::to_value(result)?);
    }
    let records = waterfall::compute_waterfall_by_year(&wf_input)?;
    Ok(serde_json::to_value(records)?)
}
