use clap::Args;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use buyout_core::lbo::{LboEngine, LboInput};
use buyout_core::waterfall::{self, FundFlows, FundTerms};

use crate::input;

/// Arguments for running a deal through the fund waterfall
#[derive(Args)]
pub struct FundArgs {
    /// Path to JSON or YAML input file ({"lbo": ..., "terms": ...})
    #[arg(long)]
    pub input: Option<String>,
}

/// An LBO and the fund terms its equity flows are allocated under
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FundInput {
    pub lbo: LboInput,
    #[serde(default)]
    pub terms: FundTerms,
}

pub fn run_fund(args: FundArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let fund_input: FundInput = input::read_input(args.input.as_deref(), "fund")?;
    let lbo = &fund_input.lbo;

    let run = LboEngine::new(lbo.assumptions.clone())?.run(lbo.years, lbo.exit_year)?;
    let flows = FundFlows::from_lbo_run(&run);
    let wf_input = flows.clone().into_input(&fund_input.terms);
    let summary = waterfall::summarize_waterfall(&wf_input)?;
    let records = waterfall::compute_waterfall_by_year(&wf_input)?;

    Ok(json!({
        "result": {
            "deal_irr": run.exit.irr,
            "deal_moic": run.exit.moic,
            "lp_irr": summary.result.lp_irr,
            "gp_irr": summary.result.gp_irr,
            "lp_moic": summary.result.moic,
            "cumulative_lp_distributed": summary.result.cumulative_lp_distributed,
            "cumulative_gp_paid": summary.result.cumulative_gp_paid,
            "clawback_amount": summary.result.clawback_amount,
        },
        "flows": flows,
        "waterfall": records,
        "methodology": "LBO sponsor flows allocated through the fund waterfall",
        "warnings": summary.warnings,
    }))
}
