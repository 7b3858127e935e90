use clap::Args;
use serde_json::Value;

use buyout_core::scenarios::{
    self, MonteCarloInput, SensitivityInput, TwoWaySensitivityInput,
};

use crate::input;

/// Arguments for sensitivity analysis
#[derive(Args)]
pub struct SensitivityArgs {
    /// Path to JSON or YAML input file. A document with `sweep_1` and
    /// `sweep_2` runs a two-way grid; otherwise a one-way sweep.
    #[arg(long)]
    pub input: Option<String>,

    /// Seed for bootstrapped IRR intervals (overrides the input)
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Arguments for the Monte Carlo LBO
#[derive(Args)]
pub struct MonteCarloArgs {
    /// Path to JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,

    /// Number of simulated paths (overrides the input)
    #[arg(long)]
    pub simulations: Option<u32>,

    /// RNG seed (overrides the input)
    #[arg(long)]
    pub seed: Option<u64>,
}

fn is_two_way(value: &Value) -> bool {
    value
        .as_object()
        .map_or(false, |m| m.contains_key("sweep_1") && m.contains_key("sweep_2"))
}

pub fn run_sensitivity(args: SensitivityArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let value = input::read_value(args.input.as_deref(), "sensitivity")?;

    if is_two_way(&value) {
        let grid_input: TwoWaySensitivityInput = serde_json::from_value(value)
            .map_err(|e| format!("Invalid two-way sensitivity input: {e}"))?;
        let result = scenarios::run_2d_sensitivity(&grid_input)?;
        return Ok(serde_json::to_value(result)?);
    }

    let mut sens_input: SensitivityInput = serde_json::from_value(value)
        .map_err(|e| format!("Invalid sensitivity input: {e}"))?;
    if let (Some(seed), Some(bootstrap)) = (args.seed, sens_input.bootstrap.as_mut()) {
        bootstrap.seed = Some(seed);
    }
    let result = scenarios::run_sensitivity(&sens_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_monte_carlo(args: MonteCarloArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut mc_input: MonteCarloInput = input::read_input(args.input.as_deref(), "Monte Carlo")?;
    if let Some(n) = args.simulations {
        mc_input.num_simulations = n;
    }
    if args.seed.is_some() {
        mc_input.seed = args.seed;
    }
    let result = scenarios::run_monte_carlo(&mc_input)?;
    Ok(serde_json::to_value(result)?)
}
