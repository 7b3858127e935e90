use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use statrs::distribution::Normal;
use statrs::statistics::Statistics;
use std::time::Instant;

use crate::error::BuyoutError;
use crate::lbo::{DealAssumptions, LboEngine, RunOutcome};
use crate::numeric::percentile;
use crate::scenarios::sensitivity::irr_as_f64;
use crate::types::{with_precision, ComputationOutput, Precision};
use crate::BuyoutResult;

/// Sampled inputs are rounded to this many places before entering the engine.
const SAMPLE_DP: u32 = 6;

fn default_num_simulations() -> u32 {
    500
}
fn default_years() -> u32 {
    5
}
fn default_multiple_sigma() -> f64 {
    0.75
}
fn default_margin_sigma() -> f64 {
    0.015
}
fn default_growth_sigma() -> f64 {
    0.02
}
fn default_multiple_floor() -> f64 {
    6.0
}
fn default_margin_floor() -> f64 {
    0.10
}
fn default_growth_floor() -> f64 {
    -0.02
}
fn default_irr_hurdle() -> f64 {
    0.08
}

/// Normal shocks around the base deal's exit multiple, margin and growth.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MonteCarloInput {
    pub base: DealAssumptions,
    #[serde(default = "default_years")]
    pub years: u32,
    #[serde(default = "default_num_simulations")]
    pub num_simulations: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(default = "default_multiple_sigma")]
    pub exit_multiple_sigma: f64,
    #[serde(default = "default_margin_sigma")]
    pub margin_sigma: f64,
    #[serde(default = "default_growth_sigma")]
    pub growth_sigma: f64,
    #[serde(default = "default_multiple_floor")]
    pub exit_multiple_floor: f64,
    #[serde(default = "default_margin_floor")]
    pub margin_floor: f64,
    #[serde(default = "default_growth_floor")]
    pub growth_floor: f64,
    /// Minimum IRR for a path to count as a success
    #[serde(default = "default_irr_hurdle")]
    pub irr_hurdle: f64,
}

/// Path counts and the IRR distribution of the successful paths
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonteCarloOutput {
    pub num_simulations: u32,
    pub successes: u32,
    /// Every path that did not succeed
    pub failures: u32,
    pub covenant_breaches: u32,
    pub insolvencies: u32,
    /// Paths the engine rejected outright (sampled inputs out of range)
    pub invalid_paths: u32,
    pub success_rate: f64,
    pub mean_irr: Option<f64>,
    pub median_irr: Option<f64>,
    pub p10_irr: Option<f64>,
    pub p90_irr: Option<f64>,
    pub std_irr: Option<f64>,
    pub irrs: Vec<f64>,
}

fn normal(field: &str, mean: f64, sigma: f64) -> BuyoutResult<Normal> {
    Normal::new(mean, sigma).map_err(|e| BuyoutError::InvalidInput {
        field: field.into(),
        reason: format!("Invalid Normal parameters: {e}"),
    })
}

fn to_decimal(field: &str, value: f64) -> BuyoutResult<Decimal> {
    Decimal::from_f64(value)
        .map(|d| d.round_dp(SAMPLE_DP))
        .ok_or_else(|| BuyoutError::InvalidInput {
            field: field.into(),
            reason: format!("Sampled value {value} is not representable"),
        })
}

fn to_f64(field: &str, value: Decimal) -> BuyoutResult<f64> {
    value.to_f64().ok_or_else(|| BuyoutError::InvalidInput {
        field: field.into(),
        reason: "Value is not representable as f64".into(),
    })
}

/// Sample deal variants and count the ones that exit cleanly above the hurdle.
///
/// Success means the run completes without breach or insolvency, exit equity
/// is positive and IRR is at least `irr_hurdle`.
pub fn run_monte_carlo(
    input: &MonteCarloInput,
) -> BuyoutResult<ComputationOutput<MonteCarloOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.num_simulations == 0 {
        return Err(BuyoutError::InvalidInput {
            field: "num_simulations".into(),
            reason: "At least one path is required".into(),
        });
    }
    // Surface a bad base deal once instead of as N failed paths
    LboEngine::new(input.base.clone())?;

    let base = &input.base;
    let multiple_dist = normal(
        "exit_multiple_sigma",
        to_f64("exit_multiple", base.exit_multiple)?,
        input.exit_multiple_sigma,
    )?;
    let margin_dist = normal(
        "margin_sigma",
        to_f64("ebitda_margin", base.ebitda_margin)?,
        input.margin_sigma,
    )?;
    let growth_dist = normal(
        "growth_sigma",
        to_f64("rev_growth", base.rev_growth)?,
        input.growth_sigma,
    )?;

    let mut rng = match input.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut irrs: Vec<f64> = Vec::new();
    let mut covenant_breaches = 0u32;
    let mut insolvencies = 0u32;
    let mut invalid_paths = 0u32;

    for _ in 0..input.num_simulations {
        let exit_multiple = rng.sample(multiple_dist).max(input.exit_multiple_floor);
        let margin = rng.sample(margin_dist).max(input.margin_floor);
        let growth = rng.sample(growth_dist).max(input.growth_floor);

        let mut deal = base.clone();
        deal.exit_multiple = to_decimal("exit_multiple", exit_multiple)?;
        deal.ebitda_margin = to_decimal("ebitda_margin", margin)?;
        deal.rev_growth = to_decimal("rev_growth", growth)?;

        let outcome = LboEngine::new(deal).and_then(|engine| engine.run_outcome(input.years, None));
        match outcome {
            Ok(RunOutcome::Completed(run)) => {
                let positive_equity = run.exit.equity_value > Decimal::ZERO;
                match irr_as_f64(run.exit.irr) {
                    Some(irr) if positive_equity && irr >= input.irr_hurdle => irrs.push(irr),
                    _ => {}
                }
            }
            Ok(RunOutcome::CovenantBreach { .. }) => covenant_breaches += 1,
            Ok(RunOutcome::Insolvent { .. }) => insolvencies += 1,
            Err(e) => {
                tracing::debug!(error = %e, "monte carlo path rejected");
                invalid_paths += 1;
            }
        }
    }

    let n = input.num_simulations;
    let successes = irrs.len() as u32;
    if successes == 0 {
        warnings.push("No path met the success definition".into());
    }
    if invalid_paths > 0 {
        warnings.push(format!("{invalid_paths} sampled deal(s) failed validation"));
    }

    let (mean_irr, std_irr) = if irrs.is_empty() {
        (None, None)
    } else {
        (
            Some(irrs.iter().mean()),
            Some(irrs.iter().population_std_dev()),
        )
    };

    tracing::info!(
        paths = n,
        successes,
        covenant_breaches,
        insolvencies,
        "monte carlo complete"
    );

    let output = MonteCarloOutput {
        num_simulations: n,
        successes,
        failures: n - successes,
        covenant_breaches,
        insolvencies,
        invalid_paths,
        success_rate: successes as f64 / n as f64,
        mean_irr,
        median_irr: percentile(&irrs, 50.0),
        p10_irr: percentile(&irrs, 10.0),
        p90_irr: percentile(&irrs, 90.0),
        std_irr,
        irrs,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_precision(
        "Monte Carlo LBO (normal shocks to exit multiple, margin, growth)",
        &serde_json::json!({
            "num_simulations": n,
            "years": input.years,
            "seed": input.seed,
            "sigmas": {
                "exit_multiple": input.exit_multiple_sigma,
                "margin": input.margin_sigma,
                "growth": input.growth_sigma,
            },
            "irr_hurdle": input.irr_hurdle,
        }),
        warnings,
        elapsed,
        Precision::F64Sampling,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lbo::MoicBasis;
    use rust_decimal_macros::dec;

    fn input(seed: u64) -> MonteCarloInput {
        let base = DealAssumptions {
            enterprise_value: dec!(1000),
            debt_pct: dec!(0.6),
            revenue0: dec!(500),
            rev_growth: dec!(0.05),
            ebitda_margin: dec!(0.25),
            capex_pct: dec!(0.04),
            wc_pct: dec!(0.10),
            tax_rate: dec!(0.25),
            exit_multiple: dec!(9),
            interest_rate: dec!(0.07),
            bullet_rate: None,
            revolver_limit: Decimal::ZERO,
            revolver_rate: Decimal::ZERO,
            pik_rate: Decimal::ZERO,
            bullet_frac: dec!(0.7),
            amort_frac: dec!(0.3),
            mezz_frac: Decimal::ZERO,
            mezz_rate: Decimal::ZERO,
            amort_schedule: None,
            icr_hurdle: None,
            leverage_hurdle: None,
            da_pct: dec!(0.03),
            cash_sweep_pct: Decimal::ONE,
            sale_cost_pct: Decimal::ZERO,
            working_capital_days: None,
            lease: None,
            moic_basis: MoicBasis::ExitEquity,
        };
        MonteCarloInput {
            base,
            years: 5,
            num_simulations: 200,
            seed: Some(seed),
            exit_multiple_sigma: default_multiple_sigma(),
            margin_sigma: default_margin_sigma(),
            growth_sigma: default_growth_sigma(),
            exit_multiple_floor: default_multiple_floor(),
            margin_floor: default_margin_floor(),
            growth_floor: default_growth_floor(),
            irr_hurdle: default_irr_hurdle(),
        }
    }

    #[test]
    fn test_seeded_runs_match() {
        let a = run_monte_carlo(&input(42)).unwrap().result;
        let b = run_monte_carlo(&input(42)).unwrap().result;
        assert_eq!(a.irrs, b.irrs);
        assert_eq!(a.successes, b.successes);
    }

    #[test]
    fn test_counts_add_up() {
        let out = run_monte_carlo(&input(1)).unwrap().result;
        assert_eq!(out.successes + out.failures, 200);
        assert!(out.covenant_breaches + out.insolvencies + out.invalid_paths <= out.failures);
        assert!(out.successes > 0);
        let (p10, med, p90) = (
            out.p10_irr.unwrap(),
            out.median_irr.unwrap(),
            out.p90_irr.unwrap(),
        );
        assert!(p10 <= med && med <= p90);
        assert!(out.irrs.iter().all(|irr| *irr >= 0.08));
    }

    #[test]
    fn test_tight_covenant_counts_breaches() {
        let mut mc = input(3);
        mc.base.icr_hurdle = Some(dec!(2.95));
        let out = run_monte_carlo(&mc).unwrap().result;
        // Base year-1 ICR is ~2.98x so margin shocks push some paths under
        assert!(out.covenant_breaches > 0);
    }

    #[test]
    fn test_zero_paths_rejected() {
        let mut mc = input(1);
        mc.num_simulations = 0;
        assert!(run_monte_carlo(&mc).is_err());
    }
}
