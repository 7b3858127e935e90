use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::error::BuyoutError;
use crate::numeric::percentile;
use crate::time_value::solve_irr;
use crate::types::Money;
use crate::BuyoutResult;

fn default_samples() -> u32 {
    1_000
}

fn default_ci() -> (f64, f64) {
    (2.5, 97.5)
}

/// Resampling settings for an IRR confidence interval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BootstrapConfig {
    #[serde(default = "default_samples")]
    pub samples: u32,
    /// Lower and upper percentiles, 0..=100
    #[serde(default = "default_ci")]
    pub ci: (f64, f64),
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            samples: default_samples(),
            ci: default_ci(),
            seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrrInterval {
    pub lower: f64,
    pub upper: f64,
    /// Resamples that produced an IRR
    pub valid_samples: u32,
}

fn validate(config: &BootstrapConfig) -> BuyoutResult<()> {
    if config.samples == 0 {
        return Err(BuyoutError::InvalidInput {
            field: "bootstrap.samples".into(),
            reason: "At least one resample is required".into(),
        });
    }
    let (lo, hi) = config.ci;
    if !(0.0..=100.0).contains(&lo) || !(0.0..=100.0).contains(&hi) || lo >= hi {
        return Err(BuyoutError::InvalidInput {
            field: "bootstrap.ci".into(),
            reason: "Percentiles must satisfy 0 <= lower < upper <= 100".into(),
        });
    }
    Ok(())
}

/// Percentile interval of IRRs over cash-flow lists resampled with replacement.
///
/// Returns `Ok(None)` when no resample admits an IRR.
pub fn bootstrap_irr(
    cash_flows: &[Money],
    config: &BootstrapConfig,
) -> BuyoutResult<Option<IrrInterval>> {
    validate(config)?;
    if cash_flows.len() < 2 {
        return Err(BuyoutError::InsufficientData(
            "Bootstrap requires at least 2 cash flows".into(),
        ));
    }

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let n = cash_flows.len();
    let mut irrs: Vec<f64> = Vec::with_capacity(config.samples as usize);
    let mut sample: Vec<Money> = Vec::with_capacity(n);

    for _ in 0..config.samples {
        sample.clear();
        sample.extend((0..n).map(|_| cash_flows[rng.gen_range(0..n)]));
        if let Some(irr) = solve_irr(&sample).and_then(|r| r.to_f64()) {
            irrs.push(irr);
        }
    }

    let (lo, hi) = config.ci;
    Ok(percentile(&irrs, lo)
        .zip(percentile(&irrs, hi))
        .map(|(lower, upper)| IrrInterval {
            lower,
            upper,
            valid_samples: irrs.len() as u32,
        }))
}
