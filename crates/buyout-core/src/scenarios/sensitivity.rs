use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::BuyoutError;
use crate::lbo::{DealAssumptions, LboEngine, LboRun};
use crate::scenarios::bootstrap::{bootstrap_irr, BootstrapConfig};
use crate::types::*;
use crate::BuyoutResult;

/// Deal inputs a sensitivity can vary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LboParameter {
    EnterpriseValue,
    DebtPct,
    RevGrowth,
    EbitdaMargin,
    CapexPct,
    WcPct,
    TaxRate,
    ExitMultiple,
    InterestRate,
    PikRate,
    RevolverLimit,
    CashSweepPct,
    SaleCostPct,
    DaPct,
}

impl LboParameter {
    pub fn apply(self, deal: &mut DealAssumptions, value: Decimal) {
        let field = match self {
            LboParameter::EnterpriseValue => &mut deal.enterprise_value,
            LboParameter::DebtPct => &mut deal.debt_pct,
            LboParameter::RevGrowth => &mut deal.rev_growth,
            LboParameter::EbitdaMargin => &mut deal.ebitda_margin,
            LboParameter::CapexPct => &mut deal.capex_pct,
            LboParameter::WcPct => &mut deal.wc_pct,
            LboParameter::TaxRate => &mut deal.tax_rate,
            LboParameter::ExitMultiple => &mut deal.exit_multiple,
            LboParameter::InterestRate => &mut deal.interest_rate,
            LboParameter::PikRate => &mut deal.pik_rate,
            LboParameter::RevolverLimit => &mut deal.revolver_limit,
            LboParameter::CashSweepPct => &mut deal.cash_sweep_pct,
            LboParameter::SaleCostPct => &mut deal.sale_cost_pct,
            LboParameter::DaPct => &mut deal.da_pct,
        };
        *field = value;
    }
}

/// Inclusive sweep over one parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParameterSweep {
    pub parameter: LboParameter,
    pub min: Decimal,
    pub max: Decimal,
    pub step: Decimal,
}

impl ParameterSweep {
    /// Values from min to max by step; max is always included.
    pub fn values(&self) -> BuyoutResult<Vec<Decimal>> {
        if self.step <= Decimal::ZERO {
            return Err(BuyoutError::InvalidInput {
                field: format!("sweep:{:?}", self.parameter),
                reason: "Step must be positive".into(),
            });
        }
        if self.min > self.max {
            return Err(BuyoutError::InvalidInput {
                field: format!("sweep:{:?}", self.parameter),
                reason: "Min must be <= max".into(),
            });
        }

        let mut values = Vec::new();
        let mut current = self.min;
        while current <= self.max {
            values.push(current);
            current += self.step;
        }
        if let Some(&last) = values.last() {
            if last < self.max {
                values.push(self.max);
            }
        }
        Ok(values)
    }
}

fn default_years() -> u32 {
    5
}

/// One-way sensitivity request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SensitivityInput {
    pub base: DealAssumptions,
    pub parameter: LboParameter,
    /// Explicit values; used instead of `sweep` when non-empty
    #[serde(default)]
    pub values: Vec<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sweep: Option<ParameterSweep>,
    #[serde(default = "default_years")]
    pub years: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_year: Option<u32>,
    /// Attach a bootstrapped IRR interval to every successful row
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bootstrap: Option<BootstrapConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityRow {
    pub value: Decimal,
    pub irr: Option<Rate>,
    pub moic: Option<Multiple>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub irr_ci_lower: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub irr_ci_upper: Option<f64>,
    /// Why this scenario produced no result
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityOutput {
    pub parameter: LboParameter,
    pub rows: Vec<SensitivityRow>,
}

/// Two-way sensitivity request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TwoWaySensitivityInput {
    pub base: DealAssumptions,
    pub sweep_1: ParameterSweep,
    pub sweep_2: ParameterSweep,
    #[serde(default = "default_years")]
    pub years: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_year: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwoWaySensitivityOutput {
    pub parameter_1: LboParameter,
    pub parameter_2: LboParameter,
    pub values_1: Vec<Decimal>,
    pub values_2: Vec<Decimal>,
    /// irr[i][j] at values_1[i], values_2[j]
    pub irr: Vec<Vec<Option<Rate>>>,
    pub moic: Vec<Vec<Option<Multiple>>>,
    pub failed_scenarios: u32,
}

/// Build a fresh engine for one scenario and run it.
fn run_scenario(
    base: &DealAssumptions,
    changes: &[(LboParameter, Decimal)],
    years: u32,
    exit_year: Option<u32>,
) -> BuyoutResult<LboRun> {
    let mut deal = base.clone();
    for (parameter, value) in changes {
        parameter.apply(&mut deal, *value);
    }
    LboEngine::new(deal)?.run(years, exit_year)
}

/// Vary one deal input; failed scenarios are recorded, never fatal.
pub fn run_sensitivity(
    input: &SensitivityInput,
) -> BuyoutResult<ComputationOutput<SensitivityOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let values = match (&input.values, &input.sweep) {
        (values, _) if !values.is_empty() => values.clone(),
        (_, Some(sweep)) => {
            if sweep.parameter != input.parameter {
                return Err(BuyoutError::InvalidInput {
                    field: "sweep.parameter".into(),
                    reason: "Sweep parameter must match the sensitivity parameter".into(),
                });
            }
            sweep.values()?
        }
        _ => {
            return Err(BuyoutError::InvalidInput {
                field: "values".into(),
                reason: "Provide explicit values or a sweep".into(),
            })
        }
    };

    let mut rows = Vec::with_capacity(values.len());
    for value in values {
        match run_scenario(
            &input.base,
            &[(input.parameter, value)],
            input.years,
            input.exit_year,
        ) {
            Ok(run) => {
                let mut row = SensitivityRow {
                    value,
                    irr: run.exit.irr,
                    moic: Some(run.exit.moic),
                    irr_ci_lower: None,
                    irr_ci_upper: None,
                    error: None,
                };
                if let Some(config) = &input.bootstrap {
                    if let Some(ci) = bootstrap_irr(&run.exit.cash_flows, config)? {
                        row.irr_ci_lower = Some(ci.lower);
                        row.irr_ci_upper = Some(ci.upper);
                    }
                }
                rows.push(row);
            }
            Err(e) => {
                if e.is_scenario_failure() {
                    tracing::warn!(
                        parameter = ?input.parameter,
                        %value,
                        error = %e,
                        "scenario failed"
                    );
                } else {
                    tracing::error!(
                        parameter = ?input.parameter,
                        %value,
                        error = %e,
                        "scenario rejected"
                    );
                }
                warnings.push(format!("{:?} = {value}: {e}", input.parameter));
                rows.push(SensitivityRow {
                    value,
                    irr: None,
                    moic: None,
                    irr_ci_lower: None,
                    irr_ci_upper: None,
                    error: Some(e.to_string()),
                });
            }
        }
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "One-Way LBO Sensitivity",
        &serde_json::json!({
            "parameter": input.parameter,
            "years": input.years,
            "exit_year": input.exit_year,
            "bootstrap": input.bootstrap,
        }),
        warnings,
        elapsed,
        SensitivityOutput {
            parameter: input.parameter,
            rows,
        },
    ))
}

/// IRR / MOIC grid over two deal inputs.
pub fn run_2d_sensitivity(
    input: &TwoWaySensitivityInput,
) -> BuyoutResult<ComputationOutput<TwoWaySensitivityOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let values_1 = input.sweep_1.values()?;
    let values_2 = input.sweep_2.values()?;
    let p1 = input.sweep_1.parameter;
    let p2 = input.sweep_2.parameter;

    let mut irr = Vec::with_capacity(values_1.len());
    let mut moic = Vec::with_capacity(values_1.len());
    let mut failed_scenarios = 0u32;

    for v1 in &values_1 {
        let mut irr_row = Vec::with_capacity(values_2.len());
        let mut moic_row = Vec::with_capacity(values_2.len());
        for v2 in &values_2 {
            match run_scenario(&input.base, &[(p1, *v1), (p2, *v2)], input.years, input.exit_year) {
                Ok(run) => {
                    irr_row.push(run.exit.irr);
                    moic_row.push(Some(run.exit.moic));
                }
                Err(e) => {
                    failed_scenarios += 1;
                    warnings.push(format!("Evaluation failed at ({v1}, {v2}): {e}"));
                    irr_row.push(None);
                    moic_row.push(None);
                }
            }
        }
        irr.push(irr_row);
        moic.push(moic_row);
    }

    tracing::debug!(
        cells = values_1.len() * values_2.len(),
        failed_scenarios,
        "two-way sensitivity complete"
    );

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Two-Way LBO Sensitivity",
        &serde_json::json!({
            "parameter_1": p1,
            "parameter_2": p2,
            "years": input.years,
        }),
        warnings,
        elapsed,
        TwoWaySensitivityOutput {
            parameter_1: p1,
            parameter_2: p2,
            values_1,
            values_2,
            irr,
            moic,
            failed_scenarios,
        },
    ))
}

/// IRR as f64 for charting consumers; `None` stays `None`.
pub fn irr_as_f64(irr: Option<Rate>) -> Option<f64> {
    irr.and_then(|r| r.to_f64())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lbo::MoicBasis;
    use rust_decimal_macros::dec;

    fn base() -> DealAssumptions {
        DealAssumptions {
            enterprise_value: dec!(1000),
            debt_pct: dec!(0.6),
            revenue0: dec!(500),
            rev_growth: dec!(0.05),
            ebitda_margin: dec!(0.25),
            capex_pct: dec!(0.04),
            wc_pct: dec!(0.10),
            tax_rate: dec!(0.25),
            exit_multiple: dec!(8),
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
        }
    }

    #[test]
    fn test_sweep_values_include_max() {
        let sweep = ParameterSweep {
            parameter: LboParameter::ExitMultiple,
            min: dec!(6),
            max: dec!(9),
            step: dec!(2),
        };
        assert_eq!(sweep.values().unwrap(), vec![dec!(6), dec!(8), dec!(9)]);
    }

    #[test]
    fn test_irr_rises_with_exit_multiple() {
        let input = SensitivityInput {
            base: base(),
            parameter: LboParameter::ExitMultiple,
            values: vec![dec!(6), dec!(8), dec!(10)],
            sweep: None,
            years: 5,
            exit_year: None,
            bootstrap: None,
        };
        let out = run_sensitivity(&input).unwrap().result;
        let irrs: Vec<Rate> = out.rows.iter().map(|r| r.irr.unwrap()).collect();
        assert!(irrs[0] < irrs[1] && irrs[1] < irrs[2]);
    }

    #[test]
    fn test_failed_scenario_recorded_as_none() {
        let mut deal = base();
        deal.icr_hurdle = Some(dec!(2.5));
        let input = SensitivityInput {
            base: deal,
            parameter: LboParameter::InterestRate,
            // 42 interest at 7% clears 2.5x; 60 at 10% does not
            values: vec![dec!(0.07), dec!(0.10)],
            sweep: None,
            years: 5,
            exit_year: None,
            bootstrap: None,
        };
        let out = run_sensitivity(&input).unwrap();
        let rows = &out.result.rows;
        assert!(rows[0].irr.is_some());
        assert_eq!(rows[1].irr, None);
        assert_eq!(rows[1].moic, None);
        assert!(rows[1].error.as_deref().unwrap().contains("ICR"));
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_invalid_value_does_not_abort_batch() {
        let input = SensitivityInput {
            base: base(),
            parameter: LboParameter::DebtPct,
            values: vec![dec!(0.5), dec!(1.5)],
            sweep: None,
            years: 3,
            exit_year: None,
            bootstrap: None,
        };
        let rows = run_sensitivity(&input).unwrap().result.rows;
        assert!(rows[0].error.is_none());
        assert!(rows[1].error.is_some());
    }

    #[test]
    fn test_bootstrap_interval_attached() {
        let input = SensitivityInput {
            base: base(),
            parameter: LboParameter::ExitMultiple,
            values: vec![dec!(8)],
            sweep: None,
            years: 5,
            exit_year: None,
            bootstrap: Some(BootstrapConfig {
                samples: 100,
                ci: (5.0, 95.0),
                seed: Some(7),
            }),
        };
        let row = &run_sensitivity(&input).unwrap().result.rows[0];
        let (lo, hi) = (row.irr_ci_lower.unwrap(), row.irr_ci_upper.unwrap());
        assert!(lo <= hi);
    }

    #[test]
    fn test_requires_values_or_sweep() {
        let input = SensitivityInput {
            base: base(),
            parameter: LboParameter::ExitMultiple,
            values: vec![],
            sweep: None,
            years: 5,
            exit_year: None,
            bootstrap: None,
        };
        assert!(run_sensitivity(&input).is_err());
    }

    #[test]
    fn test_two_way_grid_shape() {
        let input = TwoWaySensitivityInput {
            base: base(),
            sweep_1: ParameterSweep {
                parameter: LboParameter::ExitMultiple,
                min: dec!(7),
                max: dec!(9),
                step: dec!(1),
            },
            sweep_2: ParameterSweep {
                parameter: LboParameter::EbitdaMargin,
                min: dec!(0.20),
                max: dec!(0.30),
                step: dec!(0.05),
            },
            years: 5,
            exit_year: None,
        };
        let out = run_2d_sensitivity(&input).unwrap().result;
        assert_eq!(out.irr.len(), 3);
        assert_eq!(out.irr[0].len(), 3);
        assert_eq!(out.failed_scenarios, 0);
        // Higher multiple, same margin: better IRR
        assert!(out.irr[2][1].unwrap() > out.irr[0][1].unwrap());
    }
}
