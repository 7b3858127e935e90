#![cfg(feature = "scenarios")]

use buyout_core::lbo::{DealAssumptions, LboEngine, MoicBasis};
use buyout_core::scenarios::{
    bootstrap_irr, run_2d_sensitivity, run_monte_carlo, run_sensitivity, BootstrapConfig,
    LboParameter, MonteCarloInput, ParameterSweep, SensitivityInput, TwoWaySensitivityInput,
};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn deal() -> DealAssumptions {
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
        revolver_limit: dec!(50),
        revolver_rate: dec!(0.05),
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
fn test_exit_multiple_sweep_is_monotonic() {
    let input = SensitivityInput {
        base: deal(),
        parameter: LboParameter::ExitMultiple,
        values: Vec::new(),
        sweep: Some(ParameterSweep {
            parameter: LboParameter::ExitMultiple,
            min: dec!(6),
            max: dec!(10),
            step: dec!(1),
        }),
        years: 5,
        exit_year: None,
        bootstrap: None,
    };
    let out = run_sensitivity(&input).unwrap().result;
    assert_eq!(out.rows.len(), 5);

    let irrs: Vec<Decimal> = out.rows.iter().map(|r| r.irr.unwrap()).collect();
    assert!(irrs.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_rate_sweep_records_breaches_without_aborting() {
    let mut base = deal();
    base.icr_hurdle = Some(dec!(2.5));
    let input = SensitivityInput {
        base,
        parameter: LboParameter::InterestRate,
        values: vec![dec!(0.05), dec!(0.07), dec!(0.12)],
        sweep: None,
        years: 5,
        exit_year: None,
        bootstrap: None,
    };
    let out = run_sensitivity(&input).unwrap();
    let rows = &out.result.rows;

    assert!(rows[0].irr.is_some());
    assert!(rows[1].irr.is_some());
    assert_eq!(rows[2].irr, None);
    assert!(rows[2].error.as_deref().unwrap().contains("ICR"));
    assert!(!out.warnings.is_empty());
}

#[test]
fn test_two_way_grid_matches_single_runs() {
    let input = TwoWaySensitivityInput {
        base: deal(),
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
    assert_eq!(out.values_1.len(), 3);
    assert_eq!(out.values_2.len(), 3);
    assert_eq!(out.failed_scenarios, 0);

    let mut single = deal();
    single.exit_multiple = dec!(9);
    single.ebitda_margin = dec!(0.20);
    let run = LboEngine::new(single).unwrap().run(5, None).unwrap();
    assert_eq!(out.irr[2][0], run.exit.irr);
}

#[test]
fn test_bootstrap_on_lbo_cash_flows() {
    let mut base = deal();
    base.cash_sweep_pct = dec!(0.5);
    let run = LboEngine::new(base).unwrap().run(5, None).unwrap();
    let cfg = BootstrapConfig {
        samples: 300,
        ci: (5.0, 95.0),
        seed: Some(11),
    };
    let ci = bootstrap_irr(&run.exit.cash_flows, &cfg).unwrap().unwrap();
    assert!(ci.lower <= ci.upper);
    assert!(ci.valid_samples <= 300);
}

#[test]
fn test_monte_carlo_from_json_defaults() {
    let json = r#"{
        "base": {
            "enterprise_value": 1000,
            "debt_pct": 0.6,
            "revenue0": 500,
            "rev_growth": 0.05,
            "ebitda_margin": 0.25,
            "capex_pct": 0.04,
            "wc_pct": 0.10,
            "tax_rate": 0.25,
            "exit_multiple": 9,
            "interest_rate": 0.07,
            "da_pct": 0.03
        },
        "num_simulations": 100,
        "seed": 7
    }"#;
    let input: MonteCarloInput = serde_json::from_str(json).unwrap();
    assert_eq!(input.years, 5);
    assert_eq!(input.exit_multiple_floor, 6.0);

    let out = run_monte_carlo(&input).unwrap();
    let result = out.result;
    assert_eq!(result.num_simulations, 100);
    assert_eq!(result.successes as usize, result.irrs.len());
    assert!(result.success_rate > 0.5);
    assert_eq!(out.metadata.precision, "ieee754_f64_sampling");
}

#[test]
fn test_monte_carlo_rejects_invalid_base() {
    let mut base = deal();
    base.debt_pct = dec!(1.2);
    let input = MonteCarloInput {
        base,
        years: 5,
        num_simulations: 10,
        seed: Some(1),
        exit_multiple_sigma: 0.75,
        margin_sigma: 0.015,
        growth_sigma: 0.02,
        exit_multiple_floor: 6.0,
        margin_floor: 0.10,
        growth_floor: -0.02,
        irr_hurdle: 0.08,
    };
    assert!(run_monte_carlo(&input).is_err());
}
