use buyout_core::error::{BuyoutError, CovenantKind};
use buyout_core::lbo::{
    build_lbo, build_sources_uses, DealAssumptions, LboEngine, LboInput, MoicBasis, RunOutcome,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn mid_market_deal() -> DealAssumptions {
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

// ===========================================================================
// Full runs
// ===========================================================================

#[test]
fn test_five_year_run_shape() {
    let run = LboEngine::new(mid_market_deal()).unwrap().run(5, None).unwrap();

    assert_eq!(run.years.len(), 5);
    assert_eq!(run.exit.exit_year, 5);
    assert_eq!(run.exit.initial_equity, dec!(400));
    assert_eq!(run.exit.cash_flows.len(), 6);
    assert_eq!(run.exit.cash_flows[0], dec!(-400));
    assert_eq!(run.exit.equity_value, run.exit.terminal_value - run.exit.net_debt);
    assert_eq!(run.exit.net_debt, run.final_debt.total());
    assert_eq!(run.years[0].revenue, dec!(500));
    assert_eq!(run.years[1].revenue, dec!(525));
}

#[test]
fn test_full_sweep_deleverages_every_year() {
    let run = LboEngine::new(mid_market_deal()).unwrap().run(5, None).unwrap();

    let mut prev = dec!(600);
    for r in &run.years {
        assert!(r.total_debt <= prev, "debt rose in year {}", r.year);
        assert_eq!(r.revolver_draw, Decimal::ZERO);
        prev = r.total_debt;
    }
    // Senior default schedule is 180 / 5 per year
    assert_eq!(run.years[0].mandatory_repayment, dec!(36));
}

#[test]
fn test_returns_are_positive_for_healthy_deal() {
    let run = LboEngine::new(mid_market_deal()).unwrap().run(5, None).unwrap();
    let irr = run.exit.irr.expect("IRR should exist");
    assert!(irr > dec!(0.10), "IRR {irr}");
    assert!(run.exit.moic > Decimal::ONE);
    assert!(run.exit.entry_leverage.unwrap() == dec!(4.8));
}

#[test]
fn test_cash_identity_holds_each_year() {
    let run = LboEngine::new(mid_market_deal()).unwrap().run(5, None).unwrap();
    for r in &run.years {
        assert_eq!(
            r.levered_cf + r.revolver_draw,
            r.mandatory_repayment + r.cash_sweep + r.equity_cf
        );
    }
}

#[test]
fn test_leverage_breach_reported_with_history() {
    let mut deal = mid_market_deal();
    deal.leverage_hurdle = Some(dec!(4.0));
    let engine = LboEngine::new(deal).unwrap();

    match engine.run_outcome(5, None).unwrap() {
        RunOutcome::CovenantBreach { breach, years } => {
            assert_eq!(breach.kind, CovenantKind::Leverage);
            assert_eq!(breach.year, 1);
            assert!(years.is_empty());
        }
        other => panic!("expected breach, got {other:?}"),
    }

    let err = engine.run(5, None).unwrap_err();
    assert!(err.is_scenario_failure());
    assert!(matches!(err, BuyoutError::CovenantBreach(_)));
}

#[test]
fn test_exit_before_horizon_keeps_horizon_schedule() {
    let engine = LboEngine::new(mid_market_deal()).unwrap();
    let run = engine.run(5, Some(3)).unwrap();
    assert_eq!(run.years.len(), 3);
    // Amortisation still spread over the 5-year horizon
    assert_eq!(run.years[2].mandatory_repayment, dec!(36));
}

// ===========================================================================
// Enveloped run and JSON input
// ===========================================================================

#[test]
fn test_build_lbo_from_json() {
    let json = r#"{
        "assumptions": {
            "enterprise_value": "1000",
            "debt_pct": "0.6",
            "revenue": "500",
            "rev_growth": "0.05",
            "ebitda_margin": "0.25",
            "capex_pct": "0.04",
            "wc_pct": "0.10",
            "tax_rate": "0.25",
            "exit_multiple": "8",
            "interest_rate": "0.07",
            "da_pct": "0.03"
        },
        "years": 5
    }"#;
    let input: LboInput = serde_json::from_str(json).unwrap();
    assert_eq!(input.assumptions.bullet_frac, dec!(0.7));

    let out = build_lbo(&input).unwrap();
    assert!(out.result.sources_uses.balanced);
    assert_eq!(out.result.sources_uses.total_uses, dec!(1000));
    assert_eq!(out.result.run.years.len(), 5);
    assert_eq!(out.metadata.precision, "rust_decimal_128bit");
    assert!(out.methodology.contains("Leveraged Buyout"));
}

#[test]
fn test_build_lbo_rejects_zero_horizon() {
    let input = LboInput {
        assumptions: mid_market_deal(),
        years: 0,
        exit_year: None,
    };
    match build_lbo(&input).unwrap_err() {
        BuyoutError::InvalidInput { field, .. } => assert_eq!(field, "years"),
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_sources_uses_with_mezzanine() {
    let mut deal = mid_market_deal();
    deal.bullet_frac = dec!(0.5);
    deal.mezz_frac = dec!(0.2);
    deal.mezz_rate = dec!(0.11);
    let su = build_sources_uses(&deal);
    assert!(su.balanced);
    assert_eq!(su.total_sources, dec!(1000));
    assert!(su.sources.iter().any(|(name, amt)| name == "Mezzanine" && *amt == dec!(120)));
}

// ===========================================================================
// Properties
// ===========================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    // Balances never go negative and the revolver never exceeds its limit,
    // whatever the operating path.
    #[test]
    fn balances_stay_within_bounds(
        growth_bp in -1000i64..1500,
        margin_bp in 200i64..4000,
        limit in 0i64..200,
        sweep_pct in 0i64..=100,
    ) {
        let mut deal = mid_market_deal();
        deal.rev_growth = Decimal::new(growth_bp, 4);
        deal.ebitda_margin = Decimal::new(margin_bp, 4);
        deal.revolver_limit = Decimal::from(limit);
        deal.cash_sweep_pct = Decimal::new(sweep_pct, 2);

        let engine = LboEngine::new(deal).unwrap();
        let mut state = engine.initial_state(5);
        for _ in 0..5 {
            match engine.step(&state) {
                buyout_core::lbo::YearOutcome::Completed(step) => {
                    for t in &step.state.debt.tranches {
                        prop_assert!(t.balance() >= Decimal::ZERO);
                        if let Some(cap) = t.revolver_limit {
                            prop_assert!(t.balance() <= cap);
                        }
                    }
                    let r = &step.record;
                    let gap = (r.levered_cf + r.revolver_draw
                        - r.mandatory_repayment - r.cash_sweep - r.equity_cf).abs();
                    prop_assert!(gap < dec!(0.000001));
                    state = step.state;
                }
                _ => break,
            }
        }
    }

    // Sweeping more cash never leaves more debt behind.
    #[test]
    fn higher_sweep_never_increases_exit_debt(low in 0i64..=50, extra in 0i64..=50) {
        let run_with = |pct: i64| {
            let mut deal = mid_market_deal();
            deal.cash_sweep_pct = Decimal::new(pct, 2);
            LboEngine::new(deal).unwrap().run(5, None).unwrap()
        };
        let lo = run_with(low);
        let hi = run_with(low + extra);
        prop_assert!(hi.exit.net_debt <= lo.exit.net_debt);
    }
}

#[test]
fn test_engine_is_shareable_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<LboEngine>();

    let engine = std::sync::Arc::new(LboEngine::new(mid_market_deal()).unwrap());
    let handles: Vec<_> = [3u32, 4, 5]
        .into_iter()
        .map(|exit| {
            let engine = std::sync::Arc::clone(&engine);
            std::thread::spawn(move || engine.run(5, Some(exit)).map(|r| r.years.len()))
        })
        .collect();
    let lens: Vec<usize> = handles
        .into_iter()
        .map(|h| h.join().unwrap().unwrap())
        .collect();
    assert_eq!(lens, vec![3, 4, 5]);
}
