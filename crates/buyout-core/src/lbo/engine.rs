use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::time::Instant;

use crate::error::{BuyoutError, CovenantBreach, CovenantKind, Insolvency};
use crate::lbo::assumptions::{DealAssumptions, MoicBasis};
use crate::lbo::covenants::CovenantMetrics;
use crate::lbo::sources_uses::{build_sources_uses, SourcesUses};
use crate::lbo::tranche::DebtState;
use crate::numeric::{div_or, is_negligible, round_rate, safe_div};
use crate::time_value::solve_irr;
use crate::types::*;
use crate::BuyoutResult;

const MAX_HORIZON_YEARS: u32 = 100;
/// Revenue ceiling that leaves Decimal headroom for valuation products
const MAX_PROJECTED_REVENUE: Money = dec!(1000000000000000000);

/// Operating and debt position at the end of a simulated year (year 0 = close).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LboState {
    pub year: u32,
    pub revenue: Money,
    pub wc_level: Money,
    pub debt: DebtState,
}

/// One simulated year of the ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearRecord {
    pub year: u32,
    pub revenue: Money,
    pub ebitda: Money,
    /// Total interest expense (cash + PIK)
    pub interest: Money,
    pub cash_interest: Money,
    pub pik_interest: Money,
    pub tax: Money,
    pub nopat: Money,
    pub da: Money,
    pub capex: Money,
    pub delta_wc: Money,
    pub levered_cf: Money,
    pub mandatory_repayment: Money,
    pub revolver_draw: Money,
    pub cash_sweep: Money,
    pub equity_cf: Money,
    /// Closing balance across all tranches
    pub total_debt: Money,
    pub icr: Option<Multiple>,
    pub leverage: Option<Multiple>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct YearStep {
    pub state: LboState,
    pub record: YearRecord,
}

/// Result of one pure year transition
#[derive(Debug, Clone, PartialEq)]
pub enum YearOutcome {
    Completed(YearStep),
    CovenantBreach(CovenantBreach),
    Insolvent(Insolvency),
}

/// Result of a full run. Failed runs keep the years completed before the failure.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Completed(LboRun),
    CovenantBreach {
        breach: CovenantBreach,
        years: Vec<YearRecord>,
    },
    Insolvent {
        insolvency: Insolvency,
        years: Vec<YearRecord>,
    },
}

impl RunOutcome {
    pub fn into_result(self) -> BuyoutResult<LboRun> {
        match self {
            RunOutcome::Completed(run) => Ok(run),
            RunOutcome::CovenantBreach { breach, .. } => Err(breach.into()),
            RunOutcome::Insolvent { insolvency, .. } => Err(insolvency.into()),
        }
    }
}

/// Exit valuation and sponsor returns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExitSummary {
    pub exit_year: u32,
    /// Exit EV net of sale costs
    pub terminal_value: Money,
    /// All tranche balances at exit, lease included
    pub net_debt: Money,
    pub equity_value: Money,
    pub initial_equity: Money,
    /// None when the cash flows admit no IRR
    pub irr: Option<Rate>,
    pub moic: Multiple,
    pub moic_basis: MoicBasis,
    pub entry_leverage: Option<Multiple>,
    pub exit_leverage: Option<Multiple>,
    /// Sponsor cash flows, year 0 first, exit proceeds folded into the last year
    pub cash_flows: Vec<Money>,
}

/// A completed LBO run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LboRun {
    pub years: Vec<YearRecord>,
    pub exit: ExitSummary,
    pub covenants: CovenantMetrics,
    pub final_debt: DebtState,
}

impl LboRun {
    /// Ledger entry for `year` (1-based).
    pub fn year(&self, year: u32) -> Option<&YearRecord> {
        self.years.iter().find(|r| r.year == year)
    }

    /// Short plain-text report of the run.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let exit = &self.exit;
        let _ = writeln!(out, "LBO run: {} year(s)", exit.exit_year);
        for r in &self.years {
            let _ = writeln!(
                out,
                "  Year {:>2}: revenue {:.2}, EBITDA {:.2}, equity CF {:.2}, debt {:.2}",
                r.year, r.revenue, r.ebitda, r.equity_cf, r.total_debt
            );
        }
        let _ = writeln!(out, "Terminal value: {:.2}", exit.terminal_value);
        let _ = writeln!(out, "Net debt at exit: {:.2}", exit.net_debt);
        let _ = writeln!(out, "Exit equity: {:.2}", exit.equity_value);
        match exit.irr {
            Some(irr) => {
                let _ = writeln!(out, "IRR: {:.2}%", irr * Decimal::ONE_HUNDRED);
            }
            None => {
                let _ = writeln!(out, "IRR: n/a");
            }
        }
        let _ = write!(out, "MOIC: {:.2}x", exit.moic);
        out
    }
}

/// LBO cash-flow engine over a validated deal.
///
/// Each year is a pure function of the previous [`LboState`]; the engine holds
/// nothing mutable and can be shared across threads.
#[derive(Debug, Clone)]
pub struct LboEngine {
    deal: DealAssumptions,
}

impl LboEngine {
    pub fn new(deal: DealAssumptions) -> BuyoutResult<Self> {
        deal.validate()?;
        Ok(Self { deal })
    }

    pub fn assumptions(&self) -> &DealAssumptions {
        &self.deal
    }

    pub fn initial_equity(&self) -> Money {
        self.deal.initial_equity()
    }

    /// State at close. Default amortisation spreads over `horizon` years.
    pub fn initial_state(&self, horizon: u32) -> LboState {
        let mut debt = self.deal.opening_debt();
        for tranche in debt.tranches.iter_mut() {
            tranche.ensure_schedule(horizon);
        }
        LboState {
            year: 0,
            revenue: self.deal.revenue0,
            wc_level: self.deal.wc_level(self.deal.revenue0),
            debt,
        }
    }

    /// Simulate the year following `prev`.
    pub fn step(&self, prev: &LboState) -> YearOutcome {
        let d = &self.deal;
        let year = prev.year + 1;
        let mut debt = prev.debt.clone();

        let revenue = if year == 1 {
            prev.revenue
        } else {
            prev.revenue * (Decimal::ONE + d.rev_growth)
        };
        let ebitda = revenue * d.ebitda_margin;

        let charge = debt.charge_interest();
        let interest = charge.total();

        if let Some(breach) = self.check_covenants(year, ebitda, interest, debt.total()) {
            return YearOutcome::CovenantBreach(breach);
        }

        let da = revenue * d.da_pct;
        let capex = revenue * d.capex_pct;
        let wc_level = d.wc_level(revenue);
        let delta_wc = wc_level - prev.wc_level;

        let ebt = ebitda - interest - da;
        let tax = ebt.max(Decimal::ZERO) * d.tax_rate;
        let nopat = ebt - tax;
        let levered_cf = nopat + da - capex - delta_wc;

        // Mandatory service: cash first, then the revolver
        let mut cash = levered_cf;
        let mut mandatory_repayment = Decimal::ZERO;
        let mut revolver_draw = Decimal::ZERO;
        let revolver = debt.revolver_index();

        for i in 0..debt.tranches.len() {
            let due = debt.tranches[i].scheduled_due(year);
            if due <= Decimal::ZERO {
                continue;
            }
            let from_cash = cash.max(Decimal::ZERO).min(due);
            cash -= from_cash;
            let mut shortfall = due - from_cash;

            if shortfall > Decimal::ZERO {
                if let Some(r) = revolver {
                    let drawn = debt.tranches[r].draw(shortfall);
                    revolver_draw += drawn;
                    shortfall -= drawn;
                }
            }
            if !is_negligible(shortfall) {
                return YearOutcome::Insolvent(Insolvency {
                    year,
                    tranche: debt.tranches[i].name.clone(),
                    shortfall,
                });
            }

            mandatory_repayment += debt.tranches[i].repay(due);
        }

        let sweep_allotment = cash.max(Decimal::ZERO) * d.cash_sweep_pct;
        let cash_sweep = debt.sweep(sweep_allotment);
        let equity_cf = cash - cash_sweep;

        let total_debt = debt.total();
        let icr = if interest > Decimal::ZERO {
            safe_div(ebitda, interest)
        } else {
            None
        };
        let leverage = if ebitda > Decimal::ZERO {
            safe_div(total_debt, ebitda)
        } else {
            None
        };

        tracing::debug!(
            year,
            %revenue,
            %ebitda,
            %levered_cf,
            %equity_cf,
            %total_debt,
            "simulated year"
        );

        YearOutcome::Completed(YearStep {
            state: LboState {
                year,
                revenue,
                wc_level,
                debt,
            },
            record: YearRecord {
                year,
                revenue,
                ebitda,
                interest,
                cash_interest: charge.cash,
                pik_interest: charge.pik,
                tax,
                nopat,
                da,
                capex,
                delta_wc,
                levered_cf,
                mandatory_repayment,
                revolver_draw,
                cash_sweep,
                equity_cf,
                total_debt,
                icr,
                leverage,
            },
        })
    }

    fn check_covenants(
        &self,
        year: u32,
        ebitda: Money,
        interest: Money,
        total_debt: Money,
    ) -> Option<CovenantBreach> {
        if let Some(hurdle) = self.deal.icr_hurdle {
            if interest > Decimal::ZERO {
                let icr = div_or(ebitda, interest, Decimal::ZERO);
                if icr < hurdle {
                    return Some(CovenantBreach {
                        kind: CovenantKind::Icr,
                        year,
                        observed: icr,
                        hurdle,
                    });
                }
            }
        }

        if let Some(hurdle) = self.deal.leverage_hurdle {
            if total_debt > Decimal::ZERO {
                let observed = if ebitda > Decimal::ZERO {
                    div_or(total_debt, ebitda, Decimal::MAX)
                } else {
                    Decimal::MAX
                };
                if observed > hurdle {
                    return Some(CovenantBreach {
                        kind: CovenantKind::Leverage,
                        year,
                        observed,
                        hurdle,
                    });
                }
            }
        }

        None
    }

    fn check_horizon(&self, years: u32, exit_year: Option<u32>) -> BuyoutResult<u32> {
        if years == 0 || years > MAX_HORIZON_YEARS {
            return Err(BuyoutError::InvalidInput {
                field: "years".into(),
                reason: format!(
                    "Projection horizon must be between 1 and {MAX_HORIZON_YEARS} years"
                ),
            });
        }
        let exit_year = exit_year.unwrap_or(years);
        if exit_year == 0 || exit_year > years {
            return Err(BuyoutError::InvalidInput {
                field: "exit_year".into(),
                reason: format!("Exit year must be between 1 and {years}"),
            });
        }

        let terminal_revenue = (Decimal::ONE + self.deal.rev_growth)
            .checked_powi(i64::from(exit_year - 1))
            .and_then(|growth| growth.checked_mul(self.deal.revenue0))
            .filter(|revenue| revenue.abs() <= MAX_PROJECTED_REVENUE);
        if terminal_revenue.is_none() {
            return Err(BuyoutError::InvalidInput {
                field: "rev_growth".into(),
                reason: format!("Revenue compounded over {exit_year} years is out of range"),
            });
        }
        Ok(exit_year)
    }

    /// Simulate to exit, returning breach or insolvency as a tagged outcome.
    pub fn run_outcome(&self, years: u32, exit_year: Option<u32>) -> BuyoutResult<RunOutcome> {
        let exit_year = self.check_horizon(years, exit_year)?;

        let mut state = self.initial_state(years);
        let mut records: Vec<YearRecord> = Vec::with_capacity(exit_year as usize);

        while state.year < exit_year {
            match self.step(&state) {
                YearOutcome::Completed(step) => {
                    records.push(step.record);
                    state = step.state;
                }
                YearOutcome::CovenantBreach(breach) => {
                    tracing::warn!(%breach, "covenant breached");
                    return Ok(RunOutcome::CovenantBreach {
                        breach,
                        years: records,
                    });
                }
                YearOutcome::Insolvent(insolvency) => {
                    tracing::warn!(%insolvency, "insolvent");
                    return Ok(RunOutcome::Insolvent {
                        insolvency,
                        years: records,
                    });
                }
            }
        }

        let exit = self.exit_summary(exit_year, &state, &records);
        let covenants = CovenantMetrics::from_records(
            &records,
            self.deal.icr_hurdle,
            self.deal.leverage_hurdle,
        );

        Ok(RunOutcome::Completed(LboRun {
            years: records,
            exit,
            covenants,
            final_debt: state.debt,
        }))
    }

    /// Simulate to exit. Breach and insolvency surface as errors.
    pub fn run(&self, years: u32, exit_year: Option<u32>) -> BuyoutResult<LboRun> {
        self.run_outcome(years, exit_year)?.into_result()
    }

    fn exit_summary(
        &self,
        exit_year: u32,
        state: &LboState,
        records: &[YearRecord],
    ) -> ExitSummary {
        let d = &self.deal;
        let initial_equity = d.initial_equity();
        let exit_ebitda = records.last().map(|r| r.ebitda).unwrap_or(Decimal::ZERO);

        let terminal_value = exit_ebitda * d.exit_multiple * (Decimal::ONE - d.sale_cost_pct);
        let net_debt = state.debt.total();
        let equity_value = terminal_value - net_debt;

        let mut cash_flows: Vec<Money> = Vec::with_capacity(records.len() + 1);
        cash_flows.push(-initial_equity);
        cash_flows.extend(records.iter().map(|r| r.equity_cf));
        if let Some(last) = cash_flows.last_mut() {
            *last += equity_value;
        }

        let irr = solve_irr(&cash_flows).map(round_rate);
        if irr.is_none() {
            tracing::warn!(exit_year, "no IRR for sponsor cash flows");
        }

        let moic = match d.moic_basis {
            MoicBasis::ExitEquity => div_or(equity_value, initial_equity, Decimal::ZERO),
            MoicBasis::TotalInflows => {
                let interim: Money = records
                    .iter()
                    .map(|r| r.equity_cf.max(Decimal::ZERO))
                    .sum();
                div_or(
                    interim + equity_value.max(Decimal::ZERO),
                    initial_equity,
                    Decimal::ZERO,
                )
            }
        };

        let entry_ebitda = d.revenue0 * d.ebitda_margin;
        let entry_debt = d.opening_debt().total();
        let entry_leverage = if entry_ebitda > Decimal::ZERO {
            safe_div(entry_debt, entry_ebitda)
        } else {
            None
        };
        let exit_leverage = if exit_ebitda > Decimal::ZERO {
            safe_div(net_debt, exit_ebitda)
        } else {
            None
        };

        ExitSummary {
            exit_year,
            terminal_value,
            net_debt,
            equity_value,
            initial_equity,
            irr,
            moic,
            moic_basis: d.moic_basis,
            entry_leverage,
            exit_leverage,
            cash_flows,
        }
    }
}

/// Input for a single enveloped LBO run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LboInput {
    pub assumptions: DealAssumptions,
    /// Projection horizon (also the default amortisation horizon)
    pub years: u32,
    /// Exit year, defaults to `years`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_year: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LboOutput {
    pub sources_uses: SourcesUses,
    pub run: LboRun,
}

/// Run the LBO and wrap it with Sources & Uses in the standard envelope.
pub fn build_lbo(input: &LboInput) -> BuyoutResult<ComputationOutput<LboOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let engine = LboEngine::new(input.assumptions.clone())?;
    let run = engine.run(input.years, input.exit_year)?;
    let sources_uses = build_sources_uses(&input.assumptions);

    if run.exit.irr.is_none() {
        warnings.push("IRR undefined for the sponsor cash flows".into());
    }
    if run.exit.equity_value < Decimal::ZERO {
        warnings.push(format!(
            "Exit equity is negative ({:.2}); debt exceeds exit value",
            run.exit.equity_value
        ));
    }
    if run.years.iter().any(|r| r.revolver_draw > Decimal::ZERO) {
        warnings.push("Revolver drawn to meet scheduled amortisation".into());
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Leveraged Buyout (multi-tranche, covenant-tested)",
        input,
        warnings,
        elapsed,
        LboOutput { sources_uses, run },
    ))
}
