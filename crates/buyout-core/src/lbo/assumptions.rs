use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::BuyoutError;
use crate::lbo::tranche::{DebtState, DebtTranche, TrancheKind};
use crate::types::*;
use crate::BuyoutResult;

const DAYS_PER_YEAR: Decimal = dec!(365);

/// How MOIC is measured at exit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoicBasis {
    /// Exit equity value / initial equity
    #[default]
    ExitEquity,
    /// (Positive interim equity cash flows + exit equity) / initial equity
    TotalInflows,
}

/// Net working capital driven by days outstanding instead of a flat % of revenue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkingCapitalDays {
    pub receivable_days: Decimal,
    pub payable_days: Decimal,
    #[serde(default)]
    pub deferred_revenue_days: Decimal,
}

impl WorkingCapitalDays {
    /// NWC level for a year's revenue on a 365-day year.
    pub fn level(&self, revenue: Money) -> Money {
        revenue / DAYS_PER_YEAR
            * (self.receivable_days - self.payable_days - self.deferred_revenue_days)
    }
}

/// IFRS-16 lease liability carried as debt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LeaseAssumptions {
    pub balance: Money,
    pub rate: Rate,
    pub amort_years: u32,
}

fn default_bullet_frac() -> Rate {
    dec!(0.7)
}

fn default_amort_frac() -> Rate {
    dec!(0.3)
}

fn default_sweep() -> Rate {
    Decimal::ONE
}

/// Deal configuration for the LBO engine. Validated once by
/// [`validate`](Self::validate); the engine never sees an invalid set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DealAssumptions {
    /// Purchase enterprise value
    pub enterprise_value: Money,
    /// Funded debt as a fraction of EV
    pub debt_pct: Rate,
    /// Base-year revenue
    #[serde(alias = "revenue")]
    pub revenue0: Money,
    /// Annual revenue growth, first applied in year 2
    pub rev_growth: Rate,
    pub ebitda_margin: Rate,
    pub capex_pct: Rate,
    /// NWC level as a fraction of revenue (ignored when `working_capital_days` is set)
    pub wc_pct: Rate,
    pub tax_rate: Rate,
    /// Exit EV / EBITDA
    pub exit_multiple: Multiple,
    /// Cash rate on the amortising senior tranche
    pub interest_rate: Rate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bullet_rate: Option<Rate>,
    #[serde(default)]
    pub revolver_limit: Money,
    #[serde(default)]
    pub revolver_rate: Rate,
    /// When positive the bullet tranche accrues PIK at this rate
    #[serde(default)]
    pub pik_rate: Rate,
    #[serde(default = "default_bullet_frac")]
    pub bullet_frac: Rate,
    #[serde(default = "default_amort_frac")]
    pub amort_frac: Rate,
    #[serde(default)]
    pub mezz_frac: Rate,
    #[serde(default)]
    pub mezz_rate: Rate,
    /// Required repayments on the senior tranche, index = year - 1
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amort_schedule: Option<Vec<Money>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icr_hurdle: Option<Multiple>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leverage_hurdle: Option<Multiple>,
    #[serde(default)]
    pub da_pct: Rate,
    #[serde(default = "default_sweep")]
    pub cash_sweep_pct: Rate,
    #[serde(default)]
    pub sale_cost_pct: Rate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_capital_days: Option<WorkingCapitalDays>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lease: Option<LeaseAssumptions>,
    #[serde(default)]
    pub moic_basis: MoicBasis,
}

fn invalid(field: &str, reason: &str) -> BuyoutError {
    BuyoutError::InvalidInput {
        field: field.into(),
        reason: reason.into(),
    }
}

fn check_unit_interval(field: &str, value: Rate) -> BuyoutResult<()> {
    if value < Decimal::ZERO || value > Decimal::ONE {
        return Err(invalid(field, "must be between 0 and 1"));
    }
    Ok(())
}

fn check_non_negative(field: &str, value: Decimal) -> BuyoutResult<()> {
    if value < Decimal::ZERO {
        return Err(invalid(field, "cannot be negative"));
    }
    Ok(())
}

impl DealAssumptions {
    /// Reject any configuration the engine cannot simulate.
    pub fn validate(&self) -> BuyoutResult<()> {
        if self.enterprise_value <= Decimal::ZERO {
            return Err(invalid(
                "enterprise_value",
                "Enterprise value must be positive",
            ));
        }
        if self.revenue0 <= Decimal::ZERO {
            return Err(invalid("revenue0", "Base revenue must be positive"));
        }
        if self.exit_multiple <= Decimal::ZERO {
            return Err(invalid("exit_multiple", "Exit multiple must be positive"));
        }
        if self.ebitda_margin > Decimal::ONE {
            return Err(invalid("ebitda_margin", "EBITDA margin cannot exceed 100%"));
        }
        if self.rev_growth <= dec!(-1) {
            return Err(invalid("rev_growth", "Revenue growth must exceed -100%"));
        }

        check_unit_interval("debt_pct", self.debt_pct)?;
        check_unit_interval("tax_rate", self.tax_rate)?;
        check_unit_interval("cash_sweep_pct", self.cash_sweep_pct)?;
        check_unit_interval("sale_cost_pct", self.sale_cost_pct)?;

        for (field, value) in [
            ("capex_pct", self.capex_pct),
            ("wc_pct", self.wc_pct),
            ("da_pct", self.da_pct),
            ("interest_rate", self.interest_rate),
            ("revolver_limit", self.revolver_limit),
            ("revolver_rate", self.revolver_rate),
            ("pik_rate", self.pik_rate),
            ("mezz_rate", self.mezz_rate),
            ("bullet_frac", self.bullet_frac),
            ("amort_frac", self.amort_frac),
            ("mezz_frac", self.mezz_frac),
        ] {
            check_non_negative(field, value)?;
        }
        if let Some(rate) = self.bullet_rate {
            check_non_negative("bullet_rate", rate)?;
        }

        if self.bullet_frac + self.amort_frac + self.mezz_frac > Decimal::ONE {
            return Err(invalid(
                "bullet_frac",
                "bullet_frac + amort_frac + mezz_frac cannot exceed 1",
            ));
        }

        if let Some(schedule) = &self.amort_schedule {
            if schedule.iter().any(|p| *p < Decimal::ZERO) {
                return Err(invalid(
                    "amort_schedule",
                    "Scheduled repayments cannot be negative",
                ));
            }
        }

        for (field, hurdle) in [
            ("icr_hurdle", self.icr_hurdle),
            ("leverage_hurdle", self.leverage_hurdle),
        ] {
            if matches!(hurdle, Some(h) if h <= Decimal::ZERO) {
                return Err(invalid(field, "Covenant hurdle must be positive"));
            }
        }

        if let Some(days) = &self.working_capital_days {
            check_non_negative("working_capital_days.receivable_days", days.receivable_days)?;
            check_non_negative("working_capital_days.payable_days", days.payable_days)?;
            check_non_negative(
                "working_capital_days.deferred_revenue_days",
                days.deferred_revenue_days,
            )?;
        }

        if let Some(lease) = &self.lease {
            check_non_negative("lease.balance", lease.balance)?;
            check_non_negative("lease.rate", lease.rate)?;
            if lease.amort_years == 0 {
                return Err(invalid("lease.amort_years", "must be at least 1"));
            }
        }

        if self.initial_equity() <= Decimal::ZERO {
            return Err(invalid(
                "debt_pct",
                "Funded debt leaves no positive sponsor equity",
            ));
        }

        Ok(())
    }

    fn funded(&self) -> Money {
        self.enterprise_value * self.debt_pct
    }

    pub fn bullet_amount(&self) -> Money {
        self.funded() * self.bullet_frac
    }

    pub fn mezz_amount(&self) -> Money {
        self.funded() * self.mezz_frac
    }

    pub fn amort_amount(&self) -> Money {
        self.funded() * self.amort_frac
    }

    /// Debt raised at entry. The revolver starts undrawn and the lease is not
    /// a funding source.
    pub fn total_debt(&self) -> Money {
        self.bullet_amount() + self.mezz_amount() + self.amort_amount()
    }

    /// Sponsor equity cheque; plugs any unallocated debt fraction.
    pub fn initial_equity(&self) -> Money {
        self.enterprise_value - self.total_debt()
    }

    /// NWC level for `revenue` under whichever working-capital basis is set.
    pub fn wc_level(&self, revenue: Money) -> Money {
        match &self.working_capital_days {
            Some(days) => days.level(revenue),
            None => revenue * self.wc_pct,
        }
    }

    /// Entry capital structure in declaration (sweep) order:
    /// lease, bullet, mezzanine, senior, revolver.
    pub fn opening_debt(&self) -> DebtState {
        let mut tranches = Vec::with_capacity(5);

        if let Some(lease) = &self.lease {
            let annual = lease.balance / Decimal::from(lease.amort_years);
            tranches.push(
                DebtTranche::new("Lease", TrancheKind::Lease, lease.balance, lease.rate)
                    .with_amortization(Some(vec![annual; lease.amort_years as usize])),
            );
        }

        let bullet = if self.pik_rate > Decimal::ZERO {
            DebtTranche::new("Bullet", TrancheKind::Bullet, self.bullet_amount(), self.pik_rate)
                .with_pik()
        } else {
            DebtTranche::new(
                "Bullet",
                TrancheKind::Bullet,
                self.bullet_amount(),
                self.bullet_rate.unwrap_or(self.interest_rate),
            )
        };
        tranches.push(bullet);

        if self.mezz_frac > Decimal::ZERO {
            tranches.push(DebtTranche::new(
                "Mezzanine",
                TrancheKind::Mezzanine,
                self.mezz_amount(),
                self.mezz_rate,
            ));
        }

        tranches.push(
            DebtTranche::new(
                "Senior",
                TrancheKind::Senior,
                self.amort_amount(),
                self.interest_rate,
            )
            .with_amortization(self.amort_schedule.clone()),
        );

        if self.revolver_limit > Decimal::ZERO {
            tranches.push(DebtTranche::revolver(
                "Revolver",
                self.revolver_limit,
                self.revolver_rate,
            ));
        }

        DebtState::new(tranches)
    }
}
