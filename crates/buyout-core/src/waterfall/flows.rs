use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[cfg(feature = "lbo")]
use crate::lbo::LboRun;
use crate::types::*;
use crate::waterfall::engine::{
    default_gp_commitment, default_mgmt_fee, ClawbackInterest, FeeBasis, WaterfallInput,
    WaterfallTier,
};

/// Capital calls and gross distributions, one entry per year.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FundFlows {
    pub capital_calls: Vec<Money>,
    pub distributions: Vec<Money>,
}

impl FundFlows {
    /// Sponsor equity flows of an LBO as fund flows.
    ///
    /// Year 0 calls the initial equity. Negative interim equity cash flows are
    /// further calls, positive ones distributions, and exit equity (floored at
    /// zero) is distributed in the exit year.
    #[cfg(feature = "lbo")]
    pub fn from_lbo_run(run: &LboRun) -> Self {
        let mut capital_calls = Vec::with_capacity(run.years.len() + 1);
        let mut distributions = Vec::with_capacity(run.years.len() + 1);

        capital_calls.push(run.exit.initial_equity);
        distributions.push(Decimal::ZERO);

        for record in &run.years {
            if record.equity_cf < Decimal::ZERO {
                capital_calls.push(-record.equity_cf);
                distributions.push(Decimal::ZERO);
            } else {
                capital_calls.push(Decimal::ZERO);
                distributions.push(record.equity_cf);
            }
        }

        if let Some(last) = distributions.last_mut() {
            *last += run.exit.equity_value.max(Decimal::ZERO);
        }

        Self {
            capital_calls,
            distributions,
        }
    }

    pub fn total_called(&self) -> Money {
        self.capital_calls.iter().sum()
    }

    /// Waterfall input over these flows with the given terms.
    pub fn into_input(self, terms: &FundTerms) -> WaterfallInput {
        let committed_capital = terms
            .committed_capital
            .unwrap_or_else(|| self.total_called());
        WaterfallInput {
            committed_capital,
            capital_calls: self.capital_calls,
            distributions: self.distributions,
            tiers: terms.tiers.clone(),
            gp_commitment: terms.gp_commitment,
            mgmt_fee_pct: terms.mgmt_fee_pct,
            mgmt_fee_basis: terms.mgmt_fee_basis,
            reset_hurdle: terms.reset_hurdle,
            cashless: terms.cashless,
            clawback_interest: terms.clawback_interest,
        }
    }
}

/// Fund terms without a cash-flow stream. Committed capital defaults to the
/// total called.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FundTerms {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub committed_capital: Option<Money>,
    #[serde(default)]
    pub tiers: Vec<WaterfallTier>,
    #[serde(default = "default_gp_commitment")]
    pub gp_commitment: Rate,
    #[serde(default = "default_mgmt_fee")]
    pub mgmt_fee_pct: Rate,
    #[serde(default)]
    pub mgmt_fee_basis: FeeBasis,
    #[serde(default)]
    pub reset_hurdle: bool,
    #[serde(default)]
    pub cashless: bool,
    #[serde(default)]
    pub clawback_interest: ClawbackInterest,
}

impl Default for FundTerms {
    fn default() -> Self {
        Self {
            committed_capital: None,
            tiers: Vec::new(),
            gp_commitment: default_gp_commitment(),
            mgmt_fee_pct: default_mgmt_fee(),
            mgmt_fee_basis: FeeBasis::default(),
            reset_hurdle: false,
            cashless: false,
            clawback_interest: ClawbackInterest::default(),
        }
    }
}
