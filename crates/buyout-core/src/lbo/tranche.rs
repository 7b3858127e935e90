use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::*;

/// Role of a tranche in the capital structure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrancheKind {
    /// Amortising senior term loan
    Senior,
    /// Non-amortising bullet loan (PIK when a PIK rate is set)
    Bullet,
    /// Non-amortising mezzanine
    Mezzanine,
    /// Draw-as-needed facility
    Revolver,
    /// IFRS-16 lease liability
    Lease,
}

/// Interest charged on a tranche for one year.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct InterestCharge {
    /// Interest payable in cash
    pub cash: Money,
    /// Interest capitalised onto the balance
    pub pik: Money,
}

impl InterestCharge {
    pub fn total(&self) -> Money {
        self.cash + self.pik
    }
}

impl std::iter::Sum for InterestCharge {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(InterestCharge::default(), |acc, c| InterestCharge {
            cash: acc.cash + c.cash,
            pik: acc.pik + c.pik,
        })
    }
}

/// One slice of the capital structure.
///
/// Balances are only changed through [`charge_interest`](Self::charge_interest),
/// [`draw`](Self::draw) and [`repay`](Self::repay), none of which can take a
/// balance below zero or a revolver above its limit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtTranche {
    pub name: String,
    pub kind: TrancheKind,
    balance: Money,
    pub rate: Rate,
    pub amortizing: bool,
    pub pik: bool,
    /// `Some` only for revolvers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revolver_limit: Option<Money>,
    pub orig_balance: Money,
    /// Required repayment per year, index = year - 1. Empty means "not built yet".
    pub amort_schedule: Vec<Money>,
}

impl DebtTranche {
    pub fn new(name: impl Into<String>, kind: TrancheKind, balance: Money, rate: Rate) -> Self {
        let balance = balance.max(Decimal::ZERO);
        Self {
            name: name.into(),
            kind,
            balance,
            rate,
            amortizing: false,
            pik: false,
            revolver_limit: None,
            orig_balance: balance,
            amort_schedule: Vec::new(),
        }
    }

    /// Undrawn revolver with the given limit.
    pub fn revolver(name: impl Into<String>, limit: Money, rate: Rate) -> Self {
        let mut t = Self::new(name, TrancheKind::Revolver, Decimal::ZERO, rate);
        t.revolver_limit = Some(limit.max(Decimal::ZERO));
        t
    }

    pub fn with_amortization(mut self, schedule: Option<Vec<Money>>) -> Self {
        self.amortizing = true;
        self.amort_schedule = schedule.unwrap_or_default();
        self
    }

    pub fn with_pik(mut self) -> Self {
        self.pik = true;
        self
    }

    pub fn balance(&self) -> Money {
        self.balance
    }

    pub fn is_revolver(&self) -> bool {
        self.revolver_limit.is_some()
    }

    /// Whether discretionary sweep cash may prepay this tranche.
    pub fn is_sweepable(&self) -> bool {
        !self.is_revolver() && !self.pik && self.kind != TrancheKind::Lease
    }

    /// Undrawn revolver capacity (zero for term debt).
    pub fn headroom(&self) -> Money {
        self.revolver_limit
            .map(|limit| (limit - self.balance).max(Decimal::ZERO))
            .unwrap_or(Decimal::ZERO)
    }

    /// Charge one year of interest on the current balance.
    ///
    /// PIK interest is capitalised and costs no cash.
    pub fn charge_interest(&mut self) -> InterestCharge {
        let interest = self.balance * self.rate;
        if self.pik {
            self.balance += interest;
            InterestCharge {
                cash: Decimal::ZERO,
                pik: interest,
            }
        } else {
            InterestCharge {
                cash: interest,
                pik: Decimal::ZERO,
            }
        }
    }

    /// Draw up to `amount` from a revolver; returns the amount actually drawn.
    pub fn draw(&mut self, amount: Money) -> Money {
        if amount <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        let drawn = amount.min(self.headroom());
        self.balance += drawn;
        drawn
    }

    /// Repay up to `amount`; returns the amount applied.
    pub fn repay(&mut self, amount: Money) -> Money {
        if amount <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        let paid = amount.min(self.balance);
        self.balance -= paid;
        paid
    }

    /// Build the straight-line default schedule if none was supplied.
    pub fn ensure_schedule(&mut self, total_years: u32) {
        if self.amortizing && self.amort_schedule.is_empty() && total_years > 0 {
            let annual = self.orig_balance / Decimal::from(total_years);
            self.amort_schedule = vec![annual; total_years as usize];
        }
    }

    /// Required repayment for `year` (1-based), capped at the outstanding balance.
    pub fn scheduled_due(&self, year: u32) -> Money {
        if !self.amortizing || self.pik || year == 0 {
            return Decimal::ZERO;
        }
        self.amort_schedule
            .get((year - 1) as usize)
            .copied()
            .unwrap_or(Decimal::ZERO)
            .max(Decimal::ZERO)
            .min(self.balance)
    }
}

/// Snapshot of every tranche, in declaration order.
///
/// Declaration order is the sweep priority among non-revolver tranches; the
/// revolver is always swept first regardless of its position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DebtState {
    pub tranches: Vec<DebtTranche>,
}

impl DebtState {
    pub fn new(tranches: Vec<DebtTranche>) -> Self {
        Self { tranches }
    }

    pub fn total(&self) -> Money {
        self.tranches.iter().map(|t| t.balance()).sum()
    }

    pub fn revolver_index(&self) -> Option<usize> {
        self.tranches.iter().position(|t| t.is_revolver())
    }

    pub fn get(&self, name: &str) -> Option<&DebtTranche> {
        self.tranches.iter().find(|t| t.name == name)
    }

    pub fn charge_interest(&mut self) -> InterestCharge {
        self.tranches.iter_mut().map(|t| t.charge_interest()).sum()
    }

    /// Apply `amount` to the revolver, then to sweepable tranches in
    /// declaration order. Returns the amount applied.
    pub fn sweep(&mut self, amount: Money) -> Money {
        let mut left = amount.max(Decimal::ZERO);
        if let Some(idx) = self.revolver_index() {
            left -= self.tranches[idx].repay(left);
        }
        for tranche in self.tranches.iter_mut().filter(|t| t.is_sweepable()) {
            if left <= Decimal::ZERO {
                break;
            }
            left -= tranche.repay(left);
        }
        amount.max(Decimal::ZERO) - left
    }
}
