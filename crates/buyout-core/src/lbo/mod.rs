//! Leveraged-buyout cash-flow engine.
//!
//! A run starts from [`DealAssumptions`], builds the opening capital structure
//! and then steps year by year through pure transitions of [`LboState`]:
//! interest, covenant tests, operating cash flow, mandatory amortisation
//! (revolver-backed) and the discretionary sweep. The exit year folds the sale
//! proceeds into the sponsor's cash flows for IRR and MOIC.

pub mod assumptions;
pub mod covenants;
pub mod engine;
pub mod sources_uses;
pub mod tranche;

pub use assumptions::{DealAssumptions, LeaseAssumptions, MoicBasis, WorkingCapitalDays};
pub use covenants::CovenantMetrics;
pub use engine::{
    build_lbo, ExitSummary, LboEngine, LboInput, LboOutput, LboRun, LboState, RunOutcome,
    YearOutcome, YearRecord, YearStep,
};
pub use sources_uses::{build_sources_uses, SourcesUses};
pub use tranche::{DebtState, DebtTranche, InterestCharge, TrancheKind};
