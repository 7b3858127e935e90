//! Private-equity fund waterfall.
//!
//! Allocates a stream of capital calls and gross distributions between LPs and
//! the GP: management fees, return of LP capital, tiered carry with catch-up,
//! optional cashless deferral and a final-year clawback.

pub mod engine;
pub mod flows;

pub use engine::{
    compute_waterfall_by_year, summarize_waterfall, ClawbackInterest, FeeBasis,
    FundWaterfallEngine, TierType, WaterfallInput, WaterfallSummary, WaterfallTier,
    WaterfallYearRecord,
};
pub use flows::{FundFlows, FundTerms};
