use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::lbo::engine::YearRecord;
use crate::numeric::safe_div;
use crate::types::*;

/// Covenant ratios over a completed run, with headroom against the hurdles.
///
/// Headroom is signed so that positive always means "inside the covenant".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CovenantMetrics {
    /// EBITDA / interest per year (None when no interest was charged)
    pub icr_series: Vec<Option<Multiple>>,
    /// Closing debt / EBITDA per year (None when EBITDA ≤ 0)
    pub leverage_series: Vec<Option<Multiple>>,
    /// Levered CF / (interest + mandatory repayment) per year
    pub fcf_coverage_series: Vec<Option<Multiple>>,
    pub min_icr: Option<Multiple>,
    pub max_leverage: Option<Multiple>,
    pub min_fcf_coverage: Option<Multiple>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icr_headroom: Option<Multiple>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leverage_headroom: Option<Multiple>,
}

impl CovenantMetrics {
    pub fn from_records(
        records: &[YearRecord],
        icr_hurdle: Option<Multiple>,
        leverage_hurdle: Option<Multiple>,
    ) -> Self {
        let icr_series: Vec<Option<Multiple>> = records.iter().map(|r| r.icr).collect();
        let leverage_series: Vec<Option<Multiple>> =
            records.iter().map(|r| r.leverage).collect();
        let fcf_coverage_series: Vec<Option<Multiple>> = records
            .iter()
            .map(|r| {
                let service = r.interest + r.mandatory_repayment;
                if service > Decimal::ZERO {
                    safe_div(r.levered_cf, service)
                } else {
                    None
                }
            })
            .collect();

        let min_icr = icr_series.iter().flatten().copied().min();
        let max_leverage = leverage_series.iter().flatten().copied().max();
        let min_fcf_coverage = fcf_coverage_series.iter().flatten().copied().min();

        Self {
            icr_headroom: icr_hurdle.zip(min_icr).map(|(h, m)| m - h),
            leverage_headroom: leverage_hurdle.zip(max_leverage).map(|(h, m)| h - m),
            icr_series,
            leverage_series,
            fcf_coverage_series,
            min_icr,
            max_leverage,
            min_fcf_coverage,
        }
    }
}
