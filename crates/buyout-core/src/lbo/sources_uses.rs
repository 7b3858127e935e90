use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::lbo::assumptions::DealAssumptions;
use crate::lbo::tranche::TrancheKind;
use crate::types::*;

/// Entry funding table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourcesUses {
    /// All sources of funds
    pub sources: Vec<(String, Money)>,
    /// All uses of funds
    pub uses: Vec<(String, Money)>,
    pub total_sources: Money,
    pub total_uses: Money,
    pub balanced: bool,
    /// Lease liability assumed with the business (not a source of cash)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assumed_lease: Option<Money>,
}

/// Sources & Uses for the deal's opening capital structure.
///
/// Undrawn facilities are omitted; the lease is reported separately since it
/// funds nothing at close.
pub fn build_sources_uses(deal: &DealAssumptions) -> SourcesUses {
    let opening = deal.opening_debt();

    let mut sources: Vec<(String, Money)> =
        vec![("Sponsor Equity".into(), deal.initial_equity())];
    sources.extend(
        opening
            .tranches
            .iter()
            .filter(|t| t.kind != TrancheKind::Lease && t.balance() > Decimal::ZERO)
            .map(|t| (t.name.clone(), t.balance())),
    );

    let uses: Vec<(String, Money)> = vec![("Enterprise Value".into(), deal.enterprise_value)];

    let total_sources: Money = sources.iter().map(|(_, v)| *v).sum();
    let total_uses: Money = uses.iter().map(|(_, v)| *v).sum();

    let assumed_lease = opening
        .tranches
        .iter()
        .find(|t| t.kind == TrancheKind::Lease)
        .map(|t| t.balance());

    SourcesUses {
        sources,
        uses,
        total_sources,
        total_uses,
        balanced: total_sources == total_uses,
        assumed_lease,
    }
}
