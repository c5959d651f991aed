use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::time_value::{checked_sum, overflow, perpetuity_value, to_rate};
use crate::types::{DiscountAssumptions, Money, Percent};
use crate::DealSyncResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Annual run-rate synergies keyed by caller-defined category (e.g. "sga",
/// "crossSell"). Category names carry no meaning to the engine.
pub type SynergyItems = BTreeMap<String, Money>;

/// How the combined annual synergy is capitalised.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SynergyModel {
    /// `total / (wacc - g)`: run-rate synergies grow with the business at the
    /// same terminal growth the DCF assumes.
    #[default]
    GrowingPerpetuity,
    /// `total / wacc`: run-rate synergies held flat forever.
    FlatPerpetuity,
}

/// Serialisable input bundle for a synergy valuation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynergyInput {
    /// Cost synergies by category (annual run-rate)
    #[serde(default)]
    pub cost_synergies: SynergyItems,
    /// Revenue synergies by category (annual run-rate)
    #[serde(default)]
    pub revenue_synergies: SynergyItems,
    /// Same assumptions object the DCF uses
    pub assumptions: DiscountAssumptions,
    /// Capitalisation model (default: growing perpetuity)
    #[serde(default)]
    pub model: SynergyModel,
}

/// Output of the synergy valuation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynergyResult {
    /// Sum of cost synergy line items
    pub annual_cost_synergies: Money,
    /// Sum of revenue synergy line items
    pub annual_revenue_synergies: Money,
    /// Cost + revenue
    pub total_annual_synergies: Money,
    /// Denominator applied to the total, in percent (wacc - g, or wacc)
    pub capitalisation_rate: Percent,
    /// Present value of the perpetual synergy stream
    pub synergy_npv: Money,
    /// Model used
    pub model: SynergyModel,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Value itemised synergies as a growing perpetuity on the DCF assumptions.
///
/// Empty maps contribute zero. Fails with `InvalidAssumption` when
/// `wacc <= terminal_growth`.
pub fn compute_synergy_npv(
    cost_synergies: &SynergyItems,
    revenue_synergies: &SynergyItems,
    assumptions: &DiscountAssumptions,
) -> DealSyncResult<SynergyResult> {
    compute_synergy_npv_with_model(
        cost_synergies,
        revenue_synergies,
        assumptions,
        SynergyModel::GrowingPerpetuity,
    )
}

/// Value itemised synergies under an explicitly chosen model.
pub fn compute_synergy_npv_with_model(
    cost_synergies: &SynergyItems,
    revenue_synergies: &SynergyItems,
    assumptions: &DiscountAssumptions,
    model: SynergyModel,
) -> DealSyncResult<SynergyResult> {
    let capitalisation_rate = match model {
        SynergyModel::GrowingPerpetuity => {
            assumptions.validate()?;
            assumptions
                .wacc
                .checked_sub(assumptions.terminal_growth)
                .ok_or_else(|| overflow("capitalisation_rate", "WACC - terminal growth"))?
        }
        SynergyModel::FlatPerpetuity => {
            assumptions.validate_discount_rate()?;
            assumptions.wacc
        }
    };

    let annual_cost_synergies = checked_sum(cost_synergies.values(), "cost_synergies")?;
    let annual_revenue_synergies = checked_sum(revenue_synergies.values(), "revenue_synergies")?;
    let total_annual_synergies = annual_cost_synergies
        .checked_add(annual_revenue_synergies)
        .ok_or_else(|| overflow("total_annual_synergies", "Total annual synergies"))?;

    let synergy_npv = perpetuity_value(total_annual_synergies, capitalisation_rate)?;

    Ok(SynergyResult {
        annual_cost_synergies,
        annual_revenue_synergies,
        total_annual_synergies,
        capitalisation_rate,
        synergy_npv,
        model,
    })
}

/// Run the synergy valuation from a serialisable input bundle.
pub fn calculate_synergies(input: &SynergyInput) -> DealSyncResult<SynergyResult> {
    compute_synergy_npv_with_model(
        &input.cost_synergies,
        &input.revenue_synergies,
        &input.assumptions,
        input.model,
    )
}

impl SynergyResult {
    /// Revenue synergies as a share of the total run-rate. `None` when the
    /// total is zero or so small against the revenue line that the ratio
    /// does not fit in a Decimal.
    pub fn revenue_share(&self) -> Option<Decimal> {
        self.annual_revenue_synergies
            .checked_div(self.total_annual_synergies)
    }

    /// Synergy NPV as a multiple of the annual run-rate (`1 / rate`).
    pub fn implied_multiple(&self) -> Option<Decimal> {
        Decimal::ONE.checked_div(to_rate(self.capitalisation_rate))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
