use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::DealSyncError;
use crate::time_value::overflow;
use crate::types::{CashFlowSeries, DiscountAssumptions, Money, Percent, Rate};
use crate::valuation::dcf::{compute_dcf, DcfResult};
use crate::DealSyncResult;

/// Value impact of adding the synergy NPV to the standalone DCF.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccretionDilutionResult {
    /// Standalone enterprise value from the DCF
    pub standalone_value: Money,
    /// Standalone EV + synergy NPV
    pub combined_value: Money,
    /// Synergy NPV carried into the combined value
    pub synergy_contribution: Money,
    /// Synergy NPV / standalone EV (decimal, e.g. 0.25 = 25% uplift)
    pub delta_vs_standalone: Rate,
    /// Same uplift in percentage points
    pub delta_vs_standalone_pct: Percent,
    /// `true` when synergies add value (NPV > 0)
    pub is_accretive: bool,
}

/// Serialisable request: value the standalone DCF, then add `synergy_npv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccretionInput {
    pub cash_flows: CashFlowSeries,
    pub assumptions: DiscountAssumptions,
    pub synergy_npv: Money,
}

/// Combine a DCF result with a synergy NPV.
///
/// Both arguments must come from the same input snapshot. Fails with
/// `InvalidAssumption` when the standalone enterprise value is zero, since
/// the uplift ratio is undefined.
pub fn analyze_accretion_dilution(
    dcf: &DcfResult,
    synergy_npv: Money,
) -> DealSyncResult<AccretionDilutionResult> {
    let standalone_value = dcf.enterprise_value;
    if standalone_value.is_zero() {
        return Err(DealSyncError::InvalidAssumption {
            field: "enterprise_value".into(),
            reason: "Standalone enterprise value is zero; uplift versus standalone is undefined"
                .into(),
        });
    }

    let delta_vs_standalone = synergy_npv.checked_div(standalone_value).ok_or_else(|| {
        DealSyncError::InvalidAssumption {
            field: "synergy_npv".into(),
            reason: format!(
                "Synergy NPV ({synergy_npv}) against a standalone value of {standalone_value} gives an uplift outside the decimal range"
            ),
        }
    })?;
    let combined_value = standalone_value
        .checked_add(synergy_npv)
        .ok_or_else(|| overflow("combined_value", "Standalone EV + synergy NPV"))?;
    let delta_vs_standalone_pct = delta_vs_standalone
        .checked_mul(dec!(100))
        .ok_or_else(|| overflow("delta_vs_standalone_pct", "Uplift in percent"))?;

    Ok(AccretionDilutionResult {
        standalone_value,
        combined_value,
        synergy_contribution: synergy_npv,
        delta_vs_standalone,
        delta_vs_standalone_pct,
        is_accretive: synergy_npv > Decimal::ZERO,
    })
}

pub fn calculate_accretion(input: &AccretionInput) -> DealSyncResult<AccretionDilutionResult> {
    let dcf = compute_dcf(
        &input.cash_flows,
        input.assumptions.wacc,
        input.assumptions.terminal_growth,
    )?;
    analyze_accretion_dilution(&dcf, input.synergy_npv)
}
