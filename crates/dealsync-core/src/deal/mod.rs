//! Whole-deal analysis from a single input snapshot.
//!
//! [`analyze_deal`] runs every engine against one [`DealInputs`] value, so the
//! accretion analysis can never pair a DCF from one set of inputs with a
//! synergy NPV from another. [`DealModel`] adds memoisation on top for hosts
//! that edit inputs one field at a time.

pub mod model;

use serde::{Deserialize, Serialize};

use crate::ma::accretion::{analyze_accretion_dilution, AccretionDilutionResult};
use crate::ma::synergy::{compute_synergy_npv_with_model, SynergyItems, SynergyModel, SynergyResult};
use crate::types::{CashFlowSeries, DiscountAssumptions};
use crate::valuation::dcf::{compute_dcf, DcfResult};
use crate::valuation::football_field::{
    build_football_field, FootballFieldResult, SensitivityPolicy, ValuationBand,
};
use crate::DealSyncResult;

pub use model::{DealModel, RecomputeCounts};

/// Every editable input of the deal, captured at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DealInputs {
    pub cash_flows: CashFlowSeries,
    pub assumptions: DiscountAssumptions,
    #[serde(default)]
    pub cost_synergies: SynergyItems,
    #[serde(default)]
    pub revenue_synergies: SynergyItems,
    #[serde(default)]
    pub synergy_model: SynergyModel,
    /// Comparable-company and precedent-transaction bands, in chart order
    #[serde(default)]
    pub external_bands: Vec<ValuationBand>,
    /// How the DCF band is widened for the football field
    pub sensitivity: SensitivityPolicy,
}

impl DealInputs {
    /// Content hash of the snapshot; equal inputs give equal fingerprints.
    ///
    /// Hashes the [`normalized`](Self::normalized) form, so inputs that
    /// differ only in decimal scale (`8.5` vs `8.50`) share a fingerprint.
    pub fn fingerprint(&self) -> DealSyncResult<String> {
        fingerprint_of(&self.normalized())
    }

    /// Same snapshot with every decimal at its minimal scale.
    pub fn normalized(&self) -> Self {
        Self {
            cash_flows: self.cash_flows.normalized(),
            assumptions: self.assumptions.normalized(),
            cost_synergies: normalize_items(&self.cost_synergies),
            revenue_synergies: normalize_items(&self.revenue_synergies),
            synergy_model: self.synergy_model,
            external_bands: self
                .external_bands
                .iter()
                .map(ValuationBand::normalized)
                .collect(),
            sensitivity: self.sensitivity.normalized(),
        }
    }
}

pub(crate) fn normalize_items(items: &SynergyItems) -> SynergyItems {
    items
        .iter()
        .map(|(name, amount)| (name.clone(), amount.normalize()))
        .collect()
}

/// Results of all four engines for one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DealAnalysis {
    pub dcf: DcfResult,
    pub synergy: SynergyResult,
    pub accretion: AccretionDilutionResult,
    pub football_field: FootballFieldResult,
}

/// Run the DCF, synergy, accretion/dilution and football-field engines on
/// one snapshot. The first failing engine aborts the analysis.
pub fn analyze_deal(inputs: &DealInputs) -> DealSyncResult<DealAnalysis> {
    let dcf = compute_dcf(
        &inputs.cash_flows,
        inputs.assumptions.wacc,
        inputs.assumptions.terminal_growth,
    )?;
    let synergy = compute_synergy_npv_with_model(
        &inputs.cost_synergies,
        &inputs.revenue_synergies,
        &inputs.assumptions,
        inputs.synergy_model,
    )?;
    let accretion = analyze_accretion_dilution(&dcf, synergy.synergy_npv)?;
    let football_field = build_football_field(&dcf, &inputs.external_bands, &inputs.sensitivity)?;

    Ok(DealAnalysis {
        dcf,
        synergy,
        accretion,
        football_field,
    })
}

/// blake3 hex digest of the canonical JSON encoding of `value`.
pub(crate) fn fingerprint_of<T: Serialize + ?Sized>(value: &T) -> DealSyncResult<String> {
    let json = serde_json::to_string(value)?;
    Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
}
