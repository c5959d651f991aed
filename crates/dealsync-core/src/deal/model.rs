use serde::Serialize;
use std::sync::Arc;

use crate::ma::accretion::{analyze_accretion_dilution, AccretionDilutionResult};
use crate::ma::synergy::{compute_synergy_npv_with_model, SynergyItems, SynergyModel, SynergyResult};
use crate::types::{CashFlowSeries, DiscountAssumptions};
use crate::valuation::dcf::{compute_dcf, DcfResult};
use crate::valuation::football_field::{
    build_football_field, FootballFieldResult, SensitivityPolicy, ValuationBand,
};
use crate::DealSyncResult;

use super::{fingerprint_of, normalize_items, DealAnalysis, DealInputs};

/// How many times each node has actually been computed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RecomputeCounts {
    pub dcf: u64,
    pub synergy: u64,
    pub accretion: u64,
    pub football_field: u64,
}

struct Memo<T> {
    key: String,
    value: Arc<T>,
}

/// Memoised dependency graph over the deal engines.
///
/// ```text
/// cash_flows, assumptions ──► dcf ──┬──► accretion
/// synergies, assumptions ──► synergy ┘
/// dcf, external_bands, sensitivity ──► football_field
/// ```
///
/// Each node caches its last result under a hash of exactly the inputs it
/// reads, so editing synergy line items never re-runs the DCF and editing
/// the band list never re-runs accretion. Errors are returned, never cached.
pub struct DealModel {
    inputs: DealInputs,
    dcf: Option<Memo<DcfResult>>,
    synergy: Option<Memo<SynergyResult>>,
    accretion: Option<Memo<AccretionDilutionResult>>,
    football_field: Option<Memo<FootballFieldResult>>,
    counts: RecomputeCounts,
}

impl DealModel {
    pub fn new(inputs: DealInputs) -> Self {
        Self {
            inputs,
            dcf: None,
            synergy: None,
            accretion: None,
            football_field: None,
            counts: RecomputeCounts::default(),
        }
    }

    /// Current inputs.
    pub fn inputs(&self) -> &DealInputs {
        &self.inputs
    }

    pub fn recompute_counts(&self) -> RecomputeCounts {
        self.counts
    }

    // -----------------------------------------------------------------------
    // Input setters
    // -----------------------------------------------------------------------

    pub fn set_cash_flows(&mut self, cash_flows: CashFlowSeries) {
        self.inputs.cash_flows = cash_flows;
    }

    pub fn set_assumptions(&mut self, assumptions: DiscountAssumptions) {
        self.inputs.assumptions = assumptions;
    }

    pub fn set_cost_synergies(&mut self, items: SynergyItems) {
        self.inputs.cost_synergies = items;
    }

    pub fn set_revenue_synergies(&mut self, items: SynergyItems) {
        self.inputs.revenue_synergies = items;
    }

    pub fn set_synergy_model(&mut self, model: SynergyModel) {
        self.inputs.synergy_model = model;
    }

    pub fn set_external_bands(&mut self, bands: Vec<ValuationBand>) {
        self.inputs.external_bands = bands;
    }

    pub fn set_sensitivity(&mut self, policy: SensitivityPolicy) {
        self.inputs.sensitivity = policy;
    }

    /// Swap in a whole new snapshot at once.
    pub fn replace_inputs(&mut self, inputs: DealInputs) {
        self.inputs = inputs;
    }

    // -----------------------------------------------------------------------
    // Nodes
    // -----------------------------------------------------------------------

    pub fn dcf(&mut self) -> DealSyncResult<Arc<DcfResult>> {
        let key = self.dcf_key()?;
        let inputs = &self.inputs;
        memoized(&mut self.dcf, &mut self.counts.dcf, "dcf", key, || {
            compute_dcf(
                &inputs.cash_flows,
                inputs.assumptions.wacc,
                inputs.assumptions.terminal_growth,
            )
        })
    }

    pub fn synergy(&mut self) -> DealSyncResult<Arc<SynergyResult>> {
        let key = self.synergy_key()?;
        let inputs = &self.inputs;
        memoized(&mut self.synergy, &mut self.counts.synergy, "synergy", key, || {
            compute_synergy_npv_with_model(
                &inputs.cost_synergies,
                &inputs.revenue_synergies,
                &inputs.assumptions,
                inputs.synergy_model,
            )
        })
    }

    pub fn accretion(&mut self) -> DealSyncResult<Arc<AccretionDilutionResult>> {
        let dcf = self.dcf()?;
        let synergy = self.synergy()?;
        let key = fingerprint_of(&(self.dcf_key()?, self.synergy_key()?))?;
        memoized(
            &mut self.accretion,
            &mut self.counts.accretion,
            "accretion",
            key,
            || analyze_accretion_dilution(&dcf, synergy.synergy_npv),
        )
    }

    pub fn football_field(&mut self) -> DealSyncResult<Arc<FootballFieldResult>> {
        let dcf = self.dcf()?;
        let bands: Vec<ValuationBand> = self
            .inputs
            .external_bands
            .iter()
            .map(ValuationBand::normalized)
            .collect();
        let key = fingerprint_of(&(
            self.dcf_key()?,
            &bands,
            &self.inputs.sensitivity.normalized(),
        ))?;
        let inputs = &self.inputs;
        memoized(
            &mut self.football_field,
            &mut self.counts.football_field,
            "football_field",
            key,
            || build_football_field(&dcf, &inputs.external_bands, &inputs.sensitivity),
        )
    }

    /// All four results for the current snapshot.
    pub fn analysis(&mut self) -> DealSyncResult<DealAnalysis> {
        Ok(DealAnalysis {
            dcf: (*self.dcf()?).clone(),
            synergy: (*self.synergy()?).clone(),
            accretion: (*self.accretion()?).clone(),
            football_field: (*self.football_field()?).clone(),
        })
    }

    // Keys hash normalised decimals so a scale-only edit is a memo hit.

    fn dcf_key(&self) -> DealSyncResult<String> {
        fingerprint_of(&(
            self.inputs.cash_flows.normalized(),
            self.inputs.assumptions.normalized(),
        ))
    }

    fn synergy_key(&self) -> DealSyncResult<String> {
        fingerprint_of(&(
            normalize_items(&self.inputs.cost_synergies),
            normalize_items(&self.inputs.revenue_synergies),
            self.inputs.assumptions.normalized(),
            self.inputs.synergy_model,
        ))
    }
}

fn memoized<T, F>(
    slot: &mut Option<Memo<T>>,
    counter: &mut u64,
    node: &'static str,
    key: String,
    compute: F,
) -> DealSyncResult<Arc<T>>
where
    F: FnOnce() -> DealSyncResult<T>,
{
    if let Some(memo) = slot.as_ref() {
        if memo.key == key {
            tracing::debug!(node, key = %short(&key), "memo hit");
            return Ok(Arc::clone(&memo.value));
        }
    }

    let value = match compute() {
        Ok(v) => Arc::new(v),
        Err(e) => {
            tracing::debug!(node, key = %short(&key), error = %e, "recompute failed");
            return Err(e);
        }
    };
    *counter += 1;
    tracing::debug!(node, key = %short(&key), runs = *counter, "recomputed");
    *slot = Some(Memo {
        key,
        value: Arc::clone(&value),
    });
    Ok(value)
}

fn short(key: &str) -> &str {
    &key[..key.len().min(12)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn inputs() -> DealInputs {
        DealInputs {
            cash_flows: CashFlowSeries::new(vec![dec!(50), dec!(55), dec!(60), dec!(65), dec!(70)])
                .unwrap(),
            assumptions: DiscountAssumptions::new(dec!(8.5), dec!(2.5)),
            cost_synergies: SynergyItems::from([("sga".to_string(), dec!(25))]),
            revenue_synergies: SynergyItems::new(),
            synergy_model: SynergyModel::GrowingPerpetuity,
            external_bands: vec![],
            sensitivity: SensitivityPolicy::Percentage {
                spread_pct: dec!(10),
            },
        }
    }

    #[test]
    fn test_repeat_reads_hit_memo() {
        let mut model = DealModel::new(inputs());
        let first = model.dcf().unwrap();
        let second = model.dcf().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(model.recompute_counts().dcf, 1);
    }

    #[test]
    fn test_scale_only_edit_is_a_memo_hit() {
        let mut model = DealModel::new(inputs());
        model.analysis().unwrap();
        model.set_assumptions(DiscountAssumptions::new(dec!(8.50), dec!(2.500)));
        model.set_cost_synergies(SynergyItems::from([("sga".to_string(), dec!(25.0))]));
        model.set_sensitivity(SensitivityPolicy::Percentage {
            spread_pct: dec!(10.00),
        });
        model.analysis().unwrap();
        assert_eq!(
            model.recompute_counts(),
            RecomputeCounts {
                dcf: 1,
                synergy: 1,
                accretion: 1,
                football_field: 1,
            }
        );
    }

    #[test]
    fn test_failed_node_is_not_cached() {
        let mut model = DealModel::new(inputs());
        model.set_assumptions(DiscountAssumptions::new(dec!(2), dec!(2)));
        assert!(model.dcf().is_err());
        assert_eq!(model.recompute_counts().dcf, 0);
        model.set_assumptions(DiscountAssumptions::new(dec!(8.5), dec!(2.5)));
        assert!(model.dcf().is_ok());
        assert_eq!(model.recompute_counts().dcf, 1);
    }
}
