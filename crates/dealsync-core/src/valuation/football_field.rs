use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::DealSyncError;
use crate::time_value::overflow;
use crate::types::{
    CashFlowSeries, DiscountAssumptions, Money, Percent, SensitivityVariable,
};
use crate::DealSyncResult;

use super::comps::PeerSet;
use super::dcf::{compute_dcf, DcfResult};
use super::sensitivity::dcf_sensitivity;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Valuation methodology a band was produced by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValuationMethod {
    Dcf,
    ComparableCompanies,
    PrecedentTransactions,
}

impl std::fmt::Display for ValuationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValuationMethod::Dcf => write!(f, "DCF"),
            ValuationMethod::ComparableCompanies => write!(f, "Comparable Companies"),
            ValuationMethod::PrecedentTransactions => write!(f, "Precedent Transactions"),
        }
    }
}

/// One horizontal bar of the football field. Always `low <= high`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationBand {
    pub method: ValuationMethod,
    pub low: Money,
    pub high: Money,
}

impl ValuationBand {
    pub fn new(method: ValuationMethod, low: Money, high: Money) -> DealSyncResult<Self> {
        let band = Self { method, low, high };
        band.validate()?;
        Ok(band)
    }

    pub fn validate(&self) -> DealSyncResult<()> {
        if self.low > self.high {
            return Err(DealSyncError::InvalidInput {
                field: format!("band:{}", self.method),
                reason: format!("Low ({}) must not exceed high ({})", self.low, self.high),
            });
        }
        Ok(())
    }

    pub fn normalized(&self) -> Self {
        Self {
            method: self.method,
            low: self.low.normalize(),
            high: self.high.normalize(),
        }
    }

    pub fn midpoint(&self) -> Money {
        self.low / Decimal::TWO + self.high / Decimal::TWO
    }

    /// `None` when the band spans more than the decimal range.
    pub fn width(&self) -> Option<Money> {
        self.high.checked_sub(self.low)
    }
}

/// How the DCF band is derived from a point valuation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SensitivityPolicy {
    /// EV plus/minus a fixed percentage, `0 <= spread_pct < 100`.
    Percentage { spread_pct: Percent },
    /// Re-value at (wacc + wacc_shift, g - growth_shift) and
    /// (wacc - wacc_shift, g + growth_shift). Shifts are non-negative
    /// percentage points.
    AssumptionShift {
        wacc_shift: Percent,
        growth_shift: Percent,
    },
    /// Re-value across a WACC x terminal growth grid and span its extremes.
    Grid {
        wacc: SensitivityVariable,
        terminal_growth: SensitivityVariable,
    },
}

impl SensitivityPolicy {
    /// Same policy with every decimal at its minimal scale.
    pub fn normalized(&self) -> Self {
        match self {
            SensitivityPolicy::Percentage { spread_pct } => SensitivityPolicy::Percentage {
                spread_pct: spread_pct.normalize(),
            },
            SensitivityPolicy::AssumptionShift {
                wacc_shift,
                growth_shift,
            } => SensitivityPolicy::AssumptionShift {
                wacc_shift: wacc_shift.normalize(),
                growth_shift: growth_shift.normalize(),
            },
            SensitivityPolicy::Grid {
                wacc,
                terminal_growth,
            } => SensitivityPolicy::Grid {
                wacc: wacc.normalized(),
                terminal_growth: terminal_growth.normalized(),
            },
        }
    }
}

/// Chart-ready set of bands: DCF first, then external bands in caller order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FootballFieldResult {
    pub bands: Vec<ValuationBand>,
    /// Lowest low across all bands (chart axis minimum)
    pub overall_low: Money,
    /// Highest high across all bands (chart axis maximum)
    pub overall_high: Money,
}

/// Serialisable request for a standalone football field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FootballFieldInput {
    pub cash_flows: CashFlowSeries,
    pub assumptions: DiscountAssumptions,
    pub sensitivity: SensitivityPolicy,
    #[serde(default)]
    pub external_bands: Vec<ValuationBand>,
    /// Converted to bands and appended after `external_bands`, in order
    #[serde(default)]
    pub peer_sets: Vec<PeerSet>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Derive the DCF band from a point valuation under the given policy.
pub fn dcf_band(dcf: &DcfResult, policy: &SensitivityPolicy) -> DealSyncResult<ValuationBand> {
    let (low, high) = match policy {
        SensitivityPolicy::Percentage { spread_pct } => {
            if *spread_pct < Decimal::ZERO || *spread_pct >= Decimal::ONE_HUNDRED {
                return Err(DealSyncError::InvalidAssumption {
                    field: "spread_pct".into(),
                    reason: format!("Spread must be in [0, 100), got {spread_pct}%"),
                });
            }
            let delta = dcf
                .enterprise_value
                .checked_mul(*spread_pct)
                .ok_or_else(|| overflow("spread_pct", "Enterprise value x spread"))?
                / Decimal::ONE_HUNDRED;
            let a = dcf
                .enterprise_value
                .checked_sub(delta)
                .ok_or_else(|| overflow("dcf_band", "DCF band bound"))?;
            let b = dcf
                .enterprise_value
                .checked_add(delta)
                .ok_or_else(|| overflow("dcf_band", "DCF band bound"))?;
            (a.min(b), a.max(b))
        }
        SensitivityPolicy::AssumptionShift {
            wacc_shift,
            growth_shift,
        } => {
            if *wacc_shift < Decimal::ZERO || *growth_shift < Decimal::ZERO {
                return Err(DealSyncError::InvalidAssumption {
                    field: "assumption_shift".into(),
                    reason: "WACC and growth shifts must be non-negative".into(),
                });
            }
            let bear = dcf.assumptions.shifted(*wacc_shift, -*growth_shift)?;
            let bull = dcf.assumptions.shifted(-*wacc_shift, *growth_shift)?;
            let bear_ev =
                compute_dcf(&dcf.cash_flows, bear.wacc, bear.terminal_growth)?.enterprise_value;
            let bull_ev =
                compute_dcf(&dcf.cash_flows, bull.wacc, bull.terminal_growth)?.enterprise_value;
            let base = dcf.enterprise_value;
            (
                base.min(bear_ev).min(bull_ev),
                base.max(bear_ev).max(bull_ev),
            )
        }
        SensitivityPolicy::Grid {
            wacc,
            terminal_growth,
        } => dcf_sensitivity(&dcf.cash_flows, wacc, terminal_growth)?.range(),
    };

    ValuationBand::new(ValuationMethod::Dcf, low, high)
}

/// Reconcile the DCF band with externally supplied bands.
///
/// The output always has `1 + external_bands.len()` entries, DCF first and
/// the rest in the order given. External bands may not use the DCF method.
pub fn build_football_field(
    dcf: &DcfResult,
    external_bands: &[ValuationBand],
    policy: &SensitivityPolicy,
) -> DealSyncResult<FootballFieldResult> {
    for (idx, band) in external_bands.iter().enumerate() {
        if band.method == ValuationMethod::Dcf {
            return Err(DealSyncError::InvalidInput {
                field: format!("external_bands[{idx}]"),
                reason: "The DCF band is derived from the DCF result and cannot be supplied".into(),
            });
        }
        band.validate()?;
    }

    let mut bands = Vec::with_capacity(external_bands.len() + 1);
    bands.push(dcf_band(dcf, policy)?);
    bands.extend(external_bands.iter().cloned());

    let overall_low = bands
        .iter()
        .map(|b| b.low)
        .min()
        .unwrap_or(Decimal::ZERO);
    let overall_high = bands
        .iter()
        .map(|b| b.high)
        .max()
        .unwrap_or(Decimal::ZERO);

    Ok(FootballFieldResult {
        bands,
        overall_low,
        overall_high,
    })
}

/// Value the DCF, turn peer sets into bands and build the football field.
pub fn calculate_football_field(
    input: &FootballFieldInput,
) -> DealSyncResult<FootballFieldResult> {
    let dcf = compute_dcf(
        &input.cash_flows,
        input.assumptions.wacc,
        input.assumptions.terminal_growth,
    )?;

    let mut external = input.external_bands.clone();
    for peers in &input.peer_sets {
        external.push(peers.band()?);
    }

    build_football_field(&dcf, &external, &input.sensitivity)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
