use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::DealSyncError;
use crate::time_value::overflow;
use crate::types::{Money, Multiple};
use crate::DealSyncResult;

use super::football_field::{ValuationBand, ValuationMethod};

/// A peer multiple set for one method, e.g. trading EV/EBITDA multiples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerSet {
    pub method: ValuationMethod,
    /// Target metric the multiples apply to (e.g. LTM EBITDA)
    pub target_metric: Money,
    pub multiples: Vec<Multiple>,
}

impl PeerSet {
    pub fn band(&self) -> DealSyncResult<ValuationBand> {
        implied_band(self.method, self.target_metric, &self.multiples)
    }
}

/// Implied valuation band for the target from a set of peer multiples.
///
/// The band spans the target metric (e.g. EBITDA) times the 25th and 75th
/// percentile peer multiples, which keeps a single outlier peer from
/// stretching the football field. Used for both trading comparables and
/// precedent transactions; `method` labels the result.
pub fn implied_band(
    method: ValuationMethod,
    target_metric: Money,
    peer_multiples: &[Multiple],
) -> DealSyncResult<ValuationBand> {
    if method == ValuationMethod::Dcf {
        return Err(DealSyncError::InvalidInput {
            field: "method".into(),
            reason: "Peer multiples cannot produce a DCF band".into(),
        });
    }
    if peer_multiples.is_empty() {
        return Err(DealSyncError::InvalidInput {
            field: "peer_multiples".into(),
            reason: "At least one peer multiple is required".into(),
        });
    }
    if let Some(bad) = peer_multiples.iter().find(|m| **m <= Decimal::ZERO) {
        return Err(DealSyncError::InvalidInput {
            field: "peer_multiples".into(),
            reason: format!("Peer multiples must be positive, got {bad}"),
        });
    }
    if target_metric <= Decimal::ZERO {
        return Err(DealSyncError::InvalidInput {
            field: "target_metric".into(),
            reason: "Target metric must be positive for a multiples-based valuation".into(),
        });
    }

    let mut sorted = peer_multiples.to_vec();
    sorted.sort();

    let low_multiple = percentile(&sorted, dec!(0.25));
    let high_multiple = percentile(&sorted, dec!(0.75));

    let implied = |multiple: Multiple| {
        target_metric
            .checked_mul(multiple)
            .ok_or_else(|| overflow("target_metric", "Target metric x peer multiple"))
    };
    ValuationBand::new(method, implied(low_multiple)?, implied(high_multiple)?)
}

/// Linearly interpolated percentile of an ascending, non-empty slice.
fn percentile(sorted: &[Multiple], p: Decimal) -> Multiple {
    let rank = p * Decimal::from(sorted.len() - 1);
    let lower = rank.floor();
    let idx = lower.to_usize().unwrap_or(0);
    let frac = rank - lower;
    match sorted.get(idx + 1) {
        Some(next) => sorted[idx] + (*next - sorted[idx]) * frac,
        None => sorted[idx],
    }
}
