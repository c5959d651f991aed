use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use crate::error::DealSyncError;
use crate::types::{Money, Percent};
use crate::DealSyncResult;

/// Convert percentage points to a decimal rate (8.5 -> 0.085).
pub fn to_rate(pct: Percent) -> Decimal {
    pct / Decimal::ONE_HUNDRED
}

/// End-of-period discount factor `1 / (1 + r)^period` for a rate in percent.
pub fn discount_factor(rate_pct: Percent, period: u32) -> DealSyncResult<Decimal> {
    if rate_pct <= dec!(-100) {
        return Err(DealSyncError::InvalidAssumption {
            field: "rate".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }

    let compounded = (Decimal::ONE + to_rate(rate_pct))
        .checked_powi(i64::from(period))
        .ok_or_else(|| DealSyncError::InvalidInput {
            field: "period".into(),
            reason: format!("Compounding overflowed at period {period}"),
        })?;

    Decimal::ONE
        .checked_div(compounded)
        .ok_or_else(|| DealSyncError::InvalidInput {
            field: "period".into(),
            reason: format!("Discount factor underflowed at period {period}"),
        })
}

/// Error for an intermediate result that left the 96-bit decimal range.
pub(crate) fn overflow(field: &str, what: &str) -> DealSyncError {
    DealSyncError::InvalidInput {
        field: field.into(),
        reason: format!("{what} is outside the representable decimal range"),
    }
}

/// Sum that reports overflow instead of panicking.
pub(crate) fn checked_sum<'a, I>(values: I, field: &str) -> DealSyncResult<Decimal>
where
    I: IntoIterator<Item = &'a Decimal>,
{
    values.into_iter().try_fold(Decimal::ZERO, |acc, v| {
        acc.checked_add(*v).ok_or_else(|| overflow(field, "Sum"))
    })
}

/// Gordon growth perpetuity: `CF * (1 + g) / (r - g)`.
///
/// A spread so narrow that the value leaves the decimal range is reported
/// as an assumption error.
pub fn gordon_growth_value(
    cash_flow: Money,
    rate_pct: Percent,
    growth_pct: Percent,
) -> DealSyncResult<Money> {
    let spread = to_rate(rate_pct) - to_rate(growth_pct);
    if spread <= Decimal::ZERO {
        return Err(DealSyncError::InvalidAssumption {
            field: "terminal_growth".into(),
            reason: format!(
                "Discount rate ({rate_pct}%) must exceed growth ({growth_pct}%) for a growing perpetuity"
            ),
        });
    }
    let grown = cash_flow
        .checked_mul(Decimal::ONE + to_rate(growth_pct))
        .ok_or_else(|| overflow("terminal_value", "Grown terminal cash flow"))?;
    grown
        .checked_div(spread)
        .ok_or_else(|| DealSyncError::InvalidAssumption {
            field: "terminal_growth".into(),
            reason: format!(
                "Terminal value overflows: WACC ({rate_pct}%) and growth ({growth_pct}%) are too close for a cash flow of {cash_flow}"
            ),
        })
}

/// Capitalise a recurring annual amount at `rate_pct`: `amount / r`.
pub fn perpetuity_value(annual: Money, rate_pct: Percent) -> DealSyncResult<Money> {
    let rate = to_rate(rate_pct);
    if rate <= Decimal::ZERO {
        return Err(DealSyncError::InvalidAssumption {
            field: "capitalisation_rate".into(),
            reason: format!("Capitalisation rate must be positive, got {rate_pct}%"),
        });
    }
    annual
        .checked_div(rate)
        .ok_or_else(|| DealSyncError::InvalidAssumption {
            field: "capitalisation_rate".into(),
            reason: format!(
                "Capitalising {annual} at {rate_pct}% overflows; the rate is too small"
            ),
        })
}
