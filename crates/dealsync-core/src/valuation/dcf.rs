use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::time_value::{checked_sum, discount_factor, gordon_growth_value, overflow};
use crate::types::{CashFlowSeries, DiscountAssumptions, Money, Percent, Rate};
use crate::DealSyncResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Input parameters for a Discounted Cash Flow valuation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DcfInput {
    /// Projected free cash flows, period 1..N
    pub cash_flows: CashFlowSeries,
    /// WACC and terminal growth, both in percent
    pub assumptions: DiscountAssumptions,
}

/// Output of the DCF valuation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DcfResult {
    /// Discounted value of each explicit-period cash flow, aligned to the input
    pub present_values: Vec<Money>,
    /// `1 / (1 + wacc)^i` for each period
    pub discount_factors: Vec<Rate>,
    /// Sum of present values of explicit-period cash flows
    pub sum_of_present_values: Money,
    /// Gordon growth terminal value at period N
    pub terminal_value: Money,
    /// Terminal value discounted at the period-N factor
    pub present_value_of_terminal: Money,
    /// Enterprise value = sum(PV) + PV(TV)
    pub enterprise_value: Money,
    /// PV(TV) as a fraction of enterprise value (zero when EV is zero)
    pub terminal_value_pct: Rate,
    /// Cash flows the result was computed from
    pub cash_flows: CashFlowSeries,
    /// Assumptions the result was computed from
    pub assumptions: DiscountAssumptions,
}

impl DcfResult {
    /// Advisory notes that do not invalidate the valuation.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.terminal_value_pct > dec!(0.75) {
            warnings.push(match self.terminal_value_pct.checked_mul(dec!(100)) {
                Some(pct) => format!(
                    "Terminal value represents {:.1}% of enterprise value; consider extending the explicit forecast period",
                    pct
                ),
                None => "Terminal value dwarfs enterprise value; explicit-period cash flows largely offset it".to_string(),
            });
        }
        if self.enterprise_value <= Decimal::ZERO {
            warnings.push(format!(
                "Enterprise value is non-positive ({}); accretion ratios against it are not meaningful",
                self.enterprise_value
            ));
        }
        warnings
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Value a projected cash-flow series with a Gordon growth terminal value.
///
/// `wacc` and `terminal_growth` are percentages (8.5 = 8.5%). Each cash flow
/// at period `i` is discounted by `1 / (1 + wacc)^i`; the terminal value is
/// taken on the last projected cash flow and discounted at the period-N
/// factor.
pub fn compute_dcf(
    cash_flows: &CashFlowSeries,
    wacc: Percent,
    terminal_growth: Percent,
) -> DealSyncResult<DcfResult> {
    let assumptions = DiscountAssumptions::new(wacc, terminal_growth);
    assumptions.validate()?;

    let n = cash_flows.periods();

    // --- Discount explicit period ---
    let mut present_values = Vec::with_capacity(n as usize);
    let mut discount_factors = Vec::with_capacity(n as usize);
    for (idx, cf) in cash_flows.iter().enumerate() {
        let df = discount_factor(wacc, idx as u32 + 1)?;
        discount_factors.push(df);
        present_values.push(
            cf.checked_mul(df)
                .ok_or_else(|| overflow("present_values", "Discounted cash flow"))?,
        );
    }
    let sum_of_present_values = checked_sum(&present_values, "sum_of_present_values")?;

    // --- Terminal value ---
    let terminal_value = gordon_growth_value(cash_flows.last(), wacc, terminal_growth)?;
    let final_factor = discount_factors[discount_factors.len() - 1];
    let present_value_of_terminal = terminal_value
        .checked_mul(final_factor)
        .ok_or_else(|| overflow("present_value_of_terminal", "Discounted terminal value"))?;

    // --- Enterprise value ---
    let enterprise_value = sum_of_present_values
        .checked_add(present_value_of_terminal)
        .ok_or_else(|| overflow("enterprise_value", "Enterprise value"))?;

    let terminal_value_pct = if enterprise_value.is_zero() {
        Decimal::ZERO
    } else {
        present_value_of_terminal
            .checked_div(enterprise_value)
            .ok_or_else(|| overflow("terminal_value_pct", "Terminal value share"))?
    };

    Ok(DcfResult {
        present_values,
        discount_factors,
        sum_of_present_values,
        terminal_value,
        present_value_of_terminal,
        enterprise_value,
        terminal_value_pct,
        cash_flows: cash_flows.clone(),
        assumptions,
    })
}

/// Run [`compute_dcf`] from a serialisable input bundle.
pub fn calculate_dcf(input: &DcfInput) -> DealSyncResult<DcfResult> {
    compute_dcf(
        &input.cash_flows,
        input.assumptions.wacc,
        input.assumptions.terminal_growth,
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DealSyncError;
    use rust_decimal_macros::dec;

    fn sample_flows() -> CashFlowSeries {
        CashFlowSeries::new(vec![dec!(50), dec!(55), dec!(60), dec!(65), dec!(70)]).unwrap()
    }

    #[test]
    fn test_basic_dcf() {
        let out = compute_dcf(&sample_flows(), dec!(8.5), dec!(2.5)).unwrap();

        assert_eq!(out.present_values.len(), 5);
        assert_eq!(out.discount_factors.len(), 5);

        // Year 1: 50 / 1.085 = 46.0829...
        assert!((out.present_values[0] - dec!(46.0829493)).abs() < dec!(0.00001));

        assert_eq!(
            out.enterprise_value,
            out.sum_of_present_values + out.present_value_of_terminal
        );
    }

    #[test]
    fn test_terminal_value_discounted_at_final_factor() {
        let out = compute_dcf(&sample_flows(), dec!(8.5), dec!(2.5)).unwrap();
        assert_eq!(
            out.present_value_of_terminal,
            out.terminal_value * out.discount_factors[4]
        );
    }

    #[test]
    fn test_single_period() {
        let flows = CashFlowSeries::new(vec![dec!(100)]).unwrap();
        let out = compute_dcf(&flows, dec!(10), dec!(0)).unwrap();
        // PV = 100 / 1.1; TV = 100 / 0.1 = 1000; PV(TV) = 1000 / 1.1
        assert!((out.sum_of_present_values - dec!(90.9090909)).abs() < dec!(0.00001));
        assert_eq!(out.terminal_value, dec!(1000));
        assert!((out.enterprise_value - dec!(1000)).abs() < dec!(0.00001));
    }

    #[test]
    fn test_wacc_equal_to_growth_rejected() {
        let err = compute_dcf(&sample_flows(), dec!(5), dec!(5)).unwrap_err();
        assert!(matches!(err, DealSyncError::InvalidAssumption { .. }));
    }

    #[test]
    fn test_growth_above_wacc_rejected() {
        assert!(compute_dcf(&sample_flows(), dec!(5), dec!(6)).is_err());
    }

    #[test]
    fn test_near_equal_rates_error_instead_of_overflowing() {
        let flows = CashFlowSeries::new(vec![dec!(100000000)]).unwrap();
        let err = compute_dcf(&flows, dec!(8.5), dec!(8.49999999999999999999)).unwrap_err();
        assert!(err.is_assumption_error());
    }

    #[test]
    fn test_zero_wacc_rejected() {
        let err = compute_dcf(&sample_flows(), Decimal::ZERO, dec!(-1)).unwrap_err();
        assert!(err.is_assumption_error());
    }

    #[test]
    fn test_terminal_value_share_warning() {
        // Long-dated perpetuity dominates a short forecast
        let out = compute_dcf(&sample_flows(), dec!(6), dec!(4)).unwrap();
        assert!(out.terminal_value_pct > dec!(0.75));
        assert_eq!(out.warnings().len(), 1);
    }

    #[test]
    fn test_calculate_dcf_matches_compute() {
        let input = DcfInput {
            cash_flows: sample_flows(),
            assumptions: DiscountAssumptions::new(dec!(8.5), dec!(2.5)),
        };
        assert_eq!(
            calculate_dcf(&input).unwrap(),
            compute_dcf(&sample_flows(), dec!(8.5), dec!(2.5)).unwrap()
        );
    }
}
