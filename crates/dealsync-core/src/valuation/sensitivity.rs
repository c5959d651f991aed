use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::DealSyncError;
use crate::types::{CashFlowSeries, Money, SensitivityVariable};
use crate::DealSyncResult;

use super::dcf::compute_dcf;

/// Output of a 2-way sensitivity analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityOutput {
    pub variable_1_name: String,
    pub variable_2_name: String,
    pub variable_1_values: Vec<Decimal>,
    pub variable_2_values: Vec<Decimal>,
    /// Matrix[i][j] = output when variable_1 = variable_1_values[i], variable_2 = variable_2_values[j]
    pub matrix: Vec<Vec<Decimal>>,
    /// Output at the cell closest to the midpoint of both ranges
    pub base_case_value: Decimal,
    /// Position of the base case in the matrix (row, col)
    pub base_case_position: (usize, usize),
}

impl SensitivityOutput {
    /// Smallest and largest value anywhere in the matrix.
    pub fn range(&self) -> (Decimal, Decimal) {
        let mut cells = self.matrix.iter().flatten();
        let first = cells.next().copied().unwrap_or(Decimal::ZERO);
        cells.fold((first, first), |(lo, hi), v| (lo.min(*v), hi.max(*v)))
    }
}

/// Most values a single sweep axis may produce.
pub const MAX_SWEEP_POINTS: usize = 1_000;

/// Generate the sweep values for a sensitivity variable from min to max with step.
///
/// Rejects sweeps that would produce more than [`MAX_SWEEP_POINTS`] values
/// before allocating any of them.
pub fn generate_sweep_values(var: &SensitivityVariable) -> DealSyncResult<Vec<Decimal>> {
    if var.step <= Decimal::ZERO {
        return Err(DealSyncError::InvalidInput {
            field: format!("variable:{}", var.name),
            reason: "Step must be positive".into(),
        });
    }
    if var.min > var.max {
        return Err(DealSyncError::InvalidInput {
            field: format!("variable:{}", var.name),
            reason: "Min must be <= max".into(),
        });
    }

    let too_many = || DealSyncError::InvalidInput {
        field: format!("variable:{}", var.name),
        reason: format!(
            "Sweep from {} to {} by {} exceeds {} points",
            var.min, var.max, var.step, MAX_SWEEP_POINTS
        ),
    };
    let intervals = var
        .max
        .checked_sub(var.min)
        .and_then(|span| span.checked_div(var.step))
        .ok_or_else(too_many)?
        .ceil();
    // values = intervals + 1 at most
    if intervals >= Decimal::from(MAX_SWEEP_POINTS) {
        return Err(too_many());
    }

    let mut values = Vec::new();
    let mut current = var.min;
    while current <= var.max {
        values.push(current);
        match current.checked_add(var.step) {
            Some(next) => current = next,
            None => break,
        }
    }
    // Ensure max is included if step doesn't land exactly on it
    if let Some(&last) = values.last() {
        if last < var.max {
            values.push(var.max);
        }
    }

    Ok(values)
}

/// Find the closest index to a target value in a sorted list.
fn closest_index(values: &[Decimal], target: Decimal) -> usize {
    values
        .iter()
        .enumerate()
        .min_by_key(|(_, v)| (**v - target).abs())
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Evaluate a 2-way sensitivity grid using a provided computation function.
///
/// The `eval_fn` receives (variable_1_value, variable_2_value) and returns
/// the output metric value. The first failing cell aborts the sweep.
pub fn evaluate_sensitivity<F>(
    variable_1: &SensitivityVariable,
    variable_2: &SensitivityVariable,
    eval_fn: F,
) -> DealSyncResult<SensitivityOutput>
where
    F: Fn(Decimal, Decimal) -> DealSyncResult<Decimal>,
{
    let v1_values = generate_sweep_values(variable_1)?;
    let v2_values = generate_sweep_values(variable_2)?;

    let mut matrix = Vec::with_capacity(v1_values.len());
    for v1 in &v1_values {
        let mut row = Vec::with_capacity(v2_values.len());
        for v2 in &v2_values {
            row.push(eval_fn(*v1, *v2)?);
        }
        matrix.push(row);
    }

    let mid1 = variable_1.min / dec!(2) + variable_1.max / dec!(2);
    let mid2 = variable_2.min / dec!(2) + variable_2.max / dec!(2);
    let base_row = closest_index(&v1_values, mid1);
    let base_col = closest_index(&v2_values, mid2);
    let base_case_value = matrix[base_row][base_col];

    Ok(SensitivityOutput {
        variable_1_name: variable_1.name.clone(),
        variable_2_name: variable_2.name.clone(),
        variable_1_values: v1_values,
        variable_2_values: v2_values,
        matrix,
        base_case_value,
        base_case_position: (base_row, base_col),
    })
}

/// Serialisable request for [`dcf_sensitivity`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DcfSensitivityInput {
    pub cash_flows: CashFlowSeries,
    pub wacc: SensitivityVariable,
    pub terminal_growth: SensitivityVariable,
}

/// Enterprise value across a WACC (rows) x terminal growth (columns) grid.
///
/// Every grid point must satisfy the DCF assumption constraints; an invalid
/// combination fails the whole sweep.
pub fn dcf_sensitivity(
    cash_flows: &CashFlowSeries,
    wacc: &SensitivityVariable,
    terminal_growth: &SensitivityVariable,
) -> DealSyncResult<SensitivityOutput> {
    evaluate_sensitivity(wacc, terminal_growth, |w, g| -> DealSyncResult<Money> {
        Ok(compute_dcf(cash_flows, w, g)?.enterprise_value)
    })
}

pub fn calculate_dcf_sensitivity(
    input: &DcfSensitivityInput,
) -> DealSyncResult<SensitivityOutput> {
    dcf_sensitivity(&input.cash_flows, &input.wacc, &input.terminal_growth)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn wacc_var() -> SensitivityVariable {
        SensitivityVariable {
            name: "WACC".into(),
            min: dec!(8),
            max: dec!(12),
            step: dec!(1),
        }
    }

    fn growth_var() -> SensitivityVariable {
        SensitivityVariable {
            name: "Terminal Growth".into(),
            min: dec!(1),
            max: dec!(3),
            step: dec!(1),
        }
    }

    fn flows() -> CashFlowSeries {
        CashFlowSeries::new(vec![dec!(50), dec!(55), dec!(60), dec!(65), dec!(70)]).unwrap()
    }

    #[test]
    fn test_sweep_values_include_max() {
        let var = SensitivityVariable {
            name: "x".into(),
            min: dec!(1),
            max: dec!(2),
            step: dec!(0.4),
        };
        let values = generate_sweep_values(&var).unwrap();
        assert_eq!(values, vec![dec!(1), dec!(1.4), dec!(1.8), dec!(2)]);
    }

    #[test]
    fn test_sweep_rejects_bad_step() {
        let mut var = wacc_var();
        var.step = Decimal::ZERO;
        assert!(generate_sweep_values(&var).is_err());
    }

    #[test]
    fn test_sweep_point_limit() {
        let mut var = SensitivityVariable {
            name: "x".into(),
            min: dec!(0),
            max: dec!(999),
            step: dec!(1),
        };
        assert_eq!(generate_sweep_values(&var).unwrap().len(), MAX_SWEEP_POINTS);

        var.max = dec!(1000);
        assert!(generate_sweep_values(&var).is_err());
    }

    #[test]
    fn test_fine_step_rejected_before_allocating() {
        let var = SensitivityVariable {
            name: "WACC".into(),
            min: dec!(8),
            max: dec!(12),
            step: dec!(0.0000000001),
        };
        let err = generate_sweep_values(&var).unwrap_err();
        assert!(matches!(err, DealSyncError::InvalidInput { .. }));
        assert!(dcf_sensitivity(&flows(), &var, &growth_var()).is_err());
    }

    #[test]
    fn test_sweep_near_decimal_max_does_not_overflow() {
        let var = SensitivityVariable {
            name: "x".into(),
            min: Decimal::MAX - dec!(2),
            max: Decimal::MAX,
            step: dec!(1),
        };
        let values = generate_sweep_values(&var).unwrap();
        assert_eq!(values.last(), Some(&Decimal::MAX));
        assert_eq!(values.len(), 3);
    }

    #[test]
    fn test_sweep_rejects_inverted_range() {
        let mut var = wacc_var();
        var.min = dec!(13);
        assert!(generate_sweep_values(&var).is_err());
    }

    #[test]
    fn test_dcf_sensitivity_dimensions_and_base_case() {
        let out = dcf_sensitivity(&flows(), &wacc_var(), &growth_var()).unwrap();
        assert_eq!(out.matrix.len(), 5);
        assert_eq!(out.matrix[0].len(), 3);
        // Midpoints are WACC 10, growth 2
        assert_eq!(out.base_case_position, (2, 1));
        let base = compute_dcf(&flows(), dec!(10), dec!(2)).unwrap();
        assert_eq!(out.base_case_value, base.enterprise_value);
    }

    #[test]
    fn test_ev_falls_as_wacc_rises() {
        let out = dcf_sensitivity(&flows(), &wacc_var(), &growth_var()).unwrap();
        for col in 0..out.variable_2_values.len() {
            for row in 1..out.variable_1_values.len() {
                assert!(out.matrix[row][col] < out.matrix[row - 1][col]);
            }
        }
    }

    #[test]
    fn test_invalid_grid_point_fails_fast() {
        let mut growth = growth_var();
        growth.max = dec!(8); // reaches the lowest WACC
        assert!(dcf_sensitivity(&flows(), &wacc_var(), &growth).is_err());
    }

    #[test]
    fn test_range() {
        let out = dcf_sensitivity(&flows(), &wacc_var(), &growth_var()).unwrap();
        let (lo, hi) = out.range();
        // Highest value at lowest WACC / highest growth, lowest at the opposite corner
        assert_eq!(hi, out.matrix[0][2]);
        assert_eq!(lo, out.matrix[4][0]);
    }
}
