use dealsync_core::types::{CashFlowSeries, DiscountAssumptions, SensitivityVariable};
use dealsync_core::valuation::{comps, dcf, football_field, sensitivity};
use dealsync_core::DealSyncError;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use football_field::{SensitivityPolicy, ValuationBand, ValuationMethod};

fn dashboard_flows() -> CashFlowSeries {
    CashFlowSeries::new(vec![dec!(50), dec!(55), dec!(60), dec!(65), dec!(70)]).unwrap()
}

fn close(a: Decimal, b: Decimal, tol: Decimal) -> bool {
    (a - b).abs() < tol
}

// ===========================================================================
// DCF tests
// ===========================================================================

#[test]
fn test_dcf_golden_vector() {
    // cash flows 50..70, WACC 8.5%, g 2.5%
    // PV = 46.0829 + 46.7200 + 46.9745 + 46.9023 + 46.5532 = 233.2330
    // TV = 70 * 1.025 / 0.06 = 1195.8333
    // PV(TV) = 1195.8333 / 1.085^5 = 795.2835
    // EV = 1028.5165
    let out = dcf::compute_dcf(&dashboard_flows(), dec!(8.5), dec!(2.5)).unwrap();

    let expected_pvs = [
        dec!(46.0829493088),
        dec!(46.7200407739),
        dec!(46.9744859058),
        dec!(46.9023284774),
        dec!(46.5531796302),
    ];
    for (got, want) in out.present_values.iter().zip(expected_pvs.iter()) {
        assert!(close(*got, *want, dec!(0.0000001)), "PV {got} != {want}");
    }

    assert!(close(out.terminal_value, dec!(1195.8333333333), dec!(0.0000001)));
    assert!(close(out.present_value_of_terminal, dec!(795.2834853491), dec!(0.0000001)));
    assert!(close(out.sum_of_present_values, dec!(233.2329840961), dec!(0.0000001)));
    assert!(close(out.enterprise_value, dec!(1028.5164694451), dec!(0.0000001)));
}

#[test]
fn test_dcf_discount_factors_follow_wacc() {
    let out = dcf::compute_dcf(&dashboard_flows(), dec!(8.5), dec!(2.5)).unwrap();
    for (idx, df) in out.discount_factors.iter().enumerate() {
        let period = idx as i32 + 1;
        let mut expected = Decimal::ONE;
        for _ in 0..period {
            expected /= dec!(1.085);
        }
        assert!(close(*df, expected, dec!(0.0000000001)));
    }
}

#[test]
fn test_dcf_wacc_equal_to_growth_is_invalid_assumption() {
    let err = dcf::compute_dcf(&dashboard_flows(), dec!(4), dec!(4)).unwrap_err();
    assert!(matches!(err, DealSyncError::InvalidAssumption { .. }));
}

#[test]
fn test_dcf_negative_wacc_is_invalid_assumption() {
    let err = dcf::compute_dcf(&dashboard_flows(), dec!(-1), dec!(-2)).unwrap_err();
    assert!(err.is_assumption_error());
}

#[test]
fn test_dcf_growth_at_minus_hundred_rejected() {
    assert!(dcf::compute_dcf(&dashboard_flows(), dec!(8), dec!(-100)).is_err());
}

#[test]
fn test_dcf_empty_series_is_invalid_input() {
    let err = CashFlowSeries::new(vec![]).unwrap_err();
    assert!(matches!(err, DealSyncError::InvalidInput { .. }));
}

#[test]
fn test_dcf_non_finite_host_value_is_invalid_input() {
    let err = CashFlowSeries::from_f64(&[50.0, f64::NEG_INFINITY]).unwrap_err();
    assert!(matches!(err, DealSyncError::InvalidInput { .. }));
}

#[test]
fn test_dcf_idempotent() {
    let a = dcf::compute_dcf(&dashboard_flows(), dec!(8.5), dec!(2.5)).unwrap();
    let b = dcf::compute_dcf(&dashboard_flows(), dec!(8.5), dec!(2.5)).unwrap();
    assert_eq!(a, b);
    assert_eq!(
        serde_json::to_string(&a).unwrap(),
        serde_json::to_string(&b).unwrap()
    );
}

#[test]
fn test_dcf_result_round_trips_through_json() {
    let out = dcf::compute_dcf(&dashboard_flows(), dec!(8.5), dec!(2.5)).unwrap();
    let json = serde_json::to_string(&out).unwrap();
    let back: dcf::DcfResult = serde_json::from_str(&json).unwrap();
    assert_eq!(out, back);
}

#[test]
fn test_dcf_negative_cash_flows_allowed() {
    let flows = CashFlowSeries::new(vec![dec!(-20), dec!(10), dec!(30)]).unwrap();
    let out = dcf::compute_dcf(&flows, dec!(10), dec!(2)).unwrap();
    assert!(out.present_values[0] < Decimal::ZERO);
    assert!(out.enterprise_value > Decimal::ZERO);
}

#[test]
fn test_dcf_near_equal_rates_return_error_not_panic() {
    // Valid (wacc > g) but the terminal value would exceed the decimal range
    let input: dcf::DcfInput = serde_json::from_str(
        r#"{
            "cash_flows": ["100000000"],
            "assumptions": { "wacc": "8.5", "terminal_growth": "8.49999999999999999999" }
        }"#,
    )
    .unwrap();
    let err = dcf::calculate_dcf(&input).unwrap_err();
    assert!(err.is_assumption_error());
}

#[test]
fn test_calculate_dcf_from_json_input() {
    let input: dcf::DcfInput = serde_json::from_str(
        r#"{
            "cash_flows": ["50", "55", "60", "65", "70"],
            "assumptions": { "wacc": "8.5", "terminal_growth": "2.5" }
        }"#,
    )
    .unwrap();
    let out = dcf::calculate_dcf(&input).unwrap();
    assert!(close(out.enterprise_value, dec!(1028.5164694451), dec!(0.0000001)));
    assert_eq!(out.assumptions, DiscountAssumptions::new(dec!(8.5), dec!(2.5)));
}

// ===========================================================================
// Sensitivity tests
// ===========================================================================

#[test]
fn test_sensitivity_matrix_matches_point_dcf() {
    let wacc = SensitivityVariable {
        name: "WACC".into(),
        min: dec!(7.5),
        max: dec!(9.5),
        step: dec!(0.5),
    };
    let growth = SensitivityVariable {
        name: "Terminal Growth".into(),
        min: dec!(2),
        max: dec!(3),
        step: dec!(0.5),
    };
    let out = sensitivity::dcf_sensitivity(&dashboard_flows(), &wacc, &growth).unwrap();
    assert_eq!(out.variable_1_values.len(), 5);
    assert_eq!(out.variable_2_values.len(), 3);

    // Centre cell is the dashboard default
    assert_eq!(out.base_case_position, (2, 1));
    assert!(close(out.base_case_value, dec!(1028.5164694451), dec!(0.0000001)));
}

#[test]
fn test_sensitivity_rejects_oversized_sweep() {
    let input: sensitivity::DcfSensitivityInput = serde_json::from_str(
        r#"{
            "cash_flows": ["50", "55", "60"],
            "wacc": { "name": "WACC", "min": "8", "max": "12", "step": "0.0000000001" },
            "terminal_growth": { "name": "g", "min": "2", "max": "3", "step": "0.5" }
        }"#,
    )
    .unwrap();
    let err = sensitivity::calculate_dcf_sensitivity(&input).unwrap_err();
    assert!(matches!(err, DealSyncError::InvalidInput { .. }));
}

// ===========================================================================
// Football field tests
// ===========================================================================

#[test]
fn test_football_field_dcf_first_then_caller_order() {
    let dcf_out = dcf::compute_dcf(&dashboard_flows(), dec!(8.5), dec!(2.5)).unwrap();
    // Deliberately supply the higher band first
    let externals = vec![
        ValuationBand::new(ValuationMethod::PrecedentTransactions, dec!(1300), dec!(1600))
            .unwrap(),
        ValuationBand::new(ValuationMethod::ComparableCompanies, dec!(800), dec!(1100)).unwrap(),
    ];
    let out = football_field::build_football_field(
        &dcf_out,
        &externals,
        &SensitivityPolicy::AssumptionShift {
            wacc_shift: dec!(0.5),
            growth_shift: dec!(0.5),
        },
    )
    .unwrap();

    let methods: Vec<ValuationMethod> = out.bands.iter().map(|b| b.method).collect();
    assert_eq!(
        methods,
        vec![
            ValuationMethod::Dcf,
            ValuationMethod::PrecedentTransactions,
            ValuationMethod::ComparableCompanies,
        ]
    );
    assert_eq!(out.bands[1], externals[0]);
    assert_eq!(out.bands[2], externals[1]);
    assert_eq!(out.overall_low, dec!(800));
    assert_eq!(out.overall_high, dec!(1600));
}

#[test]
fn test_football_field_grid_policy_spans_matrix() {
    let dcf_out = dcf::compute_dcf(&dashboard_flows(), dec!(8.5), dec!(2.5)).unwrap();
    let policy = SensitivityPolicy::Grid {
        wacc: SensitivityVariable {
            name: "WACC".into(),
            min: dec!(8),
            max: dec!(9),
            step: dec!(0.5),
        },
        terminal_growth: SensitivityVariable {
            name: "Terminal Growth".into(),
            min: dec!(2),
            max: dec!(3),
            step: dec!(0.5),
        },
    };
    let band = football_field::dcf_band(&dcf_out, &policy).unwrap();
    let lowest = dcf::compute_dcf(&dashboard_flows(), dec!(9), dec!(2)).unwrap();
    let highest = dcf::compute_dcf(&dashboard_flows(), dec!(8), dec!(3)).unwrap();
    assert!(close(band.low, lowest.enterprise_value, dec!(0.0000001)));
    assert!(close(band.high, highest.enterprise_value, dec!(0.0000001)));
}

#[test]
fn test_football_field_with_no_external_bands() {
    let dcf_out = dcf::compute_dcf(&dashboard_flows(), dec!(8.5), dec!(2.5)).unwrap();
    let out = football_field::build_football_field(
        &dcf_out,
        &[],
        &SensitivityPolicy::Percentage { spread_pct: Decimal::ZERO },
    )
    .unwrap();
    assert_eq!(out.bands.len(), 1);
    assert_eq!(out.bands[0].low, out.bands[0].high);
    assert_eq!(out.overall_low, dcf_out.enterprise_value);
}

#[test]
fn test_football_field_policy_from_json() {
    let policy: SensitivityPolicy =
        serde_json::from_str(r#"{"AssumptionShift": {"wacc_shift": "1", "growth_shift": "0.5"}}"#)
            .unwrap();
    assert_eq!(
        policy,
        SensitivityPolicy::AssumptionShift {
            wacc_shift: dec!(1),
            growth_shift: dec!(0.5),
        }
    );
}

// ===========================================================================
// Peer multiple band tests
// ===========================================================================

#[test]
fn test_comps_band_feeds_football_field() {
    let dcf_out = dcf::compute_dcf(&dashboard_flows(), dec!(8.5), dec!(2.5)).unwrap();
    // Target EBITDA 95, peers trading 9x-13x
    let comps_band = comps::implied_band(
        ValuationMethod::ComparableCompanies,
        dec!(95),
        &[dec!(9), dec!(10), dec!(11), dec!(12), dec!(13)],
    )
    .unwrap();
    assert_eq!(comps_band.low, dec!(950));
    assert_eq!(comps_band.high, dec!(1140));

    let out = football_field::build_football_field(
        &dcf_out,
        &[comps_band],
        &SensitivityPolicy::Percentage { spread_pct: dec!(10) },
    )
    .unwrap();
    assert_eq!(out.bands.len(), 2);
}
