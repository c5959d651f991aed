//! Node bindings for the dealsync engines.
//!
//! Every function takes a JSON request string and returns the JSON result,
//! so decimals cross the boundary as strings and keep their precision.

use napi::Result as NapiResult;
use napi_derive::napi;
use serde::de::DeserializeOwned;
use serde::Serialize;

use dealsync_core::DealSyncResult;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

/// Parse the request, run the engine, serialise the result.
fn call<I, O>(
    input_json: &str,
    engine: impl FnOnce(&I) -> DealSyncResult<O>,
) -> NapiResult<String>
where
    I: DeserializeOwned,
    O: Serialize,
{
    let input: I = serde_json::from_str(input_json).map_err(to_napi_error)?;
    let output = engine(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Valuation
// ---------------------------------------------------------------------------

/// `{ cash_flows, assumptions: { wacc, terminal_growth } }`
#[napi]
pub fn compute_dcf(input_json: String) -> NapiResult<String> {
    call(&input_json, dealsync_core::valuation::dcf::calculate_dcf)
}

#[napi]
pub fn build_football_field(input_json: String) -> NapiResult<String> {
    call(
        &input_json,
        dealsync_core::valuation::football_field::calculate_football_field,
    )
}

#[napi]
pub fn dcf_sensitivity(input_json: String) -> NapiResult<String> {
    call(
        &input_json,
        dealsync_core::valuation::sensitivity::calculate_dcf_sensitivity,
    )
}

// ---------------------------------------------------------------------------
// M&A
// ---------------------------------------------------------------------------

/// `{ cost_synergies, revenue_synergies, assumptions, model? }`
#[napi]
pub fn compute_synergy_npv(input_json: String) -> NapiResult<String> {
    call(&input_json, dealsync_core::ma::synergy::calculate_synergies)
}

#[napi]
pub fn analyze_accretion_dilution(input_json: String) -> NapiResult<String> {
    call(&input_json, dealsync_core::ma::accretion::calculate_accretion)
}

// ---------------------------------------------------------------------------
// Whole deal
// ---------------------------------------------------------------------------

/// Full `DealInputs` snapshot in, `DealAnalysis` out.
#[napi]
pub fn analyze_deal(input_json: String) -> NapiResult<String> {
    call(&input_json, dealsync_core::deal::analyze_deal)
}

/// Content fingerprint of a `DealInputs` snapshot, for host-side caching.
#[napi]
pub fn deal_fingerprint(input_json: String) -> NapiResult<String> {
    let inputs: dealsync_core::deal::DealInputs =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    inputs.fingerprint().map_err(to_napi_error)
}
