use clap::Args;
use std::time::Instant;

use dealsync_core::deal::{analyze_deal, DealInputs};

use super::ma::synergy_warnings;
use super::{envelope, CommandResult};
use crate::input;

/// Arguments for whole-deal analysis
#[derive(Args)]
pub struct AnalyzeArgs {
    /// Path to a JSON/YAML deal snapshot (stdin is read when omitted)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_analyze(args: AnalyzeArgs) -> CommandResult {
    let started = Instant::now();
    let inputs: DealInputs = input::load(args.input.as_deref())?
        .ok_or("--input <deal.json|deal.yaml> or stdin required for deal analysis")?;

    let fingerprint = inputs.fingerprint()?;
    tracing::info!(
        fingerprint = %fingerprint,
        periods = inputs.cash_flows.periods(),
        bands = inputs.external_bands.len(),
        "analyzing deal"
    );

    let analysis = analyze_deal(&inputs)?;

    let mut warnings = analysis.dcf.warnings();
    warnings.extend(synergy_warnings(&analysis.synergy));

    envelope(
        "DCF, synergy NPV, accretion/dilution and football field from one snapshot",
        &serde_json::json!({
            "fingerprint": fingerprint,
            "assumptions": inputs.assumptions,
            "synergy_model": inputs.synergy_model,
            "sensitivity": inputs.sensitivity,
        }),
        warnings,
        started,
        analysis,
    )
}
