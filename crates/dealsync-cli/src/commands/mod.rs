pub mod deal;
pub mod ma;
pub mod valuation;

use dealsync_core::types::with_metadata;
use serde::Serialize;
use serde_json::Value;
use std::time::Instant;

pub type CommandResult = Result<Value, Box<dyn std::error::Error>>;

/// Wrap an engine result in the standard output envelope.
pub(crate) fn envelope<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    started: Instant,
    result: T,
) -> CommandResult {
    let elapsed = started.elapsed().as_micros() as u64;
    let output = with_metadata(methodology, assumptions, warnings, elapsed, result);
    Ok(serde_json::to_value(output)?)
}

/// Error for a flag that is required when no input document is given.
pub(crate) fn missing(flag: &str) -> Box<dyn std::error::Error> {
    format!("--{flag} is required (or provide --input / stdin)").into()
}
