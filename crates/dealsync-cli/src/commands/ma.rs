use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use std::time::Instant;

use dealsync_core::ma::accretion::{self, AccretionDilutionResult, AccretionInput};
use dealsync_core::ma::synergy::{
    self, SynergyInput, SynergyItems, SynergyModel, SynergyResult,
};

use super::valuation::{assumptions_from_flags, series_from_flags};
use super::{envelope, missing, CommandResult};
use crate::input;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ModelArg {
    /// total / (wacc - g)
    Growing,
    /// total / wacc
    Flat,
}

impl From<ModelArg> for SynergyModel {
    fn from(arg: ModelArg) -> Self {
        match arg {
            ModelArg::Growing => SynergyModel::GrowingPerpetuity,
            ModelArg::Flat => SynergyModel::FlatPerpetuity,
        }
    }
}

/// Arguments for synergy valuation
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct SynergyArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Cost synergy line item as name=annual_amount (repeatable)
    #[arg(long = "cost")]
    pub cost: Vec<String>,

    /// Revenue synergy line item as name=annual_amount (repeatable)
    #[arg(long = "revenue")]
    pub revenue: Vec<String>,

    #[arg(long)]
    pub wacc: Option<Decimal>,

    #[arg(long)]
    pub terminal_growth: Option<Decimal>,

    /// Capitalisation model
    #[arg(long, value_enum, default_value = "growing")]
    pub model: ModelArg,
}

/// Arguments for accretion/dilution analysis
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct AccretionArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    #[arg(long, value_delimiter = ',')]
    pub cash_flows: Vec<Decimal>,

    #[arg(long)]
    pub wacc: Option<Decimal>,

    #[arg(long)]
    pub terminal_growth: Option<Decimal>,

    /// Synergy NPV to add to the standalone EV
    #[arg(long)]
    pub synergy_npv: Option<Decimal>,
}

fn parse_items(specs: &[String]) -> Result<SynergyItems, Box<dyn std::error::Error>> {
    let mut items = SynergyItems::new();
    for spec in specs {
        let (name, amount) = spec
            .split_once('=')
            .ok_or_else(|| format!("Synergy item must be name=amount, got '{}'", spec))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(format!("Synergy item has an empty name: '{}'", spec).into());
        }
        if items.insert(name.to_string(), amount.trim().parse()?).is_some() {
            return Err(format!("Duplicate synergy item '{}'", name).into());
        }
    }
    Ok(items)
}

pub(crate) fn synergy_warnings(result: &SynergyResult) -> Vec<String> {
    let mut warnings = Vec::new();
    if let Some(share) = result.revenue_share() {
        if share > Decimal::new(5, 1) {
            match share.checked_mul(Decimal::ONE_HUNDRED) {
                Some(pct) => warnings.push(format!(
                    "Revenue synergies are {:.1}% of the run-rate total",
                    pct
                )),
                None => warnings
                    .push("Revenue synergies dwarf the net run-rate total".to_string()),
            }
        }
    }
    if let Some(multiple) = result.implied_multiple() {
        if multiple > Decimal::from(25) {
            warnings.push(format!(
                "Synergies capitalised at {:.1}x run-rate; check the wacc - g spread",
                multiple
            ));
        }
    }
    warnings
}

fn accretion_warnings(result: &AccretionDilutionResult) -> Vec<String> {
    let mut warnings = Vec::new();
    if result.synergy_contribution < Decimal::ZERO {
        warnings.push("Synergy NPV is negative; the deal is dilutive to value".to_string());
    } else if result.synergy_contribution.is_zero() {
        warnings.push("Synergy NPV is zero; the deal is value-neutral".to_string());
    }
    warnings
}

pub fn run_synergy(args: SynergyArgs) -> CommandResult {
    let started = Instant::now();
    let synergy_input: SynergyInput = match input::load(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => SynergyInput {
            cost_synergies: parse_items(&args.cost)?,
            revenue_synergies: parse_items(&args.revenue)?,
            assumptions: assumptions_from_flags(args.wacc, args.terminal_growth)?,
            model: args.model.into(),
        },
    };

    let result = synergy::calculate_synergies(&synergy_input)?;
    let warnings = synergy_warnings(&result);
    envelope(
        "Synergy NPV (run-rate synergies capitalised as a perpetuity)",
        &serde_json::json!({
            "assumptions": synergy_input.assumptions,
            "model": synergy_input.model,
        }),
        warnings,
        started,
        result,
    )
}

pub fn run_accretion(args: AccretionArgs) -> CommandResult {
    let started = Instant::now();
    let acc_input: AccretionInput = match input::load(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => AccretionInput {
            cash_flows: series_from_flags(args.cash_flows)?,
            assumptions: assumptions_from_flags(args.wacc, args.terminal_growth)?,
            synergy_npv: args.synergy_npv.ok_or_else(|| missing("synergy-npv"))?,
        },
    };

    let result = accretion::calculate_accretion(&acc_input)?;
    let warnings = accretion_warnings(&result);
    envelope(
        "Accretion/dilution in value terms (standalone EV + synergy NPV)",
        &acc_input.assumptions,
        warnings,
        started,
        result,
    )
}
