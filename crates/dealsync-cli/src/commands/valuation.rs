use clap::Args;
use rust_decimal::Decimal;
use std::time::Instant;

use dealsync_core::types::{CashFlowSeries, DiscountAssumptions, SensitivityVariable};
use dealsync_core::valuation::dcf::{self, DcfInput};
use dealsync_core::valuation::football_field::{
    self, FootballFieldInput, SensitivityPolicy, ValuationBand, ValuationMethod,
};
use dealsync_core::valuation::sensitivity::{self, DcfSensitivityInput};

use super::{envelope, missing, CommandResult};
use crate::input;

/// Arguments for DCF valuation
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct DcfArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Projected free cash flows, comma separated (e.g. 50,55,60,65,70)
    #[arg(long, value_delimiter = ',')]
    pub cash_flows: Vec<Decimal>,

    /// Discount rate in percent (8.5 = 8.5%)
    #[arg(long)]
    pub wacc: Option<Decimal>,

    /// Terminal growth rate in percent
    #[arg(long)]
    pub terminal_growth: Option<Decimal>,
}

/// Arguments for the football-field chart data
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct FootballFieldArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    #[arg(long, value_delimiter = ',')]
    pub cash_flows: Vec<Decimal>,

    #[arg(long)]
    pub wacc: Option<Decimal>,

    #[arg(long)]
    pub terminal_growth: Option<Decimal>,

    /// DCF band as EV +/- this percentage
    #[arg(long, conflicts_with_all = ["wacc_shift", "growth_shift"])]
    pub spread_pct: Option<Decimal>,

    /// DCF band from re-valuing at WACC +/- this many points
    #[arg(long)]
    pub wacc_shift: Option<Decimal>,

    /// Terminal growth shift paired with --wacc-shift
    #[arg(long)]
    pub growth_shift: Option<Decimal>,

    /// External band as method:low:high, method one of comps | precedents
    /// (repeatable, chart order is flag order)
    #[arg(long = "band")]
    pub bands: Vec<String>,
}

/// Arguments for the WACC x terminal growth sensitivity grid
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct SensitivityArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    #[arg(long, value_delimiter = ',')]
    pub cash_flows: Vec<Decimal>,

    /// WACC sweep as min:max:step
    #[arg(long)]
    pub wacc_range: Option<String>,

    /// Terminal growth sweep as min:max:step
    #[arg(long)]
    pub growth_range: Option<String>,
}

// ---------------------------------------------------------------------------
// Flag parsing
// ---------------------------------------------------------------------------

pub(crate) fn series_from_flags(
    flows: Vec<Decimal>,
) -> Result<CashFlowSeries, Box<dyn std::error::Error>> {
    if flows.is_empty() {
        return Err(missing("cash-flows"));
    }
    Ok(CashFlowSeries::new(flows)?)
}

pub(crate) fn assumptions_from_flags(
    wacc: Option<Decimal>,
    terminal_growth: Option<Decimal>,
) -> Result<DiscountAssumptions, Box<dyn std::error::Error>> {
    Ok(DiscountAssumptions::new(
        wacc.ok_or_else(|| missing("wacc"))?,
        terminal_growth.ok_or_else(|| missing("terminal-growth"))?,
    ))
}

fn parse_band(spec: &str) -> Result<ValuationBand, Box<dyn std::error::Error>> {
    let parts: Vec<&str> = spec.split(':').collect();
    if parts.len() != 3 {
        return Err(format!("Band must be method:low:high, got '{}'", spec).into());
    }
    let method = match parts[0].to_lowercase().as_str() {
        "comps" | "comparable_companies" => ValuationMethod::ComparableCompanies,
        "precedents" | "precedent_transactions" => ValuationMethod::PrecedentTransactions,
        other => {
            return Err(format!(
                "Unknown band method '{}'. Available methods: comps, precedents",
                other
            )
            .into())
        }
    };
    Ok(ValuationBand::new(method, parts[1].parse()?, parts[2].parse()?)?)
}

fn parse_sweep(
    name: &str,
    spec: &str,
) -> Result<SensitivityVariable, Box<dyn std::error::Error>> {
    let parts: Vec<&str> = spec.split(':').collect();
    if parts.len() != 3 {
        return Err(format!("Sweep must be min:max:step, got '{}'", spec).into());
    }
    Ok(SensitivityVariable {
        name: name.to_string(),
        min: parts[0].parse()?,
        max: parts[1].parse()?,
        step: parts[2].parse()?,
    })
}

fn policy_from_flags(
    args: &FootballFieldArgs,
) -> Result<SensitivityPolicy, Box<dyn std::error::Error>> {
    if let Some(spread_pct) = args.spread_pct {
        return Ok(SensitivityPolicy::Percentage { spread_pct });
    }
    match (args.wacc_shift, args.growth_shift) {
        (Some(wacc_shift), growth_shift) => Ok(SensitivityPolicy::AssumptionShift {
            wacc_shift,
            growth_shift: growth_shift.unwrap_or(Decimal::ZERO),
        }),
        (None, Some(_)) => Err(missing("wacc-shift")),
        (None, None) => {
            Err("one of --spread-pct or --wacc-shift is required for the DCF band".into())
        }
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

pub fn run_dcf(args: DcfArgs) -> CommandResult {
    let started = Instant::now();
    let dcf_input: DcfInput = match input::load(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => DcfInput {
            cash_flows: series_from_flags(args.cash_flows)?,
            assumptions: assumptions_from_flags(args.wacc, args.terminal_growth)?,
        },
    };

    let result = dcf::calculate_dcf(&dcf_input)?;
    envelope(
        "DCF (end-of-period discounting, Gordon growth terminal value)",
        &dcf_input.assumptions,
        result.warnings(),
        started,
        result,
    )
}

pub fn run_football_field(args: FootballFieldArgs) -> CommandResult {
    let started = Instant::now();
    let ff_input: FootballFieldInput = match input::load(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => {
            let sensitivity = policy_from_flags(&args)?;
            let external_bands = args
                .bands
                .iter()
                .map(|s| parse_band(s))
                .collect::<Result<Vec<_>, _>>()?;
            FootballFieldInput {
                cash_flows: series_from_flags(args.cash_flows)?,
                assumptions: assumptions_from_flags(args.wacc, args.terminal_growth)?,
                sensitivity,
                external_bands,
                peer_sets: vec![],
            }
        }
    };

    let result = football_field::calculate_football_field(&ff_input)?;
    envelope(
        "Football field (DCF band first, external bands in input order)",
        &serde_json::json!({
            "assumptions": ff_input.assumptions,
            "sensitivity": ff_input.sensitivity,
        }),
        Vec::new(),
        started,
        result,
    )
}

pub fn run_sensitivity(args: SensitivityArgs) -> CommandResult {
    let started = Instant::now();
    let sens_input: DcfSensitivityInput = match input::load(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => DcfSensitivityInput {
            cash_flows: series_from_flags(args.cash_flows)?,
            wacc: parse_sweep(
                "WACC",
                args.wacc_range.as_deref().ok_or_else(|| missing("wacc-range"))?,
            )?,
            terminal_growth: parse_sweep(
                "Terminal Growth",
                args.growth_range
                    .as_deref()
                    .ok_or_else(|| missing("growth-range"))?,
            )?,
        },
    };

    let result = sensitivity::calculate_dcf_sensitivity(&sens_input)?;
    envelope(
        "DCF enterprise value, WACC (rows) x terminal growth (columns)",
        &serde_json::json!({
            "wacc": sens_input.wacc,
            "terminal_growth": sens_input.terminal_growth,
        }),
        Vec::new(),
        started,
        result,
    )
}
