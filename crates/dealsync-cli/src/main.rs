mod commands;
mod input;
mod logging;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::deal::AnalyzeArgs;
use commands::ma::{AccretionArgs, SynergyArgs};
use commands::valuation::{DcfArgs, FootballFieldArgs, SensitivityArgs};

/// M&A deal valuation: DCF, synergies, accretion/dilution, football field
#[derive(Parser)]
#[command(
    name = "dealsync",
    version,
    about = "M&A deal valuation with decimal precision",
    long_about = "A CLI for valuing an acquisition target: standalone DCF, synergy NPV, \
                  accretion/dilution versus standalone, and football-field valuation \
                  ranges. Rates are given in percent (8.5 = 8.5%). Inputs come from \
                  flags, a JSON/YAML file (--input) or piped stdin."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Diagnostic log level on stderr (RUST_LOG overrides)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Standalone discounted cash flow valuation
    Dcf(DcfArgs),
    /// Value cost and revenue synergies as a perpetuity
    Synergy(SynergyArgs),
    /// Combined value versus standalone EV
    Accretion(AccretionArgs),
    /// Valuation ranges by method, DCF first
    FootballField(FootballFieldArgs),
    /// Enterprise value across a WACC x terminal growth grid
    Sensitivity(SensitivityArgs),
    /// Run every engine on one deal snapshot
    Analyze(AnalyzeArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();
    logging::init_logging(&cli.log_level);

    let result: commands::CommandResult = match cli.command {
        Commands::Dcf(args) => commands::valuation::run_dcf(args),
        Commands::Synergy(args) => commands::ma::run_synergy(args),
        Commands::Accretion(args) => commands::ma::run_accretion(args),
        Commands::FootballField(args) => commands::valuation::run_football_field(args),
        Commands::Sensitivity(args) => commands::valuation::run_sensitivity(args),
        Commands::Analyze(args) => commands::deal::run_analyze(args),
        Commands::Version => {
            println!("dealsync {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            tracing::debug!(error = %e, "command failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
