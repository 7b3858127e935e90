mod commands;
mod input;
mod logging;
mod output;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use serde_json::Value;
use std::process;

use commands::fund::FundArgs;
use commands::lbo::LboArgs;
use commands::scenarios::{MonteCarloArgs, SensitivityArgs};
use commands::waterfall::WaterfallArgs;

/// Leveraged buyout and fund waterfall modelling
#[derive(Parser)]
#[command(
    name = "buyout",
    version,
    about = "Leveraged buyout and fund waterfall modelling",
    long_about = "A CLI for multi-year LBO cash-flow projection with decimal precision. \
                  Runs single deals, allocates fund distributions between LPs and the GP, \
                  and sweeps or samples deal inputs for scenario analysis."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log verbosity on stderr (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Project an LBO year by year and compute sponsor IRR / MOIC
    Lbo(LboArgs),
    /// Allocate fund distributions between LPs and the GP
    Waterfall(WaterfallArgs),
    /// Run an LBO and allocate its equity flows through the fund waterfall
    Fund(FundArgs),
    /// One- or two-way sensitivity of deal returns
    Sensitivity(SensitivityArgs),
    /// Monte Carlo over exit multiple, margin and growth
    MonteCarlo(MonteCarloArgs),
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
    logging::init_logging(cli.verbose);

    let result: Result<Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Lbo(args) => commands::lbo::run_lbo(args),
        Commands::Waterfall(args) => commands::waterfall::run_waterfall(args),
        Commands::Fund(args) => commands::fund::run_fund(args),
        Commands::Sensitivity(args) => commands::scenarios::run_sensitivity(args),
        Commands::MonteCarlo(args) => commands::scenarios::run_monte_carlo(args),
        Commands::Version => {
            println!("buyout {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(Value::String(text)) => {
            println!("{text}");
            process::exit(0);
        }
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
