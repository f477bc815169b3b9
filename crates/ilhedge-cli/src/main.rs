mod commands;
mod input;
mod output;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::binomial::{BinomialArgs, BinomialSweepArgs};
use commands::black_scholes::{BlackScholesArgs, BlackScholesSweepArgs};
use commands::continuous::{ContinuousArgs, ContinuousSweepArgs};
use commands::hedging::{HedgeArgs, HedgeSweepArgs};
use commands::replicate::ReplicateArgs;
use commands::sensitivity::SensitivityArgs;

/// Option-pricing valuations of LP impermanent loss
#[derive(Parser)]
#[command(
    name = "ilh",
    version,
    about = "Option-pricing valuations of liquidity-provider impermanent loss",
    long_about = "Prices the cost of hedging divergence loss in constant-product pools \
                  under a one-period binomial model, Black-Scholes and GBM Monte Carlo, \
                  compares gamma / variance swap hedges, and sweeps any of them into \
                  series ready for plotting."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log more to stderr (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// One-period binomial straddle premium and fee break-even
    Binomial(BinomialArgs),
    /// Sweep the binomial break-even over rate or volatility
    BinomialSweep(BinomialSweepArgs),
    /// Black-Scholes cost of hedging the LP position
    BlackScholes(BlackScholesArgs),
    /// Sweep the Black-Scholes hedge cost over volatility
    BlackScholesSweep(BlackScholesSweepArgs),
    /// Monte Carlo estimate of the discounted divergence payoff
    Continuous(ContinuousArgs),
    /// Sweep the Monte Carlo estimate over rate or volatility
    ContinuousSweep(ContinuousSweepArgs),
    /// Compare impermanent loss with gamma / variance swap hedges
    Hedge(HedgeArgs),
    /// Sweep the hedge comparison over volatility
    HedgeSweep(HedgeSweepArgs),
    /// One- or two-way sensitivity of any closed-form or simulated model
    Sensitivity(SensitivityArgs),
    /// Run every model at the reference parameters
    Replicate(ReplicateArgs),
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

/// `-v` flags win over `RUST_LOG`; without either, only warnings are shown.
fn init_tracing(verbose: u8) {
    let directives = |level: &str| format!("ilhedge_core={level},ilh={level}");
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives("warn"))),
        1 => EnvFilter::new(directives("info")),
        _ => EnvFilter::new(directives("debug")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Binomial(args) => commands::binomial::run_binomial(args),
        Commands::BinomialSweep(args) => commands::binomial::run_binomial_sweep(args),
        Commands::BlackScholes(args) => commands::black_scholes::run_black_scholes(args),
        Commands::BlackScholesSweep(args) => commands::black_scholes::run_black_scholes_sweep(args),
        Commands::Continuous(args) => commands::continuous::run_continuous(args),
        Commands::ContinuousSweep(args) => commands::continuous::run_continuous_sweep(args),
        Commands::Hedge(args) => commands::hedging::run_hedge(args),
        Commands::HedgeSweep(args) => commands::hedging::run_hedge_sweep(args),
        Commands::Sensitivity(args) => commands::sensitivity::run_sensitivity(args),
        Commands::Replicate(args) => commands::replicate::run_replicate(args),
        Commands::Version => {
            println!("ilh {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
