mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::affordability::AffordabilityArgs;
use commands::compare::CompareArgs;
use commands::monthly_payment::MonthlyPaymentArgs;
use commands::refinance::RefinanceArgs;
use commands::run::RunArgs;

/// Mortgage calculators with decimal precision
#[derive(Parser)]
#[command(
    name = "mcalc",
    version,
    about = "Mortgage affordability, payment, comparison and refinance calculators",
    long_about = "A CLI for mortgage calculations with decimal precision. Requests can be \
                  given as flags, as a JSON file via --input, or as JSON piped on stdin. \
                  Set RUST_LOG=debug to trace calculator decisions."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Maximum home price an income supports
    Affordability(AffordabilityArgs),
    /// Monthly payment with taxes, insurance and PMI
    MonthlyPayment(MonthlyPaymentArgs),
    /// Compare two loan offers over their lifetime
    Compare(CompareArgs),
    /// Net benefit of refinancing before a planned sale
    Refinance(RefinanceArgs),
    /// Run any calculator by name on a JSON request
    Run(RunArgs),
    /// List available calculators
    List,
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
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Affordability(args) => commands::affordability::run_affordability(args),
        Commands::MonthlyPayment(args) => commands::monthly_payment::run_monthly_payment(args),
        Commands::Compare(args) => commands::compare::run_compare(args),
        Commands::Refinance(args) => commands::refinance::run_refinance(args),
        Commands::Run(args) => commands::run::run_calculator(args),
        Commands::List => commands::run::run_list(),
        Commands::Version => {
            println!("mcalc {}", env!("CARGO_PKG_VERSION"));
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
