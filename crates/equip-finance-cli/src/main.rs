mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::bands::BandsArgs;
use commands::calculator::{LoanAmountArgs, PaymentArgs, RateArgs};

/// Equipment finance loan calculations
#[derive(Parser)]
#[command(
    name = "efc",
    version,
    about = "Equipment finance loan calculations",
    long_about = "A CLI for equipment finance loan calculations with decimal precision. \
                  Quotes monthly repayments, solves the effective rate implied by a \
                  desired payment, and sizes the maximum loan amount a monthly budget \
                  supports, all against a tiered rate-band table."
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
    /// Quote the monthly repayment for an invoice amount
    Payment(PaymentArgs),
    /// Solve the effective rate implied by a desired payment
    Rate(RateArgs),
    /// Size the maximum invoice amount a monthly payment supports
    LoanAmount(LoanAmountArgs),
    /// List the rate bands in force
    Bands(BandsArgs),
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

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Payment(args) => commands::calculator::run_payment(args),
        Commands::Rate(args) => commands::calculator::run_rate(args),
        Commands::LoanAmount(args) => commands::calculator::run_loan_amount(args),
        Commands::Bands(args) => commands::bands::run_bands(args),
        Commands::Version => {
            println!("efc {}", env!("CARGO_PKG_VERSION"));
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
