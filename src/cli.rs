use clap::{Parser, Subcommand};
use std::path::PathBuf;

use maxpain::commands::DEFAULT_SYMBOLS;

/// Options-chain max-pain estimator: fetch chains, value open interest,
/// and report where aggregate option-holder payout is smallest.
#[derive(Parser)]
#[command(name = "maxpain", version, about)]
pub struct Cli {
    /// JSON config file (URL template, timeouts, table layout)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Maximum number of fetches in flight (overrides the config file)
    #[arg(long, global = true)]
    pub concurrency: Option<usize>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Fetch one chain and print calls, puts, valuation and summary
    Chain {
        /// Stock symbol
        symbol: String,

        /// Expiration month (1-12, default: current month)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
        month: Option<u32>,

        /// Expiration year (default: current year)
        #[arg(long)]
        year: Option<i32>,

        /// Write results as JSON to this file
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Max pain, open interest and put/call ratio for one symbol by month
    Months {
        /// Stock symbol
        symbol: String,

        /// Number of months after the current one to include
        #[arg(long, default_value = "12")]
        months: u32,

        /// Write results as JSON to this file
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Write the table as CSV to this file
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Max-pain matrix for many symbols across months
    Matrix {
        /// Comma-separated symbols
        #[arg(long, default_value = DEFAULT_SYMBOLS)]
        symbols: String,

        /// Number of months after the current one to include
        #[arg(long, default_value = "12")]
        months: u32,

        /// Write results as JSON to this file
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Write the matrix as CSV to this file
        #[arg(long)]
        csv: Option<PathBuf>,
    },
}
