use std::sync::Arc;

use anyhow::Context;
use chrono::Datelike;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use maxpain::commands::{self, Outputs};
use maxpain::config::ChainConfig;
use maxpain::interrupt::Interrupt;

mod cli;

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = cli::Cli::parse();
    let config = ChainConfig::load(cli.config.as_deref(), cli.concurrency)?;

    let interrupt = Arc::new(Interrupt::new());
    {
        let interrupt = interrupt.clone();
        ctrlc::set_handler(move || interrupt.trigger()).context("installing Ctrl-C handler")?;
    }

    match cli.command {
        cli::Command::Chain {
            symbol,
            month,
            year,
            output,
        } => {
            let today = chrono::Local::now().date_naive();
            commands::chain(
                config,
                interrupt,
                &symbol,
                month.unwrap_or(today.month()),
                year.unwrap_or(today.year()),
                &Outputs {
                    json: output.as_deref(),
                    csv: None,
                },
            )
        }
        cli::Command::Months {
            symbol,
            months,
            output,
            csv,
        } => commands::months(
            config,
            interrupt,
            &symbol,
            months,
            &Outputs {
                json: output.as_deref(),
                csv: csv.as_deref(),
            },
        ),
        cli::Command::Matrix {
            symbols,
            months,
            output,
            csv,
        } => commands::matrix(
            config,
            interrupt,
            &symbols,
            months,
            &Outputs {
                json: output.as_deref(),
                csv: csv.as_deref(),
            },
        ),
    }
}
