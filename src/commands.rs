use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Local;
use serde::Serialize;
use tracing::info;

use crate::config::ChainConfig;
use crate::fetch::dates::month_range;
use crate::fetch::{ChainFetcher, HttpPageSource, Scheduler};
use crate::interrupt::Interrupt;
use crate::model::{FetchRequest, FetchUnit};
use crate::report;

/// Symbols used by the `matrix` command when none are given.
pub const DEFAULT_SYMBOLS: &str = "XLK,XLB,XLE,XLI,XLF,XHB,XLV,XLU,XLP,SPY";

/// Where a batch command writes its results besides stdout.
#[derive(Debug, Default)]
pub struct Outputs<'a> {
    pub json: Option<&'a Path>,
    pub csv: Option<&'a Path>,
}

/// Fetch one chain and print the full dump.
pub fn chain(
    config: ChainConfig,
    interrupt: Arc<Interrupt>,
    symbol: &str,
    month: u32,
    year: i32,
    outputs: &Outputs,
) -> Result<()> {
    let requests = vec![FetchRequest::new(symbol, month, year)];
    let units = fetch_all(config, interrupt, requests)?;

    let mut stdout = std::io::stdout().lock();
    for unit in &units {
        report::write_chain(&mut stdout, unit)?;
    }
    stdout.flush()?;
    write_json(outputs.json, &units)
}

/// Fetch one symbol across the coming months and print the per-month table.
pub fn months(
    config: ChainConfig,
    interrupt: Arc<Interrupt>,
    symbol: &str,
    months: u32,
    outputs: &Outputs,
) -> Result<()> {
    let requests: Vec<FetchRequest> = month_range(Local::now().date_naive(), months)
        .into_iter()
        .map(|(m, y)| FetchRequest::new(symbol, m, y))
        .collect();
    let units = fetch_all(config, interrupt, requests)?;

    let mut stdout = std::io::stdout().lock();
    report::write_months(&mut stdout, &units)?;
    stdout.flush()?;

    if let Some(path) = outputs.csv {
        let file = create(path)?;
        report::write_months_csv(file, &units)
            .with_context(|| format!("writing CSV {}", path.display()))?;
    }
    write_json(outputs.json, &units)
}

/// Fetch every symbol × month under one shared limiter and print the
/// max-pain matrix.
pub fn matrix(
    config: ChainConfig,
    interrupt: Arc<Interrupt>,
    symbols: &str,
    months: u32,
    outputs: &Outputs,
) -> Result<()> {
    let symbols = parse_symbols(symbols);
    let dates = month_range(Local::now().date_naive(), months);
    let requests: Vec<FetchRequest> = symbols
        .iter()
        .flat_map(|s| dates.iter().map(move |&(m, y)| FetchRequest::new(s, m, y)))
        .collect();
    let units = fetch_all(config, interrupt, requests)?;

    let rows = group_rows(&symbols, dates.len(), &units);
    let mut stdout = std::io::stdout().lock();
    report::write_matrix(&mut stdout, &dates, &rows)?;
    stdout.flush()?;

    if let Some(path) = outputs.csv {
        let file = create(path)?;
        report::write_matrix_csv(file, &dates, &rows)
            .with_context(|| format!("writing CSV {}", path.display()))?;
    }
    write_json(outputs.json, &units)
}

/// Split a comma-separated symbol list, trimming and upper-casing entries.
pub fn parse_symbols(symbols: &str) -> Vec<String> {
    symbols
        .split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Regroup units scheduled symbol-major into one row per symbol.
pub fn group_rows(
    symbols: &[String],
    per_row: usize,
    units: &[FetchUnit],
) -> Vec<(String, Vec<FetchUnit>)> {
    symbols
        .iter()
        .cloned()
        .zip(units.chunks(per_row.max(1)).map(|c| c.to_vec()))
        .collect()
}

fn fetch_all(
    config: ChainConfig,
    interrupt: Arc<Interrupt>,
    requests: Vec<FetchRequest>,
) -> Result<Vec<FetchUnit>> {
    let source = HttpPageSource::new(&config)?;
    let fetcher = Arc::new(ChainFetcher::new(Arc::new(source), config, interrupt));
    let scheduler = Scheduler::from_config(fetcher);
    let total = requests.len();

    let rt = tokio::runtime::Runtime::new().context("creating async runtime")?;
    let units = rt.block_on(scheduler.run(requests))?;

    let available = units.iter().filter(|u| u.is_available()).count();
    info!(total, available, "fetch run complete");
    Ok(units)
}

fn write_json<T: Serialize + ?Sized>(path: Option<&Path>, value: &T) -> Result<()> {
    let Some(path) = path else { return Ok(()) };
    let json = serde_json::to_string_pretty(value).context("serializing results")?;
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    info!(path = %path.display(), "wrote results");
    Ok(())
}

fn create(path: &Path) -> Result<std::fs::File> {
    std::fs::File::create(path).with_context(|| format!("creating {}", path.display()))
}
