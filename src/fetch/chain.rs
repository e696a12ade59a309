use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::{ChainConfig, PageLayout};
use crate::engine;
use crate::error::{ChainError, Result};
use crate::fetch::html;
use crate::fetch::source::PageSource;
use crate::interrupt::Interrupt;
use crate::model::{
    FetchRequest, FetchUnit, FieldSpec, MaxPainResult, OptionChainSnapshot, RawTable,
};

/// Runs one fetch → parse → value → estimate cycle per request.
pub struct ChainFetcher {
    source: Arc<dyn PageSource>,
    config: ChainConfig,
    spec: FieldSpec,
    interrupt: Arc<Interrupt>,
}

impl ChainFetcher {
    pub fn new(
        source: Arc<dyn PageSource>,
        config: ChainConfig,
        interrupt: Arc<Interrupt>,
    ) -> Self {
        Self {
            source,
            config,
            spec: FieldSpec::option_chain(),
            interrupt,
        }
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    /// Fetch and analyse one chain.
    ///
    /// Network, parse and fit failures are folded into the returned unit,
    /// which always carries the request identity. Only
    /// [`ChainError::Interrupted`] is returned as an error.
    pub async fn fetch(&self, request: FetchRequest) -> Result<FetchUnit> {
        if self.interrupt.is_triggered() {
            return Err(ChainError::Interrupted);
        }
        let url = self.config.url(&request.symbol, request.month, request.year);
        debug!(%url, "fetching chain");

        let page = tokio::select! {
            biased;
            _ = self.interrupt.triggered() => return Err(ChainError::Interrupted),
            page = self.source.fetch_page(&url) => page,
        };

        let snapshot = match page.and_then(|html| self.snapshot(&html)) {
            Ok(s) => s,
            Err(e) => return contain(request, e),
        };

        let mut unit = FetchUnit {
            request,
            snapshot: None,
            profile: None,
            max_pain: MaxPainResult::unavailable(),
            failure: None,
        };
        let outcome = engine::value(&snapshot.calls, &snapshot.puts).and_then(|profile| {
            let estimate = engine::estimate(&profile);
            unit.profile = Some(profile);
            estimate
        });
        unit.snapshot = Some(snapshot);

        match outcome {
            Ok(max_pain) => {
                unit.max_pain = max_pain;
                info!(
                    symbol = %unit.request.symbol,
                    month = unit.request.month,
                    year = unit.request.year,
                    max_pain = ?max_pain.price,
                    "chain fetched"
                );
                Ok(unit)
            }
            Err(e) => {
                if !e.is_contained() {
                    return Err(e);
                }
                log_failure(&unit.request, &e);
                unit.failure = Some((&e).into());
                Ok(unit)
            }
        }
    }

    fn snapshot(&self, html: &str) -> Result<OptionChainSnapshot> {
        let tables = html::parse_tables(html);
        debug!(tables = tables.len(), "parsed page");
        snapshot_from_tables(&tables, &self.config.layout, &self.spec)
    }
}

fn contain(request: FetchRequest, e: ChainError) -> Result<FetchUnit> {
    if !e.is_contained() {
        return Err(e);
    }
    log_failure(&request, &e);
    Ok(FetchUnit::failed(request, &e))
}

fn log_failure(request: &FetchRequest, e: &ChainError) {
    warn!(
        symbol = %request.symbol,
        month = request.month,
        year = request.year,
        kind = e.kind(),
        "chain unavailable: {e}"
    );
}

/// Build a snapshot from the tables of a chain page.
pub fn snapshot_from_tables(
    tables: &HashMap<String, RawTable>,
    layout: &PageLayout,
    spec: &FieldSpec,
) -> Result<OptionChainSnapshot> {
    let table = |key: &str| {
        tables
            .get(key)
            .ok_or_else(|| ChainError::parse(format!("page has no table `{key}`")))
    };

    let summary = table(&layout.summary)?;
    let description = summary.cell(0, 0)?.to_string();
    let last_price = last_price(summary.cell(0, 1)?)?;
    let expire_label = expire_label(table(&layout.expiry)?.cell(0, 1)?)?;
    let calls = engine::aggregate(table(&layout.calls)?, spec)?;
    let puts = engine::aggregate(table(&layout.puts)?, spec)?;

    Ok(OptionChainSnapshot {
        description,
        last_price,
        expire_label,
        calls,
        puts,
    })
}

/// Price in text like `Last Trade: 123.45 ...`: the first `:` at or after
/// byte 6, skipping two characters, up to the next space.
pub fn last_price(text: &str) -> Result<f64> {
    let start = find_from(text, ':', 6)? + 2;
    let rest = text
        .get(start..)
        .ok_or_else(|| ChainError::parse(format!("no price after `:` in `{text}`")))?;
    let end = rest
        .find(' ')
        .ok_or_else(|| ChainError::parse(format!("unterminated price in `{text}`")))?;
    rest[..end]
        .parse()
        .map_err(|e| ChainError::parse(format!("invalid last price `{}`: {e}", &rest[..end])))
}

/// Label after the first `,` at or after byte 16, skipping two characters.
/// A `,` at the very end yields an empty label.
pub fn expire_label(text: &str) -> Result<String> {
    let start = find_from(text, ',', 16)? + 2;
    if start >= text.len() {
        return Ok(String::new());
    }
    text.get(start..)
        .map(str::to_string)
        .ok_or_else(|| ChainError::parse(format!("no expiration after `,` in `{text}`")))
}

fn find_from(text: &str, needle: char, from: usize) -> Result<usize> {
    text.get(from..)
        .and_then(|t| t.find(needle))
        .map(|i| i + from)
        .ok_or_else(|| ChainError::parse(format!("no `{needle}` after offset {from} in `{text}`")))
}
