use serde::Serialize;

use crate::error::ChainError;

use super::table::StrikeSeries;

/// Parsed contents of one options-chain page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionChainSnapshot {
    pub description: String,
    pub last_price: f64,
    pub expire_label: String,
    pub calls: StrikeSeries,
    pub puts: StrikeSeries,
}

/// Total payout owed to option holders at each candidate settlement price.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValuationProfile {
    /// Ascending, deduplicated union of call and put strikes.
    pub prices: Vec<f64>,
    pub call_payout: Vec<f64>,
    pub put_payout: Vec<f64>,
    pub total_payout: Vec<f64>,
}

impl ValuationProfile {
    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

/// Estimated max-pain price; `None` when no estimate is available.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MaxPainResult {
    pub price: Option<f64>,
}

impl MaxPainResult {
    pub fn unavailable() -> Self {
        Self { price: None }
    }
}

/// One (symbol, month, year) work item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FetchRequest {
    pub symbol: String,
    pub month: u32,
    pub year: i32,
}

impl FetchRequest {
    pub fn new(symbol: &str, month: u32, year: i32) -> Self {
        Self {
            symbol: symbol.trim().to_uppercase(),
            month,
            year,
        }
    }
}

/// Why a unit has no estimate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Failure {
    pub kind: &'static str,
    pub message: String,
}

impl From<&ChainError> for Failure {
    fn from(e: &ChainError) -> Self {
        Failure {
            kind: e.kind(),
            message: e.to_string(),
        }
    }
}

/// Outcome of one fetch: identity is always present; the chain and profile
/// are present whenever the page was parsed and valued, even if the fit
/// later failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchUnit {
    pub request: FetchRequest,
    pub snapshot: Option<OptionChainSnapshot>,
    pub profile: Option<ValuationProfile>,
    pub max_pain: MaxPainResult,
    pub failure: Option<Failure>,
}

impl FetchUnit {
    pub fn failed(request: FetchRequest, error: &ChainError) -> Self {
        Self {
            request,
            snapshot: None,
            profile: None,
            max_pain: MaxPainResult::unavailable(),
            failure: Some(error.into()),
        }
    }

    pub fn is_available(&self) -> bool {
        self.max_pain.price.is_some()
    }

    /// Call and put open interest totals, when the chain was parsed.
    pub fn open_interest(&self) -> Option<(i64, i64)> {
        self.snapshot
            .as_ref()
            .map(|s| (s.calls.total_open_interest(), s.puts.total_open_interest()))
    }
}
