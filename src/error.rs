use thiserror::Error;

/// Failures that can occur while producing a max-pain estimate for one chain.
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("network error: {0}")]
    Network(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("degenerate quadratic fit: {0}")]
    DegenerateFit(String),

    #[error("interrupted")]
    Interrupted,
}

impl ChainError {
    /// True for errors that are contained at the fetch-unit boundary.
    /// `Interrupted` is the only variant that must escape a unit.
    pub fn is_contained(&self) -> bool {
        !matches!(self, ChainError::Interrupted)
    }

    /// Short machine-readable tag for reports and JSON output.
    pub fn kind(&self) -> &'static str {
        match self {
            ChainError::Network(_) => "network",
            ChainError::Parse(_) => "parse",
            ChainError::DegenerateFit(_) => "degenerate_fit",
            ChainError::Interrupted => "interrupted",
        }
    }

    pub(crate) fn parse(msg: impl Into<String>) -> Self {
        ChainError::Parse(msg.into())
    }
}

impl From<reqwest::Error> for ChainError {
    fn from(e: reqwest::Error) -> Self {
        ChainError::Network(e.to_string())
    }
}

pub type Result<T, E = ChainError> = std::result::Result<T, E>;
