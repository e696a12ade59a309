//! Strike-table aggregation, payout valuation and max-pain estimation.

pub mod aggregate;
pub mod max_pain;
pub mod valuation;

pub use aggregate::aggregate;
pub use max_pain::estimate;
pub use valuation::value;
