pub mod chain;
pub mod table;

pub use chain::{
    Failure, FetchRequest, FetchUnit, MaxPainResult, OptionChainSnapshot, ValuationProfile,
};
pub use table::{Column, FieldRule, FieldSpec, RawTable, StrikeSeries};
