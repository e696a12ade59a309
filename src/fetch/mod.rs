//! Page retrieval, table extraction and concurrent fetch orchestration.

pub mod chain;
pub mod dates;
pub mod html;
pub mod scheduler;
pub mod source;

pub use chain::ChainFetcher;
pub use scheduler::Scheduler;
pub use source::{HttpPageSource, PageSource};
