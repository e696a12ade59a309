//! Max-pain estimation for stock option chains.

pub mod commands;
pub mod config;
pub mod engine;
pub mod error;
pub mod fetch;
pub mod interrupt;
pub mod model;
pub mod report;

pub use error::{ChainError, Result};
