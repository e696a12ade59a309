use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::{ChainError, Result};

/// Header column holding the strike price of each row.
pub const STRIKE: &str = "strike";
/// Header column holding the open interest of each row.
pub const OPEN_INTEREST: &str = "open int";

/// A table as extracted from markup: row 0 is the header, every other row
/// is a sequence of string cells.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTable {
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    pub fn header(&self) -> Option<&[String]> {
        self.rows.first().map(|r| r.as_slice())
    }

    /// Data rows, excluding the header.
    pub fn data_rows(&self) -> &[Vec<String>] {
        self.rows.get(1..).unwrap_or(&[])
    }

    /// Cell at `(row, col)`, or a parse error if the table is too small.
    pub fn cell(&self, row: usize, col: usize) -> Result<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(|c| c.as_str())
            .ok_or_else(|| ChainError::parse(format!("missing cell ({row}, {col})")))
    }
}

/// How a single column is turned into values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRule {
    /// Keep the cell text as-is.
    Identity,
    /// Strip thousands separators and parse as integer; malformed is an error.
    Integer,
    /// Strip thousands separators and parse as decimal; malformed yields 0.0.
    Price,
    /// Exclude the column entirely.
    Drop,
}

/// Per-column parsing rules keyed by lower-cased header name. Columns
/// without an entry use [`FieldRule::Price`].
#[derive(Debug, Clone, Default)]
pub struct FieldSpec {
    rules: HashMap<String, FieldRule>,
}

impl FieldSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: &str, rule: FieldRule) -> Self {
        self.rules.insert(field.to_lowercase(), rule);
        self
    }

    pub fn rule(&self, field: &str) -> FieldRule {
        self.rules.get(field).copied().unwrap_or(FieldRule::Price)
    }

    /// Rules for the strike tables of an options-chain page.
    pub fn option_chain() -> Self {
        Self::new()
            .with("symbol", FieldRule::Identity)
            .with("chg", FieldRule::Drop)
            .with("vol", FieldRule::Integer)
            .with(OPEN_INTEREST, FieldRule::Integer)
    }
}

/// One parsed column.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Column {
    Integer(Vec<i64>),
    Price(Vec<f64>),
    Text(Vec<String>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Integer(v) => v.len(),
            Column::Price(v) => v.len(),
            Column::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cell `i` formatted for display; prices use two decimals.
    pub fn display(&self, i: usize) -> String {
        match self {
            Column::Integer(v) => v[i].to_string(),
            Column::Price(v) => format!("{:.2}", v[i]),
            Column::Text(v) => v[i].clone(),
        }
    }
}

/// Column-oriented strike table. All columns share row alignment.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StrikeSeries {
    columns: BTreeMap<String, Column>,
    len: usize,
}

impl StrikeSeries {
    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, field: &str) -> Option<&Column> {
        self.columns.get(field)
    }

    /// Field names in sorted order.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(|k| k.as_str())
    }

    pub fn strikes(&self) -> Result<&[f64]> {
        match self.columns.get(STRIKE) {
            Some(Column::Price(v)) => Ok(v),
            Some(_) => Err(ChainError::parse("`strike` column is not numeric")),
            None => Err(ChainError::parse("missing `strike` column")),
        }
    }

    pub fn open_interest(&self) -> Result<&[i64]> {
        match self.columns.get(OPEN_INTEREST) {
            Some(Column::Integer(v)) => Ok(v),
            Some(_) => Err(ChainError::parse("`open int` column is not an integer column")),
            None => Err(ChainError::parse("missing `open int` column")),
        }
    }

    pub fn total_open_interest(&self) -> i64 {
        self.open_interest().map(|v| v.iter().sum()).unwrap_or(0)
    }

    pub(crate) fn from_columns(columns: BTreeMap<String, Column>, len: usize) -> Self {
        Self { columns, len }
    }

    /// Build a series directly from strike/open-interest pairs.
    pub fn from_strikes(strikes: Vec<f64>, open_interest: Vec<i64>) -> Result<Self> {
        if strikes.len() != open_interest.len() {
            return Err(ChainError::parse(format!(
                "{} strikes but {} open interest values",
                strikes.len(),
                open_interest.len()
            )));
        }
        let len = strikes.len();
        let mut columns = BTreeMap::new();
        columns.insert(STRIKE.to_string(), Column::Price(strikes));
        columns.insert(OPEN_INTEREST.to_string(), Column::Integer(open_interest));
        Ok(Self { columns, len })
    }
}
