use std::collections::BTreeMap;

use crate::error::{ChainError, Result};
use crate::model::{Column, FieldRule, FieldSpec, RawTable, StrikeSeries};

/// Parse a decimal, ignoring commas. Never fails: malformed input is 0.0.
pub fn parse_price(s: &str) -> f64 {
    s.replace(',', "").trim().parse().unwrap_or(0.0)
}

/// Parse an integer, ignoring commas.
pub fn parse_integer(s: &str) -> Result<i64> {
    s.replace(',', "")
        .trim()
        .parse()
        .map_err(|e| ChainError::parse(format!("invalid integer `{s}`: {e}")))
}

/// Convert a raw strike table into column-oriented series.
///
/// Header cells are lower-cased to form field names. Each included field
/// gets one value per data row, in row order, so index `i` refers to the
/// same source row in every column. Fields ruled [`FieldRule::Drop`] are
/// left out.
pub fn aggregate(table: &RawTable, spec: &FieldSpec) -> Result<StrikeSeries> {
    let header = table
        .header()
        .ok_or_else(|| ChainError::parse("strike table has no header row"))?;
    let width = header.len();
    let rows = table.data_rows();
    if let Some(i) = rows.iter().position(|r| r.len() != width) {
        return Err(ChainError::parse(format!(
            "row {} has {} cells, header has {width}",
            i + 1,
            rows[i].len()
        )));
    }

    let mut columns = BTreeMap::new();
    for (col, name) in header.iter().enumerate() {
        let key = name.to_lowercase();
        let cells = rows.iter().map(|r| r[col].as_str());
        let column = match spec.rule(&key) {
            FieldRule::Drop => continue,
            FieldRule::Identity => Column::Text(cells.map(str::to_string).collect()),
            FieldRule::Price => Column::Price(cells.map(parse_price).collect()),
            FieldRule::Integer => Column::Integer(
                cells
                    .map(|c| {
                        parse_integer(c)
                            .map_err(|e| ChainError::parse(format!("field `{key}`: {e}")))
                    })
                    .collect::<Result<_>>()?,
            ),
        };
        columns.insert(key, column);
    }

    Ok(StrikeSeries::from_columns(columns, rows.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: &[&[&str]]) -> RawTable {
        RawTable::new(
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    #[test]
    fn test_parse_price_strips_commas() {
        assert_eq!(parse_price("1,234.50"), 1234.5);
        assert_eq!(parse_price(" 7 "), 7.0);
        assert_eq!(parse_price("N/A"), 0.0);
        assert_eq!(parse_price(""), 0.0);
    }

    #[test]
    fn test_parse_integer_rejects_garbage() {
        assert_eq!(parse_integer("12,345").unwrap(), 12345);
        assert!(matches!(parse_integer("1.5"), Err(ChainError::Parse(_))));
        assert!(matches!(parse_integer("-"), Err(ChainError::Parse(_))));
    }

    #[test]
    fn test_aggregate_applies_rules() {
        let t = table(&[
            &["Strike", "Symbol", "Last", "Chg", "Vol", "Open Int"],
            &["10.00", "XYZ111119C00010000", "1.25", "+0.10", "1,200", "3,400"],
            &["20.00", "XYZ111119C00020000", "N/A", "-0.05", "7", "12"],
        ]);
        let s = aggregate(&t, &FieldSpec::option_chain()).unwrap();

        assert_eq!(s.len(), 2);
        assert!(s.get("chg").is_none());
        assert_eq!(s.strikes().unwrap(), &[10.0, 20.0]);
        assert_eq!(s.open_interest().unwrap(), &[3400, 12]);
        assert_eq!(s.get("vol"), Some(&Column::Integer(vec![1200, 7])));
        assert_eq!(s.get("last"), Some(&Column::Price(vec![1.25, 0.0])));
        assert!(matches!(s.get("symbol"), Some(Column::Text(v)) if v[1] == "XYZ111119C00020000"));
    }

    #[test]
    fn test_aggregate_malformed_integer_is_parse_error() {
        let t = table(&[&["Strike", "Open Int"], &["10", "lots"]]);
        let err = aggregate(&t, &FieldSpec::option_chain()).unwrap_err();
        assert!(matches!(err, ChainError::Parse(ref m) if m.contains("open int")));
    }

    #[test]
    fn test_aggregate_ragged_row_is_parse_error() {
        let t = table(&[&["Strike", "Open Int"], &["10"]]);
        assert!(matches!(
            aggregate(&t, &FieldSpec::option_chain()),
            Err(ChainError::Parse(_))
        ));
    }

    #[test]
    fn test_aggregate_header_only_gives_empty_columns() {
        let t = table(&[&["Strike", "Open Int"]]);
        let s = aggregate(&t, &FieldSpec::option_chain()).unwrap();
        assert!(s.is_empty());
        assert_eq!(s.strikes().unwrap().len(), 0);
    }
}
