//! Text and CSV renderings of fetched chains.

use std::io::{self, Write};

use serde::Serialize;

use crate::model::{FetchUnit, StrikeSeries, ValuationProfile};

/// One line of the per-month summary. Numeric fields are `None` for a
/// month whose estimate is unavailable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthRow {
    pub symbol: String,
    pub date: String,
    pub max_pain: Option<f64>,
    pub open_interest: Option<i64>,
    pub put_call_ratio: Option<f64>,
}

impl MonthRow {
    pub fn from_unit(unit: &FetchUnit) -> Self {
        let r = &unit.request;
        let mut row = MonthRow {
            symbol: r.symbol.clone(),
            date: format!("{:02}/{}", r.month, r.year),
            max_pain: unit.max_pain.price,
            open_interest: None,
            put_call_ratio: None,
        };
        if let (Some(_), Some((calls, puts))) = (row.max_pain, unit.open_interest()) {
            row.open_interest = Some(calls + puts);
            row.put_call_ratio = (calls != 0).then(|| puts as f64 / calls as f64);
        }
        row
    }
}

/// `M/YYYY` column label used by the max-pain matrix.
pub fn month_label(month: u32, year: i32) -> String {
    format!("{month}/{year}")
}

/// Tab-separated table of a strike series, columns sorted by name. The
/// contract symbol column is left out.
pub fn write_series(out: &mut impl Write, series: &StrikeSeries) -> io::Result<()> {
    let fields: Vec<&str> = series.fields().filter(|f| *f != "symbol").collect();
    writeln!(out, "{}", fields.join("\t"))?;
    for i in 0..series.len() {
        let cells: Vec<String> = fields
            .iter()
            .filter_map(|f| series.get(f).map(|c| c.display(i)))
            .collect();
        writeln!(out, "{}", cells.join("\t"))?;
    }
    Ok(())
}

pub fn write_profile(out: &mut impl Write, profile: &ValuationProfile) -> io::Result<()> {
    writeln!(out, "prices\tcalls\tputs\ttotals")?;
    for i in 0..profile.len() {
        writeln!(
            out,
            "{:.2}\t{:.2}\t{:.2}\t{:.2}",
            profile.prices[i],
            profile.call_payout[i],
            profile.put_payout[i],
            profile.total_payout[i]
        )?;
    }
    Ok(())
}

/// Full dump of one chain: calls, puts, valuation and a summary.
pub fn write_chain(out: &mut impl Write, unit: &FetchUnit) -> io::Result<()> {
    let Some(snapshot) = &unit.snapshot else {
        let reason = unit.failure.as_ref().map_or("unknown error", |f| f.message.as_str());
        return writeln!(
            out,
            "{}\t{:02}/{}\tunavailable: {reason}",
            unit.request.symbol, unit.request.month, unit.request.year
        );
    };

    writeln!(out, "CALLS")?;
    write_series(out, &snapshot.calls)?;
    writeln!(out, "\nPUTS")?;
    write_series(out, &snapshot.puts)?;
    if let Some(profile) = &unit.profile {
        writeln!(out, "\nVALUATION")?;
        write_profile(out, profile)?;
    }

    let max_pain = unit
        .max_pain
        .price
        .map_or_else(|| "n/a".to_string(), |p| format!("${p:5.2}"));
    writeln!(out, "\nSUMMARY")?;
    writeln!(
        out,
        "{}\tLast: ${:5.2}\tExpire: {}",
        snapshot.description, snapshot.last_price, snapshot.expire_label
    )?;
    writeln!(out, "{}\t Max Pain {max_pain}", unit.request.symbol)
}

/// `SYM DATE MP VOL PUTS/CALLS` table, one row per unit in order.
pub fn write_months(out: &mut impl Write, units: &[FetchUnit]) -> io::Result<()> {
    writeln!(out, "SYM\tDATE\tMP\tVOL\tPUTS/CALLS")?;
    for row in units.iter().map(MonthRow::from_unit) {
        let mp = row.max_pain.map(|p| format!("${p:5.2}")).unwrap_or_default();
        let vol = row.open_interest.map(|v| v.to_string()).unwrap_or_default();
        let ratio = row.put_call_ratio.map(|r| format!("{r:5.2}")).unwrap_or_default();
        writeln!(out, "{}\t{}\t{mp}\t{vol}\t{ratio}", row.symbol, row.date)?;
    }
    Ok(())
}

pub fn write_months_csv(out: impl Write, units: &[FetchUnit]) -> csv::Result<()> {
    let mut w = csv::Writer::from_writer(out);
    for unit in units {
        w.serialize(MonthRow::from_unit(unit))?;
    }
    w.flush()?;
    Ok(())
}

/// Max-pain matrix: one column per month, one row per symbol. Units whose
/// estimate is unavailable render as `0.00`.
pub fn write_matrix(
    out: &mut impl Write,
    dates: &[(u32, i32)],
    rows: &[(String, Vec<FetchUnit>)],
) -> io::Result<()> {
    let labels: Vec<String> = dates.iter().map(|&(m, y)| month_label(m, y)).collect();
    writeln!(out, "\t{}", labels.join("\t"))?;
    for (symbol, units) in rows {
        let cells: Vec<String> = units.iter().map(matrix_cell).collect();
        writeln!(out, "{}\t{}", symbol.to_uppercase(), cells.join("\t"))?;
    }
    Ok(())
}

pub fn write_matrix_csv(
    out: impl Write,
    dates: &[(u32, i32)],
    rows: &[(String, Vec<FetchUnit>)],
) -> csv::Result<()> {
    let mut w = csv::Writer::from_writer(out);
    let mut header = vec!["symbol".to_string()];
    header.extend(dates.iter().map(|&(m, y)| month_label(m, y)));
    w.write_record(&header)?;
    for (symbol, units) in rows {
        let mut record = vec![symbol.to_uppercase()];
        record.extend(units.iter().map(matrix_cell));
        w.write_record(&record)?;
    }
    w.flush()?;
    Ok(())
}

fn matrix_cell(unit: &FetchUnit) -> String {
    format!("{:.2}", unit.max_pain.price.unwrap_or(0.0))
}
