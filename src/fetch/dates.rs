use chrono::{Datelike, NaiveDate};

/// `months + 1` consecutive (month, year) pairs starting at `today`'s month.
pub fn month_range(today: NaiveDate, months: u32) -> Vec<(u32, i32)> {
    (0..=months)
        .map(|dm| {
            let total = today.month0() + dm;
            (total % 12 + 1, today.year() + (total / 12) as i32)
        })
        .collect()
}
