//! Month arithmetic and labels shared by queries and the series builder.

use chrono::{Datelike, NaiveDate};

pub const SHORT_MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Short name for a 1-based month number ("Jan" for 1).
pub fn short_month_name(month: u32) -> &'static str {
    SHORT_MONTHS[(month as usize - 1) % 12]
}

/// Label for a budget period, e.g. "Aug 2026".
pub fn period_label(month_year: NaiveDate) -> String {
    format!("{} {}", short_month_name(month_year.month()), month_year.year())
}

pub fn month_start(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap()
}

pub fn month_end(date: NaiveDate) -> NaiveDate {
    let next_month = if date.month() == 12 {
        NaiveDate::from_ymd_opt(date.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(date.year(), date.month() + 1, 1)
    };
    next_month.unwrap() - chrono::Duration::days(1)
}

/// 1-based month numbers from January through `today`'s month, inclusive.
pub fn months_through(today: NaiveDate) -> impl Iterator<Item = u32> {
    1..=today.month()
}
