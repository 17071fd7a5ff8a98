pub mod budget_periods;
pub mod expenses;

use chrono::NaiveDate;
use rusqlite::types::Type;

/// Parse a TEXT date column. Dates are stored as ISO "YYYY-MM-DD".
pub(crate) fn parse_date(idx: usize, value: String) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(&value, "%Y-%m-%d").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
    })
}
