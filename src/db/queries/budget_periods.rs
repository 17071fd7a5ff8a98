use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};

use super::parse_date;
use crate::date_utils::{month_end, month_start};
use crate::models::{BudgetPeriod, NewBudgetPeriod, PeriodSummary};

fn map_period(row: &rusqlite::Row) -> rusqlite::Result<BudgetPeriod> {
    Ok(BudgetPeriod {
        id: row.get(0)?,
        month_year: parse_date(1, row.get(1)?)?,
        budgeted_cents: row.get(2)?,
        remaining_cents: row.get(3)?,
    })
}

/// All periods, most recent month first.
pub fn list_periods(conn: &Connection) -> rusqlite::Result<Vec<BudgetPeriod>> {
    let mut stmt = conn.prepare(
        "SELECT id, month_year, budgeted_cents, remaining_cents
         FROM budget_periods
         ORDER BY month_year DESC",
    )?;
    let periods = stmt
        .query_map([], map_period)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(periods)
}

pub fn get_period(conn: &Connection, id: i64) -> rusqlite::Result<Option<BudgetPeriod>> {
    conn.query_row(
        "SELECT id, month_year, budgeted_cents, remaining_cents
         FROM budget_periods WHERE id = ?",
        [id],
        map_period,
    )
    .optional()
}

/// Id of the period covering `today`, if one exists.
pub fn current_period_id(conn: &Connection, today: NaiveDate) -> rusqlite::Result<Option<i64>> {
    conn.query_row(
        "SELECT id FROM budget_periods WHERE month_year = ?",
        [month_start(today).format("%Y-%m-%d").to_string()],
        |row| row.get(0),
    )
    .optional()
}

/// Period summaries for one calendar year, ascending by month.
pub fn yearly_summaries(conn: &Connection, year: i32) -> rusqlite::Result<Vec<PeriodSummary>> {
    let from = NaiveDate::from_ymd_opt(year, 1, 1).unwrap();
    let to = month_end(NaiveDate::from_ymd_opt(year, 12, 1).unwrap());

    let mut stmt = conn.prepare(
        "SELECT id, month_year, budgeted_cents, remaining_cents
         FROM budget_periods
         WHERE month_year >= ? AND month_year <= ?
         ORDER BY month_year ASC",
    )?;
    let summaries = stmt
        .query_map(
            params![
                from.format("%Y-%m-%d").to_string(),
                to.format("%Y-%m-%d").to_string()
            ],
            |row| {
                Ok(PeriodSummary {
                    period_id: row.get(0)?,
                    month_year: parse_date(1, row.get(1)?)?,
                    budgeted_cents: row.get(2)?,
                    remaining_cents: row.get(3)?,
                })
            },
        )?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(summaries)
}

/// Insert a new period. The month is normalized to its first day and the
/// remainder starts at the full budgeted amount.
pub fn insert_period(conn: &Connection, new: &NewBudgetPeriod) -> rusqlite::Result<BudgetPeriod> {
    let month = month_start(new.month_year);
    conn.execute(
        "INSERT INTO budget_periods (month_year, budgeted_cents, remaining_cents)
         VALUES (?, ?, ?)",
        params![
            month.format("%Y-%m-%d").to_string(),
            new.budgeted_cents,
            new.budgeted_cents
        ],
    )?;

    Ok(BudgetPeriod {
        id: conn.last_insert_rowid(),
        month_year: month,
        budgeted_cents: new.budgeted_cents,
        remaining_cents: new.budgeted_cents,
    })
}

/// Shift a period's remainder by `delta_cents` (negative when spending).
pub fn adjust_remaining(conn: &Connection, period_id: i64, delta_cents: i64) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE budget_periods SET remaining_cents = remaining_cents + ? WHERE id = ?",
        params![delta_cents, period_id],
    )?;
    Ok(())
}
