use rusqlite::{params, Connection, OptionalExtension};

use super::parse_date;
use crate::models::{CategoryTotal, Expense, ExpenseUpdate, NewExpense};

#[derive(Debug, Default)]
pub struct ExpenseFilter {
    pub period_id: Option<i64>,
    pub category: Option<String>,
    pub from_date: Option<String>,
    pub to_date: Option<String>,
}

fn map_expense(row: &rusqlite::Row) -> rusqlite::Result<Expense> {
    Ok(Expense {
        id: row.get(0)?,
        date: parse_date(1, row.get(1)?)?,
        amount_cents: row.get(2)?,
        category: row.get(3)?,
        description: row.get(4)?,
        period_id: row.get(5)?,
    })
}

pub fn list_expenses(conn: &Connection, filter: &ExpenseFilter) -> rusqlite::Result<Vec<Expense>> {
    let mut sql = String::from(
        "SELECT id, date, amount_cents, category, description, period_id
         FROM expenses
         WHERE 1=1",
    );
    let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

    if let Some(period_id) = filter.period_id {
        sql.push_str(" AND period_id = ?");
        params_vec.push(Box::new(period_id));
    }
    if let Some(ref category) = filter.category {
        sql.push_str(" AND category = ?");
        params_vec.push(Box::new(category.clone()));
    }
    if let Some(ref from_date) = filter.from_date {
        sql.push_str(" AND date >= ?");
        params_vec.push(Box::new(from_date.clone()));
    }
    if let Some(ref to_date) = filter.to_date {
        sql.push_str(" AND date <= ?");
        params_vec.push(Box::new(to_date.clone()));
    }

    sql.push_str(" ORDER BY date DESC, id DESC");

    let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
    let mut stmt = conn.prepare(&sql)?;
    let expenses = stmt
        .query_map(params_refs.as_slice(), map_expense)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(expenses)
}

pub fn get_expense(conn: &Connection, id: i64) -> rusqlite::Result<Option<Expense>> {
    conn.query_row(
        "SELECT id, date, amount_cents, category, description, period_id
         FROM expenses WHERE id = ?",
        [id],
        map_expense,
    )
    .optional()
}

/// Per-category sums for one period, ordered by insertion so that chart
/// colors are stable for a given dataset.
pub fn category_totals(conn: &Connection, period_id: i64) -> rusqlite::Result<Vec<CategoryTotal>> {
    let mut stmt = conn.prepare(
        "SELECT category, SUM(amount_cents) AS total
         FROM expenses
         WHERE period_id = ?
         GROUP BY category
         ORDER BY MIN(id)",
    )?;
    let totals = stmt
        .query_map([period_id], |row| {
            Ok(CategoryTotal {
                category: row.get(0)?,
                total_cents: row.get(1)?,
                month_year: None,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(totals)
}

/// Per-category sums per month for one calendar year. Each row carries the
/// first day of its month so the series builder can place it on the time
/// axis.
pub fn category_totals_by_month(
    conn: &Connection,
    year: i32,
) -> rusqlite::Result<Vec<CategoryTotal>> {
    let mut stmt = conn.prepare(
        "SELECT category, SUM(amount_cents) AS total, strftime('%Y-%m-01', date) AS month
         FROM expenses
         WHERE strftime('%Y', date) = ?
         GROUP BY category, month
         ORDER BY month ASC, MIN(id)",
    )?;
    let totals = stmt
        .query_map([format!("{:04}", year)], |row| {
            Ok(CategoryTotal {
                category: row.get(0)?,
                total_cents: row.get(1)?,
                month_year: Some(parse_date(2, row.get(2)?)?),
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(totals)
}

/// Insert an expense and deduct it from the owning period's remainder,
/// atomically.
pub fn insert_expense(conn: &mut Connection, new: &NewExpense) -> rusqlite::Result<Expense> {
    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO expenses (date, amount_cents, category, description, period_id)
         VALUES (?, ?, ?, ?, ?)",
        params![
            new.date.format("%Y-%m-%d").to_string(),
            new.amount_cents,
            new.category,
            new.description,
            new.period_id
        ],
    )?;
    let id = tx.last_insert_rowid();

    super::budget_periods::adjust_remaining(&tx, new.period_id, -new.amount_cents)?;
    tx.commit()?;

    Ok(Expense {
        id,
        date: new.date,
        amount_cents: new.amount_cents,
        category: new.category.clone(),
        description: new.description.clone(),
        period_id: new.period_id,
    })
}

/// Update an expense in place, reconciling the period remainder with the
/// amount delta.
pub fn update_expense(
    conn: &mut Connection,
    id: i64,
    update: &ExpenseUpdate,
) -> rusqlite::Result<Option<Expense>> {
    let tx = conn.transaction()?;
    let Some(existing) = get_expense(&tx, id)? else {
        return Ok(None);
    };

    tx.execute(
        "UPDATE expenses SET date = ?, amount_cents = ?, category = ?, description = ?
         WHERE id = ?",
        params![
            update.date.format("%Y-%m-%d").to_string(),
            update.amount_cents,
            update.category,
            update.description,
            id
        ],
    )?;

    let delta = existing.amount_cents - update.amount_cents;
    if delta != 0 {
        super::budget_periods::adjust_remaining(&tx, existing.period_id, delta)?;
    }

    let updated = get_expense(&tx, id)?;
    tx.commit()?;
    Ok(updated)
}

/// Delete an expense and restore its amount to the period remainder,
/// atomically.
pub fn delete_expense(conn: &mut Connection, id: i64) -> rusqlite::Result<bool> {
    let tx = conn.transaction()?;
    let Some(existing) = get_expense(&tx, id)? else {
        return Ok(false);
    };

    tx.execute("DELETE FROM expenses WHERE id = ?", [id])?;
    super::budget_periods::adjust_remaining(&tx, existing.period_id, existing.amount_cents)?;
    tx.commit()?;
    Ok(true)
}

/// Years that have any recorded expense, ascending.
pub fn expense_years(conn: &Connection) -> rusqlite::Result<Vec<i32>> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT strftime('%Y', date) FROM expenses ORDER BY 1 ASC",
    )?;
    let years = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(years.iter().filter_map(|y| y.parse().ok()).collect())
}
