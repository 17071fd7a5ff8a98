use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    pub id: i64,
    pub date: NaiveDate,
    pub amount_cents: i64,
    pub category: String,
    pub description: String,
    /// Owning budget period.
    pub period_id: i64,
}

impl Expense {
    pub fn amount_display(&self) -> String {
        format_cents(self.amount_cents)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewExpense {
    pub date: NaiveDate,
    pub amount_cents: i64,
    pub category: String,
    pub description: String,
    pub period_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseUpdate {
    pub date: NaiveDate,
    pub amount_cents: i64,
    pub category: String,
    pub description: String,
}

/// Summed expense amount for one category, scoped to a period or a month
/// of a year. Derived by GROUP BY queries, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total_cents: i64,
    /// First day of the month the total belongs to; absent for
    /// single-period snapshots.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month_year: Option<NaiveDate>,
}

pub fn format_cents(cents: i64) -> String {
    let is_negative = cents < 0;
    let abs_cents = cents.abs();
    let units = abs_cents / 100;
    let remainder = abs_cents % 100;

    if is_negative {
        format!("-{}.{:02}", units, remainder)
    } else {
        format!("{}.{:02}", units, remainder)
    }
}
